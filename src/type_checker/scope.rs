//! Lexically nested frames of declarations.
//!
//! The scope is a stack: the global frame sits at the bottom and is never
//! popped, lookups walk from the innermost frame outwards. A name can be bound
//! at most once per frame but may shadow a binding of an outer frame.

use std::collections::HashMap;

use thiserror::Error;

use crate::Span;

use super::{declarations::Declaration, types::Type};

#[derive(Debug, Clone, PartialEq)]
pub enum FrameKind {
    Global,
    /// Parameters and the top level statements of a function body
    Function { return_type: Type },
    Block,
    Loop,
    /// Holds the name bound by `if let`
    Binding,
    /// Fields of a struct, including inherited ones
    Members,
}

/// Returned by `declare` when the name is already bound in the same frame.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("`{name}` is already declared in this scope")]
pub struct Redeclaration {
    pub name: String,
    pub existing: Span,
}

#[derive(Debug, Clone)]
pub struct Frame {
    pub kind: FrameKind,
    bindings: HashMap<String, usize>,
    declarations: Vec<Declaration>,
    used: Vec<bool>,
}

impl Frame {
    pub fn new(kind: FrameKind) -> Self {
        Frame {
            kind,
            bindings: HashMap::new(),
            declarations: vec![],
            used: vec![],
        }
    }

    pub fn declare(&mut self, declaration: Declaration) -> Result<(), Redeclaration> {
        if let Some(&index) = self.bindings.get(&declaration.name) {
            return Err(Redeclaration {
                name: declaration.name,
                existing: self.declarations[index].location.clone(),
            });
        }

        self.bindings
            .insert(declaration.name.clone(), self.declarations.len());
        self.declarations.push(declaration);
        self.used.push(false);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Declaration> {
        self.bindings
            .get(name)
            .map(|&index| &self.declarations[index])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// Declarations in the order they were made.
    pub fn declarations(&self) -> impl Iterator<Item = &Declaration> {
        self.declarations.iter()
    }

    /// Declarations that were never looked up with `Scope::resolve`.
    pub fn unused(&self) -> impl Iterator<Item = &Declaration> {
        self.declarations
            .iter()
            .zip(self.used.iter())
            .filter(|(_, used)| !**used)
            .map(|(declaration, _)| declaration)
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    fn mark_used(&mut self, name: &str) -> Option<&Declaration> {
        let index = *self.bindings.get(name)?;
        self.used[index] = true;
        Some(&self.declarations[index])
    }
}

#[derive(Debug, Clone)]
pub struct Scope {
    frames: Vec<Frame>,
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

impl Scope {
    pub fn new() -> Self {
        Scope {
            frames: vec![Frame::new(FrameKind::Global)],
        }
    }

    pub fn push_frame(&mut self, kind: FrameKind) {
        self.frames.push(Frame::new(kind));
    }

    /// Pops the innermost frame. The global frame is never popped.
    pub fn pop_frame(&mut self) -> Option<Frame> {
        if self.frames.len() > 1 {
            self.frames.pop()
        } else {
            None
        }
    }

    /// Number of frames, including the global one.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn global(&self) -> &Frame {
        &self.frames[0]
    }

    /// Binds a name in the innermost frame.
    pub fn declare(&mut self, declaration: Declaration) -> Result<(), Redeclaration> {
        let last = self.frames.len() - 1;
        self.frames[last].declare(declaration)
    }

    /// Innermost declaration of `name`.
    pub fn lookup(&self, name: &str) -> Option<&Declaration> {
        self.frames.iter().rev().find_map(|frame| frame.get(name))
    }

    /// Like `lookup`, but also records that the declaration was referenced.
    pub fn resolve(&mut self, name: &str) -> Option<Declaration> {
        self.frames
            .iter_mut()
            .rev()
            .find_map(|frame| frame.mark_used(name).cloned())
    }

    /// Return type of the innermost enclosing function.
    pub fn function_return_type(&self) -> Option<&Type> {
        self.frames.iter().rev().find_map(|frame| match &frame.kind {
            FrameKind::Function { return_type } => Some(return_type),
            _ => None,
        })
    }

    /// Whether a loop encloses the current position without a function
    /// boundary in between.
    pub fn in_loop(&self) -> bool {
        for frame in self.frames.iter().rev() {
            match frame.kind {
                FrameKind::Loop => return true,
                FrameKind::Function { .. } => return false,
                _ => {}
            }
        }
        false
    }
}
