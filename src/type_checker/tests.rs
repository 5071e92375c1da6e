//! Unit tests for the type checker module.
//!
//! This module contains tests for:
//! - Subtyping and joins on the type model
//! - Scope frames and shadowing
//! - Predeclaration and configuration validation
//! - Diagnostics produced for expressions, statements and declarations
//! - Strict flags

use std::sync::Arc;

use pretty_assertions::assert_eq;

use crate::{
    ast::{
        ast::{Identifier, Program},
        expressions::{Expr, ExprKind},
        statements::{ExpressionStmt, Stmt},
    },
    errors::errors::{Error, ErrorImpl},
    lexer::lexer::tokenize,
    parse_and_check,
    parser::parser::parse,
    stdlib::{standard_configuration, PANIC_FUNCTION},
    Position, Span,
};

use super::{
    config::{Configuration, StrictFlag, TypeDeclaration, ValueDeclaration},
    declarations::{Declaration, DeclarationKind},
    diagnostics::{render, Diagnostic, DiagnosticKind, Diagnostics, Severity},
    scope::{FrameKind, Scope},
    type_checker::{check, CheckResult, Checker},
    types::{is_subtype, join, StructRef, Type},
};

fn check_with(source: &str, configuration: &Configuration) -> CheckResult {
    parse_and_check(source, "test.lang", configuration).unwrap()
}

fn check_source(source: &str) -> CheckResult {
    check_with(source, &standard_configuration())
}

fn kinds(source: &str) -> Vec<DiagnosticKind> {
    check_source(source)
        .diagnostics
        .iter()
        .map(|diagnostic| diagnostic.kind)
        .collect()
}

fn kinds_with(source: &str, configuration: &Configuration) -> Vec<DiagnosticKind> {
    check_with(source, configuration)
        .diagnostics
        .iter()
        .map(|diagnostic| diagnostic.kind)
        .collect()
}

fn parse_source(source: &str) -> Program {
    let tokens = tokenize(source.to_string(), Some("test.lang".to_string())).unwrap();
    parse(tokens, Arc::new("test.lang".to_string())).1.unwrap()
}

fn composite(name: &str, ancestors: &[&str]) -> Type {
    Type::composite(name, ancestors.iter().map(|name| StructRef::predeclared(*name)).collect())
}

fn sample_types() -> Vec<Type> {
    vec![
        Type::Int,
        Type::Int8,
        Type::String,
        Type::Any,
        Type::Never,
        Type::Void,
        Type::optional(Type::Int),
        Type::optional(Type::Int8),
        Type::optional(Type::Never),
        Type::array(Type::Int),
        Type::array(Type::Never),
        Type::function(vec![Type::Int], Type::Int),
        Type::function(vec![Type::Any], Type::Int),
        Type::function(vec![Type::Int], Type::Never),
        composite("Animal", &[]),
        composite("Dog", &["Animal"]),
        composite("Puppy", &["Dog", "Animal"]),
        composite("Cat", &["Animal"]),
        Type::optional(composite("Animal", &[])),
    ]
}

// Type model

#[test]
fn test_subtype_reflexive() {
    for ty in sample_types() {
        assert!(is_subtype(&ty, &ty), "{} should be a subtype of itself", ty);
    }
}

#[test]
fn test_subtype_transitive() {
    let types = sample_types();
    for a in &types {
        for b in &types {
            for c in &types {
                if is_subtype(a, b) && is_subtype(b, c) {
                    assert!(is_subtype(a, c), "{} <: {} <: {} but not {} <: {}", a, b, c, a, c);
                }
            }
        }
    }
}

#[test]
fn test_any_is_top_and_never_is_bottom() {
    for ty in sample_types() {
        assert!(is_subtype(&ty, &Type::Any));
        assert!(is_subtype(&Type::Never, &ty));
    }
    assert!(!is_subtype(&Type::Any, &Type::Int));
}

#[test]
fn test_subtype_optional_and_array() {
    assert!(is_subtype(&Type::Int, &Type::optional(Type::Int)));
    assert!(!is_subtype(&Type::optional(Type::Int), &Type::Int));
    assert!(is_subtype(&Type::array(composite("Dog", &["Animal"])), &Type::array(composite("Animal", &[]))));
    assert!(!is_subtype(&Type::Int8, &Type::Int));
}

#[test]
fn test_subtype_functions() {
    let takes_any = Type::function(vec![Type::Any], Type::Int);
    let takes_int = Type::function(vec![Type::Int], Type::Int);
    let returns_never = Type::function(vec![Type::Int], Type::Never);

    assert!(is_subtype(&takes_any, &takes_int));
    assert!(!is_subtype(&takes_int, &takes_any));
    assert!(is_subtype(&returns_never, &takes_int));
    assert!(!is_subtype(&Type::function(vec![], Type::Int), &takes_int));
}

#[test]
fn test_subtype_composites_are_nominal() {
    let animal = composite("Animal", &[]);
    let dog = composite("Dog", &["Animal"]);
    let puppy = composite("Puppy", &["Dog", "Animal"]);
    let other_animal = composite("Animal", &["Thing"]);

    assert!(is_subtype(&dog, &animal));
    assert!(is_subtype(&puppy, &animal));
    assert!(!is_subtype(&animal, &dog));
    assert!(!is_subtype(&dog, &other_animal));
    assert!(!is_subtype(&composite("Cat", &[]), &composite("Dog", &[])));
}

#[test]
fn test_join() {
    let animal = composite("Animal", &[]);
    let dog = composite("Dog", &["Animal"]);
    let cat = composite("Cat", &["Animal"]);

    assert_eq!(join(&dog, &cat), animal);
    assert_eq!(join(&dog, &animal), animal);
    assert_eq!(join(&Type::Int, &Type::Never), Type::Int);
    assert_eq!(join(&Type::Int, &Type::optional(Type::Never)), Type::optional(Type::Int));
    assert_eq!(join(&Type::array(dog.clone()), &Type::array(cat.clone())), Type::array(animal));
    assert_eq!(join(&Type::Int, &Type::String), Type::Any);
    assert_eq!(join(&composite("A", &[]), &composite("B", &[])), Type::Any);
}

#[test]
fn test_type_display() {
    assert_eq!(Type::function(vec![Type::Int, Type::Bool], Type::optional(Type::String)).to_string(), "fn(Int, Bool) -> String?");
    assert_eq!(Type::optional(Type::function(vec![], Type::Void)).to_string(), "(fn() -> Void)?");
    assert_eq!(Type::array(Type::optional(Type::Int8)).to_string(), "[Int8?]");
}

#[test]
fn test_integer_ranges() {
    assert!(Type::Int8.fits_integer(-128));
    assert!(!Type::Int8.fits_integer(128));
    assert!(!Type::UInt8.fits_integer(-1));
    assert!(Type::UInt64.fits_integer(u64::MAX as i128));
    assert!(Type::Int.fits_integer(i128::MAX));
    assert_eq!(Type::optional(Type::Int16).integer_hint(), Some(Type::Int16));
}

// Scope

#[test]
fn test_scope_shadowing_and_redeclaration() {
    let mut scope = Scope::new();
    let int = Declaration::new("x", DeclarationKind::Variable, Type::Int, Span::null());
    let string = Declaration::new("x", DeclarationKind::Variable, Type::String, Span::null());

    assert!(scope.declare(int.clone()).is_ok());
    assert!(scope.declare(string.clone()).is_err());
    assert_eq!(scope.lookup("x").unwrap().ty, Type::Int);

    scope.push_frame(FrameKind::Block);
    assert!(scope.declare(string).is_ok());
    assert_eq!(scope.lookup("x").unwrap().ty, Type::String);

    scope.pop_frame();
    assert_eq!(scope.lookup("x").unwrap().ty, Type::Int);
    assert!(scope.lookup("y").is_none());
}

#[test]
fn test_scope_never_pops_global_frame() {
    let mut scope = Scope::new();
    assert!(scope.pop_frame().is_none());
    assert_eq!(scope.depth(), 1);
}

#[test]
fn test_scope_loop_stops_at_function() {
    let mut scope = Scope::new();
    scope.push_frame(FrameKind::Loop);
    assert!(scope.in_loop());

    scope.push_frame(FrameKind::Function { return_type: Type::Int });
    assert!(!scope.in_loop());
    assert_eq!(scope.function_return_type(), Some(&Type::Int));
}

#[test]
fn test_scope_tracks_unused() {
    let mut scope = Scope::new();
    scope.push_frame(FrameKind::Block);
    scope.declare(Declaration::new("a", DeclarationKind::Variable, Type::Int, Span::null())).unwrap();
    scope.declare(Declaration::new("b", DeclarationKind::Variable, Type::Int, Span::null())).unwrap();
    scope.resolve("a");

    let frame = scope.pop_frame().unwrap();
    assert_eq!(frame.len(), 2);
    assert!(!frame.is_empty());
    let unused: Vec<&str> = frame.unused().map(|declaration| declaration.name.as_str()).collect();
    assert_eq!(unused, vec!["b"]);
}

// Diagnostics

#[test]
fn test_diagnostics_ordered_by_position() {
    let at = |offset| Span {
        start: Position(offset, Arc::new(String::from("test.lang"))),
        end: Position(offset, Arc::new(String::from("test.lang"))),
    };

    let mut diagnostics = Diagnostics::new();
    assert!(diagnostics.is_empty());

    diagnostics.record(Diagnostic::new(DiagnosticKind::TypeMismatch, "second", at(10)));
    diagnostics.record(Diagnostic::new(DiagnosticKind::NotDeclared, "first", at(2)));
    diagnostics.record(Diagnostic::new(DiagnosticKind::NotAValue, "also second", at(10)));
    assert_eq!(diagnostics.len(), 3);

    let messages: Vec<String> = diagnostics.result().into_iter().map(|diagnostic| diagnostic.message).collect();
    assert_eq!(messages, vec!["first", "second", "also second"]);
}

#[test]
fn test_render_points_at_column() {
    let source = "let a = 1;\nlet b: Int = \"s\";\n";
    let result = check_source(source);

    let rendered = render(&result.diagnostics[0], source);
    assert_eq!(
        rendered,
        "Error: TypeMismatch (expected `Int`, found `String`)\n-> test.lang\n  |\n2 | let b: Int = \"s\";\n  | -------------^\n"
    );
}

// Checker

#[test]
fn test_clean_program() {
    let source = r#"
        struct Point { x: Int, y: Int }

        fn length(p: Point) -> Int {
            return p.x * p.x + p.y * p.y;
        }

        let p = new Point { x: 1, y: 2 };
        print(length(p));
    "#;

    assert_eq!(kinds(source), vec![]);
}

#[test]
fn test_top_level_forward_references() {
    assert_eq!(kinds("fn a() -> Int { return b(); } fn b() -> Int { return 1; }"), vec![]);
    assert_eq!(kinds("struct A { b: B? } struct B { a: A }"), vec![]);
    assert_eq!(kinds("fn make() -> Later { return new Later { value: 1 }; } struct Later { value: Int }"), vec![]);
}

#[test]
fn test_top_level_let_is_not_forward_declared() {
    assert_eq!(kinds("fn f() -> Int { return g; } let g = 1;"), vec![DiagnosticKind::NotDeclared]);
}

#[test]
fn test_self_containing_struct() {
    assert_eq!(kinds("struct Node { next: Node }"), vec![DiagnosticKind::InvalidTypeAnnotation]);
    assert_eq!(kinds("struct Node { next: Node?, children: [Node] }"), vec![]);
    assert_eq!(
        kinds("struct A { b: B } struct B { a: A }"),
        vec![DiagnosticKind::InvalidTypeAnnotation, DiagnosticKind::InvalidTypeAnnotation]
    );
}

#[test]
fn test_undeclared_does_not_cascade() {
    assert_eq!(kinds("let x = y + 1; let z: Int = x * 2;"), vec![DiagnosticKind::NotDeclared]);
}

#[test]
fn test_shadowing_is_allowed() {
    assert_eq!(kinds(r#"let x = 1; { let x = "a"; let y: String = x; } let z: Int = x;"#), vec![]);
}

#[test]
fn test_redeclaration_keeps_first_binding() {
    assert_eq!(kinds(r#"let x = 1; let x = "s"; let y: Int = x;"#), vec![DiagnosticKind::DuplicateDeclaration]);
}

#[test]
fn test_independent_errors_are_all_reported() {
    assert_eq!(
        kinds(r#"let a: Int = "s"; let b: String = 1;"#),
        vec![DiagnosticKind::TypeMismatch, DiagnosticKind::TypeMismatch]
    );
}

#[test]
fn test_integer_literals_adopt_expected_width() {
    assert_eq!(
        kinds("let a: Int8 = 127; let b: Int8 = 128; let c: Int8 = -128; let d: UInt8 = -1;"),
        vec![DiagnosticKind::IntegerLiteralOutOfRange, DiagnosticKind::IntegerLiteralOutOfRange]
    );
    assert_eq!(kinds("let a: Int8 = 1; let b = 1 + a; let c: Int8 = b;"), vec![]);
    assert_eq!(kinds("let a: Int8 = 1; let b: Int16 = a;"), vec![DiagnosticKind::TypeMismatch]);
    assert_eq!(kinds("let a: UInt8? = 255;"), vec![]);
}

#[test]
fn test_nil_needs_optional() {
    assert_eq!(kinds("let a: Int? = nil; let b: Int? = 5; let c: Int = nil;"), vec![DiagnosticKind::TypeMismatch]);
    assert_eq!(kinds("let a: Int? = 5; let same = a == nil;"), vec![]);
}

#[test]
fn test_conditional_joins_arms() {
    let source = r#"
        struct Animal { name: String }
        struct Dog : Animal { }
        struct Cat : Animal { }

        fn pick(flag: Bool, d: Dog, c: Cat) -> Animal {
            return flag ? d : c;
        }
    "#;
    assert_eq!(kinds(source), vec![]);

    let program = parse_source("let x = true ? 1 : nil;");
    let result = check(&program, &standard_configuration()).unwrap();
    let Stmt::VarDecl(decl) = &program.body[0] else { panic!("expected variable declaration") };
    assert_eq!(result.type_of(decl.id), Some(&Type::optional(Type::Int)));
}

#[test]
fn test_conditional_needs_bool() {
    assert_eq!(kinds("let x = 1 ? 2 : 3;"), vec![DiagnosticKind::TypeMismatch]);
}

#[test]
fn test_inherited_fields() {
    let source = r#"
        struct Animal { name: String }
        struct Dog : Animal { breed: String }

        let d = new Dog { name: "Rex", breed: "Lab" };
        let n: String = d.name;
        let a: Animal = d;
    "#;
    assert_eq!(kinds(source), vec![]);

    let structs = "struct Animal { name: String } struct Dog : Animal { breed: String }";
    assert_eq!(kinds(&format!(r#"{} let d = new Dog {{ breed: "Lab" }};"#, structs)), vec![DiagnosticKind::MissingField]);
    assert_eq!(kinds(&format!(r#"{} let d = new Dog {{ name: "a", breed: "b", age: 3 }};"#, structs)), vec![DiagnosticKind::UnknownMember]);
    assert_eq!(kinds(&format!(r#"{} let a = new Animal {{ name: "a", name: "b" }};"#, structs)), vec![DiagnosticKind::DuplicateDeclaration]);
    assert_eq!(kinds(&format!(r#"{} let a = new Animal {{ name: 1 }};"#, structs)), vec![DiagnosticKind::TypeMismatch]);
    assert_eq!(kinds(&format!(r#"{} let a: Dog = new Animal {{ name: "a" }};"#, structs)), vec![DiagnosticKind::TypeMismatch]);
}

#[test]
fn test_inherited_field_cannot_be_redeclared() {
    assert_eq!(kinds("struct A { x: Int } struct B : A { x: Int }"), vec![DiagnosticKind::DuplicateDeclaration]);
}

#[test]
fn test_inheritance_errors() {
    assert_eq!(
        kinds("struct A : B { } struct B : A { }"),
        vec![DiagnosticKind::CyclicInheritance, DiagnosticKind::CyclicInheritance]
    );
    assert_eq!(kinds("struct A : A { }"), vec![DiagnosticKind::CyclicInheritance]);
    assert_eq!(kinds("struct A : Missing { }"), vec![DiagnosticKind::InvalidTypeAnnotation]);
    assert_eq!(kinds("struct A : Int { }"), vec![DiagnosticKind::InvalidTypeAnnotation]);
}

#[test]
fn test_struct_entering_a_cycle_inherits_up_to_it() {
    let program = parse_source("struct A : B { } struct B : A { } struct C : A { }");
    let result = check(&program, &standard_configuration()).unwrap();

    let (Stmt::StructDecl(a), Stmt::StructDecl(c)) = (&program.body[0], &program.body[2]) else {
        panic!("expected struct declarations")
    };
    let expected = Type::declared_composite("C", c.id, vec![StructRef::declared("A", a.id)]);
    assert_eq!(result.type_of(c.id), Some(&expected));
    assert_eq!(result.diagnostics.len(), 2);
}

#[test]
fn test_type_used_as_value() {
    assert_eq!(kinds("let x = Int;"), vec![DiagnosticKind::NotAValue]);
    assert_eq!(kinds("struct P { } let p = P;"), vec![DiagnosticKind::NotAValue]);
}

#[test]
fn test_calls() {
    assert_eq!(kinds("let x = 1; x();"), vec![DiagnosticKind::NotCallable]);
    assert_eq!(kinds("fn f(a: Int) {} f(1, 2);"), vec![DiagnosticKind::ArgumentCountMismatch]);
    assert_eq!(kinds("fn f(a: Int) {} f();"), vec![DiagnosticKind::ArgumentCountMismatch]);
    assert_eq!(kinds(r#"fn f(a: Int) -> Int { return a; } let x: Int = f("s");"#), vec![DiagnosticKind::TypeMismatch]);
}

#[test]
fn test_assignment_targets() {
    assert_eq!(kinds("const c = 1; c = 2;"), vec![DiagnosticKind::AssignmentToConstant]);
    assert_eq!(kinds("fn f(a: Int) { a = 2; }"), vec![DiagnosticKind::AssignmentToConstant]);
    assert_eq!(kinds("fn f() {} f = 1;"), vec![DiagnosticKind::AssignmentToConstant]);
    assert_eq!(kinds("1 = 2;"), vec![DiagnosticKind::InvalidAssignmentTarget]);
    assert_eq!(kinds(r#"let s = "a"; s.len = 1;"#), vec![DiagnosticKind::InvalidAssignmentTarget]);
    assert_eq!(kinds(r#"let s = "ab"; s[0] = "c";"#), vec![DiagnosticKind::InvalidAssignmentTarget]);
    assert_eq!(kinds("let xs = [1, 2]; xs[0] = 3;"), vec![]);
    assert_eq!(kinds("struct P { x: Int } let p = new P { x: 1 }; p.x = 2;"), vec![]);
    assert_eq!(kinds(r#"let x = 1; x = "s";"#), vec![DiagnosticKind::TypeMismatch]);
}

#[test]
fn test_compound_assignment() {
    assert_eq!(kinds(r#"let x = 1; x += 2; let s = "a"; s += "b";"#), vec![]);
    assert_eq!(kinds("let b = true; b += 1;"), vec![DiagnosticKind::TypeMismatch]);
}

#[test]
fn test_mismatched_assignment_is_typed_any() {
    let program = parse_source(r#"let x = 1; x = "s"; x = 2; let b = true; b += 1;"#);
    let result = check(&program, &standard_configuration()).unwrap();

    let assignment_type = |index: usize| match &program.body[index] {
        Stmt::Expression(stmt) => result.type_of(stmt.expression.id).cloned(),
        _ => panic!("expected expression statement"),
    };

    assert_eq!(assignment_type(1), Some(Type::Any));
    assert_eq!(assignment_type(2), Some(Type::Int));
    assert_eq!(assignment_type(4), Some(Type::Any));
    assert_eq!(result.diagnostics.len(), 2);
}

#[test]
fn test_operators() {
    assert_eq!(kinds(r#"let a = 1 + "s";"#), vec![DiagnosticKind::TypeMismatch]);
    assert_eq!(kinds(r#"let a = "a" < "b"; let b = 1.5 * 2.0; let c = !a && true;"#), vec![]);
    assert_eq!(kinds("let a = !1;"), vec![DiagnosticKind::TypeMismatch]);
    assert_eq!(kinds("let a: UInt8 = 1; let b = -a;"), vec![DiagnosticKind::TypeMismatch]);
    assert_eq!(kinds("let a = 1 && true;"), vec![DiagnosticKind::TypeMismatch]);
}

#[test]
fn test_returns() {
    assert_eq!(kinds("return 1;"), vec![DiagnosticKind::ReturnOutsideFunction]);
    assert_eq!(kinds("fn f() -> Int { }"), vec![DiagnosticKind::MissingReturn]);
    assert_eq!(kinds("fn f(b: Bool) -> Int { if b { return 1; } }"), vec![DiagnosticKind::MissingReturn]);
    assert_eq!(kinds("fn f(b: Bool) -> Int { if b { return 1; } else { return 2; } }"), vec![]);
    assert_eq!(kinds(r#"fn f() -> Int { panic("no"); }"#), vec![]);
    assert_eq!(kinds(r#"fn f() -> Int { return "s"; }"#), vec![DiagnosticKind::TypeMismatch]);
    assert_eq!(kinds("fn f() { return 1; }"), vec![DiagnosticKind::TypeMismatch]);
    assert_eq!(kinds("fn f() -> Int { return; }"), vec![DiagnosticKind::TypeMismatch]);
    assert_eq!(kinds("fn f() -> Int { while true { return 1; } }"), vec![DiagnosticKind::MissingReturn]);
}

#[test]
fn test_loop_control() {
    assert_eq!(kinds("break;"), vec![DiagnosticKind::ControlOutsideLoop]);
    assert_eq!(kinds("continue;"), vec![DiagnosticKind::ControlOutsideLoop]);
    assert_eq!(kinds("while true { break; continue; }"), vec![]);
    assert_eq!(kinds("while true { fn f() { break; } }"), vec![DiagnosticKind::ControlOutsideLoop]);
    assert_eq!(kinds("while 1 { }"), vec![DiagnosticKind::TypeMismatch]);
}

#[test]
fn test_if_let() {
    assert_eq!(kinds("fn f(x: Int?) -> Int { if let v = x { return v; } return 0; }"), vec![]);
    assert_eq!(kinds("let y = 1; if let v = y { }"), vec![DiagnosticKind::TypeMismatch]);
    assert_eq!(kinds("fn f(x: Int?) { if let v = x { } let w: Int = v; }"), vec![DiagnosticKind::NotDeclared]);
}

#[test]
fn test_members() {
    assert_eq!(kinds("struct P { x: Int } fn f(p: P?) -> Int { return p.x; }"), vec![DiagnosticKind::UnknownMember]);
    assert_eq!(kinds("struct P { x: Int } fn f(p: P) -> Int { return p.y; }"), vec![DiagnosticKind::UnknownMember]);
    assert_eq!(
        kinds(r#"let s = "abc"; let n: Int = s.len(); let xs = [1, 2]; xs.push(3); let last: Int = xs.pop(); let m: Int = xs.len();"#),
        vec![]
    );
    assert_eq!(kinds(r#"let xs = [1, 2]; xs.push("a");"#), vec![DiagnosticKind::TypeMismatch]);
    assert_eq!(kinds(r#"let s = "abc"; s.size();"#), vec![DiagnosticKind::UnknownMember]);
}

#[test]
fn test_arrays() {
    assert_eq!(kinds("let xs: [Int8] = [1, 2, 300];"), vec![DiagnosticKind::IntegerLiteralOutOfRange]);
    assert_eq!(kinds(r#"let xs: [Int] = [1, "a"];"#), vec![DiagnosticKind::TypeMismatch]);
    assert_eq!(kinds(r#"let xs = [1, 2]; let x: String = xs[0];"#), vec![DiagnosticKind::TypeMismatch]);
    assert_eq!(kinds(r#"let xs = [1, 2]; let x = xs["a"];"#), vec![DiagnosticKind::TypeMismatch]);
    assert_eq!(kinds("let x = 1; let y = x[0];"), vec![DiagnosticKind::TypeMismatch]);
}

#[test]
fn test_local_declarations() {
    let recursive = r#"
        fn outer() -> Int {
            fn fact(n: Int) -> Int {
                if n <= 1 { return 1; }
                return n * fact(n - 1);
            }
            return fact(5);
        }
    "#;
    assert_eq!(kinds(recursive), vec![]);

    assert_eq!(kinds("fn outer() { fn a() { b(); } fn b() { a(); } }"), vec![DiagnosticKind::NotDeclared]);
    assert_eq!(kinds("fn outer() { struct Local { x: Int } let l = new Local { x: 1 }; }"), vec![]);
    assert_eq!(kinds("fn outer() { let l = new Local { x: 1 }; struct Local { x: Int } }"), vec![DiagnosticKind::NotDeclared]);
}

#[test]
fn test_structs_may_shadow_across_frames() {
    assert_eq!(kinds("struct P { } fn f() { struct P { } }"), vec![]);

    let siblings = r#"
        fn a() { struct P { x: Int } let p = new P { x: 1 }; }
        fn b() { struct P { y: String } let q = new P { y: "s" }; }
    "#;
    assert_eq!(kinds(siblings), vec![]);

    let shadowing = r#"
        struct P { x: Int }
        fn f() -> String {
            struct P { y: String }
            let p = new P { y: "s" };
            return p.y;
        }
        let outer = new P { x: 1 };
    "#;
    assert_eq!(kinds(shadowing), vec![]);
}

#[test]
fn test_shadowed_structs_are_distinct_types() {
    let source = r#"
        struct P { x: Int }
        fn f(outer: P) {
            struct P { x: Int }
            let inner: P = outer;
        }
    "#;
    assert_eq!(kinds(source), vec![DiagnosticKind::TypeMismatch]);
}

#[test]
fn test_struct_redeclared_in_same_frame() {
    assert_eq!(kinds("struct P { } struct P { x: Int }"), vec![DiagnosticKind::DuplicateDeclaration]);
    assert_eq!(kinds("fn f() { struct P { } struct P { } }"), vec![DiagnosticKind::DuplicateDeclaration]);
    assert_eq!(kinds("struct P { x: Int } struct P { } let p = new P { x: 1 };"), vec![DiagnosticKind::DuplicateDeclaration]);
}

#[test]
fn test_child_of_shadowing_struct_uses_inner_parent() {
    let source = r#"
        struct Base { a: Int }
        fn f() {
            struct Base { b: String }
            struct Child : Base { c: Bool }
            let child = new Child { b: "s", c: true };
            let base: Base = child;
        }
    "#;
    assert_eq!(kinds(source), vec![]);
}

#[test]
fn test_parameters_share_frame_with_body() {
    assert_eq!(kinds("fn f(a: Int) { let a = 2; }"), vec![DiagnosticKind::DuplicateDeclaration]);
    assert_eq!(kinds("fn f(a: Int, a: Int) {}"), vec![DiagnosticKind::DuplicateDeclaration]);
    assert_eq!(kinds("fn f(a: Int) { { let a = 2; } }"), vec![]);
}

#[test]
fn test_invalid_type_annotations() {
    assert_eq!(kinds("let x: Foo = 1;"), vec![DiagnosticKind::InvalidTypeAnnotation]);
    assert_eq!(kinds("let y = 1; let z: y = 2;"), vec![DiagnosticKind::InvalidTypeAnnotation]);
    assert_eq!(kinds("fn f(a: Missing) -> Missing { return a; }"), vec![DiagnosticKind::InvalidTypeAnnotation, DiagnosticKind::InvalidTypeAnnotation]);
}

#[test]
fn test_any_is_accepted_everywhere() {
    assert_eq!(kinds("fn f(x: Any) -> Any { return x; } let a: Int = f(1); let b: String = f(a);"), vec![]);
}

#[test]
fn test_any_must_be_predeclared() {
    let configuration = Configuration::new();
    assert_eq!(kinds_with("let x: Any = 1;", &configuration), vec![DiagnosticKind::InvalidTypeAnnotation]);
}

#[test]
fn test_function_typed_values() {
    let source = r#"
        fn apply(f: fn(Int) -> Int, x: Int) -> Int { return f(x); }
        fn double(x: Int) -> Int { return x * 2; }
        fn widen(x: Any) -> Int { return 1; }
        let a = apply(double, 1);
        let b = apply(widen, 2);
    "#;
    assert_eq!(kinds(source), vec![]);
    assert_eq!(kinds(r#"fn apply(f: fn(Int) -> Int) {} fn s(x: String) -> Int { return 1; } apply(s);"#), vec![DiagnosticKind::TypeMismatch]);
}

// Strict flags

#[test]
fn test_unused_variables_flag() {
    let source = "fn f(a: Int) { let b = 1; let _c = 2; }";
    assert_eq!(kinds(source), vec![]);

    let configuration = standard_configuration().with_strict_flag(StrictFlag::UnusedVariables);
    let result = check_with(source, &configuration);
    let names: Vec<(DiagnosticKind, Severity)> = result.diagnostics.iter().map(|diagnostic| (diagnostic.kind, diagnostic.severity)).collect();
    assert_eq!(
        names,
        vec![(DiagnosticKind::UnusedVariable, Severity::Warning), (DiagnosticKind::UnusedVariable, Severity::Warning)]
    );
    assert_eq!(result.errors().count(), 0);
}

#[test]
fn test_unreachable_code_flag() {
    let source = "fn f() -> Int { return 1; let x = 2; print(x); }";
    assert_eq!(kinds(source), vec![]);

    let configuration = standard_configuration().with_strict_flag(StrictFlag::UnreachableCode);
    assert_eq!(kinds_with(source, &configuration), vec![DiagnosticKind::UnreachableCode]);
}

#[test]
fn test_warnings_as_errors_flag() {
    let configuration = standard_configuration()
        .with_strict_flag(StrictFlag::UnusedVariables)
        .with_strict_flag(StrictFlag::WarningsAsErrors);
    let result = check_with("fn f() { let b = 1; }", &configuration);

    assert_eq!(result.diagnostics.len(), 1);
    assert_eq!(result.diagnostics[0].kind, DiagnosticKind::UnusedVariable);
    assert_eq!(result.diagnostics[0].severity, Severity::Error);
}

// Predeclaration

#[test]
fn test_duplicate_predeclaration_keeps_first() {
    let configuration = standard_configuration()
        .with_value(Arc::new(ValueDeclaration::function("panic", vec![Type::Int], Type::Void)));

    let result = check_with(r#"panic("x");"#, &configuration);
    let found: Vec<DiagnosticKind> = result.diagnostics.iter().map(|diagnostic| diagnostic.kind).collect();

    assert_eq!(found, vec![DiagnosticKind::DuplicateDeclaration]);
    assert!(result.diagnostics[0].message.contains("panic"));
}

#[test]
fn test_predeclared_value_cannot_shadow_builtin_type() {
    let configuration = Configuration::new().with_value(Arc::new(ValueDeclaration::constant("Int", Type::String)));
    assert_eq!(kinds_with("let x: Int = 1;", &configuration), vec![DiagnosticKind::DuplicateDeclaration]);
}

#[test]
fn test_predeclaration_diagnostics_sort_first() {
    let configuration = standard_configuration().with_value(Arc::clone(&PANIC_FUNCTION));
    let found = kinds_with("let x: Int = \"s\";", &configuration);
    assert_eq!(found, vec![DiagnosticKind::DuplicateDeclaration, DiagnosticKind::TypeMismatch]);
}

#[test]
fn test_predeclared_composite_type() {
    let configuration = standard_configuration().with_type("Handle", TypeDeclaration {
        kind: DeclarationKind::Structure,
        ty: composite("Handle", &[]),
    });

    assert_eq!(kinds_with("fn f(h: Handle) -> Handle { return h; }", &configuration), vec![]);
    assert_eq!(kinds_with("struct File : Handle { path: String } fn f(file: File) -> Handle { return file; }", &configuration), vec![]);
}

#[test]
fn test_invalid_configuration_is_fatal() {
    let invalid = vec![
        Configuration::new().with_value(Arc::new(ValueDeclaration::constant("1abc", Type::Int))),
        Configuration::new().with_value(Arc::new(ValueDeclaration::constant("let", Type::Int))),
        Configuration::new().with_value(Arc::new(ValueDeclaration::new("x", DeclarationKind::Type, Type::Int))),
        Configuration::new().with_type("T", TypeDeclaration { kind: DeclarationKind::Function, ty: Type::Int }),
    ];

    for configuration in invalid {
        let error = parse_and_check("let a = 1;", "test.lang", &configuration).unwrap_err();
        assert_eq!(error.get_error_name(), "InvalidConfiguration");
    }
}

// Fatal errors and checker lifecycle

fn literal_stmt(id: u32) -> Stmt {
    Stmt::Expression(ExpressionStmt {
        expression: Expr { id, kind: ExprKind::Integer(1), span: Span::null() },
        span: Span::null(),
    })
}

#[test]
fn test_duplicate_node_ids_are_fatal() {
    let program = Program { body: vec![literal_stmt(0), literal_stmt(0)], span: Span::null() };
    let error = check(&program, &standard_configuration()).unwrap_err();

    assert!(matches!(error.get_error_impl(), ErrorImpl::MalformedAst { .. }));
}

#[test]
fn test_empty_identifiers_are_fatal() {
    let program = Program {
        body: vec![Stmt::Expression(ExpressionStmt {
            expression: Expr {
                id: 0,
                kind: ExprKind::StructInit { name: Identifier::new("", Span::null()), fields: vec![] },
                span: Span::null(),
            },
            span: Span::null(),
        })],
        span: Span::null(),
    };

    let error = check(&program, &standard_configuration()).unwrap_err();
    assert!(matches!(error.get_error_impl(), ErrorImpl::MalformedAst { .. }));
}

#[test]
fn test_frames_are_popped_on_fatal_errors() {
    let program = Program { body: vec![], span: Span::null() };
    let configuration = standard_configuration();
    let mut checker = Checker::new(&program, &configuration);

    let result: Result<(), Error> = checker.with_frame(FrameKind::Block, |checker| {
        checker.with_frame(FrameKind::Loop, |_| {
            Err(Error::new(ErrorImpl::MalformedAst { reason: String::from("test") }, Position::null()))
        })
    });

    assert!(result.is_err());
    assert_eq!(checker.scope.depth(), 1);
}

#[test]
fn test_frames_are_balanced_after_check() {
    let program = parse_source("fn f(x: Int?) { if let v = x { while true { { break; } } } }");
    let configuration = standard_configuration();
    let mut checker = Checker::new(&program, &configuration);

    checker.check().unwrap();
    assert_eq!(checker.scope.depth(), 1);
    assert!(checker.global_frame().contains("f"));
    assert!(checker.global_frame().contains("panic"));
    assert!(!checker.global_frame().contains("v"));
}

#[test]
fn test_check_runs_once() {
    let program = parse_source("let a: Int = \"s\";");
    let configuration = standard_configuration();
    let mut checker = Checker::new(&program, &configuration);

    checker.check().unwrap();
    checker.check().unwrap();
    assert_eq!(checker.diagnostics().len(), 1);
}

#[test]
fn test_every_node_is_annotated() {
    let source = r#"
        struct Animal { name: String }
        struct Dog : Animal { age: Int }
        fn describe(d: Dog?) -> String {
            if let dog = d {
                let older = dog.age + 1;
                return dog.name;
            }
            return "none";
        }
        let xs = [1, -2, 3];
        xs[0] = xs.len() > 2 ? 4 : 5;
        print(describe(new Dog { name: "Rex", age: 3 }));
    "#;
    let program = parse_source(source);
    let result = check(&program, &standard_configuration()).unwrap();

    assert_eq!(result.diagnostics, vec![]);

    let ids: Vec<u32> = result.annotations.keys().copied().collect();
    let max = *ids.last().unwrap();
    assert_eq!(ids, (0..=max).collect::<Vec<u32>>());
}

#[test]
fn test_checking_is_deterministic() {
    let source = r#"
        struct A { x: Int }
        fn f(a: A) -> String { return a.y; }
        let q = missing + 1;
        let r: Bool = 3;
        f(1, 2);
    "#;
    let program = parse_source(source);
    let configuration = standard_configuration();

    let first = check(&program, &configuration).unwrap();
    let second = check(&program, &configuration).unwrap();

    assert_eq!(first.diagnostics, second.diagnostics);
    assert_eq!(first.annotations, second.annotations);
    assert_eq!(first.diagnostics.len(), 4);
}
