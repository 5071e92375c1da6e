//! Type annotation parsing.
//!
//! This module handles parsing of type annotations. It supports:
//!
//! - Named types (`Int`, `Point`)
//! - Optional types (`Int?`)
//! - Array types (`[Int]`)
//! - Function types (`fn(Int, String) -> Bool`)
//!
//! Similar to expression parsing, it uses NUD/LED handlers with
//! binding powers, so `[Int]?` and `[Int?]` parse as written.

use std::collections::HashMap;

use crate::{
    ast::types::{TypeAnnotation, TypeAnnotationKind},
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::TokenKind,
};

use super::{lookups::BindingPower, parser::Parser};

/// Type alias for type null denotation handler functions.
pub type TypeNUDHandler = fn(&mut Parser) -> Result<TypeAnnotation, Error>;

/// Type alias for type left denotation handler functions.
pub type TypeLEDHandler =
    fn(&mut Parser, TypeAnnotation, BindingPower) -> Result<TypeAnnotation, Error>;

/// Type alias for type NUD lookup table.
pub type TypeNUDLookup = HashMap<TokenKind, TypeNUDHandler>;

/// Type alias for type LED lookup table.
pub type TypeLEDLookup = HashMap<TokenKind, TypeLEDHandler>;

/// Type alias for type binding power lookup table.
pub type TypeBPLookup = HashMap<TokenKind, BindingPower>;

/// Initializes the type parsing lookup tables.
///
/// # Arguments
///
/// * `parser` - Mutable reference to the parser to initialize
pub fn create_token_type_lookups(parser: &mut Parser) {
    parser.type_nud(TokenKind::Identifier, parse_symbol_type);
    parser.type_nud(TokenKind::OpenBracket, parse_array_type);
    parser.type_nud(TokenKind::Fn, parse_function_type);
    parser.type_led(TokenKind::Question, BindingPower::Call, parse_optional_type);
}

pub fn parse_symbol_type(parser: &mut Parser) -> Result<TypeAnnotation, Error> {
    let token = parser.expect(TokenKind::Identifier)?;
    Ok(TypeAnnotation::symbol(token.value, token.span))
}

pub fn parse_array_type(parser: &mut Parser) -> Result<TypeAnnotation, Error> {
    let start = parser.expect(TokenKind::OpenBracket)?.span.start;
    let element = parse_type(parser, BindingPower::Default)?;
    parser.expect(TokenKind::CloseBracket)?;

    Ok(TypeAnnotation {
        kind: TypeAnnotationKind::Array(Box::new(element)),
        span: parser.span_from(start),
    })
}

pub fn parse_function_type(parser: &mut Parser) -> Result<TypeAnnotation, Error> {
    let start = parser.expect(TokenKind::Fn)?.span.start;
    parser.expect(TokenKind::OpenParen)?;

    let mut parameters = vec![];
    while parser.current_token_kind() != TokenKind::CloseParen {
        parameters.push(parse_type(parser, BindingPower::Default)?);

        if parser.current_token_kind() == TokenKind::Comma {
            parser.advance();
        } else {
            break;
        }
    }

    parser.expect(TokenKind::CloseParen)?;

    let return_type = if parser.current_token_kind() == TokenKind::Arrow {
        parser.advance();
        Some(Box::new(parse_type(parser, BindingPower::Default)?))
    } else {
        None
    };

    Ok(TypeAnnotation {
        kind: TypeAnnotationKind::Function {
            parameters,
            return_type,
        },
        span: parser.span_from(start),
    })
}

pub fn parse_optional_type(
    parser: &mut Parser,
    left: TypeAnnotation,
    _bp: BindingPower,
) -> Result<TypeAnnotation, Error> {
    parser.expect(TokenKind::Question)?;
    let span = parser.span_from(left.span.start.clone());

    Ok(TypeAnnotation {
        kind: TypeAnnotationKind::Optional(Box::new(left)),
        span,
    })
}

pub fn parse_type(parser: &mut Parser, bp: BindingPower) -> Result<TypeAnnotation, Error> {
    // First parse NUD
    let token_kind = parser.current_token_kind();
    let nud = match parser.get_type_nud_lookup().get(&token_kind) {
        Some(nud) => *nud,
        None => {
            return Err(Error::new(
                ErrorImpl::UnexpectedTokenDetailed {
                    token: parser.current_token().value.clone(),
                    message: String::from("expected a type"),
                },
                parser.get_position(),
            ))
        }
    };

    let mut left = nud(parser)?;

    // While LED and current BP is less than BP of current token, continue parsing lhs
    loop {
        let token_kind = parser.current_token_kind();
        let token_bp = *parser
            .get_type_bp_lookup()
            .get(&token_kind)
            .unwrap_or(&BindingPower::Default);
        if token_bp <= bp {
            break;
        }

        let led = match parser.get_type_led_lookup().get(&token_kind) {
            Some(led) => *led,
            None => break,
        };

        left = led(parser, left, token_bp)?;
    }

    Ok(left)
}
