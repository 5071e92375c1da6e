use crate::{
    ast::{
        ast::{Access, Identifier},
        statements::{
            BlockStmt, ExpressionStmt, FieldDecl, FnDeclStmt, IfCondition, IfStmt, Parameter,
            ReturnStmt, Stmt, StructDeclStmt, VarDeclStmt, WhileStmt,
        },
    },
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::TokenKind,
    parser::{expr::parse_expr, lookups::BindingPower},
};

use super::{parser::Parser, types::parse_type};

pub fn parse_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    if let Some(handler) = parser.get_stmt_lookup().get(&parser.current_token_kind()).copied() {
        return handler(parser);
    }

    let expr = parse_expr(parser, BindingPower::Default)?;

    parser.expect(TokenKind::Semicolon)?;

    Ok(Stmt::Expression(ExpressionStmt {
        span: parser.span_from(expr.span.start.clone()),
        expression: expr,
    }))
}

fn expect_identifier(parser: &mut Parser, context: &str) -> Result<Identifier, Error> {
    let error = Error::new(ErrorImpl::UnexpectedTokenDetailed {
        token: parser.current_token().value.clone(),
        message: format!("expected identifier {}", context),
    }, parser.get_position());
    let token = parser.expect_error(TokenKind::Identifier, Some(error))?;

    Ok(Identifier::new(token.value, token.span))
}

/// `pub` in front of a declaration.
pub fn parse_pub_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    parser.expect(TokenKind::Pub)?;

    match parser.current_token_kind() {
        TokenKind::Let | TokenKind::Const => parse_var_decl(parser, Access::Public),
        TokenKind::Fn => parse_fn_decl(parser, Access::Public),
        TokenKind::Struct => parse_struct_decl(parser, Access::Public),
        _ => Err(Error::new(ErrorImpl::UnexpectedTokenDetailed {
            token: parser.current_token().value.clone(),
            message: String::from("expected declaration after `pub`"),
        }, parser.get_position())),
    }
}

pub fn parse_var_decl_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    parse_var_decl(parser, Access::Private)
}

fn parse_var_decl(parser: &mut Parser, access: Access) -> Result<Stmt, Error> {
    let start_token = parser.advance().clone();
    let is_constant = start_token.kind == TokenKind::Const;

    let identifier = expect_identifier(parser, "during variable declaration")?;

    let explicit_type = if parser.current_token_kind() == TokenKind::Colon {
        parser.advance();
        Some(parse_type(parser, BindingPower::Default)?)
    } else {
        None
    };

    let assigned_value = if parser.current_token_kind() != TokenKind::Semicolon {
        parser.expect(TokenKind::Assignment)?;
        Some(parse_expr(parser, BindingPower::Default)?)
    } else if explicit_type.is_none() {
        return Err(Error::new(ErrorImpl::UnexpectedTokenDetailed {
            token: parser.current_token().value.clone(),
            message: String::from("expected rhs or explicit type")
        }, parser.get_position()));
    } else {
        None
    };

    if is_constant && assigned_value.is_none() {
        return Err(Error::new(ErrorImpl::UnexpectedTokenDetailed { token: parser.current_token().value.clone(), message: String::from("expected rhs in constant definition") }, parser.get_position()));
    }

    parser.expect(TokenKind::Semicolon)?;

    Ok(Stmt::VarDecl(VarDeclStmt {
        id: parser.advance_id(),
        span: parser.span_from(start_token.span.start.clone()),
        identifier,
        is_constant,
        access,
        assigned_value,
        explicit_type
    }))
}

pub fn parse_if_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.expect(TokenKind::If)?.span.start;

    let condition = if parser.current_token_kind() == TokenKind::Let {
        parser.advance();
        let identifier = expect_identifier(parser, "in optional binding")?;
        parser.expect(TokenKind::Assignment)?;
        let value = parse_expr(parser, BindingPower::Default)?;
        IfCondition::Let { id: parser.advance_id(), identifier, value }
    } else {
        IfCondition::Expr(parse_expr(parser, BindingPower::Default)?)
    };

    let then_body = parse_stmt(parser)?;

    let else_body = if parser.current_token_kind() == TokenKind::Else {
        parser.advance();
        Some(Box::new(parse_stmt(parser)?))
    } else {
        None
    };

    Ok(Stmt::If(IfStmt {
        condition,
        then_body: Box::new(then_body),
        else_body,
        span: parser.span_from(start),
    }))
}

pub fn parse_while_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.expect(TokenKind::While)?.span.start;

    let condition = parse_expr(parser, BindingPower::Default)?;
    let body = parse_stmt(parser)?;

    Ok(Stmt::While(WhileStmt {
        condition,
        body: Box::new(body),
        span: parser.span_from(start),
    }))
}

fn parse_block(parser: &mut Parser) -> Result<BlockStmt, Error> {
    let start = parser.expect(TokenKind::OpenCurly)?.span.start;

    let mut statements = Vec::new();
    while parser.current_token_kind() != TokenKind::CloseCurly {
        statements.push(parse_stmt(parser)?);
    }

    parser.expect(TokenKind::CloseCurly)?;

    Ok(BlockStmt {
        body: statements,
        span: parser.span_from(start),
    })
}

pub fn parse_block_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    Ok(Stmt::Block(parse_block(parser)?))
}

pub fn parse_fn_decl_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    parse_fn_decl(parser, Access::Private)
}

fn parse_fn_decl(parser: &mut Parser, access: Access) -> Result<Stmt, Error> {
    let start = parser.expect(TokenKind::Fn)?.span.start;

    let identifier = expect_identifier(parser, "after `fn`")?;

    parser.expect(TokenKind::OpenParen)?;

    let mut parameters = Vec::new();
    while parser.current_token_kind() != TokenKind::CloseParen {
        let name = expect_identifier(parser, "as parameter name")?;
        parser.expect(TokenKind::Colon)?;
        let ty = parse_type(parser, BindingPower::Default)?;
        parameters.push(Parameter { id: parser.advance_id(), identifier: name, type_annotation: ty });

        if parser.current_token_kind() == TokenKind::Comma {
            parser.advance();
        } else {
            break;
        }
    }

    parser.expect(TokenKind::CloseParen)?;

    let return_type = if parser.current_token_kind() == TokenKind::Arrow {
        parser.advance();
        Some(parse_type(parser, BindingPower::Default)?)
    } else {
        None
    };

    let body = parse_block(parser)?;

    Ok(Stmt::FnDecl(FnDeclStmt {
        id: parser.advance_id(),
        span: parser.span_from(start),
        identifier,
        access,
        parameters,
        return_type,
        body,
    }))
}

pub fn parse_return_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.expect(TokenKind::Return)?.span.start;

    let value = if parser.current_token_kind() != TokenKind::Semicolon {
        Some(parse_expr(parser, BindingPower::Default)?)
    } else {
        None
    };

    parser.expect(TokenKind::Semicolon)?;

    Ok(Stmt::Return(ReturnStmt {
        value,
        span: parser.span_from(start),
    }))
}

pub fn parse_break_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.expect(TokenKind::Break)?.span.start;
    parser.expect(TokenKind::Semicolon)?;

    Ok(Stmt::Break(parser.span_from(start)))
}

pub fn parse_continue_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.expect(TokenKind::Continue)?.span.start;
    parser.expect(TokenKind::Semicolon)?;

    Ok(Stmt::Continue(parser.span_from(start)))
}

pub fn parse_struct_decl_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    parse_struct_decl(parser, Access::Private)
}

fn parse_struct_decl(parser: &mut Parser, access: Access) -> Result<Stmt, Error> {
    let start = parser.expect(TokenKind::Struct)?.span.start;

    let identifier = expect_identifier(parser, "after `struct`")?;

    let parent = if parser.current_token_kind() == TokenKind::Colon {
        parser.advance();
        Some(expect_identifier(parser, "as parent struct")?)
    } else {
        None
    };

    parser.expect(TokenKind::OpenCurly)?;

    let mut fields = Vec::new();
    while parser.current_token_kind() != TokenKind::CloseCurly {
        let field_access = if parser.current_token_kind() == TokenKind::Pub {
            parser.advance();
            Access::Public
        } else {
            Access::Private
        };
        let name = expect_identifier(parser, "as field name")?;
        parser.expect(TokenKind::Colon)?;
        let ty = parse_type(parser, BindingPower::Default)?;
        fields.push(FieldDecl { id: parser.advance_id(), identifier: name, access: field_access, type_annotation: ty });

        if parser.current_token_kind() == TokenKind::Comma {
            parser.advance();
        } else {
            break;
        }
    }

    parser.expect(TokenKind::CloseCurly)?;

    Ok(Stmt::StructDecl(StructDeclStmt {
        id: parser.advance_id(),
        identifier,
        access,
        parent,
        fields,
        span: parser.span_from(start),
    }))
}
