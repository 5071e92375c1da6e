use crate::{
    ast::{
        ast::Identifier,
        expressions::{AssignmentOperator, BinaryOperator, Expr, ExprKind, PrefixOperator},
    },
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::TokenKind,
};

use super::{lookups::BindingPower, parser::Parser};

pub fn parse_expr(parser: &mut Parser, bp: BindingPower) -> Result<Expr, Error> {
    // First parse NUD
    let token_kind = parser.current_token_kind();
    let nud = match parser.get_nud_lookup().get(&token_kind) {
        Some(nud) => *nud,
        None => return Err(Error::new(ErrorImpl::UnexpectedToken { token: parser.current_token().value.clone() }, parser.get_position())),
    };

    let mut left = nud(parser)?;

    // While LED and current BP is less than BP of current token, continue parsing lhs
    loop {
        let token_kind = parser.current_token_kind();
        let token_bp = *parser.get_bp_lookup().get(&token_kind).unwrap_or(&BindingPower::Default);
        if token_bp <= bp {
            break;
        }

        let led = match parser.get_led_lookup().get(&token_kind) {
            Some(led) => *led,
            None => return Err(Error::new(ErrorImpl::UnexpectedToken { token: parser.current_token().value.clone() }, parser.get_position())),
        };

        left = led(parser, left, token_bp)?;
    }

    Ok(left)
}

pub fn parse_primary_expr(parser: &mut Parser) -> Result<Expr, Error> {
    let token = parser.current_token().clone();
    let kind = match token.kind {
        TokenKind::Number if token.value.contains('.') => match token.value.parse::<f64>() {
            Ok(value) => ExprKind::Float(value),
            Err(_) => return Err(Error::new(ErrorImpl::NumberParseError { token: token.value }, token.span.start)),
        },
        TokenKind::Number => match token.value.parse::<u64>() {
            Ok(value) => ExprKind::Integer(value),
            Err(_) => return Err(Error::new(ErrorImpl::NumberParseError { token: token.value }, token.span.start)),
        },
        TokenKind::Identifier => ExprKind::Symbol(token.value),
        TokenKind::String => ExprKind::String(token.value),
        TokenKind::True => ExprKind::Bool(true),
        TokenKind::False => ExprKind::Bool(false),
        TokenKind::Nil => ExprKind::Nil,
        _ => {
            return Err(Error::new(ErrorImpl::UnexpectedToken { token: token.value }, token.span.start));
        }
    };

    parser.advance();
    Ok(parser.make_expr(kind, token.span))
}

pub fn parse_binary_expr(parser: &mut Parser, left: Expr, bp: BindingPower) -> Result<Expr, Error> {
    let operator_token = parser.advance().clone();
    let operator = BinaryOperator::from_token(operator_token.kind).ok_or_else(|| {
        Error::new(ErrorImpl::UnexpectedToken { token: operator_token.value.clone() }, operator_token.span.start.clone())
    })?;

    let right = parse_expr(parser, bp)?;
    let span = left.span.to(&right.span);

    Ok(parser.make_expr(ExprKind::Binary { left: Box::new(left), operator, right: Box::new(right) }, span))
}

pub fn parse_prefix_expr(parser: &mut Parser) -> Result<Expr, Error> {
    let operator_token = parser.advance().clone();
    let operator = match operator_token.kind {
        TokenKind::Not => PrefixOperator::Not,
        _ => PrefixOperator::Negate,
    };
    let rhs = parse_expr(parser, BindingPower::Unary)?;
    let span = operator_token.span.to(&rhs.span);

    Ok(parser.make_expr(ExprKind::Prefix { operator, right: Box::new(rhs) }, span))
}

pub fn parse_assignment_expr(parser: &mut Parser, left: Expr, _bp: BindingPower) -> Result<Expr, Error> {
    let operator_token = parser.advance().clone();
    let operator = AssignmentOperator::from_token(operator_token.kind).ok_or_else(|| {
        Error::new(ErrorImpl::UnexpectedToken { token: operator_token.value.clone() }, operator_token.span.start.clone())
    })?;

    // Right associative: `a = b = c` is `a = (b = c)`
    let rhs = parse_expr(parser, BindingPower::Comma)?;
    let span = left.span.to(&rhs.span);

    Ok(parser.make_expr(ExprKind::Assignment { assignee: Box::new(left), operator, value: Box::new(rhs) }, span))
}

pub fn parse_conditional_expr(parser: &mut Parser, condition: Expr, _bp: BindingPower) -> Result<Expr, Error> {
    parser.expect(TokenKind::Question)?;
    let then_expr = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::Colon)?;
    let else_expr = parse_expr(parser, BindingPower::Assignment)?;
    let span = condition.span.to(&else_expr.span);

    Ok(parser.make_expr(ExprKind::Conditional {
        condition: Box::new(condition),
        then_expr: Box::new(then_expr),
        else_expr: Box::new(else_expr),
    }, span))
}

pub fn parse_grouping_expr(parser: &mut Parser) -> Result<Expr, Error> {
    parser.expect(TokenKind::OpenParen)?;
    let expr = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::CloseParen)?;

    Ok(expr)
}

pub fn parse_array_expr(parser: &mut Parser) -> Result<Expr, Error> {
    let start = parser.expect(TokenKind::OpenBracket)?.span.start;

    let mut elements = vec![];
    while parser.current_token_kind() != TokenKind::CloseBracket {
        elements.push(parse_expr(parser, BindingPower::Comma)?);

        if parser.current_token_kind() == TokenKind::Comma {
            parser.advance();
        } else {
            break;
        }
    }

    parser.expect(TokenKind::CloseBracket)?;
    let span = parser.span_from(start);

    Ok(parser.make_expr(ExprKind::Array(elements), span))
}

pub fn parse_call_expr(parser: &mut Parser, left: Expr, _bp: BindingPower) -> Result<Expr, Error> {
    parser.expect(TokenKind::OpenParen)?;

    let mut args = vec![];
    while parser.current_token_kind() != TokenKind::CloseParen {
        args.push(parse_expr(parser, BindingPower::Comma)?);

        if parser.current_token_kind() == TokenKind::Comma {
            parser.advance();
        } else {
            break;
        }
    }

    parser.expect(TokenKind::CloseParen)?;
    let span = parser.span_from(left.span.start.clone());

    Ok(parser.make_expr(ExprKind::Call { callee: Box::new(left), arguments: args }, span))
}

pub fn parse_index_expr(parser: &mut Parser, left: Expr, _bp: BindingPower) -> Result<Expr, Error> {
    parser.expect(TokenKind::OpenBracket)?;
    let index = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::CloseBracket)?;
    let span = parser.span_from(left.span.start.clone());

    Ok(parser.make_expr(ExprKind::Index { object: Box::new(left), index: Box::new(index) }, span))
}

pub fn parse_member_expr(parser: &mut Parser, left: Expr, _bp: BindingPower) -> Result<Expr, Error> {
    parser.expect(TokenKind::Dot)?;
    let member = parser.expect(TokenKind::Identifier)?;
    let span = left.span.to(&member.span);

    Ok(parser.make_expr(ExprKind::Member {
        object: Box::new(left),
        member: Identifier::new(member.value, member.span),
    }, span))
}

pub fn parse_struct_init_expr(parser: &mut Parser) -> Result<Expr, Error> {
    // new Test { field1: 1, field2: 2 }
    let start_pos = parser.expect(TokenKind::New)?.span.start;

    let struct_name = parser.expect(TokenKind::Identifier)?;

    parser.expect(TokenKind::OpenCurly)?;

    let mut fields = vec![];

    while parser.current_token_kind() != TokenKind::CloseCurly {
        let field_name = parser.expect(TokenKind::Identifier)?;
        parser.expect(TokenKind::Colon)?;
        let field_value = parse_expr(parser, BindingPower::Comma)?;

        fields.push((Identifier::new(field_name.value, field_name.span), field_value));

        if parser.current_token_kind() == TokenKind::Comma {
            parser.advance();
        } else {
            break;
        }
    }

    parser.expect(TokenKind::CloseCurly)?;
    let span = parser.span_from(start_pos);

    Ok(parser.make_expr(ExprKind::StructInit {
        name: Identifier::new(struct_name.value, struct_name.span),
        fields,
    }, span))
}
