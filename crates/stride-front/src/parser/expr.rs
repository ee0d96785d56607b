use stride_core::{Error, ErrorKind, TokenSet, TokenType};

use crate::ast::{ArithOp, ComparisonOp, Expr, ExprKind, Literal, LogicalOp, NodeMeta};
use crate::registry::{ScopeId, SymbolRegistry};

use super::decl::try_parse_lambda;

/// Parses a full expression using conventional precedence climbing, lowest
/// precedence first: `||`, then `&&`, then comparisons, then `+`/`-`, then
/// `*`/`/`/`%`, then unary, then postfix, then atoms.
pub fn parse_expression(registry: &mut SymbolRegistry, scope: ScopeId, set: &mut TokenSet) -> Result<Expr, Error> {
    parse_or(registry, scope, set)
}

fn parse_or(registry: &mut SymbolRegistry, scope: ScopeId, set: &mut TokenSet) -> Result<Expr, Error> {
    let mut lhs = parse_and(registry, scope, set)?;
    while set.peek_next_eq(TokenType::DoublePipe) {
        let tok = set.next();
        let rhs = parse_and(registry, scope, set)?;
        let meta = NodeMeta::new(set.source(), tok.position, scope);
        lhs = Expr::new(
            meta,
            ExprKind::Logical { op: LogicalOp::Or, lhs: Box::new(lhs), rhs: Box::new(rhs) },
        );
    }
    Ok(lhs)
}

fn parse_and(registry: &mut SymbolRegistry, scope: ScopeId, set: &mut TokenSet) -> Result<Expr, Error> {
    let mut lhs = parse_comparison(registry, scope, set)?;
    while set.peek_next_eq(TokenType::DoubleAmpersand) {
        let tok = set.next();
        let rhs = parse_comparison(registry, scope, set)?;
        let meta = NodeMeta::new(set.source(), tok.position, scope);
        lhs = Expr::new(
            meta,
            ExprKind::Logical { op: LogicalOp::And, lhs: Box::new(lhs), rhs: Box::new(rhs) },
        );
    }
    Ok(lhs)
}

fn comparison_op(kind: TokenType) -> Option<ComparisonOp> {
    Some(match kind {
        TokenType::DoubleEquals => ComparisonOp::Equal,
        TokenType::BangEquals => ComparisonOp::NotEqual,
        TokenType::LArrow => ComparisonOp::LessThan,
        TokenType::LEquals => ComparisonOp::LessThanOrEqual,
        TokenType::RArrow => ComparisonOp::GreaterThan,
        TokenType::GEquals => ComparisonOp::GreaterThanOrEqual,
        _ => return None,
    })
}

fn parse_comparison(registry: &mut SymbolRegistry, scope: ScopeId, set: &mut TokenSet) -> Result<Expr, Error> {
    let mut lhs = parse_additive(registry, scope, set)?;
    while let Some(op) = comparison_op(set.peek_next().kind) {
        let tok = set.next();
        let rhs = parse_additive(registry, scope, set)?;
        let meta = NodeMeta::new(set.source(), tok.position, scope);
        lhs = Expr::new(meta, ExprKind::Comparison { op, lhs: Box::new(lhs), rhs: Box::new(rhs) });
    }
    Ok(lhs)
}

fn parse_additive(registry: &mut SymbolRegistry, scope: ScopeId, set: &mut TokenSet) -> Result<Expr, Error> {
    let mut lhs = parse_multiplicative(registry, scope, set)?;
    loop {
        let op = match set.peek_next().kind {
            TokenType::Plus => ArithOp::Add,
            TokenType::Minus => ArithOp::Sub,
            _ => break,
        };
        let tok = set.next();
        let rhs = parse_multiplicative(registry, scope, set)?;
        let meta = NodeMeta::new(set.source(), tok.position, scope);
        lhs = Expr::new(meta, ExprKind::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) });
    }
    Ok(lhs)
}

fn parse_multiplicative(registry: &mut SymbolRegistry, scope: ScopeId, set: &mut TokenSet) -> Result<Expr, Error> {
    let mut lhs = parse_unary(registry, scope, set)?;
    loop {
        let op = match set.peek_next().kind {
            TokenType::Star => ArithOp::Mul,
            TokenType::Slash => ArithOp::Div,
            TokenType::Percent => ArithOp::Rem,
            _ => break,
        };
        let tok = set.next();
        let rhs = parse_unary(registry, scope, set)?;
        let meta = NodeMeta::new(set.source(), tok.position, scope);
        lhs = Expr::new(meta, ExprKind::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) });
    }
    Ok(lhs)
}

/// `-x` lowers to `0 - x`; `!x` lowers to `x == false` (both as ordinary
/// binary/comparison nodes — the core doesn't need a dedicated unary tag).
fn parse_unary(registry: &mut SymbolRegistry, scope: ScopeId, set: &mut TokenSet) -> Result<Expr, Error> {
    if set.peek_next_eq(TokenType::Minus) {
        let tok = set.next();
        let operand = parse_unary(registry, scope, set)?;
        let meta = NodeMeta::new(set.source(), tok.position, scope);
        let zero = Expr::new(meta.clone(), ExprKind::Literal(Literal::Int { value: 0, bits: 32 }));
        return Ok(Expr::new(
            meta,
            ExprKind::Binary { op: ArithOp::Sub, lhs: Box::new(zero), rhs: Box::new(operand) },
        ));
    }
    if set.peek_next_eq(TokenType::Bang) {
        let tok = set.next();
        let operand = parse_unary(registry, scope, set)?;
        let meta = NodeMeta::new(set.source(), tok.position, scope);
        let falsy = Expr::new(meta.clone(), ExprKind::Literal(Literal::Bool(false)));
        return Ok(Expr::new(
            meta,
            ExprKind::Comparison { op: ComparisonOp::Equal, lhs: Box::new(operand), rhs: Box::new(falsy) },
        ));
    }
    parse_postfix(registry, scope, set)
}

fn parse_postfix(registry: &mut SymbolRegistry, scope: ScopeId, set: &mut TokenSet) -> Result<Expr, Error> {
    let mut expr = parse_atom(registry, scope, set)?;
    loop {
        if set.peek_next_eq(TokenType::LSquare) {
            let tok = set.peek_next();
            let block = stride_core::collect_block_variant(set, TokenType::LSquare, TokenType::RSquare)?;
            let Some(mut inner) = block else {
                return Err(set.throw_error_at(&tok, ErrorKind::Syntax, "expected array index accessor after '['"));
            };
            let index = parse_expression(registry, scope, &mut inner)?;
            let meta = NodeMeta::new(set.source(), tok.position, scope);
            expr = Expr::new(meta, ExprKind::ArrayIndex { base: Box::new(expr), index: Box::new(index) });
            continue;
        }

        if set.peek_next_eq(TokenType::LParen) {
            if let ExprKind::Identifier(name) = expr.kind {
                let meta = expr.meta;
                let args = parse_call_args(registry, scope, set)?;
                expr = Expr::new(meta, ExprKind::Call { name, args });
                continue;
            }
        }

        break;
    }
    Ok(expr)
}

fn parse_call_args(registry: &mut SymbolRegistry, scope: ScopeId, set: &mut TokenSet) -> Result<Vec<Expr>, Error> {
    set.expect(TokenType::LParen)?;
    let mut args = Vec::new();
    if !set.peek_next_eq(TokenType::RParen) {
        args.push(parse_expression(registry, scope, set)?);
        while set.peek_next_eq(TokenType::Comma) {
            set.next();
            args.push(parse_expression(registry, scope, set)?);
        }
    }
    set.expect(TokenType::RParen)?;
    Ok(args)
}

fn parse_qualified_name(set: &mut TokenSet) -> Result<Vec<String>, Error> {
    let first = set.expect(TokenType::Identifier)?;
    let mut segments = vec![first.lexeme];
    while set.peek_next_eq(TokenType::DoubleColon) {
        set.next();
        let next = set.expect_msg(TokenType::Identifier, "expected identifier segment after '::'")?;
        segments.push(next.lexeme);
    }
    Ok(segments)
}

fn parse_atom(registry: &mut SymbolRegistry, scope: ScopeId, set: &mut TokenSet) -> Result<Expr, Error> {
    if let Some(lambda) = try_parse_lambda(registry, scope, set)? {
        let meta = lambda.meta.clone();
        return Ok(Expr::new(meta, ExprKind::Lambda(Box::new(lambda))));
    }

    if let Some(lit) = try_parse_literal(scope, set)? {
        return Ok(lit);
    }

    let tok = set.peek_next();
    match tok.kind {
        TokenType::LParen => {
            set.next();
            let inner = parse_expression(registry, scope, set)?;
            set.expect(TokenType::RParen)?;
            Ok(inner)
        }
        TokenType::LSquare => {
            let block = stride_core::collect_block_variant(set, TokenType::LSquare, TokenType::RSquare)?;
            let meta = NodeMeta::new(set.source(), tok.position, scope);
            let mut elements = Vec::new();
            if let Some(mut inner) = block {
                elements.push(parse_expression(registry, scope, &mut inner)?);
                while inner.peek_next_eq(TokenType::Comma) {
                    inner.next();
                    if !inner.has_next() {
                        break;
                    }
                    elements.push(parse_expression(registry, scope, &mut inner)?);
                }
            }
            Ok(Expr::new(meta, ExprKind::ArrayInitializer(elements)))
        }
        TokenType::ThreeDots => {
            set.next();
            let meta = NodeMeta::new(set.source(), tok.position, scope);
            Ok(Expr::new(meta, ExprKind::VariadicRef))
        }
        TokenType::Identifier => {
            let meta = NodeMeta::new(set.source(), tok.position, scope);
            let segments = parse_qualified_name(set)?;
            Ok(Expr::new(meta, ExprKind::Identifier(segments)))
        }
        _ => Err(set.throw_error(ErrorKind::Syntax, format!("expected an expression, found {}", tok.kind.describe()))),
    }
}

fn try_parse_literal(scope: ScopeId, set: &mut TokenSet) -> Result<Option<Expr>, Error> {
    let tok = set.peek_next();
    let scope_pos = tok.position;
    match tok.kind {
        TokenType::Integer | TokenType::Hex | TokenType::LongInteger => {
            set.next();
            let is_long = tok.kind == TokenType::LongInteger;
            let digits: &str = if is_long { &tok.lexeme[..tok.lexeme.len() - 1] } else { &tok.lexeme };
            let radix = if tok.kind == TokenType::Hex { 16 } else { 10 };
            let digits = digits.trim_start_matches("0x");

            let value = i64::from_str_radix(digits, radix).map_err(|_| {
                Error::semantic("invalid integer literal", set.source(), scope_pos)
            })?;

            if is_long {
                if value > i64::MAX || value < i64::MIN {
                    return Err(Error::semantic(
                        "Number exceeds 64-bit integer limit. Max value is 9223372036854775807",
                        set.source(),
                        scope_pos,
                    ));
                }
            } else if !(i32::MIN as i64..=i32::MAX as i64).contains(&value) {
                let max = if tok.kind == TokenType::Hex { "0x7FFFFFFF" } else { "2147483647" };
                return Err(Error::semantic(
                    format!("Number exceeds 32-bit integer limit. Max value is {}", max),
                    set.source(),
                    scope_pos,
                ));
            }

            let bits = if is_long {
                64
            } else if (-128..128).contains(&value) {
                8
            } else if (-32768..32768).contains(&value) {
                16
            } else {
                32
            };

            Ok(Some(Expr::new(
                NodeMeta::new(set.source(), scope_pos, scope),
                ExprKind::Literal(Literal::Int { value, bits }),
            )))
        }
        TokenType::Double => {
            set.next();
            let digits = &tok.lexeme[..tok.lexeme.len() - 1];
            let value: f64 = digits.parse().map_err(|_| Error::semantic("invalid double literal", set.source(), scope_pos))?;
            Ok(Some(Expr::new(NodeMeta::new(set.source(), scope_pos, scope), ExprKind::Literal(Literal::Double(value)))))
        }
        TokenType::Float => {
            set.next();
            let value: f32 = tok.lexeme.parse().map_err(|_| Error::semantic("invalid float literal", set.source(), scope_pos))?;
            Ok(Some(Expr::new(NodeMeta::new(set.source(), scope_pos, scope), ExprKind::Literal(Literal::Float(value)))))
        }
        TokenType::CharLit => {
            set.next();
            let value = tok.lexeme.chars().next().unwrap_or('\0');
            Ok(Some(Expr::new(NodeMeta::new(set.source(), scope_pos, scope), ExprKind::Literal(Literal::Char(value)))))
        }
        TokenType::StringLit => {
            set.next();
            Ok(Some(Expr::new(NodeMeta::new(set.source(), scope_pos, scope), ExprKind::Str(tok.lexeme))))
        }
        TokenType::BooleanLit => {
            set.next();
            Ok(Some(Expr::new(
                NodeMeta::new(set.source(), scope_pos, scope),
                ExprKind::Literal(Literal::Bool(tok.lexeme == "true")),
            )))
        }
        TokenType::Nil => {
            set.next();
            Ok(Some(Expr::new(NodeMeta::new(set.source(), scope_pos, scope), ExprKind::Literal(Literal::Nil))))
        }
        _ => Ok(None),
    }
}
