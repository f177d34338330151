//! Infix arithmetic expressions inside getter clauses.
//!
//! `nc(z:Deck)+1` or `(2+3)*4` parse here into a small AST whose
//! operands are themselves getters, so any deferred value can feed the
//! arithmetic. Standard precedence, `^` right-associative, unary
//! minus.

use tracing::warn;

use crate::clause::ClauseError;
use crate::core::EvalContext;

use super::Getter;

/// Binary arithmetic operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
}

impl ArithOp {
    fn from_char(c: char) -> Option<Self> {
        match c {
            '+' => Some(ArithOp::Add),
            '-' => Some(ArithOp::Sub),
            '*' => Some(ArithOp::Mul),
            '/' => Some(ArithOp::Div),
            '%' => Some(ArithOp::Rem),
            '^' => Some(ArithOp::Pow),
            _ => None,
        }
    }

    fn precedence(self) -> u8 {
        match self {
            ArithOp::Add | ArithOp::Sub => 1,
            ArithOp::Mul | ArithOp::Div | ArithOp::Rem => 2,
            ArithOp::Pow => 3,
        }
    }

    fn apply(self, l: f64, r: f64) -> f64 {
        match self {
            ArithOp::Add => l + r,
            ArithOp::Sub => l - r,
            ArithOp::Mul => l * r,
            ArithOp::Div => l / r,
            ArithOp::Rem => l % r,
            ArithOp::Pow => l.powf(r),
        }
    }
}

/// Parsed arithmetic expression.
#[derive(Clone, Debug)]
pub enum Expr {
    Operand(Box<Getter>),
    Neg(Box<Expr>),
    Binary {
        op: ArithOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

/// Whether the text contains a binary arithmetic operator outside all
/// parentheses (so selector-internal operators don't count).
#[must_use]
pub(super) fn has_top_level_operator(text: &str) -> bool {
    let mut depth = 0i32;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            '+' | '*' | '/' | '%' | '^' if depth == 0 => return true,
            // A leading minus is a sign, not an operator.
            '-' if depth == 0 && i > 0 => return true,
            _ => {}
        }
    }
    false
}

enum Token {
    Op(char),
    Operand(Expr),
}

impl Expr {
    /// Parse an arithmetic clause.
    pub fn parse(text: &str) -> Result<Self, ClauseError> {
        let tokens = tokenize(text)?;
        let mut pos = 0;
        let expr = parse_binary(&tokens, &mut pos, 0)
            .ok_or_else(|| ClauseError::BadExpression(text.to_string()))?;
        if pos != tokens.len() {
            return Err(ClauseError::BadExpression(text.to_string()));
        }
        Ok(expr)
    }

    /// Evaluate to a number; `None` on any non-numeric operand.
    pub fn eval(&self, ctx: &mut EvalContext) -> Option<f64> {
        match self {
            Expr::Operand(getter) => {
                let value = getter.get(ctx);
                let num = value.as_number();
                if num.is_none() {
                    warn!(operand = ?value, "non-numeric operand in arithmetic expression");
                }
                num
            }
            Expr::Neg(inner) => Some(-inner.eval(ctx)?),
            Expr::Binary { op, left, right } => {
                Some(op.apply(left.eval(ctx)?, right.eval(ctx)?))
            }
        }
    }
}

fn tokenize(text: &str) -> Result<Vec<Token>, ClauseError> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i] as char;
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        if matches!(c, '+' | '-' | '*' | '/' | '%' | '^') {
            tokens.push(Token::Op(c));
            i += 1;
            continue;
        }
        if c == '(' {
            let close = matching_paren(text, i)
                .ok_or_else(|| ClauseError::UnbalancedParens(text.to_string()))?;
            tokens.push(Token::Operand(Expr::parse(&text[i + 1..close])?));
            i = close + 1;
            continue;
        }
        // Operand: run until a top-level operator, skipping any call
        // parentheses it contains.
        let start = i;
        let mut depth = 0i32;
        while i < bytes.len() {
            let c = bytes[i] as char;
            match c {
                '(' => depth += 1,
                ')' => depth -= 1,
                '+' | '-' | '*' | '/' | '%' | '^' if depth == 0 => break,
                _ => {}
            }
            i += 1;
        }
        let operand = text[start..i].trim();
        if operand.is_empty() {
            return Err(ClauseError::BadExpression(text.to_string()));
        }
        let getter = Getter::parse(operand)?;
        tokens.push(Token::Operand(Expr::Operand(Box::new(getter))));
    }
    if tokens.is_empty() {
        return Err(ClauseError::BadExpression(text.to_string()));
    }
    Ok(tokens)
}

fn matching_paren(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0i32;
    for (i, c) in text.char_indices().skip_while(|(i, _)| *i < open) {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn parse_binary(tokens: &[Token], pos: &mut usize, min_prec: u8) -> Option<Expr> {
    let mut left = parse_unary(tokens, pos)?;
    while let Some(Token::Op(c)) = tokens.get(*pos) {
        let op = ArithOp::from_char(*c)?;
        let prec = op.precedence();
        if prec < min_prec {
            break;
        }
        *pos += 1;
        // `^` is right-associative; everything else left.
        let next_min = if op == ArithOp::Pow { prec } else { prec + 1 };
        let right = parse_binary(tokens, pos, next_min)?;
        left = Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        };
    }
    Some(left)
}

fn parse_unary(tokens: &[Token], pos: &mut usize) -> Option<Expr> {
    match tokens.get(*pos)? {
        Token::Op('-') => {
            *pos += 1;
            // Unary minus binds tighter than `*` but looser than `^`.
            let inner = parse_binary(tokens, pos, 3)?;
            Some(Expr::Neg(Box::new(inner)))
        }
        Token::Op(_) => None,
        Token::Operand(_) => {
            let Token::Operand(expr) = &tokens[*pos] else {
                return None;
            };
            *pos += 1;
            Some(expr.clone())
        }
    }
}
