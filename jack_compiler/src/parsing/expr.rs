//! Expression parsing.
use super::{Ident, Parse};
use crate::{
    error::JackResult,
    token_stream::TokenStream,
    tokens::{Keyword, Span, Token, TokenKind},
};
use smol_str::SmolStr;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    IntegerLiteral(u16),
    StringLiteral { value: SmolStr, span: Span },
    Keyword(KeywordConst),
    Ident(Ident),
    /// Array element `base[index]`
    Index { base: Box<Expr>, index: Box<Expr> },
    Call(SubroutineCall),
    Paren(Box<Expr>),
    Prefix { op: PrefixOp, operand: Box<Expr> },
    Infix { left: Box<Expr>, op: InfixOp, right: Box<Expr> },
}

impl Parse for Expr {
    type Output = Self;

    fn parse(input: &mut TokenStream) -> JackResult<Self> {
        parse_expr(input, Precedence::Lowest)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordConst {
    True,
    False,
    Null,
    This,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixOp {
    /// Arithmetic negation `-`
    Neg,
    /// Bitwise not `~`
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfixOp {
    Add,
    Sub,
    Mul,
    Div,
    And,
    Or,
    Lt,
    Gt,
    Eq,
}

impl InfixOp {
    fn from_token(kind: TokenKind) -> Option<Self> {
        match kind {
            TokenKind::Plus => Some(InfixOp::Add),
            TokenKind::Minus => Some(InfixOp::Sub),
            TokenKind::Star => Some(InfixOp::Mul),
            TokenKind::Slash => Some(InfixOp::Div),
            TokenKind::Ampersand => Some(InfixOp::And),
            TokenKind::Pipe => Some(InfixOp::Or),
            TokenKind::Less => Some(InfixOp::Lt),
            TokenKind::Greater => Some(InfixOp::Gt),
            TokenKind::Eq => Some(InfixOp::Eq),
            _ => None,
        }
    }
}

impl fmt::Display for InfixOp {
    #[rustfmt::skip]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            InfixOp::Add => write!(f, "+"),
            InfixOp::Sub => write!(f, "-"),
            InfixOp::Mul => write!(f, "*"),
            InfixOp::Div => write!(f, "/"),
            InfixOp::And => write!(f, "&"),
            InfixOp::Or  => write!(f, "|"),
            InfixOp::Lt  => write!(f, "<"),
            InfixOp::Gt  => write!(f, ">"),
            InfixOp::Eq  => write!(f, "="),
        }
    }
}

/// Object or class a subroutine is called on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Receiver {
    /// `draw()`, the current object or class.
    None,
    /// `Math.max()`
    Class(Ident),
    /// `square.dispose()`
    Var(Ident),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubroutineCall {
    pub receiver: Receiver,
    pub name: Ident,
    pub arguments: Vec<Expr>,
}

/// Binding power of operators, from loosest to tightest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    Lowest,
    /// `&` `|`
    Logical,
    /// `=`
    Equals,
    /// `<` `>`
    LessGreater,
    /// `+` `-`
    Sum,
    /// `*` `/`
    Product,
    /// `-x` `~x`
    Prefix,
    /// `Class.call()`
    Dot,
    /// `call()`
    Call,
    /// `array[index]`
    Index,
}

impl Precedence {
    /// Infix binding power of a token. Tokens that can't continue an
    /// expression are `Lowest`.
    #[rustfmt::skip]
    pub fn of(kind: TokenKind) -> Self {
        use TokenKind as T;
        match kind {
            T::Ampersand | T::Pipe => Precedence::Logical,
            T::Eq                  => Precedence::Equals,
            T::Less | T::Greater   => Precedence::LessGreater,
            T::Plus | T::Minus     => Precedence::Sum,
            T::Star | T::Slash     => Precedence::Product,
            T::Dot                 => Precedence::Dot,
            T::LeftParen           => Precedence::Call,
            T::LeftBracket         => Precedence::Index,
            _                      => Precedence::Lowest,
        }
    }
}

/// Parse an expression, consuming operators that bind tighter
/// than the given precedence.
pub fn parse_expr(input: &mut TokenStream, precedence: Precedence) -> JackResult<Expr> {
    let token = input.next_token()?;
    let mut left = parse_prefix(input, token)?;

    while let Some(kind) = input.peek_kind() {
        if Precedence::of(kind) <= precedence {
            break;
        }

        let token = input.next_token()?;
        left = parse_infix(input, token, left)?;
    }

    Ok(left)
}

fn parse_prefix(input: &mut TokenStream, token: Token) -> JackResult<Expr> {
    use Keyword as K;
    use TokenKind as T;

    match token.kind {
        T::Integer => match token.literal.parse::<u16>() {
            Ok(value) => Ok(Expr::IntegerLiteral(value)),
            Err(_) => Err(input.error(token, "invalid integer literal")),
        },
        T::String => Ok(Expr::StringLiteral {
            value: token.literal,
            span: token.span,
        }),
        T::Keyword(K::True) => Ok(Expr::Keyword(KeywordConst::True)),
        T::Keyword(K::False) => Ok(Expr::Keyword(KeywordConst::False)),
        T::Keyword(K::Null) => Ok(Expr::Keyword(KeywordConst::Null)),
        T::Keyword(K::This) => Ok(Expr::Keyword(KeywordConst::This)),
        T::Ident => Ok(Expr::Ident(Ident::from(token))),
        T::LeftParen => {
            let inner = parse_expr(input, Precedence::Lowest)?;
            input.consume(T::RightParen)?;
            Ok(Expr::Paren(Box::new(inner)))
        }
        T::Minus => parse_prefix_op(input, PrefixOp::Neg),
        T::Tilde => parse_prefix_op(input, PrefixOp::Not),
        kind => {
            let message = format!("expected expression, found '{kind}'");
            Err(input.error(token, message))
        }
    }
}

fn parse_prefix_op(input: &mut TokenStream, op: PrefixOp) -> JackResult<Expr> {
    let operand = parse_expr(input, Precedence::Prefix)?;
    Ok(Expr::Prefix {
        op,
        operand: Box::new(operand),
    })
}

fn parse_infix(input: &mut TokenStream, token: Token, left: Expr) -> JackResult<Expr> {
    if let Some(op) = InfixOp::from_token(token.kind) {
        let right = parse_expr(input, Precedence::of(token.kind))?;
        return Ok(Expr::Infix {
            left: Box::new(left),
            op,
            right: Box::new(right),
        });
    }

    match token.kind {
        TokenKind::Dot => {
            let receiver = match left {
                // The parser has no symbol table, so capitalization
                // is what tells a class apart from a variable.
                Expr::Ident(ident) if ident.is_capitalized() => Receiver::Class(ident),
                Expr::Ident(ident) => Receiver::Var(ident),
                _ => return Err(input.error(token, "expected class or variable name before '.'")),
            };
            let name = Ident::parse(input)?;
            input.consume(TokenKind::LeftParen)?;
            let arguments = parse_arguments(input)?;

            Ok(Expr::Call(SubroutineCall {
                receiver,
                name,
                arguments,
            }))
        }
        TokenKind::LeftParen => {
            let name = match left {
                Expr::Ident(ident) => ident,
                _ => return Err(input.error(token, "expected subroutine name before '('")),
            };
            let arguments = parse_arguments(input)?;

            Ok(Expr::Call(SubroutineCall {
                receiver: Receiver::None,
                name,
                arguments,
            }))
        }
        TokenKind::LeftBracket => {
            let index = parse_expr(input, Precedence::Lowest)?;
            input.consume(TokenKind::RightBracket)?;

            Ok(Expr::Index {
                base: Box::new(left),
                index: Box::new(index),
            })
        }
        kind => {
            let message = format!("unexpected '{kind}' in expression");
            Err(input.error(token, message))
        }
    }
}

/// Parse call arguments after the opening parenthesis, up to and
/// including the closing parenthesis.
fn parse_arguments(input: &mut TokenStream) -> JackResult<Vec<Expr>> {
    let mut arguments = vec![];

    if input.match_token(TokenKind::RightParen) {
        return Ok(arguments);
    }

    loop {
        arguments.push(parse_expr(input, Precedence::Lowest)?);

        if !input.match_token(TokenKind::Comma) {
            break;
        }
    }

    input.consume(TokenKind::RightParen)?;

    Ok(arguments)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::lex::Lexer;

    fn parse(source: &str) -> Expr {
        let mut stream = TokenStream::new(Lexer::new(source));
        let expr = Expr::parse(&mut stream).unwrap();
        assert!(stream.consume(TokenKind::EOS).is_ok(), "trailing tokens in {source:?}");
        expr
    }

    fn ident(expr: &Expr) -> &str {
        match expr {
            Expr::Ident(ident) => ident.as_str(),
            _ => panic!("expected identifier, found {expr:?}"),
        }
    }

    #[test]
    fn test_product_binds_tighter_than_sum() {
        // a + (b * c)
        match parse("a + b * c") {
            Expr::Infix { left, op: InfixOp::Add, right } => {
                assert_eq!(ident(&left), "a");
                assert!(matches!(*right, Expr::Infix { op: InfixOp::Mul, .. }));
            }
            expr => panic!("unexpected {expr:?}"),
        }
    }

    #[test]
    fn test_left_associative() {
        // (a - b) - c
        match parse("a - b - c") {
            Expr::Infix { left, op: InfixOp::Sub, right } => {
                assert!(matches!(*left, Expr::Infix { op: InfixOp::Sub, .. }));
                assert_eq!(ident(&right), "c");
            }
            expr => panic!("unexpected {expr:?}"),
        }
    }

    #[test]
    fn test_logical_below_comparison() {
        // (a < b) & (c = d)
        match parse("a < b & c = d") {
            Expr::Infix { left, op: InfixOp::And, right } => {
                assert!(matches!(*left, Expr::Infix { op: InfixOp::Lt, .. }));
                assert!(matches!(*right, Expr::Infix { op: InfixOp::Eq, .. }));
            }
            expr => panic!("unexpected {expr:?}"),
        }
    }

    #[test]
    fn test_prefix_operand() {
        // (-a) + b
        match parse("-a + b") {
            Expr::Infix { left, op: InfixOp::Add, .. } => {
                assert!(matches!(*left, Expr::Prefix { op: PrefixOp::Neg, .. }));
            }
            expr => panic!("unexpected {expr:?}"),
        }

        // ~(a[i])
        match parse("~a[i]") {
            Expr::Prefix { op: PrefixOp::Not, operand } => {
                assert!(matches!(*operand, Expr::Index { .. }));
            }
            expr => panic!("unexpected {expr:?}"),
        }
    }

    #[test]
    fn test_call_receivers() {
        match parse("Math.max(1, x)") {
            Expr::Call(call) => {
                assert!(matches!(call.receiver, Receiver::Class(ref i) if i.as_str() == "Math"));
                assert_eq!(call.name.as_str(), "max");
                assert_eq!(call.arguments.len(), 2);
            }
            expr => panic!("unexpected {expr:?}"),
        }

        match parse("square.dispose()") {
            Expr::Call(call) => {
                assert!(matches!(call.receiver, Receiver::Var(ref i) if i.as_str() == "square"));
                assert!(call.arguments.is_empty());
            }
            expr => panic!("unexpected {expr:?}"),
        }

        match parse("draw(a + 1)") {
            Expr::Call(call) => {
                assert_eq!(call.receiver, Receiver::None);
                assert!(matches!(call.arguments[0], Expr::Infix { op: InfixOp::Add, .. }));
            }
            expr => panic!("unexpected {expr:?}"),
        }
    }

    #[test]
    fn test_index_with_nested_expression() {
        match parse("a[i + 1] * 2") {
            Expr::Infix { left, op: InfixOp::Mul, .. } => match *left {
                Expr::Index { base, index } => {
                    assert_eq!(ident(&base), "a");
                    assert!(matches!(*index, Expr::Infix { op: InfixOp::Add, .. }));
                }
                expr => panic!("unexpected {expr:?}"),
            },
            expr => panic!("unexpected {expr:?}"),
        }
    }

    #[test]
    fn test_literals() {
        assert_eq!(parse("32767"), Expr::IntegerLiteral(32767));
        assert_eq!(parse("null"), Expr::Keyword(KeywordConst::Null));
        assert!(matches!(parse("\"hi\""), Expr::StringLiteral { ref value, .. } if value == "hi"));
        assert!(matches!(parse("(1)"), Expr::Paren(_)));
    }

    #[test]
    fn test_call_on_expression_is_error() {
        let mut stream = TokenStream::new(Lexer::new("(a).b()"));
        assert!(Expr::parse(&mut stream).is_err());

        let mut stream = TokenStream::new(Lexer::new("1 + ;"));
        assert!(Expr::parse(&mut stream).is_err());
    }
}
