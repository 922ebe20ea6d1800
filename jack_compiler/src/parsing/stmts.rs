//! Statement parsing.
use super::{expr::parse_expr, Expr, Ident, Parse, Precedence, SubroutineCall};
use crate::{
    error::JackResult,
    token_stream::TokenStream,
    tokens::{Keyword, TokenKind},
};

#[derive(Debug, Clone)]
pub enum Stmt {
    Let(LetStmt),
    If(IfStmt),
    While(WhileStmt),
    Do(SubroutineCall),
    Return(Option<Expr>),
}

/// Assignment to a variable, or to an element of an array variable.
///
/// ```text
/// let x = 1;
/// let a[i] = x;
/// ```
#[derive(Debug, Clone)]
pub struct LetStmt {
    pub name: Ident,
    pub index: Option<Expr>,
    pub value: Expr,
}

#[derive(Debug, Clone)]
pub struct IfStmt {
    pub cond: Expr,
    pub then_branch: Vec<Stmt>,
    pub else_branch: Option<Vec<Stmt>>,
}

#[derive(Debug, Clone)]
pub struct WhileStmt {
    pub cond: Expr,
    pub body: Vec<Stmt>,
}

/// Parse statements until a token is reached that can't start one.
pub fn parse_statements(input: &mut TokenStream) -> JackResult<Vec<Stmt>> {
    let mut stmts = vec![];

    while let Some(stmt) = Stmt::parse(input)? {
        stmts.push(stmt);
    }

    Ok(stmts)
}

impl Parse for Stmt {
    type Output = Option<Self>;

    fn parse(input: &mut TokenStream) -> JackResult<Option<Self>> {
        use Keyword as K;

        let stmt = match input.peek_kind() {
            Some(TokenKind::Keyword(K::Let)) => Stmt::Let(LetStmt::parse(input)?),
            Some(TokenKind::Keyword(K::If)) => Stmt::If(IfStmt::parse(input)?),
            Some(TokenKind::Keyword(K::While)) => Stmt::While(WhileStmt::parse(input)?),
            Some(TokenKind::Keyword(K::Do)) => Stmt::Do(parse_do(input)?),
            Some(TokenKind::Keyword(K::Return)) => Stmt::Return(parse_return(input)?),
            _ => return Ok(None),
        };

        Ok(Some(stmt))
    }
}

impl Parse for LetStmt {
    type Output = Self;

    fn parse(input: &mut TokenStream) -> JackResult<Self> {
        input.consume(TokenKind::Keyword(Keyword::Let))?;

        let name = Ident::parse(input)?;

        let index = if input.match_token(TokenKind::LeftBracket) {
            let index = parse_expr(input, Precedence::Lowest)?;
            input.consume(TokenKind::RightBracket)?;
            Some(index)
        } else {
            None
        };

        input.consume(TokenKind::Eq)?;
        let value = parse_expr(input, Precedence::Lowest)?;
        input.consume(TokenKind::Semicolon)?;

        Ok(LetStmt { name, index, value })
    }
}

impl Parse for IfStmt {
    type Output = Self;

    fn parse(input: &mut TokenStream) -> JackResult<Self> {
        input.consume(TokenKind::Keyword(Keyword::If))?;

        let cond = parse_condition(input)?;
        let then_branch = parse_body(input)?;

        let else_branch = if input.match_token(TokenKind::Keyword(Keyword::Else)) {
            Some(parse_body(input)?)
        } else {
            None
        };

        Ok(IfStmt {
            cond,
            then_branch,
            else_branch,
        })
    }
}

impl Parse for WhileStmt {
    type Output = Self;

    fn parse(input: &mut TokenStream) -> JackResult<Self> {
        input.consume(TokenKind::Keyword(Keyword::While))?;

        let cond = parse_condition(input)?;
        let body = parse_body(input)?;

        Ok(WhileStmt { cond, body })
    }
}

/// `do` only accepts an expression that is a subroutine call.
fn parse_do(input: &mut TokenStream) -> JackResult<SubroutineCall> {
    input.consume(TokenKind::Keyword(Keyword::Do))?;

    let start = input.peek()?.clone();

    match parse_expr(input, Precedence::Lowest)? {
        Expr::Call(call) => {
            input.consume(TokenKind::Semicolon)?;
            Ok(call)
        }
        _ => Err(input.error(start, "expected subroutine call after 'do'")),
    }
}

fn parse_return(input: &mut TokenStream) -> JackResult<Option<Expr>> {
    input.consume(TokenKind::Keyword(Keyword::Return))?;

    if input.match_token(TokenKind::Semicolon) {
        return Ok(None);
    }

    let value = parse_expr(input, Precedence::Lowest)?;
    input.consume(TokenKind::Semicolon)?;

    Ok(Some(value))
}

/// `( expr )`
fn parse_condition(input: &mut TokenStream) -> JackResult<Expr> {
    input.consume(TokenKind::LeftParen)?;
    let cond = parse_expr(input, Precedence::Lowest)?;
    input.consume(TokenKind::RightParen)?;
    Ok(cond)
}

/// `{ statement* }`
fn parse_body(input: &mut TokenStream) -> JackResult<Vec<Stmt>> {
    input.consume(TokenKind::LeftBrace)?;
    let stmts = parse_statements(input)?;
    input.consume(TokenKind::RightBrace)?;
    Ok(stmts)
}
