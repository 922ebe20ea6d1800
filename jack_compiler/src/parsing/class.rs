//! Class and subroutine declarations.
use super::{parse_names, stmts::parse_statements, Ident, Parse, Stmt, Type};
use crate::{
    error::JackResult,
    token_stream::TokenStream,
    tokens::{Keyword, TokenKind},
};

/// A class is the unit of compilation. One per source file.
///
/// ```text
/// class Point {
///     field int x, y;
///     constructor Point new(int ax, int ay) { ... }
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Class {
    pub name: Ident,
    pub fields: Vec<Field>,
    pub subroutines: Vec<Subroutine>,
}

impl Parse for Class {
    type Output = Self;

    fn parse(input: &mut TokenStream) -> JackResult<Self> {
        input.consume(TokenKind::Keyword(Keyword::Class))?;

        let token = input.consume(TokenKind::Ident)?;
        if !token.literal.starts_with(|c: char| c.is_ascii_uppercase()) {
            let message = format!("class name '{}' must start with an uppercase letter", token.literal);
            return Err(input.error(token, message));
        }
        let name = Ident::from(token);

        input.consume(TokenKind::LeftBrace)?;

        let mut fields = vec![];
        while let Some(field) = Field::parse(input)? {
            fields.push(field);
        }

        let mut subroutines = vec![];
        while let Some(subroutine) = Subroutine::parse(input)? {
            subroutines.push(subroutine);
        }

        input.consume(TokenKind::RightBrace)?;

        // One class per source file, nothing may follow it.
        let token = input.next_token()?;
        if !token.is_eos() {
            let message = format!("unexpected '{}' after the end of class '{}'", token.kind, name);
            return Err(input.error(token, message));
        }

        Ok(Class {
            name,
            fields,
            subroutines,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldScope {
    /// Shared by all instances of the class.
    Static,
    /// Stored per instance.
    Instance,
}

/// Class variable declaration.
///
/// ```text
/// static int count;
/// field Array items, spare;
/// ```
#[derive(Debug, Clone)]
pub struct Field {
    pub scope: FieldScope,
    pub ty: Type,
    pub names: Vec<Ident>,
}

impl Parse for Field {
    type Output = Option<Self>;

    fn parse(input: &mut TokenStream) -> JackResult<Option<Self>> {
        let scope = if input.match_token(TokenKind::Keyword(Keyword::Static)) {
            FieldScope::Static
        } else if input.match_token(TokenKind::Keyword(Keyword::Field)) {
            FieldScope::Instance
        } else {
            return Ok(None);
        };

        let ty = Type::parse(input)?;
        let names = parse_names(input)?;

        Ok(Some(Field { scope, ty, names }))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubroutineKind {
    Constructor,
    Function,
    Method,
}

#[derive(Debug, Clone)]
pub struct Subroutine {
    pub kind: SubroutineKind,
    /// `None` for `void`.
    pub return_type: Option<Type>,
    pub name: Ident,
    pub parameters: Vec<Parameter>,
    pub body: Block,
}

impl Parse for Subroutine {
    type Output = Option<Self>;

    fn parse(input: &mut TokenStream) -> JackResult<Option<Self>> {
        use Keyword as K;

        let kind = match input.peek_kind() {
            Some(TokenKind::Keyword(K::Constructor)) => SubroutineKind::Constructor,
            Some(TokenKind::Keyword(K::Function)) => SubroutineKind::Function,
            Some(TokenKind::Keyword(K::Method)) => SubroutineKind::Method,
            _ => return Ok(None),
        };
        input.next_token()?;

        let return_type = Type::parse_return(input)?;

        let token = input.consume(TokenKind::Ident)?;
        if !token.literal.starts_with(|c: char| c.is_ascii_lowercase()) {
            let message = format!("subroutine name '{}' must start with a lowercase letter", token.literal);
            return Err(input.error(token, message));
        }
        let name = Ident::from(token);

        input.consume(TokenKind::LeftParen)?;
        let parameters = parse_parameters(input)?;
        input.consume(TokenKind::RightParen)?;

        let body = Block::parse(input)?;

        Ok(Some(Subroutine {
            kind,
            return_type,
            name,
            parameters,
            body,
        }))
    }
}

#[derive(Debug, Clone)]
pub struct Parameter {
    pub ty: Type,
    pub name: Ident,
}

fn parse_parameters(input: &mut TokenStream) -> JackResult<Vec<Parameter>> {
    let mut parameters = vec![];

    if input.peek_kind() == Some(TokenKind::RightParen) {
        return Ok(parameters);
    }

    loop {
        let ty = Type::parse(input)?;
        let name = Ident::parse(input)?;
        parameters.push(Parameter { ty, name });

        if !input.match_token(TokenKind::Comma) {
            break;
        }
    }

    Ok(parameters)
}

/// Subroutine body.
///
/// Local variables can only be declared at the top.
#[derive(Debug, Clone)]
pub struct Block {
    pub var_decs: Vec<VarDec>,
    pub statements: Vec<Stmt>,
}

impl Block {
    /// Number of local variables declared in the body.
    pub fn local_count(&self) -> usize {
        self.var_decs.iter().map(|var_dec| var_dec.names.len()).sum()
    }
}

impl Parse for Block {
    type Output = Self;

    fn parse(input: &mut TokenStream) -> JackResult<Self> {
        input.consume(TokenKind::LeftBrace)?;

        let mut var_decs = vec![];
        while let Some(var_dec) = VarDec::parse(input)? {
            var_decs.push(var_dec);
        }

        let statements = parse_statements(input)?;

        input.consume(TokenKind::RightBrace)?;

        Ok(Block { var_decs, statements })
    }
}

/// Local variable declaration.
///
/// ```text
/// var int i, j;
/// ```
#[derive(Debug, Clone)]
pub struct VarDec {
    pub ty: Type,
    pub names: Vec<Ident>,
}

impl Parse for VarDec {
    type Output = Option<Self>;

    fn parse(input: &mut TokenStream) -> JackResult<Option<Self>> {
        if !input.match_token(TokenKind::Keyword(Keyword::Var)) {
            return Ok(None);
        }

        let ty = Type::parse(input)?;
        let names = parse_names(input)?;

        Ok(Some(VarDec { ty, names }))
    }
}
