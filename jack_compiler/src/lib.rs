//! Compiler for the Jack language, targeting a stack based virtual machine.
//!
//! One source file holds one class, which compiles to one list of
//! VM instructions.
//!
//! ```
//! let code = jack_compiler::compile_str("class Main { function void main() { return; } }").unwrap();
//! assert_eq!(code.to_string(), "function Main.main 0\npush constant 0\nreturn\n");
//! ```
pub mod compile;
mod cursor;
pub mod error;
pub mod lex;
pub mod parsing;
pub mod token_stream;
pub mod tokens;

pub use error::{JackError, JackResult};

use compile::{CodeGen, VmCode};
use parsing::{Class, Parse};
use std::io;
use tokens::Token;

/// Compile the source code of one class.
pub fn compile_str(source: &str) -> JackResult<VmCode> {
    // Syntactic analysis
    let class = parse_str(source)?;

    // Semantic analysis and code generation
    let code = CodeGen::new()
        .compile(&class)
        .map_err(|err| err.locate(source))?;

    Ok(code)
}

/// Read the whole source from the reader, then compile it.
pub fn compile_reader(mut reader: impl io::Read) -> JackResult<VmCode> {
    let mut buf = vec![];
    reader.read_to_end(&mut buf)?;
    let source = String::from_utf8(buf)?;
    compile_str(&source)
}

pub fn parse_str(source: &str) -> JackResult<Class> {
    let lexer = lex::Lexer::new(source);
    let mut stream = token_stream::TokenStream::new(lexer);
    Class::parse(&mut stream)
}

/// Lex the whole source, including the end-of-source token.
pub fn tokenize(source: &str) -> JackResult<Vec<Token>> {
    lex::Lexer::new(source)
        .into_iter()
        .map(|result| result.map_err(JackError::from))
        .collect()
}
