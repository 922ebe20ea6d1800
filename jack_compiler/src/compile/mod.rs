//! Semantic analysis and code generation.
pub mod codegen;
pub mod symbol;
pub mod vm;

pub use codegen::{CodeGen, CodeGenError, CodeGenErrorKind};
pub use symbol::{DeclareError, NotFound, Symbol, SymbolKind, SymbolTable};
pub use vm::{ArithOp, OperandError, Segment, VmCode, VmInstr};
