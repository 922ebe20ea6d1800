//! Stack machine instructions.
use crate::lex::MAX_INTEGER;
use smol_str::SmolStr;
use std::{error, fmt, io, ops, slice};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Constant,
    Local,
    Argument,
    /// Fields of the object `pointer 0` refers to.
    This,
    /// Memory `pointer 1` refers to, used for array access.
    That,
    Temp,
    /// `this` and `that` base addresses.
    Pointer,
    Static,
}

impl fmt::Display for Segment {
    #[rustfmt::skip]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Segment::Constant => write!(f, "constant"),
            Segment::Local    => write!(f, "local"),
            Segment::Argument => write!(f, "argument"),
            Segment::This     => write!(f, "this"),
            Segment::That     => write!(f, "that"),
            Segment::Temp     => write!(f, "temp"),
            Segment::Pointer  => write!(f, "pointer"),
            Segment::Static   => write!(f, "static"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Neg,
    Eq,
    Gt,
    Lt,
    And,
    Or,
    Not,
}

impl fmt::Display for ArithOp {
    #[rustfmt::skip]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ArithOp::Add => write!(f, "add"),
            ArithOp::Sub => write!(f, "sub"),
            ArithOp::Neg => write!(f, "neg"),
            ArithOp::Eq  => write!(f, "eq"),
            ArithOp::Gt  => write!(f, "gt"),
            ArithOp::Lt  => write!(f, "lt"),
            ArithOp::And => write!(f, "and"),
            ArithOp::Or  => write!(f, "or"),
            ArithOp::Not => write!(f, "not"),
        }
    }
}

/// VM instruction.
///
/// `Push` and `Pop` should be built with [`VmInstr::push`] and
/// [`VmInstr::pop`], which reject operands the VM can't execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VmInstr {
    Push(Segment, u16),
    Pop(Segment, u16),
    Arith(ArithOp),
    Label(SmolStr),
    Goto(SmolStr),
    IfGoto(SmolStr),
    /// Subroutine entry, `name` is qualified with the class.
    Function { name: SmolStr, locals: u16 },
    Call { name: SmolStr, args: u16 },
    Return,
}

impl VmInstr {
    pub fn push(segment: Segment, index: u16) -> Result<Self, OperandError> {
        match segment {
            Segment::Constant if index > MAX_INTEGER => Err(OperandError::ConstantOutOfRange(index)),
            Segment::Pointer if index > 1 => Err(OperandError::PointerOutOfRange(index)),
            _ => Ok(VmInstr::Push(segment, index)),
        }
    }

    pub fn pop(segment: Segment, index: u16) -> Result<Self, OperandError> {
        match segment {
            Segment::Constant => Err(OperandError::PopConstant),
            Segment::Pointer if index > 1 => Err(OperandError::PointerOutOfRange(index)),
            _ => Ok(VmInstr::Pop(segment, index)),
        }
    }
}

/// Outputs instruction as VM text.
impl fmt::Display for VmInstr {
    #[rustfmt::skip]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            VmInstr::Push(segment, index)      => write!(f, "push {} {}", segment, index),
            VmInstr::Pop(segment, index)       => write!(f, "pop {} {}", segment, index),
            VmInstr::Arith(op)                 => write!(f, "{}", op),
            VmInstr::Label(label)              => write!(f, "label {}", label),
            VmInstr::Goto(label)               => write!(f, "goto {}", label),
            VmInstr::IfGoto(label)             => write!(f, "if-goto {}", label),
            VmInstr::Function { name, locals } => write!(f, "function {} {}", name, locals),
            VmInstr::Call { name, args }       => write!(f, "call {} {}", name, args),
            VmInstr::Return                    => write!(f, "return"),
        }
    }
}

/// Operand the VM can't execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandError {
    /// The constant segment is virtual and can't be written.
    PopConstant,
    /// Only `pointer 0` and `pointer 1` exist.
    PointerOutOfRange(u16),
    ConstantOutOfRange(u16),
}

impl error::Error for OperandError {}

impl fmt::Display for OperandError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OperandError::PopConstant => write!(f, "cannot pop into the constant segment"),
            OperandError::PointerOutOfRange(index) => write!(f, "pointer index {index} out of range 0..=1"),
            OperandError::ConstantOutOfRange(value) => write!(f, "constant {value} exceeds {MAX_INTEGER}"),
        }
    }
}

/// Compiled instructions of one class, in emission order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct VmCode {
    instrs: Vec<VmInstr>,
}

impl VmCode {
    pub fn new(instrs: Vec<VmInstr>) -> Self {
        Self { instrs }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.instrs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.instrs.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> slice::Iter<'_, VmInstr> {
        self.instrs.iter()
    }

    /// Write the instructions as text, one per line.
    pub fn write_to(&self, mut writer: impl io::Write) -> io::Result<()> {
        for instr in &self.instrs {
            writeln!(writer, "{}", instr)?;
        }
        writer.flush()
    }
}

impl fmt::Display for VmCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for instr in &self.instrs {
            writeln!(f, "{}", instr)?;
        }
        Ok(())
    }
}

impl ops::Index<usize> for VmCode {
    type Output = VmInstr;

    fn index(&self, index: usize) -> &Self::Output {
        &self.instrs[index]
    }
}

impl IntoIterator for VmCode {
    type Item = VmInstr;
    type IntoIter = std::vec::IntoIter<VmInstr>;

    fn into_iter(self) -> Self::IntoIter {
        self.instrs.into_iter()
    }
}

impl<'a> IntoIterator for &'a VmCode {
    type Item = &'a VmInstr;
    type IntoIter = slice::Iter<'a, VmInstr>;

    fn into_iter(self) -> Self::IntoIter {
        self.instrs.iter()
    }
}
