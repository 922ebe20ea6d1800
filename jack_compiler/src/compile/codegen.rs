//! Lowering of the syntax tree to VM instructions.
use super::{
    symbol::{DeclareError, NotFound, SymbolKind, SymbolTable},
    vm::{ArithOp, OperandError, Segment, VmCode, VmInstr},
};
use crate::{
    parsing::{
        Class, Expr, FieldScope, Ident, IfStmt, InfixOp, KeywordConst, LetStmt, PrefixOp, Receiver, Stmt, Subroutine,
        SubroutineCall, SubroutineKind, Type, WhileStmt,
    },
    tokens::{SourceLine, Span},
};
use log::{debug, trace};
use smol_str::SmolStr;
use std::{collections::BTreeSet, error, fmt};

// Runtime library routines the generated code depends on.
const MEMORY_ALLOC: &str = "Memory.alloc";
const MATH_MULTIPLY: &str = "Math.multiply";
const MATH_DIVIDE: &str = "Math.divide";
const STRING_NEW: &str = "String.new";
const STRING_APPEND_CHAR: &str = "String.appendChar";

pub struct CodeGen {
    code: Vec<VmInstr>,
    class_name: SmolStr,
    /// Fields and statics, alive for the whole class.
    class_symbols: SymbolTable,
    /// Parameters and locals, cleared for every subroutine.
    subroutine_symbols: SymbolTable,
    /// Names of the class's methods, which take the object as
    /// an implicit first argument.
    methods: BTreeSet<SmolStr>,
    /// Next label number. Labels are unique per class.
    label_counter: u32,
}

impl CodeGen {
    #[inline]
    pub fn new() -> Self {
        Self {
            code: vec![],
            class_name: SmolStr::default(),
            class_symbols: SymbolTable::new(),
            subroutine_symbols: SymbolTable::new(),
            methods: BTreeSet::new(),
            label_counter: 1,
        }
    }

    /// Generate the instructions for one class.
    ///
    /// Nothing is returned for a class that fails to compile.
    pub fn compile(&mut self, class: &Class) -> Result<VmCode, CodeGenError> {
        self.reset();

        match self.class(class) {
            Ok(()) => Ok(VmCode::new(std::mem::take(&mut self.code))),
            Err(err) => {
                self.code.clear();
                Err(err)
            }
        }
    }

    /// Clear all state left by a previous compilation.
    pub fn reset(&mut self) {
        self.code.clear();
        self.class_name = SmolStr::default();
        self.class_symbols.clear();
        self.subroutine_symbols.clear();
        self.methods.clear();
        self.label_counter = 1;
    }

    /// Fields and statics of the last compiled class.
    pub fn class_symbols(&self) -> &SymbolTable {
        &self.class_symbols
    }

    /// Parameters and locals of the last compiled subroutine.
    pub fn subroutine_symbols(&self) -> &SymbolTable {
        &self.subroutine_symbols
    }

    fn emit(&mut self, instr: VmInstr) {
        #[cfg(feature = "emit_trace")]
        trace!("emit {}", instr);

        self.code.push(instr)
    }

    fn emit_push(&mut self, segment: Segment, index: u16) -> Result<(), CodeGenError> {
        let instr = VmInstr::push(segment, index)?;
        self.emit(instr);
        Ok(())
    }

    fn emit_pop(&mut self, segment: Segment, index: u16) -> Result<(), CodeGenError> {
        let instr = VmInstr::pop(segment, index)?;
        self.emit(instr);
        Ok(())
    }

    #[inline]
    fn emit_arith(&mut self, op: ArithOp) {
        self.emit(VmInstr::Arith(op))
    }

    fn emit_call(&mut self, name: impl Into<SmolStr>, args: u16) {
        self.emit(VmInstr::Call {
            name: name.into(),
            args,
        })
    }

    fn new_label(&mut self) -> SmolStr {
        let label = SmolStr::from(format!("{}_{}", self.class_name, self.label_counter));
        self.label_counter += 1;
        trace!("allocated label {}", label);
        label
    }

    /// Resolve a variable to its memory location and declared type.
    ///
    /// Subroutine scope shadows class scope.
    fn variable(&self, ident: &Ident) -> Result<(Segment, u16, Type), CodeGenError> {
        let symbol = self
            .subroutine_symbols
            .get(ident.as_str())
            .or_else(|_| self.class_symbols.get(ident.as_str()))
            .map_err(|err| CodeGenError::from(err).with_span(ident.span))?;

        Ok((segment_of(symbol.kind), symbol.position, symbol.ty.clone()))
    }
}

impl Default for CodeGen {
    #[inline]
    fn default() -> Self {
        CodeGen::new()
    }
}

fn segment_of(kind: SymbolKind) -> Segment {
    match kind {
        SymbolKind::Field => Segment::This,
        SymbolKind::Static => Segment::Static,
        SymbolKind::Argument => Segment::Argument,
        SymbolKind::Local => Segment::Local,
    }
}

/// Declarations
impl CodeGen {
    fn class(&mut self, class: &Class) -> Result<(), CodeGenError> {
        self.class_name = class.name.name.clone();
        debug!("compiling class {}", self.class_name);

        self.methods = class
            .subroutines
            .iter()
            .filter(|subroutine| subroutine.kind == SubroutineKind::Method)
            .map(|subroutine| subroutine.name.name.clone())
            .collect();

        for field in &class.fields {
            let kind = match field.scope {
                FieldScope::Static => SymbolKind::Static,
                FieldScope::Instance => SymbolKind::Field,
            };
            for name in &field.names {
                self.class_symbols
                    .add(name.as_str(), field.ty.clone(), kind)
                    .map_err(|err| CodeGenError::from(err).with_span(name.span))?;
            }
        }

        for subroutine in &class.subroutines {
            self.subroutine(subroutine)?;
        }

        Ok(())
    }

    fn subroutine(&mut self, subroutine: &Subroutine) -> Result<(), CodeGenError> {
        self.subroutine_symbols.clear();

        if subroutine.kind == SubroutineKind::Method {
            // `this` is a keyword, so it can't collide with a parameter.
            self.subroutine_symbols
                .add("this", Type::Class(self.class_name.clone()), SymbolKind::Argument)
                .map_err(|err| CodeGenError::from(err).with_span(subroutine.name.span))?;
        }

        for parameter in &subroutine.parameters {
            self.subroutine_symbols
                .add(parameter.name.as_str(), parameter.ty.clone(), SymbolKind::Argument)
                .map_err(|err| CodeGenError::from(err).with_span(parameter.name.span))?;
        }

        for var_dec in &subroutine.body.var_decs {
            for name in &var_dec.names {
                self.subroutine_symbols
                    .add(name.as_str(), var_dec.ty.clone(), SymbolKind::Local)
                    .map_err(|err| CodeGenError::from(err).with_span(name.span))?;
            }
        }

        let name = SmolStr::from(format!("{}.{}", self.class_name, subroutine.name));
        debug!("compiling subroutine {}", name);

        let locals = self.subroutine_symbols.count(SymbolKind::Local);
        self.emit(VmInstr::Function { name, locals });

        match subroutine.kind {
            SubroutineKind::Constructor => {
                // Allocate at least one word, so every object has a unique address.
                let size = u16::max(1, self.class_symbols.count(SymbolKind::Field));
                self.emit_push(Segment::Constant, size)?;
                self.emit_call(MEMORY_ALLOC, 1);
                self.emit_pop(Segment::Pointer, 0)?;
            }
            SubroutineKind::Method => {
                self.emit_push(Segment::Argument, 0)?;
                self.emit_pop(Segment::Pointer, 0)?;
            }
            SubroutineKind::Function => {}
        }

        self.stmts(&subroutine.body.statements)
    }
}

/// Statements
impl CodeGen {
    fn stmts(&mut self, stmts: &[Stmt]) -> Result<(), CodeGenError> {
        for stmt in stmts {
            self.stmt(stmt)?;
        }
        Ok(())
    }

    #[inline]
    fn stmt(&mut self, stmt: &Stmt) -> Result<(), CodeGenError> {
        match stmt {
            Stmt::Let(stmt) => self.let_stmt(stmt),
            Stmt::If(stmt) => self.if_stmt(stmt),
            Stmt::While(stmt) => self.while_stmt(stmt),
            Stmt::Do(call) => self.do_stmt(call),
            Stmt::Return(value) => self.return_stmt(value.as_ref()),
        }
    }

    fn let_stmt(&mut self, stmt: &LetStmt) -> Result<(), CodeGenError> {
        self.expr(&stmt.value)?;

        let (segment, index, _) = self.variable(&stmt.name)?;

        match &stmt.index {
            Some(element) => {
                // Value stays on the stack below the element address.
                self.emit_push(segment, index)?;
                self.expr(element)?;
                self.emit_arith(ArithOp::Add);
                self.emit_pop(Segment::Pointer, 1)?;
                self.emit_pop(Segment::That, 0)
            }
            None => self.emit_pop(segment, index),
        }
    }

    fn if_stmt(&mut self, stmt: &IfStmt) -> Result<(), CodeGenError> {
        let else_label = self.new_label();
        let end_label = self.new_label();

        self.expr(&stmt.cond)?;
        self.emit_arith(ArithOp::Not);
        self.emit(VmInstr::IfGoto(else_label.clone()));

        self.stmts(&stmt.then_branch)?;

        match &stmt.else_branch {
            Some(else_branch) => {
                self.emit(VmInstr::Goto(end_label.clone()));
                self.emit(VmInstr::Label(else_label));
                self.stmts(else_branch)?;
                self.emit(VmInstr::Label(end_label));
            }
            None => self.emit(VmInstr::Label(else_label)),
        }

        Ok(())
    }

    fn while_stmt(&mut self, stmt: &WhileStmt) -> Result<(), CodeGenError> {
        let loop_label = self.new_label();
        let end_label = self.new_label();

        self.emit(VmInstr::Label(loop_label.clone()));
        self.expr(&stmt.cond)?;
        self.emit_arith(ArithOp::Not);
        self.emit(VmInstr::IfGoto(end_label.clone()));

        self.stmts(&stmt.body)?;

        self.emit(VmInstr::Goto(loop_label));
        self.emit(VmInstr::Label(end_label));

        Ok(())
    }

    fn do_stmt(&mut self, call: &SubroutineCall) -> Result<(), CodeGenError> {
        self.call(call)?;

        // Discard the return value.
        self.emit_pop(Segment::Temp, 0)
    }

    fn return_stmt(&mut self, value: Option<&Expr>) -> Result<(), CodeGenError> {
        match value {
            Some(expr) => self.expr(expr)?,
            // Void subroutines still return a value.
            None => self.emit_push(Segment::Constant, 0)?,
        }
        self.emit(VmInstr::Return);
        Ok(())
    }
}

/// Expressions
impl CodeGen {
    fn expr(&mut self, expr: &Expr) -> Result<(), CodeGenError> {
        match expr {
            Expr::IntegerLiteral(value) => self.emit_push(Segment::Constant, *value),
            Expr::StringLiteral { value, span } => self
                .string(value)
                .map_err(|err| err.with_span(*span)),
            Expr::Keyword(keyword) => self.keyword_const(*keyword),
            Expr::Ident(ident) => {
                let (segment, index, _) = self.variable(ident)?;
                self.emit_push(segment, index)
            }
            Expr::Index { base, index } => {
                self.expr(base)?;
                self.expr(index)?;
                self.emit_arith(ArithOp::Add);
                self.emit_pop(Segment::Pointer, 1)?;
                self.emit_push(Segment::That, 0)
            }
            Expr::Call(call) => self.call(call),
            Expr::Paren(inner) => self.expr(inner),
            Expr::Prefix { op, operand } => {
                self.expr(operand)?;
                match op {
                    PrefixOp::Neg => self.emit_arith(ArithOp::Neg),
                    PrefixOp::Not => self.emit_arith(ArithOp::Not),
                }
                Ok(())
            }
            Expr::Infix { left, op, right } => {
                self.expr(left)?;
                self.expr(right)?;
                self.infix_op(*op);
                Ok(())
            }
        }
    }

    #[rustfmt::skip]
    fn infix_op(&mut self, op: InfixOp) {
        match op {
            InfixOp::Add => self.emit_arith(ArithOp::Add),
            InfixOp::Sub => self.emit_arith(ArithOp::Sub),
            InfixOp::And => self.emit_arith(ArithOp::And),
            InfixOp::Or  => self.emit_arith(ArithOp::Or),
            InfixOp::Lt  => self.emit_arith(ArithOp::Lt),
            InfixOp::Gt  => self.emit_arith(ArithOp::Gt),
            InfixOp::Eq  => self.emit_arith(ArithOp::Eq),
            // No hardware multiply or divide.
            InfixOp::Mul => self.emit_call(MATH_MULTIPLY, 2),
            InfixOp::Div => self.emit_call(MATH_DIVIDE, 2),
        }
    }

    fn keyword_const(&mut self, keyword: KeywordConst) -> Result<(), CodeGenError> {
        match keyword {
            KeywordConst::True => {
                // All bits set.
                self.emit_push(Segment::Constant, 1)?;
                self.emit_arith(ArithOp::Neg);
                Ok(())
            }
            KeywordConst::False | KeywordConst::Null => self.emit_push(Segment::Constant, 0),
            KeywordConst::This => self.emit_push(Segment::Pointer, 0),
        }
    }

    /// Strings are built at runtime, one character at a time.
    fn string(&mut self, value: &str) -> Result<(), CodeGenError> {
        let len = value.chars().count();
        let len = u16::try_from(len).map_err(|_| CodeGenError::new(CodeGenErrorKind::StringTooLong(len)))?;

        self.emit_push(Segment::Constant, len)
            .map_err(|_| CodeGenError::new(CodeGenErrorKind::StringTooLong(len as usize)))?;
        self.emit_call(STRING_NEW, 1);

        for c in value.chars() {
            let instr = u16::try_from(c as u32)
                .ok()
                .and_then(|code| VmInstr::push(Segment::Constant, code).ok())
                .ok_or_else(|| CodeGenError::new(CodeGenErrorKind::CharOutOfRange(c)))?;
            self.emit(instr);
            self.emit_call(STRING_APPEND_CHAR, 2);
        }

        Ok(())
    }

    fn call(&mut self, call: &SubroutineCall) -> Result<(), CodeGenError> {
        let (name, implicit_args) = match &call.receiver {
            Receiver::Class(class) => (format!("{}.{}", class, call.name), 0),
            Receiver::Var(var) => {
                // The object is the first argument of the method.
                let (segment, index, ty) = self.variable(var)?;
                self.emit_push(segment, index)?;
                (format!("{}.{}", ty, call.name), 1)
            }
            Receiver::None if self.methods.contains(call.name.as_str()) => {
                self.emit_push(Segment::Pointer, 0)?;
                (format!("{}.{}", self.class_name, call.name), 1)
            }
            Receiver::None => (format!("{}.{}", self.class_name, call.name), 0),
        };

        for argument in &call.arguments {
            self.expr(argument)?;
        }

        let count = call.arguments.len() + implicit_args;
        let args = u16::try_from(count)
            .map_err(|_| CodeGenError::new(CodeGenErrorKind::TooManyArguments(count)).with_span(call.name.span))?;
        self.emit_call(name, args);

        Ok(())
    }
}

/// Syntax tree could not be lowered to VM code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeGenError {
    pub kind: CodeGenErrorKind,
    /// Location of the offending identifier or literal.
    pub span: Option<Span>,
    /// Filled in by [`CodeGenError::locate`].
    pub line: Option<SourceLine>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeGenErrorKind {
    /// Identifier is neither a local, argument, field nor static.
    NotFound(SmolStr),
    /// Name declared twice in the same scope.
    DuplicateName(SmolStr),
    /// More variables of one kind than a VM segment index can address.
    TooManySymbols(SymbolKind),
    /// Instruction operand rejected by the VM.
    Operand(OperandError),
    /// Character in a string literal has no integer constant encoding.
    CharOutOfRange(char),
    StringTooLong(usize),
    TooManyArguments(usize),
}

impl CodeGenError {
    pub fn new(kind: CodeGenErrorKind) -> Self {
        Self {
            kind,
            span: None,
            line: None,
        }
    }

    /// Attach a location, unless the error already has a more precise one.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span.get_or_insert(span);
        self
    }

    /// Resolve the span against the source it was compiled from.
    pub fn locate(mut self, source: &str) -> Self {
        self.line = self.span.map(|span| span.source_line(source));
        self
    }
}

impl From<DeclareError> for CodeGenError {
    fn from(err: DeclareError) -> Self {
        match err {
            DeclareError::DuplicateName(name) => CodeGenError::new(CodeGenErrorKind::DuplicateName(name)),
            DeclareError::TooManySymbols(kind) => CodeGenError::new(CodeGenErrorKind::TooManySymbols(kind)),
        }
    }
}

impl From<NotFound> for CodeGenError {
    fn from(err: NotFound) -> Self {
        CodeGenError::new(CodeGenErrorKind::NotFound(err.name))
    }
}

impl From<OperandError> for CodeGenError {
    fn from(err: OperandError) -> Self {
        CodeGenError::new(CodeGenErrorKind::Operand(err))
    }
}

impl error::Error for CodeGenError {}

impl fmt::Display for CodeGenError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.line {
            Some(line) => {
                writeln!(f, "compile error on line {}: {}", line.number, self.kind)?;
                write!(f, "{}", line)
            }
            None => write!(f, "compile error: {}", self.kind),
        }
    }
}

impl fmt::Display for CodeGenErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use CodeGenErrorKind as K;
        match self {
            K::NotFound(name) => write!(f, "'{}' is not declared", name),
            K::DuplicateName(name) => write!(f, "'{}' is already declared", name),
            K::TooManySymbols(kind) => write!(f, "too many {} variables", kind),
            K::Operand(err) => write!(f, "{}", err),
            K::CharOutOfRange(c) => write!(f, "character {:?} can't be encoded as an integer constant", c),
            K::StringTooLong(len) => write!(f, "string literal of {} characters is too long", len),
            K::TooManyArguments(count) => write!(f, "too many arguments ({})", count),
        }
    }
}
