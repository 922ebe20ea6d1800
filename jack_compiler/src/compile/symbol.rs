use crate::parsing::Type;
use smol_str::SmolStr;
use std::{collections::BTreeMap, error, fmt};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: SmolStr,
    pub ty: Type,
    pub kind: SymbolKind,
    /// Zero-based index among the symbols of the same kind.
    pub position: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    /// Instance variable of the class.
    Field,
    /// Class variable shared by all instances.
    Static,
    /// Subroutine parameter.
    Argument,
    /// Subroutine local variable.
    Local,
}

impl SymbolKind {
    const COUNT: usize = 4;

    #[inline]
    fn index(self) -> usize {
        match self {
            SymbolKind::Field => 0,
            SymbolKind::Static => 1,
            SymbolKind::Argument => 2,
            SymbolKind::Local => 3,
        }
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SymbolKind::Field => write!(f, "field"),
            SymbolKind::Static => write!(f, "static"),
            SymbolKind::Argument => write!(f, "argument"),
            SymbolKind::Local => write!(f, "local"),
        }
    }
}

/// Scope of declared names.
///
/// Positions are handed out per kind in declaration order,
/// so they stay dense.
#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: BTreeMap<SmolStr, Symbol>,
    counts: [u16; SymbolKind::COUNT],
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a new name.
    ///
    /// The table is left unchanged when the name already exists,
    /// or when every position of the kind is taken.
    pub fn add(&mut self, name: &str, ty: Type, kind: SymbolKind) -> Result<&Symbol, DeclareError> {
        if self.symbols.contains_key(name) {
            return Err(DeclareError::DuplicateName(name.into()));
        }

        let position = self.counts[kind.index()];
        self.counts[kind.index()] = position.checked_add(1).ok_or(DeclareError::TooManySymbols(kind))?;

        let name = SmolStr::from(name);
        let symbol = Symbol {
            name: name.clone(),
            ty,
            kind,
            position,
        };

        Ok(self.symbols.entry(name).or_insert(symbol))
    }

    pub fn get(&self, name: &str) -> Result<&Symbol, NotFound> {
        self.symbols.get(name).ok_or_else(|| NotFound { name: name.into() })
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    /// Number of symbols declared of the given kind.
    #[inline]
    pub fn count(&self, kind: SymbolKind) -> u16 {
        self.counts[kind.index()]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn clear(&mut self) {
        self.symbols.clear();
        self.counts = [0; SymbolKind::COUNT];
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclareError {
    /// A name was declared twice in the same scope.
    DuplicateName(SmolStr),
    /// No position left for another symbol of this kind.
    TooManySymbols(SymbolKind),
}

impl error::Error for DeclareError {}

impl fmt::Display for DeclareError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DeclareError::DuplicateName(name) => write!(f, "'{}' is already declared", name),
            DeclareError::TooManySymbols(kind) => write!(f, "too many {} variables", kind),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotFound {
    pub name: SmolStr,
}

impl error::Error for NotFound {}

impl fmt::Display for NotFound {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "'{}' is not declared", self.name)
    }
}
