//! Scope- and frame-aware symbol table for the PL/0 compiler.
//!
//! The table distinguishes three addressing schemes:
//! - **Constants**: folded at compile time, never stored
//! - **Global variables**: absolute addresses from [`GLOBAL_BASE`] upwards
//! - **Parameters and locals**: offsets into the active subprogram's frame
//!
//! Symbols are keyed by `(scope, name)`. The global scope holds constants and
//! global variables; each subprogram scope holds its constants, parameters and
//! locals. Leaving a subprogram makes its symbols unreachable without deleting
//! them, so re-entering the same scope finds the same frame layout.

use crate::error::{CompileError, Result};
use crate::frame::GLOBAL_BASE;
use std::collections::HashMap;
use std::fmt;

/// A symbol scope: the program level or a named subprogram.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    Global,
    Subprogram(String),
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Global => write!(f, "global scope"),
            Scope::Subprogram(name) => write!(f, "subprogram '{}'", name),
        }
    }
}

/// What a name is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    /// Compile-time constant value.
    Const(i32),
    /// Absolute word address.
    GlobalVar(u16),
    /// Frame offset `1..=P`.
    Param { offset: u16 },
    /// Frame offset `P+1..=P+L`.
    Local { offset: u16 },
}

/// Parameters plus locals one frame can hold, keeping `1 + P + L` in a word.
const MAX_FRAME_SLOTS: usize = u16::MAX as usize - 1;

/// Parameter and local names of one subprogram, in declaration order.
///
/// Frame offset 0 holds the caller's frame pointer, parameters follow at
/// `1..=P` and locals at `P+1..=P+L`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameLayout {
    params: Vec<String>,
    locals: Vec<String>,
}

// Counts fit in u16: `declare_frame_slot` stops at `MAX_FRAME_SLOTS`.
impl FrameLayout {
    pub fn param_count(&self) -> u16 {
        self.params.len() as u16
    }

    pub fn local_count(&self) -> u16 {
        self.locals.len() as u16
    }

    /// Words per activation: link + parameters + locals.
    pub fn size(&self) -> u16 {
        1 + self.param_count() + self.local_count()
    }
}

/// Symbol table for one code-generation run.
#[derive(Debug)]
pub struct SymbolTable {
    /// Symbols per scope.
    scopes: HashMap<Scope, HashMap<String, Symbol>>,
    /// Frame layouts per subprogram, fixed at declaration time.
    frames: HashMap<String, FrameLayout>,
    /// Active subprogram scopes, innermost last.
    active: Vec<String>,
    /// Next free global address, `None` once `0xFFFF` is taken.
    next_global: Option<u16>,
}

impl SymbolTable {
    /// Create an empty table with globals starting at [`GLOBAL_BASE`].
    pub fn new() -> Self {
        Self::with_base(GLOBAL_BASE)
    }

    /// Create an empty table with globals starting at `base`.
    pub fn with_base(base: u16) -> Self {
        Self {
            scopes: HashMap::new(),
            frames: HashMap::new(),
            active: Vec::new(),
            next_global: Some(base),
        }
    }

    /// The scope declarations currently go into.
    pub fn current_scope(&self) -> Scope {
        match self.active.last() {
            Some(name) => Scope::Subprogram(name.clone()),
            None => Scope::Global,
        }
    }

    fn scope_symbols(&self, scope: &Scope) -> Option<&HashMap<String, Symbol>> {
        self.scopes.get(scope)
    }

    fn get(&self, scope: &Scope, name: &str) -> Option<Symbol> {
        self.scope_symbols(scope)
            .and_then(|symbols| symbols.get(name))
            .copied()
    }

    fn insert(&mut self, scope: Scope, name: &str, symbol: Symbol) {
        self.scopes
            .entry(scope)
            .or_default()
            .insert(name.to_string(), symbol);
    }

    // ========================================================================
    // Declarations
    // ========================================================================

    /// Bind a constant in the current scope.
    ///
    /// Rebinding an existing constant replaces its value; a variable of the
    /// same name in the same scope is a redeclaration error.
    pub fn declare_constant(&mut self, name: &str, value: i32) -> Result<()> {
        let scope = self.current_scope();
        match self.get(&scope, name) {
            Some(Symbol::Const(_)) | None => {
                self.insert(scope, name, Symbol::Const(value));
                Ok(())
            }
            Some(_) => Err(CompileError::redeclaration(name, scope)),
        }
    }

    /// Allocate the next global address for `name`.
    ///
    /// Idempotent for an existing global variable.
    pub fn declare_global_variable(&mut self, name: &str) -> Result<u16> {
        match self.get(&Scope::Global, name) {
            Some(Symbol::GlobalVar(address)) => Ok(address),
            Some(_) => Err(CompileError::redeclaration(name, Scope::Global)),
            None => {
                let address = self
                    .next_global
                    .ok_or_else(|| CompileError::address_space_exhausted(name))?;
                self.next_global = address.checked_add(1);
                self.insert(Scope::Global, name, Symbol::GlobalVar(address));
                Ok(address)
            }
        }
    }

    /// Enter a subprogram scope, creating its frame layout on first entry.
    pub fn enter_subprogram(&mut self, name: &str) {
        self.frames.entry(name.to_string()).or_default();
        self.active.push(name.to_string());
    }

    /// Leave the innermost subprogram scope.
    pub fn exit_subprogram(&mut self) -> Option<String> {
        self.active.pop()
    }

    /// Append a parameter to the current subprogram's frame.
    ///
    /// Outside any subprogram the name becomes a global variable.
    pub fn declare_parameter(&mut self, name: &str) -> Result<()> {
        self.declare_frame_slot(name, true)
    }

    /// Append a local to the current subprogram's frame.
    ///
    /// Outside any subprogram the name becomes a global variable.
    pub fn declare_local(&mut self, name: &str) -> Result<()> {
        self.declare_frame_slot(name, false)
    }

    fn declare_frame_slot(&mut self, name: &str, is_param: bool) -> Result<()> {
        let Some(subprogram) = self.active.last().cloned() else {
            return self.declare_global_variable(name).map(|_| ());
        };
        let scope = Scope::Subprogram(subprogram.clone());

        match self.get(&scope, name) {
            Some(Symbol::Const(_)) => return Err(CompileError::redeclaration(name, scope)),
            Some(_) => return Ok(()),
            None => {}
        }

        let frame = self.frames.entry(subprogram).or_default();
        if frame.params.len() + frame.locals.len() >= MAX_FRAME_SLOTS {
            return Err(CompileError::address_space_exhausted(name));
        }

        let symbol = if is_param {
            frame.params.push(name.to_string());
            // Locals sit after the parameters.
            if let Some(symbols) = self.scopes.get_mut(&scope) {
                for symbol in symbols.values_mut() {
                    if let Symbol::Local { offset } = symbol {
                        *offset += 1;
                    }
                }
            }
            Symbol::Param {
                offset: frame.param_count(),
            }
        } else {
            frame.locals.push(name.to_string());
            Symbol::Local {
                offset: frame.size() - 1,
            }
        };
        self.insert(scope, name, symbol);
        Ok(())
    }

    // ========================================================================
    // Lookups
    // ========================================================================

    /// Symbol bound to `name` in the current scope, falling back to global.
    pub fn lookup(&self, name: &str) -> Option<Symbol> {
        self.get(&self.current_scope(), name)
            .or_else(|| self.get(&Scope::Global, name))
    }

    /// Constant value of `name` in the current scope, then the global scope.
    ///
    /// `None` is not an error: it tells the caller `name` is not a constant.
    pub fn lookup_constant(&self, name: &str) -> Option<i32> {
        let current = self.current_scope();
        [current, Scope::Global]
            .iter()
            .find_map(|scope| match self.get(scope, name) {
                Some(Symbol::Const(value)) => Some(value),
                _ => None,
            })
    }

    /// Frame offset of a parameter or local of the current subprogram.
    pub fn lookup_frame_offset(&self, name: &str) -> Option<u16> {
        let subprogram = self.active.last()?;
        match self.get(&Scope::Subprogram(subprogram.clone()), name)? {
            Symbol::Param { offset } | Symbol::Local { offset } => Some(offset),
            Symbol::Const(_) | Symbol::GlobalVar(_) => None,
        }
    }

    /// Address of a declared global variable.
    pub fn lookup_global_address(&self, name: &str) -> Result<u16> {
        match self.get(&Scope::Global, name) {
            Some(Symbol::GlobalVar(address)) => Ok(address),
            _ => Err(CompileError::undeclared(name)),
        }
    }

    /// `(parameter count, local count)` of a subprogram.
    pub fn frame_size(&self, subprogram: &str) -> Option<(u16, u16)> {
        self.frames
            .get(subprogram)
            .map(|frame| (frame.param_count(), frame.local_count()))
    }

    /// Full frame layout of a subprogram.
    pub fn frame_layout(&self, subprogram: &str) -> Option<&FrameLayout> {
        self.frames.get(subprogram)
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}
