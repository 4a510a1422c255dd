//! Symbol module - String interning for efficient identifier handling.
//!
//! A [`Symbol`] is a compact 4-byte handle to an interned string. Interning
//! gives O(1) comparison for the identifiers that flow through every stage
//! of the pipeline, and the names the code generator keys its lowerings on
//! (`Channel`, `sleep`, `length`, ...) are pre-interned at fixed indices so
//! they can live in `const` tables.
//!
//! Interned strings are leaked to obtain `'static` lifetime. That is
//! acceptable for a batch compiler: total memory is bounded by the source
//! text and released when the process exits.
//!
//! # Examples
//!
//! ```
//! use sailc_util::symbol::{sym, Symbol};
//!
//! let a = Symbol::intern("area");
//! let b = Symbol::intern("area");
//! assert_eq!(a, b);
//! assert_eq!(a.as_str(), "area");
//!
//! assert_eq!(sym::CHANNEL.as_str(), "Channel");
//! ```

use std::fmt;
use std::sync::{LazyLock, RwLock};

use ahash::RandomState;
use dashmap::DashMap;

/// A handle to an interned string.
///
/// Symbols compare by index, so equality is a single integer comparison.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(u32);

impl Symbol {
    /// Intern a string, returning its stable handle.
    ///
    /// Interning the same text twice yields the same symbol.
    pub fn intern(text: &str) -> Symbol {
        Symbol(INTERNER.intern(text))
    }

    /// The interned text.
    ///
    /// The returned reference is `'static`: interned strings live for the
    /// whole compilation.
    pub fn as_str(&self) -> &'static str {
        INTERNER.get(self.0)
    }

    /// The raw interner index.
    #[inline]
    pub fn index(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({:?})", self.as_str())
    }
}

/// Well-known symbols, pre-interned at fixed indices.
///
/// The constant order must match [`KNOWN_SYMBOLS`]; `test_known_symbols`
/// checks the correspondence.
pub mod sym {
    use super::Symbol;

    pub const MAIN: Symbol = Symbol(0);
    pub const SELF_: Symbol = Symbol(1);
    pub const NEW: Symbol = Symbol(2);
    pub const CHANNEL: Symbol = Symbol(3);
    pub const NUMBER: Symbol = Symbol(4);
    pub const STRING: Symbol = Symbol(5);
    pub const BOOLEAN: Symbol = Symbol(6);
    pub const VOID: Symbol = Symbol(7);
    pub const LIST: Symbol = Symbol(8);
    pub const OPTIONAL: Symbol = Symbol(9);
    pub const PRINT: Symbol = Symbol(10);
    pub const INFO: Symbol = Symbol(11);
    pub const DEBUG: Symbol = Symbol(12);
    pub const WARN: Symbol = Symbol(13);
    pub const ERROR: Symbol = Symbol(14);
    pub const LENGTH: Symbol = Symbol(15);
    pub const MAP: Symbol = Symbol(16);
    pub const FILTER: Symbol = Symbol(17);
    pub const REDUCE: Symbol = Symbol(18);
    pub const CONCAT: Symbol = Symbol(19);
    pub const SEND: Symbol = Symbol(20);
    pub const RECEIVE: Symbol = Symbol(21);
    pub const SLEEP: Symbol = Symbol(22);
    pub const PARALLEL: Symbol = Symbol(23);
    pub const WILDCARD: Symbol = Symbol(24);
}

/// Texts for the [`sym`] constants, in index order.
const KNOWN_SYMBOLS: &[&str] = &[
    "main", "self", "new", "Channel", "number", "string", "boolean", "void", "List", "Optional",
    "print", "info", "debug", "warn", "error", "length", "map", "filter", "reduce", "concat",
    "send", "receive", "sleep", "parallel", "_",
];

/// Global string table.
///
/// The map keys are the leaked strings themselves, so lookup never
/// allocates; the vector gives O(1) index-to-text resolution.
struct Interner {
    names: DashMap<&'static str, u32, RandomState>,
    strings: RwLock<Vec<&'static str>>,
}

static INTERNER: LazyLock<Interner> = LazyLock::new(|| {
    let interner = Interner {
        names: DashMap::with_hasher(RandomState::new()),
        strings: RwLock::new(Vec::with_capacity(256)),
    };
    for text in KNOWN_SYMBOLS {
        interner.intern(text);
    }
    interner
});

impl Interner {
    fn intern(&self, text: &str) -> u32 {
        if let Some(index) = self.names.get(text) {
            return *index;
        }
        let mut strings = self.strings.write().unwrap();
        // Re-check under the write lock: another thread may have won.
        if let Some(index) = self.names.get(text) {
            return *index;
        }
        let leaked: &'static str = Box::leak(text.to_owned().into_boxed_str());
        let index = strings.len() as u32;
        strings.push(leaked);
        self.names.insert(leaked, index);
        index
    }

    fn get(&self, index: u32) -> &'static str {
        self.strings.read().unwrap()[index as usize]
    }
}
