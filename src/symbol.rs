//! Case-insensitive symbol table.
//!
//! Keys are folded to uppercase before hashing so that `FNV-1a` behaves as a
//! plain case-insensitive map; we reuse [`fnv`] rather than hand-roll the
//! hasher, since `FnvHashMap` already is FNV-1a over the key bytes.

use fnv::FnvHashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Label,
    Equ,
    Set,
    Macro,
    Section,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    pub file: String,
    pub line: usize,
}

impl Origin {
    pub fn new(file: impl Into<String>, line: usize) -> Self {
        Origin {
            file: file.into(),
            line,
        }
    }
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

#[derive(Debug, Clone)]
pub struct MacroBody {
    pub params: Vec<String>,
    pub lines: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Symbol {
    pub kind: SymbolKind,
    pub value: i64,
    pub defined: bool,
    pub referenced: bool,
    pub origin: Origin,
    pub macro_body: Option<MacroBody>,
}

impl Symbol {
    fn new(kind: SymbolKind, value: i64, origin: Origin) -> Self {
        Symbol {
            kind,
            value,
            defined: true,
            referenced: false,
            origin,
            macro_body: None,
        }
    }
}

/// Outcome of [`SymbolTable::define`]; the caller turns `Duplicate` into a
/// diagnostic, since the table itself never reports.
pub enum DefineResult {
    Ok,
    Duplicate { origin: Origin },
}

#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: FnvHashMap<String, Symbol>,
}

fn fold(name: &str) -> String {
    name.to_ascii_uppercase()
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable {
            symbols: FnvHashMap::with_capacity_and_hasher(4096, Default::default()),
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(&fold(name))
    }

    pub fn lookup_mut(&mut self, name: &str) -> Option<&mut Symbol> {
        self.symbols.get_mut(&fold(name))
    }

    /// Marks a symbol as having been read by an expression, for the
    /// `referenced` bookkeeping field.
    pub fn mark_referenced(&mut self, name: &str) {
        if let Some(sym) = self.symbols.get_mut(&fold(name)) {
            sym.referenced = true;
        }
    }

    /// Defines `name` as `kind` with `value`, per the rules in the symbol
    /// table design: Set always overwrites; a prior defined entry hit again
    /// during pass 1 is a duplicate; anything else (pass 2, or a pass-1
    /// Label whose defined-flag was reset) updates silently.
    pub fn define(
        &mut self,
        name: &str,
        kind: SymbolKind,
        value: i64,
        origin: Origin,
        pass: u8,
    ) -> DefineResult {
        let key = fold(name);

        match self.symbols.get_mut(&key) {
            None => {
                self.symbols.insert(key, Symbol::new(kind, value, origin));
                DefineResult::Ok
            }
            Some(existing) => {
                if existing.kind == SymbolKind::Set || kind == SymbolKind::Set {
                    existing.kind = kind;
                    existing.value = value;
                    existing.defined = true;
                    DefineResult::Ok
                } else if existing.defined && pass == 1 {
                    DefineResult::Duplicate {
                        origin: existing.origin.clone(),
                    }
                } else {
                    existing.value = value;
                    existing.defined = true;
                    existing.kind = kind;
                    DefineResult::Ok
                }
            }
        }
    }

    pub fn define_macro(&mut self, name: &str, body: MacroBody, origin: Origin) -> DefineResult {
        let key = fold(name);
        if let Some(existing) = self.symbols.get(&key) {
            if existing.defined {
                return DefineResult::Duplicate {
                    origin: existing.origin.clone(),
                };
            }
        }
        let mut sym = Symbol::new(SymbolKind::Macro, 0, origin);
        sym.macro_body = Some(body);
        self.symbols.insert(key, sym);
        DefineResult::Ok
    }

    /// Clears the defined-flag on every `Label`-kind entry; called at the
    /// top of every driver iteration (including the final emitting pass) so
    /// label addresses are recomputed fresh each time.
    pub fn reset_labels(&mut self) {
        for sym in self.symbols.values_mut() {
            if sym.kind == SymbolKind::Label {
                sym.defined = false;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_insensitive_lookup() {
        let mut table = SymbolTable::new();
        table.define("Foo", SymbolKind::Equ, 42, Origin::new("a.asm", 1), 1);

        assert_eq!(table.lookup("FOO").unwrap().value, 42);
        assert_eq!(table.lookup("foo").unwrap().value, 42);
        assert_eq!(table.lookup("Foo").unwrap().value, 42);
    }

    #[test]
    fn duplicate_label_in_pass_one_is_reported() {
        let mut table = SymbolTable::new();
        table.define("LOOP", SymbolKind::Label, 0, Origin::new("a.asm", 1), 1);

        let result = table.define("LOOP", SymbolKind::Label, 10, Origin::new("a.asm", 5), 1);

        assert!(matches!(result, DefineResult::Duplicate { .. }));
    }

    #[test]
    fn set_symbols_are_freely_reassignable() {
        let mut table = SymbolTable::new();
        table.define("COUNT", SymbolKind::Set, 1, Origin::new("a.asm", 1), 1);
        let result = table.define("COUNT", SymbolKind::Set, 2, Origin::new("a.asm", 2), 1);

        assert!(matches!(result, DefineResult::Ok));
        assert_eq!(table.lookup("COUNT").unwrap().value, 2);
    }

    #[test]
    fn pass_two_redefinition_is_silent() {
        let mut table = SymbolTable::new();
        table.define("LOOP", SymbolKind::Label, 0, Origin::new("a.asm", 1), 1);
        let result = table.define("LOOP", SymbolKind::Label, 0x1000, Origin::new("a.asm", 1), 2);

        assert!(matches!(result, DefineResult::Ok));
        assert_eq!(table.lookup("LOOP").unwrap().value, 0x1000);
    }

    #[test]
    fn reset_labels_only_touches_labels() {
        let mut table = SymbolTable::new();
        table.define("LOOP", SymbolKind::Label, 0x10, Origin::new("a.asm", 1), 1);
        table.define("VAL", SymbolKind::Equ, 0x42, Origin::new("a.asm", 2), 1);

        table.reset_labels();

        assert!(!table.lookup("LOOP").unwrap().defined);
        assert!(table.lookup("VAL").unwrap().defined);
    }
}
