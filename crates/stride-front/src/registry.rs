//! The scope/symbol registry: an arena of nested scopes carrying symbol and
//! field tables, module-qualified name mangling, and lexical lookup.
//!
//! Modeled as an arena of scope records addressed by a stable integer index
//! (`ScopeId`) rather than parent/child pointers — AST nodes carry an
//! index, never a pointer, which sidesteps any cyclic-ownership question
//! entirely.

use std::rc::Rc;

use indexmap::IndexMap;
use stride_core::{Error, ErrorKind, SourceFile, SourcePosition};

use crate::ty::AstType;

/// `"__"`, joining qualified-name segments.
pub const SEGMENT_DELIMITER: &str = "__";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeType {
    Global,
    Module,
    Block,
    Function,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Enum,
    EnumMember,
    Struct,
    Function,
    Module,
    Variable,
}

#[derive(Debug, Clone)]
pub struct SymbolEntry {
    pub kind: SymbolKind,
    pub internal_name: String,
}

#[derive(Debug, Clone)]
pub struct FieldEntry {
    pub source_name: String,
    pub internal_name: String,
    pub ty: AstType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(pub u32);

#[derive(Debug)]
struct ScopeRecord {
    parent: Option<ScopeId>,
    kind: ScopeType,
    segment: String,
    symbols: IndexMap<String, SymbolEntry>,
    fields: IndexMap<String, FieldEntry>,
}

/// The tree of scopes for one compilation. Scope 0 is always the single
/// global scope shared by every source file in the program.
#[derive(Debug)]
pub struct SymbolRegistry {
    scopes: Vec<ScopeRecord>,
}

impl Default for SymbolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolRegistry {
    pub fn new() -> Self {
        Self {
            scopes: vec![ScopeRecord {
                parent: None,
                kind: ScopeType::Global,
                segment: String::new(),
                symbols: IndexMap::new(),
                fields: IndexMap::new(),
            }],
        }
    }

    pub fn global(&self) -> ScopeId {
        ScopeId(0)
    }

    pub fn kind_of(&self, scope: ScopeId) -> ScopeType {
        self.scopes[scope.0 as usize].kind
    }

    pub fn parent_of(&self, scope: ScopeId) -> Option<ScopeId> {
        self.scopes[scope.0 as usize].parent
    }

    /// Creates a child scope whose qualified prefix is `parent_prefix ++
    /// segment`.
    pub fn derive(&mut self, parent: ScopeId, kind: ScopeType, segment: impl Into<String>) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(ScopeRecord {
            parent: Some(parent),
            kind,
            segment: segment.into(),
            symbols: IndexMap::new(),
            fields: IndexMap::new(),
        });
        id
    }

    /// The qualified-name segments from global down to (and including)
    /// `scope`, skipping the empty root segment.
    pub fn path_segments(&self, scope: ScopeId) -> Vec<String> {
        let mut segments = Vec::new();
        let mut cur = Some(scope);
        while let Some(id) = cur {
            let record = &self.scopes[id.0 as usize];
            if !record.segment.is_empty() {
                segments.push(record.segment.clone());
            }
            cur = record.parent;
        }
        segments.reverse();
        segments
    }

    /// Joins path segments by the segment delimiter; the root scope's
    /// (empty) segment contributes nothing.
    pub fn resolve_internal_name(segments: &[String]) -> String {
        segments.join(SEGMENT_DELIMITER)
    }

    /// The module-qualified internal name a symbol defined in `scope`
    /// would receive, with `name` as its final segment.
    pub fn qualified_name(&self, scope: ScopeId, name: &str) -> String {
        let mut segments = self.path_segments(scope);
        segments.push(name.to_owned());
        Self::resolve_internal_name(&segments)
    }

    /// Inserts a symbol into `scope`. Re-definition of the same source name
    /// within one scope is a `SemanticError` — scopes don't shadow within
    /// themselves, only across nesting.
    pub fn define_symbol(
        &mut self,
        scope: ScopeId,
        name: &str,
        kind: SymbolKind,
        file: &Rc<SourceFile>,
        position: SourcePosition,
    ) -> Result<SymbolEntry, Error> {
        let internal_name = self.qualified_name(scope, name);
        let record = &mut self.scopes[scope.0 as usize];
        if record.symbols.contains_key(name) {
            return Err(Error::semantic(
                format!("'{}' is already defined in this scope", name),
                Rc::clone(file),
                position,
            ));
        }
        let entry = SymbolEntry { kind, internal_name };
        record.symbols.insert(name.to_owned(), entry.clone());
        Ok(entry)
    }

    /// Inserts a field (variable or function parameter) into `scope`. Same
    /// shadowing rule as `define_symbol`.
    pub fn define_field(
        &mut self,
        scope: ScopeId,
        source_name: &str,
        ty: AstType,
        file: &Rc<SourceFile>,
        position: SourcePosition,
    ) -> Result<FieldEntry, Error> {
        let internal_name = self.qualified_name(scope, source_name);
        let record = &mut self.scopes[scope.0 as usize];
        if record.fields.contains_key(source_name) {
            return Err(Error::semantic(
                format!("'{}' is already defined in this scope", source_name),
                Rc::clone(file),
                position,
            ));
        }
        let entry = FieldEntry {
            source_name: source_name.to_owned(),
            internal_name,
            ty,
        };
        record.fields.insert(source_name.to_owned(), entry.clone());
        Ok(entry)
    }

    /// Walks the parent chain looking for a field. Stops ascending once it
    /// leaves a MODULE scope, unless `cross_module` is set: lookups never
    /// cross a MODULE boundary upward by default.
    pub fn field_lookup(&self, scope: ScopeId, name: &str) -> Option<&FieldEntry> {
        self.field_lookup_inner(scope, name, false)
    }

    fn field_lookup_inner(&self, scope: ScopeId, name: &str, mut crossed_module: bool) -> Option<&FieldEntry> {
        let mut cur = Some(scope);
        while let Some(id) = cur {
            let record = &self.scopes[id.0 as usize];
            if let Some(entry) = record.fields.get(name) {
                return Some(entry);
            }
            if record.kind == ScopeType::Module {
                if crossed_module {
                    return None;
                }
                crossed_module = true;
            }
            cur = record.parent;
        }
        None
    }

    /// Same traversal semantics as `field_lookup`, optionally filtered to a
    /// single `SymbolKind`.
    pub fn symbol_lookup(&self, scope: ScopeId, name: &str, kind_filter: Option<SymbolKind>) -> Option<&SymbolEntry> {
        let mut cur = Some(scope);
        let mut crossed_module = false;
        while let Some(id) = cur {
            let record = &self.scopes[id.0 as usize];
            if let Some(entry) = record.symbols.get(name) {
                if kind_filter.is_none_or(|k| k == entry.kind) {
                    return Some(entry);
                }
            }
            if record.kind == ScopeType::Module {
                if crossed_module {
                    return None;
                }
                crossed_module = true;
            }
            cur = record.parent;
        }
        None
    }

    /// Global resolution used by import/qualified-path handling only:
    /// walks down from the global scope by successive module segments,
    /// then looks up the final symbol in the resulting scope.
    pub fn resolve_qualified(&self, segments: &[String]) -> Option<&SymbolEntry> {
        if segments.is_empty() {
            return None;
        }
        let (path, last) = segments.split_at(segments.len() - 1);
        let mut scope = self.global();
        for part in path {
            scope = self.child_module(scope, part)?;
        }
        self.scopes[scope.0 as usize].symbols.get(&last[0])
    }

    fn child_module(&self, scope: ScopeId, segment: &str) -> Option<ScopeId> {
        for (idx, record) in self.scopes.iter().enumerate() {
            if record.parent == Some(scope) && record.kind == ScopeType::Module && record.segment == segment {
                return Some(ScopeId(idx as u32));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos() -> SourcePosition {
        SourcePosition::new(0, 1)
    }

    #[test]
    fn nested_module_segments_join_with_delimiter() {
        let mut reg = SymbolRegistry::new();
        let a = reg.derive(reg.global(), ScopeType::Module, "a");
        let b = reg.derive(a, ScopeType::Module, "b");
        let file = SourceFile::new("t.sr", "");
        let entry = reg.define_symbol(b, "g", SymbolKind::Function, &file, pos()).unwrap();
        assert_eq!(entry.internal_name, "a__b__g");
    }

    #[test]
    fn redefinition_in_same_scope_is_an_error() {
        let mut reg = SymbolRegistry::new();
        let file = SourceFile::new("t.sr", "");
        let scope = reg.global();
        reg.define_symbol(scope, "A", SymbolKind::EnumMember, &file, pos()).unwrap();
        let err = reg.define_symbol(scope, "A", SymbolKind::EnumMember, &file, pos()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Semantic);
    }

    #[test]
    fn field_lookup_walks_parent_chain_within_one_module() {
        let mut reg = SymbolRegistry::new();
        let file = SourceFile::new("t.sr", "");
        let func = reg.derive(reg.global(), ScopeType::Function, "f");
        let block = reg.derive(func, ScopeType::Block, "");
        reg.define_field(func, "x", AstType::i32(), &file, pos()).unwrap();
        assert!(reg.field_lookup(block, "x").is_some());
    }

    #[test]
    fn qualified_resolution_finds_nested_module_function() {
        let mut reg = SymbolRegistry::new();
        let file = SourceFile::new("t.sr", "");
        let a = reg.derive(reg.global(), ScopeType::Module, "a");
        let b = reg.derive(a, ScopeType::Module, "b");
        reg.define_symbol(b, "g", SymbolKind::Function, &file, pos()).unwrap();
        let found = reg.resolve_qualified(&["a".to_owned(), "b".to_owned(), "g".to_owned()]);
        assert_eq!(found.unwrap().internal_name, "a__b__g");
    }
}
