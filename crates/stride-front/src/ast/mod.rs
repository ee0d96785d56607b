//! The AST node taxonomy: a polymorphic tree of expressions, statements,
//! and declarations. Modeled as tagged variants — sum types per category —
//! rather than a class hierarchy; the "parseable / synthesisable /
//! reducible" capability split becomes ordinary functions that
//! pattern-match on the tag.

mod decl;
mod expr;
mod stmt;

pub use decl::{EnumDecl, EnumMember, FunctionDecl, FunctionParam, ImportDecl, ModuleDecl, StructDecl, StructMember};
pub use expr::{ArithOp, ComparisonOp, Expr, ExprKind, Literal, LogicalOp};
pub use stmt::{Block, Node, ReturnStmt, VarDeclStmt};

use std::rc::Rc;

use stride_core::{SourceFile, SourcePosition};

use crate::registry::ScopeId;
use crate::ty::{AstType, TypeFlags};

/// Fields every AST node carries: its source file and span for
/// diagnostics, the scope it was parsed in, its statically-known type (if
/// any), and its type-flags bitset.
#[derive(Debug, Clone)]
pub struct NodeMeta {
    pub source: Rc<SourceFile>,
    pub position: SourcePosition,
    pub scope: ScopeId,
    pub ty: Option<AstType>,
    pub flags: TypeFlags,
}

impl NodeMeta {
    pub fn new(source: Rc<SourceFile>, position: SourcePosition, scope: ScopeId) -> Self {
        Self {
            source,
            position,
            scope,
            ty: None,
            flags: crate::ty::FLAG_NONE,
        }
    }

    pub fn with_type(mut self, ty: AstType) -> Self {
        self.ty = Some(ty);
        self
    }

    pub fn with_flags(mut self, flags: TypeFlags) -> Self {
        self.flags = flags;
        self
    }
}
