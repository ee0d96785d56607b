use super::decl::{EnumDecl, FunctionDecl, ImportDecl, ModuleDecl, StructDecl};
use super::expr::Expr;
use super::NodeMeta;
use crate::ty::AstType;

#[derive(Debug, Clone)]
pub struct VarDeclStmt {
    pub meta: NodeMeta,
    pub name: String,
    pub internal_name: String,
    pub ty: AstType,
    pub mutable: bool,
    pub init: Option<Expr>,
}

#[derive(Debug, Clone)]
pub struct ReturnStmt {
    pub meta: NodeMeta,
    pub value: Option<Expr>,
}

/// Any of the heterogeneous things a `Block`'s children list can hold — the
/// parser never needs a separate "statement vs. declaration" split at this
/// level, it dispatches on this tag from `parse_sequential`.
#[derive(Debug, Clone)]
pub enum Node {
    VarDecl(VarDeclStmt),
    Return(ReturnStmt),
    Block(Block),
    Expr(Expr),
    Function(FunctionDecl),
    Enum(EnumDecl),
    Struct(StructDecl),
    Module(ModuleDecl),
    Import(ImportDecl),
}

impl Node {
    /// Whether this child, if it were the last instruction emitted so far,
    /// leaves the current basic block terminated — only `Return` does.
    /// Used by the codegen pass's "skip children after a terminated block"
    /// rule.
    pub fn is_return(&self) -> bool {
        matches!(self, Node::Return(_))
    }

    /// Function declarations always define their own fresh block and are
    /// therefore visited even after a terminator.
    pub fn is_function_decl(&self) -> bool {
        matches!(self, Node::Function(_))
    }
}

#[derive(Debug, Clone)]
pub struct Block {
    pub meta: NodeMeta,
    pub children: Vec<Node>,
}

impl Block {
    pub fn new(meta: NodeMeta, children: Vec<Node>) -> Self {
        Self { meta, children }
    }
}
