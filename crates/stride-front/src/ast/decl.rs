use super::expr::Literal;
use super::stmt::Block;
use super::NodeMeta;
use crate::registry::ScopeId;
use crate::ty::AstType;

#[derive(Debug, Clone)]
pub struct FunctionParam {
    pub meta: NodeMeta,
    pub name: String,
    pub ty: AstType,
    pub mutable: bool,
    pub variadic: bool,
}

#[derive(Debug, Clone)]
pub struct FunctionDecl {
    pub meta: NodeMeta,
    pub name: String,
    /// The mangled name this declaration will be registered under in the
    /// backend module — `name` unchanged for `main` and for externs
    /// (no-body declarations), the two mangling exceptions.
    pub internal_name: String,
    pub params: Vec<FunctionParam>,
    pub ret: AstType,
    pub is_variadic: bool,
    /// `scope` is the FUNCTION child scope holding the parameters; `body`'s
    /// own scope is a BLOCK child of it.
    pub scope: ScopeId,
    pub body: Option<Block>,
}

impl FunctionDecl {
    pub fn is_extern(&self) -> bool {
        self.body.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct EnumMember {
    pub meta: NodeMeta,
    pub name: String,
    pub value: Literal,
}

#[derive(Debug, Clone)]
pub struct EnumDecl {
    pub meta: NodeMeta,
    pub name: String,
    pub scope: ScopeId,
    pub members: Vec<EnumMember>,
}

#[derive(Debug, Clone)]
pub struct StructMember {
    pub meta: NodeMeta,
    pub name: String,
    pub ty: AstType,
}

#[derive(Debug, Clone)]
pub struct StructDecl {
    pub meta: NodeMeta,
    pub name: String,
    pub scope: ScopeId,
    /// `struct Foo = Bar;` — an alias rather than a member list.
    pub alias: Option<AstType>,
    pub members: Vec<StructMember>,
}

#[derive(Debug, Clone)]
pub struct ModuleDecl {
    pub meta: NodeMeta,
    pub name: String,
    pub scope: ScopeId,
    pub body: Block,
}

#[derive(Debug, Clone)]
pub struct ImportDecl {
    pub meta: NodeMeta,
    pub module_base: String,
    pub submodules: Vec<String>,
}
