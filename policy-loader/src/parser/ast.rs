//! Abstract Syntax Tree types for the policy text language (spec §6).
//!
//! Names are kept as plain `String`s here; resolving them to arena handles
//! (and reporting undefined references) is the compiler's job, not the
//! parser's.

use serde::{Deserialize, Serialize};

/// The root AST node: a policy source file is a flat list of statements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyAst {
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    Type(TypeDecl),
    TypeAlias { name: String, aliases: Vec<String> },
    Attribute(String),
    TypeAttribute { ty: String, attrs: Vec<String> },
    Class(ClassDecl),
    Common(ClassDecl),
    Bool { name: String, default: bool },
    Sensitivity { name: String, alias: Option<String> },
    Dominance(Vec<String>),
    Category { name: String, alias: Option<String> },
    Level { sensitivity: String, categories: Vec<String> },
    Av(AvDecl),
    Te(TeDecl),
    Role(RoleDecl),
    RoleAllow { source: Vec<String>, target: Vec<String> },
    RoleTransition { source_roles: Vec<String>, target_types: TypeSetAst, default_role: String },
    User(UserDecl),
    RangeTransition { source: TypeSetAst, target: TypeSetAst, range: RangeAst },
    Constrain { class: String, perms: Vec<String>, mls: bool, expr: ConstraintExprAst },
    Conditional(ConditionalDecl),
    Sid { name: String, context: ContextAst },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDecl {
    pub name: String,
    pub attrs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDecl {
    pub name: String,
    pub inherits: Option<String>,
    pub perms: Vec<String>,
}

/// A source/target operand: a possibly-negated, possibly-starred set of
/// names, with an optional trailing `self`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeSetAst {
    pub names: Vec<String>,
    pub includes_self: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AvKind {
    Allow,
    NeverAllow,
    AuditAllow,
    DontAudit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvDecl {
    pub kind: AvKind,
    pub source: TypeSetAst,
    pub target: TypeSetAst,
    pub classes: Vec<String>,
    pub perms: Vec<String>,
    pub conditional: Option<CondBindingAst>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TeKind {
    TypeTransition,
    TypeChange,
    TypeMember,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeDecl {
    pub kind: TeKind,
    pub source: TypeSetAst,
    pub target: TypeSetAst,
    pub classes: Vec<String>,
    pub default_type: String,
    pub conditional: Option<CondBindingAst>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleDecl {
    pub name: String,
    pub types: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserDecl {
    pub name: String,
    pub roles: Vec<String>,
    pub range: Option<RangeAst>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelAst {
    pub sensitivity: String,
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeAst {
    pub low: LevelAst,
    pub high: LevelAst,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextAst {
    pub user: String,
    pub role: String,
    pub type_: String,
    pub range: Option<RangeAst>,
}

/// One node of a constraint's expression, parsed as a small recursive tree
/// rather than the runtime's flattened RPN stream — the compiler linearizes
/// it during the second pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConstraintExprAst {
    AttrOpAttr { attr: String, op: String },
    AttrOpNameSet { attr: String, op: String, names: Vec<String> },
    Not(Box<ConstraintExprAst>),
    And(Box<ConstraintExprAst>, Box<ConstraintExprAst>),
    Or(Box<ConstraintExprAst>, Box<ConstraintExprAst>),
}

/// A boolean expression over Booleans, in recursive form; `CondId` binding
/// resolution and RPN flattening happen in the compiler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BoolExprAst {
    Ref(String),
    Not(Box<BoolExprAst>),
    And(Box<BoolExprAst>, Box<BoolExprAst>),
    Or(Box<BoolExprAst>, Box<BoolExprAst>),
    Xor(Box<BoolExprAst>, Box<BoolExprAst>),
    Eq(Box<BoolExprAst>, Box<BoolExprAst>),
    Neq(Box<BoolExprAst>, Box<BoolExprAst>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BranchSideAst {
    True,
    False,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CondBindingAst {
    pub expr: BoolExprAst,
    pub branch: BranchSideAst,
}

/// An `if (expr) { ... } else { ... }` block; each contained rule carries
/// its own `CondBindingAst` once lowered, so the compiler flattens this
/// into a run of ordinary `Av`/`Te` statements rather than keeping a nested
/// AST node downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionalDecl {
    pub expr: BoolExprAst,
    pub true_branch: Vec<Statement>,
    pub false_branch: Vec<Statement>,
}
