//! Lexer token types for the SELinux-family policy text language (spec §6).

/// Token kinds recognized by the scanner.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Declaration keywords
    Type,
    TypeAlias,
    Alias,
    Attribute,
    TypeAttribute,
    Class,
    Common,
    Inherits,
    Bool,
    Sensitivity,
    Dominance,
    Category,
    Level,

    // Rule keywords
    Allow,
    NeverAllow,
    AuditAllow,
    DontAudit,
    TypeTransition,
    TypeChange,
    TypeMember,

    // RBAC keywords
    Role,
    Types,
    RoleAllow,
    RoleTransition,
    User,
    Roles,

    // MLS keywords
    RangeKw,
    RangeTransition,

    // Constraints
    Constrain,
    MlsConstrain,
    Dom,
    Domby,
    Incomp,

    // Conditionals
    If,
    Else,
    True,
    False,

    // Initial SIDs
    Sid,

    // Operators
    Eq,
    Neq,
    And,
    Or,
    Not,
    Xor,

    // Delimiters
    LBrace,
    RBrace,
    LParen,
    RParen,
    Colon,
    Semi,
    Comma,
    Dot,
    Tilde,
    Star,
    Dash,

    // Literals
    Identifier(String),
    Number(u32),

    Eof,
    Error(String),
}

impl TokenKind {
    /// Map a lowercase identifier to its keyword token, if it is one.
    pub fn keyword(ident: &str) -> Option<TokenKind> {
        Some(match ident {
            "type" => TokenKind::Type,
            "typealias" => TokenKind::TypeAlias,
            "alias" => TokenKind::Alias,
            "attribute" => TokenKind::Attribute,
            "typeattribute" => TokenKind::TypeAttribute,
            "class" => TokenKind::Class,
            "common" => TokenKind::Common,
            "inherits" => TokenKind::Inherits,
            "bool" => TokenKind::Bool,
            "sensitivity" => TokenKind::Sensitivity,
            "dominance" => TokenKind::Dominance,
            "category" => TokenKind::Category,
            "level" => TokenKind::Level,
            "allow" => TokenKind::Allow,
            "neverallow" => TokenKind::NeverAllow,
            "auditallow" => TokenKind::AuditAllow,
            "dontaudit" => TokenKind::DontAudit,
            "type_transition" => TokenKind::TypeTransition,
            "type_change" => TokenKind::TypeChange,
            "type_member" => TokenKind::TypeMember,
            "role" => TokenKind::Role,
            "types" => TokenKind::Types,
            "role_allow" => TokenKind::RoleAllow,
            "role_transition" => TokenKind::RoleTransition,
            "user" => TokenKind::User,
            "roles" => TokenKind::Roles,
            "range" => TokenKind::RangeKw,
            "range_transition" => TokenKind::RangeTransition,
            "constrain" => TokenKind::Constrain,
            "mlsconstrain" => TokenKind::MlsConstrain,
            "dom" => TokenKind::Dom,
            "domby" => TokenKind::Domby,
            "incomp" => TokenKind::Incomp,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "sid" => TokenKind::Sid,
            _ => return None,
        })
    }
}

/// Source location span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

impl Default for Span {
    fn default() -> Self {
        Self {
            start: 0,
            end: 0,
            line: 1,
            column: 1,
        }
    }
}

/// A token with its kind and source location.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}
