//! Parser implementation: recursive descent over the token stream produced
//! by the lexer, building a [`PolicyAst`].

use super::ast::*;
use crate::lexer::*;

/// A parse error with source location, in the style produced by the lexer's
/// `Span`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}: {}", self.line, self.column, self.message)
    }
}

impl std::error::Error for ParseError {}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    pub fn parse(&mut self) -> Result<PolicyAst, ParseError> {
        let mut statements = Vec::new();
        while !self.is_at_end() {
            statements.push(self.parse_statement()?);
        }
        Ok(PolicyAst { statements })
    }

    fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        match &self.current().kind {
            TokenKind::Type => self.parse_type(),
            TokenKind::TypeAlias => self.parse_typealias(),
            TokenKind::Attribute => self.parse_attribute(),
            TokenKind::TypeAttribute => self.parse_typeattribute(),
            TokenKind::Class => self.parse_class(false),
            TokenKind::Common => self.parse_class(true),
            TokenKind::Bool => self.parse_bool(),
            TokenKind::Sensitivity => self.parse_sensitivity(),
            TokenKind::Dominance => self.parse_dominance(),
            TokenKind::Category => self.parse_category(),
            TokenKind::Level => self.parse_level(),
            TokenKind::Allow | TokenKind::NeverAllow | TokenKind::AuditAllow | TokenKind::DontAudit => {
                Ok(Statement::Av(self.parse_av(None)?))
            }
            TokenKind::TypeTransition | TokenKind::TypeChange | TokenKind::TypeMember => {
                Ok(Statement::Te(self.parse_te(None)?))
            }
            TokenKind::Role => self.parse_role(),
            TokenKind::RoleAllow => self.parse_role_allow(),
            TokenKind::RoleTransition => self.parse_role_transition(),
            TokenKind::User => self.parse_user(),
            TokenKind::RangeTransition => self.parse_range_transition(),
            TokenKind::Constrain => self.parse_constrain(false),
            TokenKind::MlsConstrain => self.parse_constrain(true),
            TokenKind::If => Ok(Statement::Conditional(self.parse_conditional()?)),
            TokenKind::Sid => self.parse_sid(),
            other => Err(self.error(&format!("unexpected token at top level: {other:?}"))),
        }
    }

    fn parse_type(&mut self) -> Result<Statement, ParseError> {
        self.advance();
        let name = self.expect_identifier()?;
        let mut attrs = Vec::new();
        if self.check(&TokenKind::Comma) {
            while self.check(&TokenKind::Comma) {
                self.advance();
                attrs.push(self.expect_identifier()?);
            }
        }
        self.expect(TokenKind::Semi)?;
        Ok(Statement::Type(TypeDecl { name, attrs }))
    }

    fn parse_typealias(&mut self) -> Result<Statement, ParseError> {
        self.advance();
        let name = self.expect_identifier()?;
        self.expect(TokenKind::Alias)?;
        let mut aliases = vec![self.expect_identifier()?];
        while self.check(&TokenKind::Comma) {
            self.advance();
            aliases.push(self.expect_identifier()?);
        }
        self.expect(TokenKind::Semi)?;
        Ok(Statement::TypeAlias { name, aliases })
    }

    fn parse_attribute(&mut self) -> Result<Statement, ParseError> {
        self.advance();
        let name = self.expect_identifier()?;
        self.expect(TokenKind::Semi)?;
        Ok(Statement::Attribute(name))
    }

    fn parse_typeattribute(&mut self) -> Result<Statement, ParseError> {
        self.advance();
        let ty = self.expect_identifier()?;
        let mut attrs = vec![self.expect_identifier()?];
        while self.check(&TokenKind::Comma) {
            self.advance();
            attrs.push(self.expect_identifier()?);
        }
        self.expect(TokenKind::Semi)?;
        Ok(Statement::TypeAttribute { ty, attrs })
    }

    fn parse_class(&mut self, is_common: bool) -> Result<Statement, ParseError> {
        self.advance();
        let name = self.expect_identifier()?;
        let inherits = if self.check(&TokenKind::Inherits) {
            self.advance();
            Some(self.expect_identifier()?)
        } else {
            None
        };
        self.expect(TokenKind::LBrace)?;
        let mut perms = Vec::new();
        while !self.check(&TokenKind::RBrace) {
            perms.push(self.expect_identifier()?);
        }
        self.expect(TokenKind::RBrace)?;
        let decl = ClassDecl { name, inherits, perms };
        Ok(if is_common { Statement::Common(decl) } else { Statement::Class(decl) })
    }

    fn parse_bool(&mut self) -> Result<Statement, ParseError> {
        self.advance();
        let name = self.expect_identifier()?;
        let default = self.expect_bool_literal()?;
        self.expect(TokenKind::Semi)?;
        Ok(Statement::Bool { name, default })
    }

    fn parse_sensitivity(&mut self) -> Result<Statement, ParseError> {
        self.advance();
        let name = self.expect_identifier()?;
        let alias = if self.check(&TokenKind::Alias) {
            self.advance();
            Some(self.expect_identifier()?)
        } else {
            None
        };
        self.expect(TokenKind::Semi)?;
        Ok(Statement::Sensitivity { name, alias })
    }

    fn parse_dominance(&mut self) -> Result<Statement, ParseError> {
        self.advance();
        self.expect(TokenKind::LBrace)?;
        let mut order = Vec::new();
        while !self.check(&TokenKind::RBrace) {
            order.push(self.expect_identifier()?);
        }
        self.expect(TokenKind::RBrace)?;
        Ok(Statement::Dominance(order))
    }

    fn parse_category(&mut self) -> Result<Statement, ParseError> {
        self.advance();
        let name = self.expect_identifier()?;
        let alias = if self.check(&TokenKind::Alias) {
            self.advance();
            Some(self.expect_identifier()?)
        } else {
            None
        };
        self.expect(TokenKind::Semi)?;
        Ok(Statement::Category { name, alias })
    }

    fn parse_level(&mut self) -> Result<Statement, ParseError> {
        self.advance();
        let sensitivity = self.expect_identifier()?;
        self.expect(TokenKind::Colon)?;
        let categories = self.parse_category_range_list()?;
        self.expect(TokenKind::Semi)?;
        Ok(Statement::Level { sensitivity, categories })
    }

    fn parse_category_range_list(&mut self) -> Result<Vec<String>, ParseError> {
        let mut categories = vec![self.expect_identifier()?];
        while self.check(&TokenKind::Comma) {
            self.advance();
            categories.push(self.expect_identifier()?);
        }
        Ok(categories)
    }

    /// Parse an `allow`/`neverallow`/`auditallow`/`dontaudit` rule.
    /// `conditional` is the binding supplied by an enclosing `if` block, if
    /// any.
    fn parse_av(&mut self, conditional: Option<CondBindingAst>) -> Result<AvDecl, ParseError> {
        let kind = match self.current().kind {
            TokenKind::Allow => AvKind::Allow,
            TokenKind::NeverAllow => AvKind::NeverAllow,
            TokenKind::AuditAllow => AvKind::AuditAllow,
            TokenKind::DontAudit => AvKind::DontAudit,
            _ => return Err(self.error("expected an access-vector rule keyword")),
        };
        self.advance();
        let source = self.parse_type_set()?;
        let target = self.parse_type_set()?;
        self.expect(TokenKind::Colon)?;
        let classes = self.parse_name_or_set()?;
        let perms = self.parse_name_or_set()?;
        self.expect(TokenKind::Semi)?;
        Ok(AvDecl { kind, source, target, classes, perms, conditional })
    }

    fn parse_te(&mut self, conditional: Option<CondBindingAst>) -> Result<TeDecl, ParseError> {
        let kind = match self.current().kind {
            TokenKind::TypeTransition => TeKind::TypeTransition,
            TokenKind::TypeChange => TeKind::TypeChange,
            TokenKind::TypeMember => TeKind::TypeMember,
            _ => return Err(self.error("expected a type-enforcement rule keyword")),
        };
        self.advance();
        let source = self.parse_type_set()?;
        let target = self.parse_type_set()?;
        self.expect(TokenKind::Colon)?;
        let classes = self.parse_name_or_set()?;
        let default_type = self.expect_identifier()?;
        self.expect(TokenKind::Semi)?;
        Ok(TeDecl { kind, source, target, classes, default_type, conditional })
    }

    /// `NAME`, `{ NAME1 NAME2 }`, `~{ NAME1 NAME2 }`, `*`, or a set with a
    /// trailing `self`.
    fn parse_type_set(&mut self) -> Result<TypeSetAst, ParseError> {
        let mut names = Vec::new();
        let mut includes_self = false;
        if self.check(&TokenKind::Tilde) {
            self.advance();
        }
        if self.check(&TokenKind::Star) {
            self.advance();
            return Ok(TypeSetAst { names, includes_self });
        }
        if self.check(&TokenKind::LBrace) {
            self.advance();
            while !self.check(&TokenKind::RBrace) {
                if self.check(&TokenKind::Identifier("self".to_string())) {
                    // `self` never lexes distinctly; handled below by name text.
                }
                let name = self.expect_identifier()?;
                if name == "self" {
                    includes_self = true;
                } else {
                    names.push(name);
                }
            }
            self.expect(TokenKind::RBrace)?;
        } else {
            names.push(self.expect_identifier()?);
        }
        Ok(TypeSetAst { names, includes_self })
    }

    fn parse_name_or_set(&mut self) -> Result<Vec<String>, ParseError> {
        if self.check(&TokenKind::LBrace) {
            self.advance();
            let mut names = Vec::new();
            while !self.check(&TokenKind::RBrace) {
                names.push(self.expect_identifier()?);
            }
            self.expect(TokenKind::RBrace)?;
            Ok(names)
        } else {
            Ok(vec![self.expect_identifier()?])
        }
    }

    fn parse_role(&mut self) -> Result<Statement, ParseError> {
        self.advance();
        let name = self.expect_identifier()?;
        let mut types = Vec::new();
        if self.check(&TokenKind::Types) {
            self.advance();
            types = self.parse_name_or_set()?;
        }
        self.expect(TokenKind::Semi)?;
        Ok(Statement::Role(RoleDecl { name, types }))
    }

    fn parse_role_allow(&mut self) -> Result<Statement, ParseError> {
        self.advance();
        let source = self.parse_name_or_set()?;
        let target = self.parse_name_or_set()?;
        self.expect(TokenKind::Semi)?;
        Ok(Statement::RoleAllow { source, target })
    }

    fn parse_role_transition(&mut self) -> Result<Statement, ParseError> {
        self.advance();
        let source_roles = self.parse_name_or_set()?;
        let target_types = self.parse_type_set()?;
        let default_role = self.expect_identifier()?;
        self.expect(TokenKind::Semi)?;
        Ok(Statement::RoleTransition { source_roles, target_types, default_role })
    }

    fn parse_user(&mut self) -> Result<Statement, ParseError> {
        self.advance();
        let name = self.expect_identifier()?;
        self.expect(TokenKind::Roles)?;
        let roles = self.parse_name_or_set()?;
        let range = if self.check(&TokenKind::RangeKw) {
            self.advance();
            Some(self.parse_range()?)
        } else {
            None
        };
        self.expect(TokenKind::Semi)?;
        Ok(Statement::User(UserDecl { name, roles, range }))
    }

    fn parse_range_transition(&mut self) -> Result<Statement, ParseError> {
        self.advance();
        let source = self.parse_type_set()?;
        let target = self.parse_type_set()?;
        let range = self.parse_range()?;
        self.expect(TokenKind::Semi)?;
        Ok(Statement::RangeTransition { source, target, range })
    }

    fn parse_level_literal(&mut self) -> Result<LevelAst, ParseError> {
        let sensitivity = self.expect_identifier()?;
        let categories = if self.check(&TokenKind::Colon) {
            self.advance();
            self.parse_category_range_list()?
        } else {
            Vec::new()
        };
        Ok(LevelAst { sensitivity, categories })
    }

    fn parse_range(&mut self) -> Result<RangeAst, ParseError> {
        let low = self.parse_level_literal()?;
        let high = if self.check(&TokenKind::Dash) {
            self.advance();
            self.parse_level_literal()?
        } else {
            low.clone()
        };
        Ok(RangeAst { low, high })
    }

    fn parse_context(&mut self) -> Result<ContextAst, ParseError> {
        let user = self.expect_identifier()?;
        self.expect(TokenKind::Colon)?;
        let role = self.expect_identifier()?;
        self.expect(TokenKind::Colon)?;
        let type_ = self.expect_identifier()?;
        let range = if self.check(&TokenKind::Colon) {
            self.advance();
            Some(self.parse_range()?)
        } else {
            None
        };
        Ok(ContextAst { user, role, type_, range })
    }

    fn parse_sid(&mut self) -> Result<Statement, ParseError> {
        self.advance();
        let name = self.expect_identifier()?;
        let context = self.parse_context()?;
        self.expect(TokenKind::Semi)?;
        Ok(Statement::Sid { name, context })
    }

    fn parse_constrain(&mut self, mls: bool) -> Result<Statement, ParseError> {
        self.advance();
        let class = self.expect_identifier()?;
        self.expect(TokenKind::LBrace)?;
        let mut perms = Vec::new();
        while !self.check(&TokenKind::RBrace) {
            perms.push(self.expect_identifier()?);
        }
        self.expect(TokenKind::RBrace)?;
        let expr = self.parse_constraint_expr()?;
        self.expect(TokenKind::Semi)?;
        Ok(Statement::Constrain { class, perms, mls, expr })
    }

    /// `expr := term (('and' | 'or') term)*`, right-associated for
    /// simplicity — constraint expressions in practice are shallow.
    fn parse_constraint_expr(&mut self) -> Result<ConstraintExprAst, ParseError> {
        let mut left = self.parse_constraint_term()?;
        loop {
            if self.check(&TokenKind::And) {
                self.advance();
                let right = self.parse_constraint_term()?;
                left = ConstraintExprAst::And(Box::new(left), Box::new(right));
            } else if self.check(&TokenKind::Or) {
                self.advance();
                let right = self.parse_constraint_term()?;
                left = ConstraintExprAst::Or(Box::new(left), Box::new(right));
            } else {
                break;
            }
        }
        Ok(left)
    }

    fn parse_constraint_term(&mut self) -> Result<ConstraintExprAst, ParseError> {
        if self.check(&TokenKind::Not) {
            self.advance();
            return Ok(ConstraintExprAst::Not(Box::new(self.parse_constraint_term()?)));
        }
        let attr = self.expect_identifier()?;
        let op = self.parse_constraint_op()?;
        if self.check(&TokenKind::LBrace) {
            self.advance();
            let mut names = Vec::new();
            while !self.check(&TokenKind::RBrace) {
                names.push(self.expect_identifier()?);
            }
            self.expect(TokenKind::RBrace)?;
            Ok(ConstraintExprAst::AttrOpNameSet { attr, op, names })
        } else {
            let _rhs = self.expect_identifier()?;
            Ok(ConstraintExprAst::AttrOpAttr { attr, op })
        }
    }

    fn parse_constraint_op(&mut self) -> Result<String, ParseError> {
        let op = match self.current().kind {
            TokenKind::Eq => "==",
            TokenKind::Neq => "!=",
            TokenKind::Dom => "dom",
            TokenKind::Domby => "domby",
            TokenKind::Incomp => "incomp",
            _ => return Err(self.error("expected a constraint operator")),
        };
        self.advance();
        Ok(op.to_string())
    }

    fn parse_conditional(&mut self) -> Result<ConditionalDecl, ParseError> {
        self.advance();
        self.expect(TokenKind::LParen)?;
        let expr = self.parse_bool_expr()?;
        self.expect(TokenKind::RParen)?;
        self.expect(TokenKind::LBrace)?;
        let true_branch = self.parse_conditional_body()?;
        self.expect(TokenKind::RBrace)?;
        let false_branch = if self.check(&TokenKind::Else) {
            self.advance();
            self.expect(TokenKind::LBrace)?;
            let body = self.parse_conditional_body()?;
            self.expect(TokenKind::RBrace)?;
            body
        } else {
            Vec::new()
        };
        Ok(ConditionalDecl { expr, true_branch, false_branch })
    }

    fn parse_conditional_body(&mut self) -> Result<Vec<Statement>, ParseError> {
        let mut statements = Vec::new();
        while !self.check(&TokenKind::RBrace) {
            statements.push(match self.current().kind {
                TokenKind::Allow | TokenKind::NeverAllow | TokenKind::AuditAllow | TokenKind::DontAudit => {
                    Statement::Av(self.parse_av(None)?)
                }
                TokenKind::TypeTransition | TokenKind::TypeChange | TokenKind::TypeMember => {
                    Statement::Te(self.parse_te(None)?)
                }
                _ => return Err(self.error("only AV/TE rules are allowed inside a conditional block")),
            });
        }
        Ok(statements)
    }

    /// `expr := or_expr`, `or_expr := and_expr ('||' and_expr)*`,
    /// `and_expr := eq_expr ('&&' eq_expr)*`,
    /// `eq_expr := unary (('==' | '!=' | '^') unary)*`,
    /// `unary := '!' unary | NAME`.
    fn parse_bool_expr(&mut self) -> Result<BoolExprAst, ParseError> {
        let mut left = self.parse_bool_and()?;
        while self.check(&TokenKind::Or) {
            self.advance();
            let right = self.parse_bool_and()?;
            left = BoolExprAst::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_bool_and(&mut self) -> Result<BoolExprAst, ParseError> {
        let mut left = self.parse_bool_eq()?;
        while self.check(&TokenKind::And) {
            self.advance();
            let right = self.parse_bool_eq()?;
            left = BoolExprAst::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_bool_eq(&mut self) -> Result<BoolExprAst, ParseError> {
        let mut left = self.parse_bool_unary()?;
        loop {
            if self.check(&TokenKind::Eq) {
                self.advance();
                left = BoolExprAst::Eq(Box::new(left), Box::new(self.parse_bool_unary()?));
            } else if self.check(&TokenKind::Neq) {
                self.advance();
                left = BoolExprAst::Neq(Box::new(left), Box::new(self.parse_bool_unary()?));
            } else if self.check(&TokenKind::Xor) {
                self.advance();
                left = BoolExprAst::Xor(Box::new(left), Box::new(self.parse_bool_unary()?));
            } else {
                break;
            }
        }
        Ok(left)
    }

    fn parse_bool_unary(&mut self) -> Result<BoolExprAst, ParseError> {
        if self.check(&TokenKind::Not) {
            self.advance();
            return Ok(BoolExprAst::Not(Box::new(self.parse_bool_unary()?)));
        }
        if self.check(&TokenKind::LParen) {
            self.advance();
            let inner = self.parse_bool_expr()?;
            self.expect(TokenKind::RParen)?;
            return Ok(inner);
        }
        Ok(BoolExprAst::Ref(self.expect_identifier()?))
    }

    // ------------------------------------------------------------------
    // Token-stream helpers
    // ------------------------------------------------------------------

    fn current(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn advance(&mut self) {
        if !self.is_at_end() {
            self.pos += 1;
        }
    }

    fn is_at_end(&self) -> bool {
        self.current().kind == TokenKind::Eof
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.current().kind) == std::mem::discriminant(kind)
    }

    fn expect(&mut self, kind: TokenKind) -> Result<(), ParseError> {
        if self.check(&kind) {
            self.advance();
            Ok(())
        } else {
            Err(self.error(&format!("expected {:?}, found {:?}", kind, self.current().kind)))
        }
    }

    fn expect_identifier(&mut self) -> Result<String, ParseError> {
        match &self.current().kind {
            TokenKind::Identifier(s) => {
                let s = s.clone();
                self.advance();
                Ok(s)
            }
            _ => Err(self.error(&format!("expected identifier, found {:?}", self.current().kind))),
        }
    }

    fn expect_bool_literal(&mut self) -> Result<bool, ParseError> {
        match self.current().kind {
            TokenKind::True => {
                self.advance();
                Ok(true)
            }
            TokenKind::False => {
                self.advance();
                Ok(false)
            }
            _ => Err(self.error("expected 'true' or 'false'")),
        }
    }

    fn error(&self, msg: &str) -> ParseError {
        let span = self.current().span;
        ParseError {
            message: msg.to_string(),
            line: span.line,
            column: span.column,
        }
    }
}

/// Parse policy source text into an AST.
pub fn parse(source: &str) -> Result<PolicyAst, ParseError> {
    let mut lexer = Lexer::new(source);
    let tokens = lexer.tokenize();
    let mut parser = Parser::new(tokens);
    parser.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_type_and_attribute() {
        let ast = parse("type sysadm_t, domain;\nattribute domain;").unwrap();
        assert_eq!(ast.statements.len(), 2);
        assert_eq!(
            ast.statements[0],
            Statement::Type(TypeDecl { name: "sysadm_t".to_string(), attrs: vec!["domain".to_string()] })
        );
    }

    #[test]
    fn parses_class_with_permissions() {
        let ast = parse("class file { read write execute };").unwrap();
        match &ast.statements[0] {
            Statement::Class(decl) => {
                assert_eq!(decl.name, "file");
                assert_eq!(decl.perms, vec!["read", "write", "execute"]);
            }
            other => panic!("expected Class, got {other:?}"),
        }
    }

    #[test]
    fn parses_allow_rule_with_set_operands() {
        let ast = parse("allow { t_a t_b } t_c : file { read write };").unwrap();
        match &ast.statements[0] {
            Statement::Av(decl) => {
                assert_eq!(decl.kind, AvKind::Allow);
                assert_eq!(decl.source.names, vec!["t_a".to_string(), "t_b".to_string()]);
                assert_eq!(decl.classes, vec!["file".to_string()]);
                assert_eq!(decl.perms, vec!["read".to_string(), "write".to_string()]);
            }
            other => panic!("expected Av, got {other:?}"),
        }
    }

    #[test]
    fn parses_conditional_block_with_else() {
        let ast = parse(
            "if (secure_mode) {\n  allow t1 t2 : file { read };\n} else {\n  allow t1 t2 : file { write };\n}",
        )
        .unwrap();
        match &ast.statements[0] {
            Statement::Conditional(decl) => {
                assert_eq!(decl.expr, BoolExprAst::Ref("secure_mode".to_string()));
                assert_eq!(decl.true_branch.len(), 1);
                assert_eq!(decl.false_branch.len(), 1);
            }
            other => panic!("expected Conditional, got {other:?}"),
        }
    }

    #[test]
    fn parses_range_transition() {
        let ast = parse("range_transition sysadm_t passwd_exec_t s0-s0:c0;").unwrap();
        assert!(matches!(ast.statements[0], Statement::RangeTransition { .. }));
    }

    #[test]
    fn reports_line_and_column_on_malformed_input() {
        let err = parse("type t\ntype u;").unwrap_err();
        assert_eq!(err.line, 2);
    }
}
