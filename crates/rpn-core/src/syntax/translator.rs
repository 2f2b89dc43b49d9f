//! translator.rs: Descente récursive sur les termes RPN → AST étiqueté.
//!
//! Grammaire (postfixe, une instruction par ligne) :
//! ```text
//! line       := expression [ "\n" | EOF ]
//! expression := value [ expression operator | print ]
//! value      := NUMBER | IDENTIFIER
//! operator   := "+" | "-" | "*" | "/" | "="
//! ```
//! La récursion est **à droite** : `a b c - +` donne `a + (b - c)`, et
//! `c a b 1 - / =` donne `c = a / (b - 1)`.
//!
//! `print` ne s’applique qu’à une valeur seule : `a b + print` est refusé
//! (fin de ligne attendue), `a b print +` affiche `b`.
//!
//! La profondeur d’imbrication est bornée (`max_depth`) : une chaîne trop
//! longue donne `NestingTooDeep` au lieu d’épuiser la pile d’appels.
//!
//! Chaque nœud est étiqueté avec la position de début du terme qui l’a produit
//! (`Tokenizer::start_position` juste après la consommation du terme).

#![forbid(unsafe_code)]

use log::trace;

use crate::error::{ErrorKind, SyntaxError};
use crate::syntax::ast::{
    classify, is_variable, Ast, BinaryOp, NodeId, NodeKind, Tag, ValueKind, ASSIGN_OPERATOR,
    PRINT_KEYWORD,
};
use crate::syntax::tokenizer::Tokenizer;

/// Profondeur d’imbrication par défaut.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Traduit une source complète.
pub fn translate(source: &str) -> Result<Ast, SyntaxError> {
    Translator::new(source).compile_source()
}

/// Comme [`translate`], avec une profondeur d’imbrication maximale explicite.
pub fn translate_with_depth(source: &str, max_depth: usize) -> Result<Ast, SyntaxError> {
    Translator::new(source).with_max_depth(max_depth).compile_source()
}

pub struct Translator {
    tokenizer: Tokenizer,
    ast: Ast,
    depth: usize,
    max_depth: usize,
}

impl Translator {
    pub fn new(source: &str) -> Self {
        Self {
            tokenizer: Tokenizer::new(source),
            ast: Ast::new(),
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Boucle principale : une expression puis une fin de ligne, jusqu’à EOF.
    pub fn compile_source(mut self) -> Result<Ast, SyntaxError> {
        while !self.tokenizer.at_end() {
            let root = self.compile_expression()?;
            trace!("instruction: {}", self.ast.render_infix(root));
            self.ast.add_statement(root);
            self.parse_newline()?;
        }
        Ok(self.ast)
    }

    /// Une valeur, puis soit `expression operator` (opérande droite imbriquée),
    /// soit `print`, soit rien.
    pub fn compile_expression(&mut self) -> Result<NodeId, SyntaxError> {
        let left = self.compile_value()?;

        if self.peek_is(|t| classify(t).is_some()) {
            let right = self.compile_nested()?;
            return self.compile_operator(left, right);
        }
        if self.peek_is(|t| t == PRINT_KEYWORD) {
            return self.compile_print(left);
        }
        Ok(left)
    }

    /// Nombre (premier caractère chiffre) ou identifiant (premier caractère lettre, ≠ `print`).
    pub fn compile_value(&mut self) -> Result<NodeId, SyntaxError> {
        let term = self.tokenizer.next_term()?;
        let Some(kind) = classify(&term.text) else {
            return Err(self.error(ErrorKind::ExpectedValue(term.text)));
        };
        let tag = Tag::at(self.tokenizer.start_position(), term.text.clone());
        Ok(self.ast.push(NodeKind::Value { kind, text: term.text }, tag))
    }

    /// Opérateur binaire (table constante) ou `=`.
    pub fn compile_operator(&mut self, left: NodeId, right: NodeId) -> Result<NodeId, SyntaxError> {
        let term = self.tokenizer.next_term()?;
        if term.text == ASSIGN_OPERATOR {
            return self.compile_assignment(left, right);
        }

        let Some(op) = BinaryOp::from_symbol(&term.text) else {
            return Err(self.error(ErrorKind::IllegalOperator(term.text)));
        };
        let tag = Tag::at(self.tokenizer.start_position(), term.text);
        Ok(self.ast.push(NodeKind::Binary { op, left, right }, tag))
    }

    /// `variable value =` ; la cible doit être un identifiant.
    pub fn compile_assignment(
        &mut self,
        variable: NodeId,
        value: NodeId,
    ) -> Result<NodeId, SyntaxError> {
        let target = self.ast.node(variable);
        let name = target.tag.name.clone();
        let legal = matches!(target.kind, NodeKind::Value { kind: ValueKind::Variable, .. })
            && is_variable(&name);
        if !legal {
            return Err(self.error(ErrorKind::IllegalVariableName(name)));
        }

        let tag = Tag::at(self.tokenizer.start_position(), format!("{name}{ASSIGN_OPERATOR}"));
        Ok(self.ast.push(NodeKind::Assign { target: variable, value }, tag))
    }

    /// Opérateur unaire `print` appliqué à `operand`.
    pub fn compile_print(&mut self, operand: NodeId) -> Result<NodeId, SyntaxError> {
        let term = self.tokenizer.next_term()?;
        if term.text != PRINT_KEYWORD {
            return Err(self.error(ErrorKind::IllegalOperator(term.text)));
        }
        let tag = Tag::at(self.tokenizer.start_position(), term.text);
        Ok(self.ast.push(NodeKind::Print { operand }, tag))
    }

    /// Opérande droite, un niveau plus profond.
    fn compile_nested(&mut self) -> Result<NodeId, SyntaxError> {
        if self.depth >= self.max_depth {
            return Err(self.error(ErrorKind::NestingTooDeep(self.max_depth)));
        }
        self.depth += 1;
        let right = self.compile_expression();
        self.depth -= 1;
        right
    }

    /// EOF compte comme fin de ligne ; sinon exactement un `\n`.
    fn parse_newline(&mut self) -> Result<(), SyntaxError> {
        if self.tokenizer.at_end() {
            return Ok(());
        }
        let term = self.tokenizer.next_term()?;
        if !term.is_newline() {
            return Err(self.error(ErrorKind::ExpectedNewline(term.text)));
        }
        Ok(())
    }

    /// La fin de source pendant un peek termine simplement l’expression.
    fn peek_is(&self, pred: impl Fn(&str) -> bool) -> bool {
        self.tokenizer.peek_term().is_ok_and(|t| pred(&t.text))
    }

    fn error(&self, kind: ErrorKind) -> SyntaxError {
        SyntaxError::new(kind, self.tokenizer.position())
    }
}

/* ───────────────────────────── Tests ───────────────────────────── */

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn infix(src: &str) -> Vec<String> {
        let ast = translate(src).expect("traduction ok");
        ast.statements().iter().map(|id| ast.render_infix(*id)).collect()
    }

    fn kind_of(src: &str) -> ErrorKind {
        translate(src).expect_err("doit échouer").kind
    }

    #[test]
    fn binary_and_assignment() {
        assert_eq!(infix("8 3 -"), vec!["(8 - 3)"]);
        assert_eq!(infix("c a b 1 - / ="), vec!["c = (a / (b - 1))"]);
    }

    #[test]
    fn right_nesting_binds_rightmost_pair_first() {
        assert_eq!(infix("a b c - +"), vec!["(a + (b - c))"]);
        assert_eq!(infix("v1 v2 v3 * /"), vec!["(v1 / (v2 * v3))"]);
    }

    #[test]
    fn single_values_and_lines() {
        assert_eq!(infix("8\nx 2 *\n"), vec!["8", "(x * 2)"]);
    }

    #[test]
    fn print_is_an_optional_trailing_operator() {
        assert_eq!(infix("x print"), vec!["print(x)"]);
        assert_eq!(infix("a b print +"), vec!["(a + print(b))"]);
        assert_eq!(kind_of("print"), ErrorKind::ExpectedValue("print".into()));
    }

    #[test]
    fn print_only_wraps_a_lone_value() {
        assert_eq!(kind_of("a b + print"), ErrorKind::ExpectedNewline("print".into()));
        assert_eq!(kind_of("c 8 = print"), ErrorKind::ExpectedNewline("print".into()));
        assert_eq!(kind_of("a b c + print -"), ErrorKind::IllegalOperator("print".into()));
        assert_eq!(kind_of("x print print"), ErrorKind::ExpectedNewline("print".into()));
    }

    fn chain(values: usize) -> String {
        let mut src = "1 ".repeat(values);
        src.push_str(&"+ ".repeat(values - 1));
        src
    }

    #[test]
    fn nesting_depth_is_bounded() {
        let ast = translate_with_depth(&chain(4), 3).unwrap();
        assert_eq!(ast.render_infix(ast.statements()[0]), "(1 + (1 + (1 + 1)))");
        assert_eq!(
            translate_with_depth(&chain(5), 3).unwrap_err().kind,
            ErrorKind::NestingTooDeep(3)
        );
    }

    #[test]
    fn very_long_chain_is_an_error_not_a_crash() {
        let err = translate(&chain(50_000)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::NestingTooDeep(DEFAULT_MAX_DEPTH));
        assert_eq!(err.at.line, 1);
    }

    #[test]
    fn tags_point_at_the_producing_term() {
        let ast = translate("8 3 -\n  c 8 =").unwrap();
        let sub = ast.node(ast.statements()[0]);
        assert_eq!(sub.tag, Tag { line: 1, column: 4, name: "-".into() });
        let assign = ast.node(ast.statements()[1]);
        assert_eq!(assign.tag, Tag { line: 2, column: 6, name: "c=".into() });
        if let NodeKind::Assign { target, value } = assign.kind {
            assert_eq!(ast.node(target).tag, Tag { line: 2, column: 2, name: "c".into() });
            assert_eq!(ast.node(value).tag, Tag { line: 2, column: 4, name: "8".into() });
        } else {
            panic!("affectation attendue");
        }
    }

    #[test]
    fn malformed_inputs() {
        assert_eq!(kind_of("= 1"), ErrorKind::ExpectedValue("=".into()));
        assert_eq!(kind_of("2 x ="), ErrorKind::IllegalVariableName("2".into()));
        assert_eq!(kind_of("1 ="), ErrorKind::ExpectedNewline("=".into()));
        assert_eq!(kind_of("1 2 %"), ErrorKind::IllegalOperator("%".into()));
        assert_eq!(kind_of("1 2 3 +"), ErrorKind::UnexpectedEndOfInput);
        assert_eq!(kind_of("8 3"), ErrorKind::UnexpectedEndOfInput);
        assert_eq!(kind_of("8\n\n9"), ErrorKind::ExpectedValue("\n".into()));
    }

    #[test]
    fn two_expressions_on_one_line() {
        assert_eq!(kind_of("1 2 + 3 4 +"), ErrorKind::ExpectedNewline("3".into()));
    }

    #[test]
    fn error_position_is_the_cursor() {
        let err = translate("a\n1 2 %  \n").unwrap_err();
        // Curseur après `%` et ses espaces de fin.
        assert_eq!((err.at.line, err.at.column), (2, 7));
    }

    #[test]
    fn empty_source_has_no_statement() {
        assert!(translate("").unwrap().statements().is_empty());
    }
}
