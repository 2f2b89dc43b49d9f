//! ast.rs: AST RPN en arène (indices, pas de pointeurs).
//!
//! La grammaire est un arbre : chaque nœud est créé une fois, ses enfants
//! sont créés avant lui, donc un `NodeId` enfant est toujours < au parent.

#![forbid(unsafe_code)]

use std::fmt;

use crate::syntax::position::Position;

/// Mot réservé `print` (jamais une valeur).
pub const PRINT_KEYWORD: &str = "print";

/// Opérateur d’affectation postfixe.
pub const ASSIGN_OPERATOR: &str = "=";

/* ───────────────────────── Opérateurs ───────────────────────── */

/// Opérateurs binaires et nom de la méthode runtime associée.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

/// Table symbole → opérateur (constante, partagée par toutes les compilations).
pub const OPERATORS: [(&str, BinaryOp); 4] = [
    ("+", BinaryOp::Add),
    ("-", BinaryOp::Subtract),
    ("*", BinaryOp::Multiply),
    ("/", BinaryOp::Divide),
];

impl BinaryOp {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        OPERATORS.iter().find(|(s, _)| *s == symbol).map(|(_, op)| *op)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
        }
    }

    /// Nom de la méthode appelée sur l’objet runtime.
    pub fn runtime_name(self) -> &'static str {
        match self {
            BinaryOp::Add => "add",
            BinaryOp::Subtract => "subtract",
            BinaryOp::Multiply => "multiply",
            BinaryOp::Divide => "divide",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/* ───────────────────────── Valeurs ───────────────────────── */

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Number,
    Variable,
}

/// Premier caractère ASCII chiffre.
pub fn is_number(term: &str) -> bool {
    term.chars().next().is_some_and(|c| c.is_ascii_digit())
}

/// Premier caractère ASCII lettre, et pas le mot réservé `print`.
pub fn is_variable(term: &str) -> bool {
    term != PRINT_KEYWORD && term.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
}

/// Classe un terme ; `None` si ce n’est pas une valeur légale.
pub fn classify(term: &str) -> Option<ValueKind> {
    if is_number(term) {
        Some(ValueKind::Number)
    } else if is_variable(term) {
        Some(ValueKind::Variable)
    } else {
        None
    }
}

/* ───────────────────────── Nœuds ───────────────────────── */

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Étiquette de corrélation : terme source qui a produit le nœud.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub line: u32,
    pub column: u32,
    pub name: String,
}

impl Tag {
    pub fn at(position: Position, name: impl Into<String>) -> Self {
        Self { line: position.line, column: position.column, name: name.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Value { kind: ValueKind, text: String },
    Binary { op: BinaryOp, left: NodeId, right: NodeId },
    /// `target` est toujours un nœud `Value` de genre `Variable`.
    Assign { target: NodeId, value: NodeId },
    Print { operand: NodeId },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    pub tag: Tag,
}

/// Arène + liste des instructions (une racine par ligne source).
#[derive(Debug, Clone, Default)]
pub struct Ast {
    nodes: Vec<Node>,
    statements: Vec<NodeId>,
}

impl Ast {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: NodeKind, tag: Tag) -> NodeId {
        let id = NodeId(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        self.nodes.push(Node { kind, tag });
        id
    }

    pub fn add_statement(&mut self, root: NodeId) {
        self.statements.push(root);
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn statements(&self) -> &[NodeId] {
        &self.statements
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Notation infixe complètement parenthésée (debug / tests).
    pub fn render_infix(&self, id: NodeId) -> String {
        let node = self.node(id);
        match &node.kind {
            NodeKind::Value { text, .. } => text.clone(),
            NodeKind::Binary { op, left, right } => {
                format!("({} {} {})", self.render_infix(*left), op, self.render_infix(*right))
            }
            NodeKind::Assign { target, value } => {
                format!("{} = {}", self.render_infix(*target), self.render_infix(*value))
            }
            NodeKind::Print { operand } => format!("print({})", self.render_infix(*operand)),
        }
    }
}
