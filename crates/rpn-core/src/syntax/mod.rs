//! syntax: Frontal RPN : positions, termes, AST et traduction.
//!
//! Pipeline : `source → Tokenizer → Translator → Ast`.

#![forbid(unsafe_code)]

pub mod ast;
pub mod position;
pub mod tokenizer;
pub mod translator;

pub use ast::{Ast, BinaryOp, Node, NodeId, NodeKind, Tag, ValueKind};
pub use position::Position;
pub use tokenizer::{Term, Tokenizer};
pub use translator::{translate, translate_with_depth, Translator, DEFAULT_MAX_DEPTH};
