//! codegen.rs: AST RPN → fragments JavaScript (module ES).
//!
//! ```text
//! import { Rpn } from '../rpn-vm.js';
//! let rpn = new Rpn();
//! rpn.push( 8 );        ← valeur
//! rpn.subtract();       ← opérateur binaire (après ses deux opérandes)
//! var c = rpn.pop();    ← affectation (la cible n’est jamais empilée)
//! rpn.print();          ← print
//! ```

#![forbid(unsafe_code)]

use crate::compiler::config::Config;
use crate::compiler::fragment::Fragment;
use crate::syntax::ast::{Ast, NodeId, NodeKind};

/// Générateur : ne porte que les noms runtime issus de la configuration.
pub struct CodeGen<'c> {
    config: &'c Config,
}

impl<'c> CodeGen<'c> {
    pub fn new(config: &'c Config) -> Self {
        Self { config }
    }

    /// Fragment racine (non étiqueté) : préambule puis une instruction par ligne source.
    pub fn generate(&self, ast: &Ast) -> Fragment {
        let mut root = Fragment::untagged().with_text(self.preamble());
        for id in ast.statements() {
            root.push_child(self.node(ast, *id));
        }
        root
    }

    pub fn preamble(&self) -> String {
        let Config { runtime_module, runtime_class, runtime_instance, .. } = self.config;
        format!(
            "import {{ {runtime_class} }} from '{runtime_module}';\n\
             let {runtime_instance} = new {runtime_class}();\n"
        )
    }

    fn node(&self, ast: &Ast, id: NodeId) -> Fragment {
        let node = ast.node(id);
        let vm = &self.config.runtime_instance;
        let frag = Fragment::tagged(node.tag.clone());
        match &node.kind {
            NodeKind::Value { text, .. } => frag.with_text(format!("{vm}.push( {text} );\n")),
            NodeKind::Binary { op, left, right } => frag
                .with_child(self.node(ast, *left))
                .with_child(self.node(ast, *right))
                .with_text(format!("{vm}.{}();\n", op.runtime_name())),
            NodeKind::Assign { target, value } => {
                let name = &ast.node(*target).tag.name;
                frag.with_child(self.node(ast, *value))
                    .with_text(format!("var {name} = {vm}.pop();\n"))
            }
            NodeKind::Print { operand } => frag
                .with_child(self.node(ast, *operand))
                .with_text(format!("{vm}.print();\n")),
        }
    }
}
