//! fragment.rs: Arbre de texte généré, chaque nœud éventuellement étiqueté.
//!
//! Un [`Fragment`] possède une suite de [`Chunk`] : du texte brut ou un
//! sous-fragment. L’ordre de parcours en profondeur est l’ordre de sortie.

#![forbid(unsafe_code)]

use crate::syntax::ast::Tag;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Chunk {
    Text(String),
    Node(Fragment),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    /// Terme source qui a produit ce fragment (`None` : préambule, marqueur…).
    pub origin: Option<Tag>,
    pub children: Vec<Chunk>,
}

impl Fragment {
    pub fn untagged() -> Self {
        Self::default()
    }

    pub fn tagged(tag: Tag) -> Self {
        Self { origin: Some(tag), children: Vec::new() }
    }

    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.push_text(text);
        self
    }

    #[must_use]
    pub fn with_child(mut self, child: Fragment) -> Self {
        self.push_child(child);
        self
    }

    pub fn push_text(&mut self, text: impl Into<String>) {
        self.children.push(Chunk::Text(text.into()));
    }

    pub fn push_child(&mut self, child: Fragment) {
        self.children.push(Chunk::Node(child));
    }

    /// Concaténation du texte, sans position.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        self.write_into(&mut out);
        out
    }

    fn write_into(&self, out: &mut String) {
        for chunk in &self.children {
            match chunk {
                Chunk::Text(t) => out.push_str(t),
                Chunk::Node(f) => f.write_into(out),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_is_depth_first() {
        let inner = Fragment::untagged().with_text("b");
        let f = Fragment::untagged().with_text("a").with_child(inner).with_text("c");
        assert_eq!(f.to_text(), "abc");
    }
}
