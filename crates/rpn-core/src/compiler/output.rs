//! output.rs: Assemblage : fragments → texte final + table de correspondance.
//!
//! Le parcours en profondeur concatène le texte et suit la position de sortie
//! (ligne 1-based, colonne 0-based en unités UTF-16, comme les source maps).
//! Chaque chunk de texte non vide porté **directement** par un fragment étiqueté
//! produit une [`Mapping`] à la position où il commence. Les chunks non
//! étiquetés (préambule, marqueur) ne produisent rien.
//!
//! Pas de cas d’erreur : le traducteur ne construit que des arbres bien formés.

#![forbid(unsafe_code)]

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::compiler::fragment::{Chunk, Fragment};
use crate::syntax::ast::Tag;

/* ───────────────────────────── Types publics ───────────────────────────── */

/// Couple (ligne 1-based, colonne 0-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LineCol {
    pub line: u32,
    pub column: u32,
}

impl LineCol {
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for LineCol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Une entrée de la table de correspondance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mapping {
    pub generated: LineCol,
    pub original: LineCol,
    pub source: String,
    pub name: String,
}

impl fmt::Display for Mapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}:{} `{}`", self.generated, self.source, self.original, self.name)
    }
}

/// Résultat d’assemblage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assembled {
    pub code: String,
    pub mappings: Vec<Mapping>,
}

/* ───────────────────────────── Assembleur ───────────────────────────── */

/// Assembleur à usage unique (une source).
pub struct Assembler {
    source: String,
    code: String,
    at: LineCol,
    mappings: Vec<Mapping>,
}

impl Assembler {
    /// `source` : nom de la source RPN inscrit dans chaque mapping.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            code: String::new(),
            at: LineCol::new(1, 0),
            mappings: Vec::new(),
        }
    }

    /// Position de sortie courante.
    pub fn position(&self) -> LineCol {
        self.at
    }

    /// Parcourt `fragment` et accumule texte et mappings.
    pub fn walk(&mut self, fragment: &Fragment) {
        for chunk in &fragment.children {
            match chunk {
                Chunk::Text(text) => {
                    if let (Some(tag), false) = (&fragment.origin, text.is_empty()) {
                        self.record(tag);
                    }
                    self.write(text);
                }
                Chunk::Node(child) => self.walk(child),
            }
        }
    }

    /// Texte brut, sans mapping.
    pub fn write(&mut self, text: &str) {
        for ch in text.chars() {
            if ch == '\n' {
                self.at.line += 1;
                self.at.column = 0;
            } else {
                self.at.column += u32::try_from(ch.len_utf16()).unwrap_or(1);
            }
        }
        self.code.push_str(text);
    }

    /// Ajoute le commentaire `sourceMappingURL` et rend le résultat.
    pub fn finish(mut self, map_file: &str) -> Assembled {
        self.write(&marker(map_file));
        Assembled { code: self.code, mappings: self.mappings }
    }

    fn record(&mut self, tag: &Tag) {
        self.mappings.push(Mapping {
            generated: self.at,
            original: LineCol::new(tag.line, tag.column),
            source: self.source.clone(),
            name: tag.name.clone(),
        });
    }
}

/// Commentaire de fin reconnu par les consommateurs de source maps.
pub fn marker(map_file: &str) -> String {
    format!("\n//# sourceMappingURL={map_file}\n")
}

/// Raccourci : assemble `root` et termine par le marqueur.
pub fn assemble(root: &Fragment, source: &str, map_file: &str) -> Assembled {
    let mut asm = Assembler::new(source);
    asm.walk(root);
    asm.finish(map_file)
}

/* ───────────────────────────── Tests ───────────────────────────── */

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::position::Position;
    use pretty_assertions::assert_eq;

    fn tag(line: u32, column: u32, name: &str) -> Tag {
        Tag::at(Position { index: 0, line, column }, name)
    }

    #[test]
    fn tagged_chunks_map_to_their_start() {
        let leaf = Fragment::tagged(tag(1, 0, "8")).with_text("push8;\n");
        let root = Fragment::untagged()
            .with_text("pre\n")
            .with_child(Fragment::tagged(tag(1, 2, "-")).with_child(leaf).with_text("sub;\n"));
        let out = assemble(&root, "p.rpn", "p.js.map");

        assert_eq!(out.code, "pre\npush8;\nsub;\n\n//# sourceMappingURL=p.js.map\n");
        let positions: Vec<_> = out
            .mappings
            .iter()
            .map(|m| (m.generated, m.original, m.name.as_str()))
            .collect();
        assert_eq!(
            positions,
            vec![
                (LineCol::new(2, 0), LineCol::new(1, 0), "8"),
                (LineCol::new(3, 0), LineCol::new(1, 2), "-"),
            ]
        );
    }

    #[test]
    fn empty_and_untagged_chunks_yield_nothing() {
        let root = Fragment::untagged()
            .with_text("x")
            .with_child(Fragment::tagged(tag(1, 0, "e")).with_text(""));
        let out = assemble(&root, "s", "m");
        assert!(out.mappings.is_empty());
    }

    #[test]
    fn columns_count_utf16_units() {
        let mut asm = Assembler::new("s");
        asm.write("a😀");
        assert_eq!(asm.position(), LineCol::new(1, 3));
    }
}
