//! position.rs: Curseur (index, ligne, colonne) dans le texte source.
//!
//! L’index compte des **caractères** (pas des octets), la ligne est 1-based,
//! la colonne 0-based et en unités UTF-16 (convention des source maps, comme
//! les colonnes du code généré).

#![forbid(unsafe_code)]

use std::fmt;

/// Position dans la source RPN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    /// Nombre de caractères consommés depuis le début.
    pub index: usize,
    /// Ligne courante (1-based).
    pub line: u32,
    /// Colonne courante (0-based, unités UTF-16).
    pub column: u32,
}

impl Position {
    /// Début de la source : index 0, ligne 1, colonne 0.
    pub const fn start() -> Self {
        Self { index: 0, line: 1, column: 0 }
    }

    /// Consomme `ch` et renvoie le nouvel index.
    ///
    /// `\n` passe à la ligne suivante et remet la colonne à 0 ; tout autre
    /// caractère avance la colonne de sa longueur UTF-16 (1 ou 2).
    pub fn increment(&mut self, ch: char) -> usize {
        self.index += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += u32::try_from(ch.len_utf16()).unwrap_or(1);
        }
        self.index
    }

    /// Recopie `other` dans `self` (snapshot / restauration).
    pub fn assign(&mut self, other: &Position) -> &mut Self {
        *self = *other;
        self
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::start()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_is_line_one_column_zero() {
        let p = Position::default();
        assert_eq!((p.index, p.line, p.column), (0, 1, 0));
    }

    #[test]
    fn newline_resets_column() {
        let mut p = Position::start();
        for ch in "ab\nc".chars() {
            p.increment(ch);
        }
        assert_eq!(p, Position { index: 4, line: 2, column: 1 });
    }

    #[test]
    fn astral_chars_take_two_columns() {
        let mut p = Position::start();
        for ch in "a😀é".chars() {
            p.increment(ch);
        }
        assert_eq!(p, Position { index: 3, line: 1, column: 4 });
    }

    #[test]
    fn increment_returns_new_index() {
        let mut p = Position::start();
        assert_eq!(p.increment('x'), 1);
        assert_eq!(p.increment('\n'), 2);
    }

    #[test]
    fn assign_copies_everything() {
        let mut a = Position::start();
        let b = Position { index: 7, line: 3, column: 2 };
        a.assign(&b);
        assert_eq!(a, b);
    }
}
