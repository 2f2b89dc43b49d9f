//! tokenizer.rs: Découpage de la source RPN en termes.
//!
//! Deux sortes de termes :
//! - le terme **newline** : exactement un `\n` (significatif, il termine une instruction) ;
//! - le terme **mot** : suite maximale de caractères qui ne sont ni espace ni `\n`.
//!
//! Espaces = ` `, `\t`, `\r`. Ils sont sautés **avant et après** chaque terme,
//! ce qui rend la lecture anticipée triviale : [`Tokenizer::lookahead`] travaille
//! sur une copie du curseur et renvoie `(terme, curseur_suivant)` sans rien muter.
//!
//! API :
//!   let mut tz = Tokenizer::new(src);
//!   while !tz.at_end() { let t = tz.next_term()?; ... }
//!   let next = tz.peek_term()?; // ne bouge jamais le curseur

#![forbid(unsafe_code)]

use std::fmt;

use crate::error::{ErrorKind, SyntaxError};
use crate::syntax::position::Position;

/* ───────────────────────── Termes ───────────────────────── */

/// Un terme et sa tranche dans la source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    pub text: String,
    /// Premier caractère du terme.
    pub start: Position,
    /// Juste après le dernier caractère (avant les espaces de fin).
    pub end: Position,
}

impl Term {
    pub fn is_newline(&self) -> bool {
        self.text == "\n"
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text.escape_debug())
    }
}

/* ───────────────────────── Curseur immuable ───────────────────────── */

/// Vue (source, position) copiable : c’est l’unité de snapshot du lookahead.
#[derive(Clone, Copy)]
struct Cursor<'s> {
    chars: &'s [char],
    pos: Position,
}

impl Cursor<'_> {
    fn at_end(&self) -> bool {
        self.pos.index >= self.chars.len()
    }

    fn peek_char(&self) -> Option<char> {
        self.chars.get(self.pos.index).copied()
    }

    fn next_char(&mut self) -> Result<char, SyntaxError> {
        let ch = self
            .peek_char()
            .ok_or_else(|| SyntaxError::new(ErrorKind::UnexpectedEndOfInput, self.pos))?;
        self.pos.increment(ch);
        Ok(ch)
    }

    fn at_space(&self) -> bool {
        matches!(self.peek_char(), Some(c) if is_space(c))
    }

    fn at_newline(&self) -> bool {
        self.peek_char() == Some('\n')
    }

    fn skip_space(&mut self) {
        while self.at_space() {
            self.pos.increment(self.chars[self.pos.index]);
        }
    }

    /// Espaces, terme, espaces. Échoue en fin de source.
    fn scan_term(mut self) -> Result<(Term, Position), SyntaxError> {
        self.skip_space();
        if self.at_end() {
            return Err(SyntaxError::new(ErrorKind::UnexpectedEndOfInput, self.pos));
        }

        let start = self.pos;
        let mut text = String::new();
        if self.at_newline() {
            text.push(self.next_char()?);
        } else {
            while !self.at_end() && !self.at_space() && !self.at_newline() {
                text.push(self.next_char()?);
            }
        }
        let end = self.pos;

        self.skip_space();
        Ok((Term { text, start, end }, self.pos))
    }
}

fn is_space(c: char) -> bool {
    c == ' ' || c == '\t' || c == '\r'
}

/* ───────────────────────── Tokenizer ───────────────────────── */

/// Tokenizer à la demande : aucun terme n’est stocké.
pub struct Tokenizer {
    chars: Vec<char>,
    /// Position courante.
    position: Position,
    /// Début du dernier terme consommé (sert à étiqueter les fragments).
    start: Position,
}

impl Tokenizer {
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            position: Position::start(),
            start: Position::start(),
        }
    }

    fn cursor(&self) -> Cursor<'_> {
        Cursor { chars: &self.chars, pos: self.position }
    }

    /// Position courante du curseur.
    pub fn position(&self) -> Position {
        self.position
    }

    /// Début du dernier terme consommé.
    pub fn start_position(&self) -> Position {
        self.start
    }

    pub fn at_end(&self) -> bool {
        self.cursor().at_end()
    }

    pub fn peek_char(&self) -> Option<char> {
        self.cursor().peek_char()
    }

    pub fn next_char(&mut self) -> Result<char, SyntaxError> {
        let mut c = self.cursor();
        let ch = c.next_char()?;
        self.position = c.pos;
        Ok(ch)
    }

    /// Saute espaces, tabulations et `\r` (jamais `\n`).
    pub fn skip_space(&mut self) {
        let mut c = self.cursor();
        c.skip_space();
        self.position = c.pos;
    }

    /// Lecture anticipée depuis `at`, sans état partagé : renvoie le terme et
    /// la position qui suivrait sa consommation.
    pub fn lookahead(&self, at: Position) -> Result<(Term, Position), SyntaxError> {
        Cursor { chars: &self.chars, pos: at }.scan_term()
    }

    /// Prochain terme sans le consommer ; mêmes règles que [`Self::next_term`].
    pub fn peek_term(&self) -> Result<Term, SyntaxError> {
        self.lookahead(self.position).map(|(term, _)| term)
    }

    /// Consomme le prochain terme (espaces de tête et de queue compris).
    pub fn next_term(&mut self) -> Result<Term, SyntaxError> {
        let (term, next) = self.lookahead(self.position)?;
        self.position = term.start;
        self.update_start_position();
        self.position = next;
        Ok(term)
    }

    /// Snapshot de la position courante comme “début du terme courant”.
    pub fn update_start_position(&mut self) {
        self.start.assign(&self.position);
    }
}

/* ───────────────────────── Tests ───────────────────────── */

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn texts(src: &str) -> Vec<String> {
        let mut tz = Tokenizer::new(src);
        let mut out = Vec::new();
        while !tz.at_end() {
            out.push(tz.next_term().expect("terme").text);
        }
        out
    }

    #[test]
    fn splits_words_and_newlines() {
        assert_eq!(
            texts("8 3 -\n c\ta =\r\n"),
            vec!["8", "3", "-", "\n", "c", "a", "=", "\n"]
        );
    }

    #[test]
    fn term_positions_point_at_first_char() {
        let mut tz = Tokenizer::new("  12  ab\n  x");
        let t = tz.next_term().unwrap();
        assert_eq!((t.text.as_str(), t.start.line, t.start.column), ("12", 1, 2));
        assert_eq!(tz.start_position(), t.start);
        let t = tz.next_term().unwrap();
        assert_eq!((t.start.column, t.end.column), (6, 8));
        let nl = tz.next_term().unwrap();
        assert!(nl.is_newline());
        let x = tz.next_term().unwrap();
        assert_eq!((x.start.line, x.start.column), (2, 2));
        assert!(tz.at_end());
    }

    #[test]
    fn columns_after_an_astral_char_count_utf16_units() {
        let mut tz = Tokenizer::new("a😀 b +");
        assert_eq!(tz.next_term().unwrap().text, "a😀");
        let b = tz.next_term().unwrap();
        assert_eq!((b.start.index, b.start.column), (3, 4));
        let plus = tz.next_term().unwrap();
        assert_eq!(plus.start.column, 6);
    }

    #[test]
    fn peek_does_not_move() {
        let mut tz = Tokenizer::new("a   b");
        let before = tz.position();
        for _ in 0..3 {
            assert_eq!(tz.peek_term().unwrap().text, "a");
        }
        assert_eq!(tz.position(), before);
        assert_eq!(tz.next_term().unwrap().text, "a");
        assert_eq!(tz.peek_term().unwrap().text, "b");
    }

    #[test]
    fn lookahead_returns_next_cursor() {
        let tz = Tokenizer::new("ab  cd");
        let (t, next) = tz.lookahead(tz.position()).unwrap();
        assert_eq!(t.text, "ab");
        assert_eq!(next.index, 4);
        let (t2, _) = tz.lookahead(next).unwrap();
        assert_eq!(t2.text, "cd");
    }

    #[test]
    fn end_of_input_is_an_error() {
        let mut tz = Tokenizer::new("x   ");
        tz.next_term().unwrap();
        assert!(tz.at_end());
        let err = tz.next_term().unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnexpectedEndOfInput);
        assert_eq!(tz.peek_term().unwrap_err().kind, ErrorKind::UnexpectedEndOfInput);
        assert_eq!(tz.next_char().unwrap_err().kind, ErrorKind::UnexpectedEndOfInput);
    }

    #[test]
    fn skip_space_keeps_newline() {
        let mut tz = Tokenizer::new(" \t\r\nx");
        tz.skip_space();
        assert_eq!(tz.peek_char(), Some('\n'));
        assert_eq!(tz.position().column, 3);
    }

    #[test]
    fn blank_source_ends_after_spaces() {
        let mut tz = Tokenizer::new("   ");
        assert!(!tz.at_end());
        assert_eq!(tz.next_term().unwrap_err().kind, ErrorKind::UnexpectedEndOfInput);
    }
}
