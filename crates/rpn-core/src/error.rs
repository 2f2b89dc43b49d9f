//! error.rs: Erreurs de traduction et d’émission.
//!
//! Deux niveaux :
//! - [`SyntaxError`] : produite par le tokenizer / traducteur, porte la
//!   position courante du curseur au moment de l’échec ;
//! - [`Error`] : erreur “fichier” (nom de source + ligne + colonne), I/O, JSON.
//!
//! Toute erreur de traduction est fatale pour la compilation en cours.

#![forbid(unsafe_code)]

use camino::Utf8PathBuf;
use thiserror::Error;

use crate::syntax::position::Position;

/// Nature d’une erreur de traduction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    /// Fin de source alors qu’un terme était attendu.
    #[error("fin de source inattendue")]
    UnexpectedEndOfInput,

    /// Ni nombre, ni identifiant.
    #[error("valeur attendue, reçu: `{}`", printable(.0))]
    ExpectedValue(String),

    /// Opérateur hors table (`+ - * / =`).
    #[error("opérateur illégal: `{}`", printable(.0))]
    IllegalOperator(String),

    /// Cible d’affectation qui n’est pas un identifiant.
    #[error("nom de variable illégal pour l’affectation: `{0}`")]
    IllegalVariableName(String),

    /// Deux expressions sur la même ligne.
    #[error("fin de ligne attendue, reçu: `{}`", printable(.0))]
    ExpectedNewline(String),

    /// Chaîne d’opérandes imbriquées plus profonde que la limite.
    #[error("imbrication trop profonde (limite {0})")]
    NestingTooDeep(usize),
}

/// Erreur de syntaxe localisée (sans nom de fichier).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{at}: {kind}")]
pub struct SyntaxError {
    pub kind: ErrorKind,
    pub at: Position,
}

impl SyntaxError {
    pub fn new(kind: ErrorKind, at: Position) -> Self {
        Self { kind, at }
    }

    /// Attache le nom de la source pour obtenir une erreur “fichier”.
    pub fn in_file(self, file: impl Into<String>) -> Error {
        Error::Syntax {
            file: file.into(),
            line: self.at.line,
            column: self.at.column,
            kind: self.kind,
        }
    }
}

/// Erreurs du crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Erreur de traduction rapportée avec fichier, ligne et colonne.
    #[error("File: {file}, line: {line}, col: {column}: {kind}")]
    Syntax {
        file: String,
        line: u32,
        column: u32,
        kind: ErrorKind,
    },

    /// Lecture / écriture d’un artefact.
    #[error("io: {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// (Dé)sérialisation de la source map.
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    /// Chaîne `mappings` mal formée.
    #[error("mappings invalides: {0}")]
    InvalidMapping(String),

    /// Configuration incohérente.
    #[error("config: {0}")]
    Config(String),
}

impl Error {
    /// Nature de l’erreur de traduction, s’il s’agit d’une.
    pub fn kind(&self) -> Option<&ErrorKind> {
        match self {
            Error::Syntax { kind, .. } => Some(kind),
            _ => None,
        }
    }
}

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// `\n` est un terme à part entière : on l’affiche échappé.
fn printable(term: &str) -> String {
    term.escape_debug().to_string()
}
