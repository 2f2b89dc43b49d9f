//! rpn-core: Compilateur RPN (postfixe) → JavaScript avec source map
//!
//! Une ligne source = une instruction postfixe (`c a b 1 - / =`). Le code
//! généré pilote une machine à pile runtime (`rpn.push( 8 ); rpn.subtract();`)
//! et une source map v3 relie chaque instruction émise au terme d’origine.
//!
//! ## Modules
//! - `syntax`   : positions, tokenizer, AST en arène, traducteur.
//! - `compiler` : génération, assemblage, source map, configuration, pilote.
//! - `error`    : erreurs de traduction et d’E/S.
//!
//! ## Exemple
//! ```
//! let t = rpn_core::compile("prog.rpn", "8 3 -").unwrap();
//! assert!(t.code.contains("rpn.subtract();"));
//! assert_eq!(t.map.mappings, ";;AAAAA;AAAEC;AAAEC");
//! ```

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms, unused_must_use)]

pub mod compiler;
pub mod error;
pub mod syntax;

// ---------- Reexports de confort ----------
pub use compiler::{Config, Driver, Mapping, SourceMap, Translation};
pub use error::{Error, ErrorKind, Result, SyntaxError};
pub use syntax::{translate, Ast, Position};

/// Version du crate (lisible, via Cargo).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Compile `text` en mémoire avec la configuration par défaut.
pub fn compile(name: &str, text: &str) -> Result<Translation> {
    Driver::new(Config::default())?.compile_source(name, text)
}
