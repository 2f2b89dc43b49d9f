//! Module `compiler` (rpn-core)
//!
//! 🧩 De l’AST aux artefacts :
//! - [`config`]    : noyau de configuration (extensions, noms runtime, options map)
//! - [`codegen`]   : AST → arbre de [`fragment::Fragment`] JavaScript
//! - [`output`]    : assemblage texte + table de correspondance, marqueur `sourceMappingURL`
//! - [`sourcemap`] : encodage/décodage source map v3 (VLQ)
//! - [`driver`]    : pilote fichier / lot
//!
//! ## Exemple rapide
//! ```no_run
//! use camino::Utf8Path;
//! use rpn_core::compiler::{Config, Driver};
//!
//! let driver = Driver::new(Config::from_env()).expect("config valide");
//! let report = driver.compile_files(&[Utf8Path::new("calc.rpn")]);
//! assert!(report.is_success());
//! ```

#![forbid(unsafe_code)]

pub mod codegen;
pub mod config;
pub mod driver;
pub mod fragment;
pub mod output;
pub mod sourcemap;

pub use codegen::CodeGen;
pub use config::{CliOverrides, Config};
pub use driver::{artifact_paths, ArtifactPaths, Artifacts, BatchReport, Driver, Translation};
pub use fragment::{Chunk, Fragment};
pub use output::{assemble, Assembled, Assembler, LineCol, Mapping};
pub use sourcemap::SourceMap;
