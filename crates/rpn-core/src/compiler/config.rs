//! config.rs: Configuration du compilateur RPN → JavaScript.
//!
//! - Defaults sûrs (`Config::default()`)
//! - Lecture **ENV** (préfixe `RPN_...`) via `Config::from_env()`
//! - **Overrides CLI** via `CliOverrides` (appliqués avec `apply_cli_overrides`)
//! - `validate()` : extensions et identifiants runtime cohérents
//!
//! ENV supportés (tous facultatifs) :
//!   RPN_SOURCE_EXT=.rpn
//!   RPN_TARGET_EXT=.js
//!   RPN_MAP_EXT=.map
//!   RPN_RUNTIME_MODULE=../rpn-vm.js
//!   RPN_RUNTIME_CLASS=Rpn
//!   RPN_RUNTIME_INSTANCE=rpn
//!   RPN_EMBED_SOURCES=0|1
//!   RPN_PRETTY_MAP=0|1
//!   RPN_FAIL_FAST=0|1
//!   RPN_MAX_DEPTH=256
//!
//! Le fichier TOML est lu côté CLI ; ici on expose seulement `Serialize`/`Deserialize`
//! (chaque clé est facultative grâce à `#[serde(default)]`).

#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::syntax::translator::DEFAULT_MAX_DEPTH;

/* ─────────────────────────── Types publics ─────────────────────────── */

/// Configuration complète d’une compilation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /* Nommage des artefacts */
    /// Extension source reconnue (retirée sans tenir compte de la casse).
    pub source_extension: String,
    /// Extension du code généré.
    pub target_extension: String,
    /// Suffixe ajouté au nom du code pour obtenir la source map.
    pub map_extension: String,

    /* Préambule du code généré */
    pub runtime_module: String,
    pub runtime_class: String,
    pub runtime_instance: String,

    /* Source map */
    /// Recopie le texte source dans `sourcesContent`.
    pub embed_sources: bool,
    /// JSON indenté.
    pub pretty_map: bool,

    /* Lot */
    /// Arrête le lot au premier échec.
    pub fail_fast: bool,

    /* Traduction */
    /// Profondeur maximale d’imbrication d’une instruction.
    pub max_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_extension: ".rpn".into(),
            target_extension: ".js".into(),
            map_extension: ".map".into(),
            runtime_module: "../rpn-vm.js".into(),
            runtime_class: "Rpn".into(),
            runtime_instance: "rpn".into(),
            embed_sources: false,
            pretty_map: false,
            fail_fast: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/* ─────────────────────── Overrides (CLI / couches) ─────────────────────── */

/// Overrides fournis par une CLI en amont, appliqués en dernier.
#[derive(Default, Clone, Debug)]
pub struct CliOverrides {
    pub source_extension: Option<String>,
    pub target_extension: Option<String>,
    pub runtime_module: Option<String>,
    pub embed_sources: Option<bool>,
    pub pretty_map: Option<bool>,
    pub fail_fast: Option<bool>,
    pub max_depth: Option<usize>,
}

impl Config {
    /// Construit depuis les valeurs par défaut + ENV.
    pub fn from_env() -> Self {
        let mut c = Self::default();
        c.apply_env();
        c
    }

    /// Applique les variables d’environnement `RPN_*`.
    pub fn apply_env(&mut self) {
        self.apply_lookup(|key| std::env::var(key).ok());
    }

    /// Même chose qu’`apply_env`, avec une source de variables injectable (tests).
    pub fn apply_lookup(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        // chaînes
        if let Some(v) = lookup("RPN_SOURCE_EXT")       { self.source_extension = v; }
        if let Some(v) = lookup("RPN_TARGET_EXT")       { self.target_extension = v; }
        if let Some(v) = lookup("RPN_MAP_EXT")          { self.map_extension = v; }
        if let Some(v) = lookup("RPN_RUNTIME_MODULE")   { self.runtime_module = v; }
        if let Some(v) = lookup("RPN_RUNTIME_CLASS")    { self.runtime_class = v; }
        if let Some(v) = lookup("RPN_RUNTIME_INSTANCE") { self.runtime_instance = v; }

        // bools
        if let Some(b) = lookup("RPN_EMBED_SOURCES").as_deref().and_then(parse_bool) { self.embed_sources = b; }
        if let Some(b) = lookup("RPN_PRETTY_MAP").as_deref().and_then(parse_bool)    { self.pretty_map = b; }
        if let Some(b) = lookup("RPN_FAIL_FAST").as_deref().and_then(parse_bool)     { self.fail_fast = b; }

        // entiers
        if let Some(n) = lookup("RPN_MAX_DEPTH").as_deref().and_then(parse_usize)    { self.max_depth = n; }
    }

    /// Applique des overrides “dernier mot” typiquement issus d’une CLI.
    pub fn apply_cli_overrides(&mut self, o: &CliOverrides) {
        if let Some(x) = &o.source_extension { self.source_extension = x.clone(); }
        if let Some(x) = &o.target_extension { self.target_extension = x.clone(); }
        if let Some(x) = &o.runtime_module   { self.runtime_module = x.clone(); }
        if let Some(x) = o.embed_sources     { self.embed_sources = x; }
        if let Some(x) = o.pretty_map        { self.pretty_map = x; }
        if let Some(x) = o.fail_fast         { self.fail_fast = x; }
        if let Some(x) = o.max_depth         { self.max_depth = x; }
    }

    /// Validation de base.
    pub fn validate(&self) -> Result<()> {
        for (key, ext) in [
            ("source_extension", &self.source_extension),
            ("target_extension", &self.target_extension),
            ("map_extension", &self.map_extension),
        ] {
            if ext.len() < 2 || !ext.starts_with('.') {
                let msg = format!("{key} doit commencer par `.` et être non vide: `{ext}`");
                return Err(Error::Config(msg));
            }
        }
        for (key, ident) in [
            ("runtime_class", &self.runtime_class),
            ("runtime_instance", &self.runtime_instance),
        ] {
            if !is_js_identifier(ident) {
                let msg = format!("{key} n’est pas un identifiant JavaScript: `{ident}`");
                return Err(Error::Config(msg));
            }
        }
        if self.runtime_instance == self.runtime_class {
            return Err(Error::Config("runtime_instance et runtime_class doivent différer".into()));
        }
        if self.max_depth == 0 {
            return Err(Error::Config("max_depth doit être > 0".into()));
        }
        if self.runtime_module.trim().is_empty() || self.runtime_module.contains('\'') {
            let msg = format!("runtime_module invalide: `{}`", self.runtime_module);
            return Err(Error::Config(msg));
        }
        Ok(())
    }
}

/* ────────────────────────── Parsing ────────────────────────── */

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

fn parse_usize(s: &str) -> Option<usize> {
    s.trim().parse().ok()
}

/// `[A-Za-z_$][A-Za-z0-9_$]*`
pub fn is_js_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/* ───────────────────────────── Tests ───────────────────────────── */
