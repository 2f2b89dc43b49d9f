//! rpn-cli/src/lib.rs: CLI lib pour le compilateur RPN
//!
//! Sous-commandes :
//!   - build : compile des `.rpn` en `.js` + `.js.map` (à côté de chaque source)
//!   - run   : compile en mémoire puis exécute avec la machine à pile
//!   - map   : affiche la table de correspondance décodée d’un `.map`
//!
//! Configuration (du plus faible au plus fort) :
//!   défauts < fichier TOML (`--config`) < ENV `RPN_*` < options de la ligne de commande.
//!
//! ```toml
//! [compiler]
//! target_extension = ".mjs"
//! runtime_module = "./vm.js"
//!
//! [run]
//! print_mode = "repeat"
//! capacity = 64
//! repeat_limit = 100
//! ```

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms, unused_must_use)]

use std::fs;
use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use log::{debug, LevelFilter};
use serde::Deserialize;

use rpn_core::compiler::Config;

pub mod commands;

/// Point d’entrée du binaire (à appeler depuis src/main.rs)
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose);
    let mut stdout = std::io::stdout().lock();
    run_with(cli, &mut stdout)
}

/// Exécute une ligne de commande déjà parsée, sortie normale vers `out`.
pub fn run_with(cli: Cli, out: &mut dyn Write) -> Result<()> {
    let settings = load_settings(cli.config.as_deref())?;
    debug!("configuration effective: {:?}", settings.compiler);

    match cli.cmd {
        Cmd::Build(a) => commands::build::exec(a, settings.compiler, out),
        Cmd::Run(a) => commands::run::exec(a, &settings, out),
        Cmd::Map(a) => commands::map::exec(a, out),
    }
}

#[derive(Parser, Debug)]
#[command(name = "rpnc", version, about = "Compilateur RPN → JavaScript avec source map")]
pub struct Cli {
    /// Verbosité (répéter pour plus de bruit : -v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Fichier de configuration TOML
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<Utf8PathBuf>,

    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Compiler des fichiers .rpn (code + source map)
    Build(commands::build::Args),
    /// Compiler puis exécuter un fichier .rpn
    Run(commands::run::Args),
    /// Décoder une source map
    Map(commands::map::Args),
}

/* ─────────────────────────── Configuration ─────────────────────────── */

/// Contenu du fichier `--config` (toutes les sections sont facultatives).
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub compiler: Config,
    pub run: RunDefaults,
}

/// Valeurs par défaut de `rpnc run`.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunDefaults {
    pub print_mode: Option<commands::run::PrintModeArg>,
    pub capacity: Option<usize>,
    pub repeat_limit: Option<usize>,
    pub max_steps: Option<usize>,
}

/// Défauts, puis TOML éventuel, puis ENV `RPN_*`.
pub fn load_settings(path: Option<&Utf8Path>) -> Result<Settings> {
    let mut settings = match path {
        Some(p) => {
            let text = fs::read_to_string(p).wrap_err_with(|| format!("lecture de {p}"))?;
            toml::from_str::<Settings>(&text).wrap_err_with(|| format!("config invalide: {p}"))?
        }
        None => Settings::default(),
    };
    settings.compiler.apply_env();
    Ok(settings)
}

/* ─────────────────────────── Logs ─────────────────────────── */

fn level_for(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// `-v` fixe le niveau de base, `RUST_LOG` a le dernier mot.
pub fn init_logger(verbose: u8) {
    let _ = env_logger::Builder::new()
        .filter_level(level_for(verbose))
        .parse_default_env()
        .format_target(false)
        .try_init();
}
