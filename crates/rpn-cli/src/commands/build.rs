use std::io::Write;

use camino::Utf8PathBuf;
use clap::Args as ClapArgs;
use color_eyre::eyre::{bail, Result};
use log::error;

use rpn_core::compiler::{CliOverrides, Config, Driver};

#[derive(ClapArgs, Debug)]
pub struct Args {
    /// Fichiers .rpn à compiler (dans l’ordre)
    #[arg(required = true, value_name = "FILES")]
    pub files: Vec<Utf8PathBuf>,

    /// S’arrêter au premier fichier en échec
    #[arg(long)]
    pub fail_fast: bool,

    /// Recopier la source dans `sourcesContent`
    #[arg(long)]
    pub embed_sources: bool,

    /// Source map JSON indentée
    #[arg(long)]
    pub pretty_map: bool,

    /// Module importé par le code généré (défaut: ../rpn-vm.js)
    #[arg(long, value_name = "M")]
    pub runtime_module: Option<String>,
}

impl Args {
    /// Un drapeau absent ne remplace pas la valeur issue du TOML / de l’ENV.
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            runtime_module: self.runtime_module.clone(),
            embed_sources: self.embed_sources.then_some(true),
            pretty_map: self.pretty_map.then_some(true),
            fail_fast: self.fail_fast.then_some(true),
            ..CliOverrides::default()
        }
    }
}

pub fn exec(args: Args, mut cfg: Config, out: &mut dyn Write) -> Result<()> {
    cfg.apply_cli_overrides(&args.overrides());
    let driver = Driver::new(cfg)?;

    let report = driver.compile_files(&args.files);
    for a in &report.compiled {
        writeln!(out, "{} → {} + {} ({} mapping(s))", a.input, a.code, a.map, a.mappings)?;
    }
    if report.is_success() {
        return Ok(());
    }

    let (failed, total) = (report.failed.len(), args.files.len());
    let mut message = format!("{failed} fichier(s) en échec sur {total}");
    for (path, e) in &report.failed {
        error!("{path}: {e}");
        message.push_str(&format!("\n  {e}"));
    }
    bail!(message)
}
