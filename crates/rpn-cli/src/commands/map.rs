use std::fs;
use std::io::Write;

use camino::Utf8PathBuf;
use clap::Args as ClapArgs;
use color_eyre::eyre::{Result, WrapErr};

use rpn_core::compiler::SourceMap;

#[derive(ClapArgs, Debug)]
pub struct Args {
    /// Source map à décoder (ex. prog.js.map)
    #[arg(value_name = "FILE.map")]
    pub file: Utf8PathBuf,
}

/// Une ligne d’en-tête puis une ligne par mapping : `généré -> source:ligne:col `nom``.
pub fn exec(args: Args, out: &mut dyn Write) -> Result<()> {
    let text = fs::read_to_string(&args.file)
        .wrap_err_with(|| format!("lecture de {}", args.file))?;
    let map = SourceMap::from_json(&text)
        .wrap_err_with(|| format!("source map invalide: {}", args.file))?;
    let table = map.decode()?;

    writeln!(out, "{} ← {} ({} mapping(s))", map.file, map.sources.join(", "), table.len())?;
    for m in &table {
        writeln!(out, "{m}")?;
    }
    Ok(())
}
