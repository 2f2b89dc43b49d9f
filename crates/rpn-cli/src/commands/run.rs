use std::fs;
use std::io::Write;

use camino::Utf8PathBuf;
use clap::{Args as ClapArgs, ValueEnum};
use color_eyre::eyre::{bail, Result, WrapErr};
use log::{debug, info};
use serde::Deserialize;

use rpn_core::compiler::Driver;
use rpn_runtime::{execute, ExecOptions, PrintMode, DEFAULT_CAPACITY, DEFAULT_REPEAT_LIMIT};

use crate::Settings;

#[derive(ValueEnum, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PrintModeArg {
    /// Affiche le sommet et le laisse sur la pile
    Peek,
    /// Dépile un nombre de répétitions puis la valeur
    Repeat,
}

impl From<PrintModeArg> for PrintMode {
    fn from(m: PrintModeArg) -> Self {
        match m {
            PrintModeArg::Peek => PrintMode::Peek,
            PrintModeArg::Repeat => PrintMode::Repeat,
        }
    }
}

#[derive(ClapArgs, Debug)]
pub struct Args {
    /// Fichier .rpn à exécuter
    pub file: Utf8PathBuf,

    /// Liaison initiale `nom=valeur` (répétable)
    #[arg(long = "bind", value_name = "NOM=VALEUR", value_parser = parse_binding)]
    pub bindings: Vec<(String, f64)>,

    /// Sémantique de `print`
    #[arg(long, value_enum)]
    pub print_mode: Option<PrintModeArg>,

    /// Capacité de la pile
    #[arg(long, value_name = "N")]
    pub capacity: Option<usize>,

    /// Copies maximales d’un `print` en mode repeat
    #[arg(long, value_name = "N")]
    pub repeat_limit: Option<usize>,

    /// Garde-fou : nombre maximal d’instructions
    #[arg(long, value_name = "N")]
    pub max_steps: Option<usize>,

    /// Afficher la pile restante à la fin
    #[arg(long)]
    pub stack: bool,
}

fn parse_binding(s: &str) -> Result<(String, f64), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("attendu nom=valeur, reçu `{s}`"))?;
    let name = name.trim();
    if !name.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return Err(format!("nom de variable illégal: `{name}`"));
    }
    let value = value.trim().parse::<f64>().map_err(|e| format!("valeur `{value}`: {e}"))?;
    Ok((name.to_owned(), value))
}

pub fn exec(args: Args, settings: &Settings, out: &mut dyn Write) -> Result<()> {
    let text = fs::read_to_string(&args.file)
        .wrap_err_with(|| format!("lecture de {}", args.file))?;
    let driver = Driver::new(settings.compiler.clone())?;
    let t = driver.compile_source(args.file.as_str(), &text)?;
    debug!("{} : {} ligne(s) générée(s)", args.file, t.code.lines().count());

    let run = &settings.run;
    let opts = ExecOptions {
        print_mode: args.print_mode.or(run.print_mode).unwrap_or(PrintModeArg::Peek).into(),
        capacity: args.capacity.or(run.capacity).unwrap_or(DEFAULT_CAPACITY),
        repeat_limit: args.repeat_limit.or(run.repeat_limit).unwrap_or(DEFAULT_REPEAT_LIMIT),
        max_steps: args.max_steps.or(run.max_steps).or(ExecOptions::default().max_steps),
        capture_stdout: true,
    };
    let binds: Vec<(&str, f64)> = args.bindings.iter().map(|(n, v)| (n.as_str(), *v)).collect();

    let output = match execute(&t.code, &binds, opts) {
        Ok(o) => o,
        Err(e) => {
            // Remonte à la position `.rpn` via la source map.
            let at = t.map.original_position_for(e.line(), u32::MAX)?;
            match at {
                Some(m) => {
                    let (line, column) = (m.original.line, m.original.column);
                    bail!("{}:{line}:{column}: {e} (terme `{}`)", m.source, m.name)
                }
                None => return Err(e).wrap_err_with(|| format!("exécution de {}", args.file)),
            }
        }
    };
    info!("{} : {} instruction(s) exécutée(s)", args.file, output.steps);

    out.write_all(output.stdout.as_bytes())?;
    if args.stack {
        let rendered: Vec<String> = output.stack.iter().map(|v| rpn_runtime::render(*v)).collect();
        writeln!(out, "pile: [{}]", rendered.join(", "))?;
    }
    Ok(())
}
