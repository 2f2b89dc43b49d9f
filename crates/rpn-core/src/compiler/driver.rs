//! driver.rs: Pilote de compilation `.rpn` → `.js` + `.js.map`.
//!
//! Entrées : une liste ordonnée de fichiers, chacun compilé indépendamment.
//! Pour `dir/prog.rpn` on écrit `dir/prog.js` et `dir/prog.js.map`.
//!
//! Un échec n’interrompt pas le lot (sauf `fail_fast`) : le rapport liste
//! les fichiers compilés et chaque échec avec son erreur.

#![forbid(unsafe_code)]

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info, warn};

use crate::compiler::codegen::CodeGen;
use crate::compiler::config::Config;
use crate::compiler::output::{assemble, Mapping};
use crate::compiler::sourcemap::SourceMap;
use crate::error::{Error, Result};
use crate::syntax::translator::translate_with_depth;

/* ─────────────────────────── Types publics ─────────────────────────── */

/// Chemins des deux artefacts d’une entrée.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub code: Utf8PathBuf,
    pub map: Utf8PathBuf,
}

/// Résultat en mémoire d’une compilation.
#[derive(Debug, Clone)]
pub struct Translation {
    pub code: String,
    pub map: SourceMap,
    pub table: Vec<Mapping>,
}

/// Artefacts écrits pour une entrée.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifacts {
    pub input: Utf8PathBuf,
    pub code: Utf8PathBuf,
    pub map: Utf8PathBuf,
    /// Nombre d’entrées de la table de correspondance.
    pub mappings: usize,
}

/// Bilan d’un lot.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub compiled: Vec<Artifacts>,
    pub failed: Vec<(Utf8PathBuf, Error)>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/* ─────────────────────────── Nommage ─────────────────────────── */

/// Dérive les noms d’artefacts : extension source retirée (casse ignorée),
/// extension cible ajoutée, map = nom du code + extension map.
pub fn artifact_paths(input: &Utf8Path, config: &Config) -> ArtifactPaths {
    let file_name = input.file_name().unwrap_or(input.as_str());
    let stem = strip_suffix_ignore_case(file_name, &config.source_extension).unwrap_or(file_name);

    let code_name = format!("{stem}{}", config.target_extension);
    let map_name = format!("{code_name}{}", config.map_extension);

    let dir = input.parent().unwrap_or_else(|| Utf8Path::new(""));
    ArtifactPaths { code: dir.join(code_name), map: dir.join(map_name) }
}

fn strip_suffix_ignore_case<'a>(name: &'a str, suffix: &str) -> Option<&'a str> {
    let cut = name.len().checked_sub(suffix.len())?;
    let (stem, tail) = (name.get(..cut)?, name.get(cut..)?);
    (!stem.is_empty() && tail.eq_ignore_ascii_case(suffix)).then_some(stem)
}

fn file_name_of(path: &Utf8Path) -> &str {
    path.file_name().unwrap_or(path.as_str())
}

/* ─────────────────────────── Driver ─────────────────────────── */

#[derive(Debug, Clone)]
pub struct Driver {
    config: Config,
}

impl Driver {
    /// Valide la configuration une fois pour toutes.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Compile un texte en mémoire ; `name` est le nom de la source (ex. `prog.rpn`).
    pub fn compile_source(&self, name: &str, text: &str) -> Result<Translation> {
        self.translate_as(name, name, text)
    }

    /// Lit `input`, compile, écrit les deux artefacts à côté.
    pub fn compile_file(&self, input: &Utf8Path) -> Result<Artifacts> {
        let text = fs::read_to_string(input)
            .map_err(|source| Error::Io { path: input.to_owned(), source })?;
        let t = self.translate_as(input.as_str(), file_name_of(input), &text)?;

        let paths = artifact_paths(input, &self.config);
        write(&paths.code, &t.code)?;
        write(&paths.map, &t.map.to_json(self.config.pretty_map)?)?;
        debug!("{input}: {} mapping(s) → {}", t.table.len(), paths.map);
        info!("compilé {input} → {}", paths.code);

        Ok(Artifacts {
            input: input.to_owned(),
            code: paths.code,
            map: paths.map,
            mappings: t.table.len(),
        })
    }

    /// Compile chaque entrée dans l’ordre ; continue après un échec sauf `fail_fast`.
    pub fn compile_files<P: AsRef<Utf8Path>>(&self, inputs: &[P]) -> BatchReport {
        let mut report = BatchReport::default();
        for input in inputs {
            let input = input.as_ref();
            match self.compile_file(input) {
                Ok(a) => report.compiled.push(a),
                Err(e) => {
                    warn!("{e}");
                    report.failed.push((input.to_owned(), e));
                    if self.config.fail_fast {
                        break;
                    }
                }
            }
        }
        report
    }

    /// `label` apparaît dans les erreurs, `source` dans la source map.
    fn translate_as(&self, label: &str, source: &str, text: &str) -> Result<Translation> {
        let ast = translate_with_depth(text, self.config.max_depth)
            .map_err(|e| e.in_file(label))?;
        debug!("{label}: {} instruction(s), {} nœud(s)", ast.statements().len(), ast.len());

        let names = artifact_paths(Utf8Path::new(source), &self.config);
        let code_file = file_name_of(&names.code);
        let map_file = file_name_of(&names.map);

        let root = CodeGen::new(&self.config).generate(&ast);
        let out = assemble(&root, source, map_file);

        let mut map = SourceMap::from_mappings(code_file, &out.mappings);
        if self.config.embed_sources {
            map = map.with_sources_content(vec![Some(text.to_owned())]);
        }
        Ok(Translation { code: out.code, map, table: out.mappings })
    }
}

fn write(path: &Utf8Path, contents: &str) -> Result<()> {
    fs::write(path, contents).map_err(|source| Error::Io { path: path.to_owned(), source })
}

/* ───────────────────────────── Tests ───────────────────────────── */
