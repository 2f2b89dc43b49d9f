//! sourcemap.rs: Source map v3 (JSON + Base64 VLQ).
//!
//! Format des `mappings` :
//! - `;` sépare les lignes générées, `,` les segments d’une même ligne ;
//! - segment à 5 champs : colonne générée, index de source, ligne d’origine
//!   (0-based), colonne d’origine, index de nom ;
//! - la colonne générée repart de 0 à chaque ligne, les autres champs sont
//!   relatifs au segment précédent dans tout le fichier.
//!
//! Deux mappings consécutifs identiques sont fusionnés à l’encodage.

#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

use crate::compiler::output::{LineCol, Mapping};
use crate::error::{Error, Result};

pub const VERSION: u32 = 3;

const BASE64: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
const VLQ_SHIFT: u32 = 5;
const VLQ_MASK: i64 = (1 << VLQ_SHIFT) - 1;
const VLQ_CONTINUATION: i64 = 1 << VLQ_SHIFT;

/* ───────────────────────────── VLQ ───────────────────────────── */

/// Encode un entier signé en Base64 VLQ (bit de signe en poids faible).
pub fn encode_vlq(value: i64, out: &mut String) {
    let mut v = if value < 0 { ((-value) << 1) | 1 } else { value << 1 };
    loop {
        let mut digit = v & VLQ_MASK;
        v >>= VLQ_SHIFT;
        if v > 0 {
            digit |= VLQ_CONTINUATION;
        }
        out.push(char::from(BASE64[usize::try_from(digit).unwrap_or(0)]));
        if v == 0 {
            break;
        }
    }
}

fn base64_value(c: char) -> Option<i64> {
    let b = u8::try_from(c).ok()?;
    BASE64.iter().position(|x| *x == b).and_then(|p| i64::try_from(p).ok())
}

/// Décode une valeur VLQ depuis `chars`.
pub fn decode_vlq(chars: &mut impl Iterator<Item = char>) -> Result<i64> {
    let mut acc: i64 = 0;
    let mut shift = 0u32;
    loop {
        let c = chars
            .next()
            .ok_or_else(|| Error::InvalidMapping("VLQ tronqué".into()))?;
        let digit = base64_value(c)
            .ok_or_else(|| Error::InvalidMapping(format!("caractère base64 invalide: `{c}`")))?;
        if shift > 60 {
            return Err(Error::InvalidMapping("VLQ trop long".into()));
        }
        acc |= (digit & VLQ_MASK) << shift;
        if digit & VLQ_CONTINUATION == 0 {
            break;
        }
        shift += VLQ_SHIFT;
    }
    let magnitude = acc >> 1;
    Ok(if acc & 1 == 1 { -magnitude } else { magnitude })
}

/* ───────────────────────────── SourceMap ───────────────────────────── */

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMap {
    pub version: u32,
    /// Nom du fichier de code généré.
    pub file: String,
    pub sources: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources_content: Option<Vec<Option<String>>>,
    pub names: Vec<String>,
    pub mappings: String,
}

impl SourceMap {
    /// Construit la source map d’un fichier généré à partir de sa table.
    ///
    /// `sources` et `names` sont dédupliqués dans l’ordre de première utilisation.
    pub fn from_mappings(file: impl Into<String>, table: &[Mapping]) -> Self {
        let mut sources: Vec<String> = Vec::new();
        let mut names: Vec<String> = Vec::new();
        let mut mappings = String::new();

        let mut line = 1u32;
        let mut first_in_line = true;
        let mut prev_gen_col = 0i64;
        let (mut prev_src, mut prev_line, mut prev_col, mut prev_name) = (0i64, 0i64, 0i64, 0i64);

        let mut previous: Option<&Mapping> = None;
        for m in table {
            if previous == Some(m) {
                continue;
            }
            previous = Some(m);

            while line < m.generated.line {
                mappings.push(';');
                line += 1;
                first_in_line = true;
                prev_gen_col = 0;
            }
            if !first_in_line {
                mappings.push(',');
            }
            first_in_line = false;

            let src = index_of(&mut sources, &m.source);
            let name = index_of(&mut names, &m.name);
            let gen_col = i64::from(m.generated.column);
            let orig_line = i64::from(m.original.line.saturating_sub(1));
            let orig_col = i64::from(m.original.column);

            encode_vlq(gen_col - prev_gen_col, &mut mappings);
            encode_vlq(src - prev_src, &mut mappings);
            encode_vlq(orig_line - prev_line, &mut mappings);
            encode_vlq(orig_col - prev_col, &mut mappings);
            encode_vlq(name - prev_name, &mut mappings);

            prev_gen_col = gen_col;
            (prev_src, prev_line, prev_col, prev_name) = (src, orig_line, orig_col, name);
        }

        Self {
            version: VERSION,
            file: file.into(),
            sources,
            sources_content: None,
            names,
            mappings,
        }
    }

    /// Recopie le texte source (une entrée par source, même ordre).
    #[must_use]
    pub fn with_sources_content(mut self, contents: Vec<Option<String>>) -> Self {
        self.sources_content = Some(contents);
        self
    }

    pub fn to_json(&self, pretty: bool) -> Result<String> {
        Ok(if pretty { serde_json::to_string_pretty(self)? } else { serde_json::to_string(self)? })
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let map: Self = serde_json::from_str(text)?;
        if map.version != VERSION {
            return Err(Error::InvalidMapping(format!("version {} non supportée", map.version)));
        }
        Ok(map)
    }

    /// Décode `mappings` en table complète (positions absolues).
    ///
    /// Les segments à 1 champ (sans origine) sont ignorés.
    pub fn decode(&self) -> Result<Vec<Mapping>> {
        let mut out = Vec::new();
        let (mut src, mut orig_line, mut orig_col, mut name) = (0i64, 0i64, 0i64, 0i64);

        for (line_index, line) in self.mappings.split(';').enumerate() {
            let gen_line = u32::try_from(line_index + 1)
                .map_err(|_| Error::InvalidMapping("trop de lignes".into()))?;
            let mut gen_col = 0i64;
            for segment in line.split(',').filter(|s| !s.is_empty()) {
                let mut chars = segment.chars().peekable();
                let mut fields = Vec::with_capacity(5);
                while chars.peek().is_some() {
                    fields.push(decode_vlq(&mut chars)?);
                }
                gen_col += fields[0];
                match fields.len() {
                    1 => continue,
                    4 | 5 => {}
                    n => {
                        let msg = format!("segment à {n} champs: `{segment}`");
                        return Err(Error::InvalidMapping(msg));
                    }
                }
                src += fields[1];
                orig_line += fields[2];
                orig_col += fields[3];
                let name_text = if fields.len() == 5 {
                    name += fields[4];
                    lookup(&self.names, name, "name")?.to_owned()
                } else {
                    String::new()
                };

                out.push(Mapping {
                    generated: LineCol::new(gen_line, to_u32(gen_col)?),
                    original: LineCol::new(to_u32(orig_line + 1)?, to_u32(orig_col)?),
                    source: lookup(&self.sources, src, "source")?.to_owned(),
                    name: name_text,
                });
            }
        }
        Ok(out)
    }

    /// Position d’origine du segment le plus proche à gauche sur la même ligne générée.
    pub fn original_position_for(&self, line: u32, column: u32) -> Result<Option<Mapping>> {
        Ok(self
            .decode()?
            .into_iter()
            .filter(|m| m.generated.line == line && m.generated.column <= column)
            .max_by_key(|m| m.generated.column))
    }
}

fn index_of(list: &mut Vec<String>, item: &str) -> i64 {
    let idx = match list.iter().position(|s| s == item) {
        Some(i) => i,
        None => {
            list.push(item.to_owned());
            list.len() - 1
        }
    };
    i64::try_from(idx).unwrap_or(i64::MAX)
}

fn lookup<'a>(list: &'a [String], index: i64, what: &str) -> Result<&'a str> {
    usize::try_from(index)
        .ok()
        .and_then(|i| list.get(i))
        .map(String::as_str)
        .ok_or_else(|| Error::InvalidMapping(format!("index de {what} hors bornes: {index}")))
}

fn to_u32(v: i64) -> Result<u32> {
    u32::try_from(v)
        .map_err(|_| Error::InvalidMapping(format!("position négative ou trop grande: {v}")))
}

/* ───────────────────────────── Tests ───────────────────────────── */

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn vlq(v: i64) -> String {
        let mut s = String::new();
        encode_vlq(v, &mut s);
        s
    }

    fn m(gl: u32, gc: u32, ol: u32, oc: u32, name: &str) -> Mapping {
        Mapping {
            generated: LineCol::new(gl, gc),
            original: LineCol::new(ol, oc),
            source: "prog.rpn".into(),
            name: name.into(),
        }
    }

    #[test]
    fn vlq_known_values() {
        assert_eq!(vlq(0), "A");
        assert_eq!(vlq(1), "C");
        assert_eq!(vlq(-1), "D");
        assert_eq!(vlq(15), "e");
        assert_eq!(vlq(16), "gB");
        assert_eq!(vlq(123), "2H");
        for v in [-1000, -33, -16, 0, 31, 32, 1 << 20] {
            assert_eq!(decode_vlq(&mut vlq(v).chars()).unwrap(), v);
        }
    }

    #[test]
    fn vlq_errors() {
        assert!(matches!(decode_vlq(&mut "g".chars()), Err(Error::InvalidMapping(_))));
        assert!(matches!(decode_vlq(&mut "!".chars()), Err(Error::InvalidMapping(_))));
    }

    #[test]
    fn encodes_lines_segments_and_names() {
        let table = vec![m(3, 0, 1, 0, "8"), m(4, 0, 1, 2, "3"), m(5, 0, 1, 4, "-")];
        let map = SourceMap::from_mappings("prog.js", &table);
        assert_eq!(map.mappings, ";;AAAAA;AAAEC;AAAEC");
        assert_eq!(map.names, vec!["8", "3", "-"]);
        assert_eq!(map.sources, vec!["prog.rpn"]);
        assert_eq!(map.decode().unwrap(), table);
    }

    #[test]
    fn same_line_segments_and_reused_names() {
        let table = vec![m(1, 0, 2, 0, "x"), m(1, 5, 2, 2, "y"), m(2, 1, 1, 0, "x")];
        let map = SourceMap::from_mappings("o.js", &table);
        assert_eq!(map.names, vec!["x", "y"]);
        assert!(map.mappings.contains(','));
        assert_eq!(map.decode().unwrap(), table);
    }

    #[test]
    fn identical_consecutive_mappings_collapse() {
        let table = vec![m(1, 0, 1, 0, "a"), m(1, 0, 1, 0, "a")];
        assert_eq!(SourceMap::from_mappings("o.js", &table).mappings, "AAAAA");
    }

    #[test]
    fn json_shape_and_roundtrip() {
        let map = SourceMap::from_mappings("p.js", &[m(1, 0, 1, 0, "a")])
            .with_sources_content(vec![Some("a\n".into())]);
        let json = map.to_json(false).unwrap();
        assert_eq!(
            json,
            concat!(
                r#"{"version":3,"file":"p.js","sources":["prog.rpn"],"#,
                r#""sourcesContent":["a\n"],"names":["a"],"mappings":"AAAAA"}"#,
            )
        );
        assert_eq!(SourceMap::from_json(&json).unwrap(), map);
    }

    #[test]
    fn rejects_other_versions() {
        let json = r#"{"version":2,"file":"p.js","sources":[],"names":[],"mappings":""}"#;
        assert!(matches!(SourceMap::from_json(json), Err(Error::InvalidMapping(_))));
    }

    #[test]
    fn greatest_lower_bound_lookup() {
        let table = vec![m(3, 0, 1, 0, "a"), m(3, 10, 1, 4, "b"), m(4, 0, 2, 0, "c")];
        let map = SourceMap::from_mappings("p.js", &table);
        assert_eq!(map.original_position_for(3, 7).unwrap().unwrap().name, "a");
        assert_eq!(map.original_position_for(3, 99).unwrap().unwrap().name, "b");
        assert_eq!(map.original_position_for(1, 0).unwrap(), None);
    }
}
