//! tests/cli.rs: `rpnc` de bout en bout (parse clap + exécution) sur un répertoire temporaire.

use std::fs;

use camino::Utf8PathBuf;
use clap::Parser;
use indoc::indoc;
use pretty_assertions::assert_eq;

use rpn_cli::{run_with, Cli};

fn rpnc(args: &[&str]) -> (color_eyre::Result<()>, String) {
    let argv = std::iter::once("rpnc").chain(args.iter().copied());
    let cli = Cli::try_parse_from(argv).expect("arguments valides");
    let mut out = Vec::new();
    let res = run_with(cli, &mut out);
    (res, String::from_utf8(out).expect("sortie UTF-8"))
}

fn workspace() -> (tempfile::TempDir, Utf8PathBuf) {
    let tmp = tempfile::tempdir().unwrap();
    let dir = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).unwrap();
    (tmp, dir)
}

#[test]
fn build_writes_artifacts_and_reports_them() {
    let (_tmp, dir) = workspace();
    let src = dir.join("prog.rpn");
    fs::write(&src, "8 3 -\n").unwrap();

    let (res, out) = rpnc(&["build", src.as_str()]);
    res.unwrap();
    assert_eq!(
        out,
        format!(
            "{src} → {} + {} (3 mapping(s))\n",
            dir.join("prog.js"),
            dir.join("prog.js.map")
        )
    );
    assert!(fs::read_to_string(dir.join("prog.js")).unwrap().contains("rpn.subtract();"));
}

#[test]
fn build_lists_every_failure() {
    let (_tmp, dir) = workspace();
    let good = dir.join("good.rpn");
    let bad1 = dir.join("bad1.rpn");
    let bad2 = dir.join("bad2.rpn");
    fs::write(&good, "1 2 +").unwrap();
    fs::write(&bad1, "1 2 %").unwrap();
    fs::write(&bad2, "2 x =").unwrap();

    let (res, out) = rpnc(&["build", bad1.as_str(), good.as_str(), bad2.as_str()]);
    let msg = format!("{:#}", res.unwrap_err());
    assert!(msg.starts_with("2 fichier(s) en échec sur 3"), "{msg}");
    assert!(msg.contains("opérateur illégal: `%`"), "{msg}");
    assert!(msg.contains("nom de variable illégal pour l’affectation: `2`"), "{msg}");
    assert!(out.contains("good.js"));
    assert!(dir.join("good.js.map").exists());
}

#[test]
fn config_file_and_flags_layer() {
    let (_tmp, dir) = workspace();
    let src = dir.join("p.rpn");
    fs::write(&src, "x print\n").unwrap();
    let cfg = dir.join("rpn.toml");
    fs::write(
        &cfg,
        indoc! {r#"
            [compiler]
            target_extension = ".mjs"
            runtime_module = "./from-toml.js"
        "#},
    )
    .unwrap();

    let (res, _) = rpnc(&[
        "--config",
        cfg.as_str(),
        "build",
        src.as_str(),
        "--runtime-module",
        "./vm.js",
        "--embed-sources",
    ]);
    res.unwrap();
    let code = fs::read_to_string(dir.join("p.mjs")).unwrap();
    assert!(code.starts_with("import { Rpn } from './vm.js';\n"));
    assert!(code.ends_with("//# sourceMappingURL=p.mjs.map\n"));
    let map = fs::read_to_string(dir.join("p.mjs.map")).unwrap();
    assert!(map.contains(r#""sourcesContent":["x print\n"]"#), "{map}");
}

#[test]
fn run_prints_and_binds() {
    let (_tmp, dir) = workspace();
    let src = dir.join("calc.rpn");
    fs::write(
        &src,
        indoc! {"
            c a b 1 - / =
            c print
        "},
    )
    .unwrap();

    let (res, out) = rpnc(&["run", src.as_str(), "--bind", "a=8", "--bind", "b=3", "--stack"]);
    res.unwrap();
    assert_eq!(out, "4\npile: [4]\n");
}

#[test]
fn run_repeat_mode_from_config() {
    let (_tmp, dir) = workspace();
    let src = dir.join("r.rpn");
    fs::write(&src, "7\n2 print\n").unwrap();
    let cfg = dir.join("rpn.toml");
    fs::write(&cfg, "[run]\nprint_mode = \"repeat\"\n").unwrap();

    let (res, out) = rpnc(&["run", src.as_str(), "--config", cfg.as_str()]);
    res.unwrap();
    assert_eq!(out, "7\n7\n");
}

#[test]
fn run_refuses_a_repeat_count_over_the_limit() {
    let (_tmp, dir) = workspace();
    let src = dir.join("r.rpn");
    fs::write(&src, "7\nn print\n").unwrap();

    let (res, out) = rpnc(&[
        "run",
        src.as_str(),
        "--print-mode",
        "repeat",
        "--repeat-limit",
        "5",
        "--bind",
        "n=6",
    ]);
    let msg = res.unwrap_err().to_string();
    assert!(msg.starts_with(&format!("{src}:2:2: ")), "{msg}");
    assert!(msg.contains("trop de répétitions : 6 (limite 5)"), "{msg}");
    assert!(out.is_empty());
}

#[test]
fn run_errors_point_back_to_the_source() {
    let (_tmp, dir) = workspace();
    let src = dir.join("div.rpn");
    fs::write(&src, "1 2 +\n  a 0 /\n").unwrap();

    let (res, _) = rpnc(&["run", src.as_str(), "--bind", "a=1"]);
    let msg = res.unwrap_err().to_string();
    // `rpn.divide();` vient du `/` en ligne 2, colonne 6.
    assert!(msg.starts_with(&format!("{src}:2:6: ")), "{msg}");
    assert!(msg.contains("division par 0"), "{msg}");
    assert!(msg.ends_with("(terme `/`)"), "{msg}");
}

#[test]
fn map_decodes_a_built_map() {
    let (_tmp, dir) = workspace();
    let src = dir.join("prog.rpn");
    fs::write(&src, "8 3 -").unwrap();
    rpnc(&["build", src.as_str()]).0.unwrap();

    let (res, out) = rpnc(&["map", dir.join("prog.js.map").as_str()]);
    res.unwrap();
    assert_eq!(
        out,
        indoc! {"
            prog.js ← prog.rpn (3 mapping(s))
            3:0 -> prog.rpn:1:0 `8`
            4:0 -> prog.rpn:1:2 `3`
            5:0 -> prog.rpn:1:4 `-`
        "}
    );
}
