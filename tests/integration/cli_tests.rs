use clap::Parser;
use dupehunt::cli::Cli;
use dupehunt::error::ExitCode;
use dupehunt::run_with_output;
use std::fs;
use std::path::Path;
use tempfile::{tempdir, TempDir};

/// A scan root with one group of two files plus an unrelated file, and an
/// empty config file so the user's own settings cannot leak in.
fn fixture() -> (TempDir, TempDir) {
    let root = tempdir().unwrap();
    fs::write(root.path().join("a.txt"), b"hello").unwrap();
    fs::write(root.path().join("b.txt"), b"hello").unwrap();
    fs::write(root.path().join("c.txt"), b"world!").unwrap();

    let config_dir = tempdir().unwrap();
    fs::write(config_dir.path().join("config.toml"), "").unwrap();
    (root, config_dir)
}

fn run(root: &Path, config_dir: &Path, extra: &[&str]) -> (ExitCode, String) {
    let config = config_dir.join("config.toml");
    let mut argv = vec![
        "dupehunt",
        "scan",
        root.to_str().unwrap(),
        "--no-progress",
        "--config",
        config.to_str().unwrap(),
    ];
    argv.extend_from_slice(extra);

    let cli = Cli::try_parse_from(argv).unwrap();
    let mut out = Vec::new();
    let code = run_with_output(cli, &mut out, false).unwrap();
    (code, String::from_utf8(out).unwrap())
}

#[test]
fn test_text_report() {
    let (root, config_dir) = fixture();

    let (code, out) = run(root.path(), config_dir.path(), &["--labels", "sequential"]);

    assert_eq!(code, ExitCode::Success);
    assert!(out.contains("Duplicate group (Group 1): 2 files"));
    assert!(out.contains(&format!("  {}", root.path().join("a.txt").display())));
    assert!(out.contains(&format!("  {}", root.path().join("b.txt").display())));
    assert!(!out.contains("c.txt"));
    assert!(out.contains("1 duplicate group, 1 redundant file"));
    // No ANSI escapes when color is off
    assert!(!out.contains('\u{1b}'));
}

#[test]
fn test_text_report_uses_hash_labels_by_default() {
    let (root, config_dir) = fixture();

    let (_, out) = run(root.path(), config_dir.path(), &[]);

    let digest = dupehunt::scanner::hash_to_hex(&dupehunt::scanner::Hasher::new().hash_bytes(b"hello"));
    assert!(out.contains(&format!("Duplicate group ({digest})")));
}

#[test]
fn test_json_report() {
    let (root, config_dir) = fixture();

    let (code, out) = run(
        root.path(),
        config_dir.path(),
        &["--output", "json", "--labels", "sequential"],
    );
    let value: serde_json::Value = serde_json::from_str(&out).unwrap();

    assert_eq!(code, ExitCode::Success);
    let duplicates = value["duplicates"].as_array().unwrap();
    assert_eq!(duplicates.len(), 1);
    assert_eq!(duplicates[0]["label"], "Group 1");
    assert_eq!(duplicates[0]["size"], 5);
    assert_eq!(duplicates[0]["files"].as_array().unwrap().len(), 2);
    assert_eq!(value["summary"]["total_files"], 3);
    assert_eq!(value["summary"]["exit_code"], 0);
    assert_eq!(value["summary"]["exit_code_name"], "DH000");
}

#[test]
fn test_no_duplicates_exit_code() {
    let root = tempdir().unwrap();
    fs::write(root.path().join("only.txt"), b"alone").unwrap();
    let config_dir = tempdir().unwrap();
    fs::write(config_dir.path().join("config.toml"), "").unwrap();

    let (code, out) = run(root.path(), config_dir.path(), &[]);

    assert_eq!(code, ExitCode::NoDuplicates);
    assert!(out.contains("No duplicate files found."));
}

#[test]
fn test_config_file_selects_json() {
    let (root, config_dir) = fixture();
    fs::write(config_dir.path().join("config.toml"), "output = \"json\"\n").unwrap();

    let (_, out) = run(root.path(), config_dir.path(), &[]);

    assert!(serde_json::from_str::<serde_json::Value>(&out).is_ok());
}

#[test]
fn test_cli_flag_beats_config_file() {
    let (root, config_dir) = fixture();
    fs::write(config_dir.path().join("config.toml"), "output = \"json\"\n").unwrap();

    let (_, out) = run(root.path(), config_dir.path(), &["--output", "text"]);

    assert!(out.starts_with("Duplicate group"));
}

#[test]
fn test_missing_config_file_is_an_error() {
    let (root, _) = fixture();
    let cli = Cli::try_parse_from([
        "dupehunt",
        "scan",
        root.path().to_str().unwrap(),
        "--no-progress",
        "--config",
        "/definitely/not/here.toml",
    ])
    .unwrap();

    let err = run_with_output(cli, &mut Vec::new(), false).unwrap_err();

    assert!(err.to_string().contains("Config file not found"));
    assert_eq!(ExitCode::for_error(&err), ExitCode::GeneralError);
}

#[test]
fn test_zero_io_threads_rejected() {
    let result = Cli::try_parse_from(["dupehunt", "scan", "/tmp", "--io-threads", "0"]);
    assert!(result.is_err());
}
