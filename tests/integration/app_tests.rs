use clap::Parser;
use filetime::{set_file_mtime, FileTime};
use mostsimilar::cli::Cli;
use mostsimilar::config::Config;
use mostsimilar::error::ExitCode;
use mostsimilar::run_app;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

const SHARED: &str = "quantum harbor lantern meadow quantum orchid";

struct Workspace {
    _dir: TempDir,
    root: PathBuf,
    config: PathBuf,
    csv: PathBuf,
}

fn workspace() -> Workspace {
    let dir = tempdir().unwrap();
    let root = dir.path().join("corpus");
    fs::create_dir(&root).unwrap();
    let config = dir.path().join("config.toml");
    fs::write(&config, "").unwrap();
    let csv = dir.path().join("out.csv");
    Workspace {
        root,
        config,
        csv,
        _dir: dir,
    }
}

fn run(ws: &Workspace, args: &[&str]) -> anyhow::Result<ExitCode> {
    run_with_config(&ws.config, args)
}

fn run_with_config(config: &Path, args: &[&str]) -> anyhow::Result<ExitCode> {
    let mut argv: Vec<String> = vec![
        "mostsimilar".into(),
        "-q".into(),
        "--config".into(),
        config.display().to_string(),
    ];
    argv.extend(args.iter().map(|s| (*s).to_string()));
    let cli = Cli::try_parse_from(argv).unwrap();
    let _guard = crate::env_lock();
    run_app(cli)
}

fn age(path: &Path, secs: i64) {
    set_file_mtime(path, FileTime::from_unix_time(secs, 0)).unwrap();
}

#[test]
fn test_app_scan_writes_csv() {
    let ws = workspace();
    fs::write(ws.root.join("a.txt"), SHARED).unwrap();
    fs::write(ws.root.join("b.txt"), SHARED).unwrap();
    fs::write(ws.root.join("c.txt"), "violin copper glacier").unwrap();
    age(&ws.root.join("a.txt"), 2_000_000);
    age(&ws.root.join("b.txt"), 1_000_000);

    let root = ws.root.display().to_string();
    let csv = ws.csv.display().to_string();
    let code = run(&ws, &["scan", &root, "--no-table", "-o", &csv, "-j", "2"]).unwrap();

    assert_eq!(code, ExitCode::Success);
    let content = fs::read_to_string(&ws.csv).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "file,most_similar,score,pair_id");
    assert_eq!(lines[1], ".../a.txt,.../b.txt,1.00000000,1");
    assert!(lines[2].starts_with(".../c.txt,.../a.txt,0.00000000,"));
    // Nothing moved without --dedup.
    assert!(ws.root.join("b.txt").exists());
}

#[test]
fn test_app_scan_dedup_relocates() {
    let ws = workspace();
    fs::write(ws.root.join("a.txt"), SHARED).unwrap();
    fs::write(ws.root.join("b.txt"), SHARED).unwrap();
    fs::write(ws.root.join("c.txt"), "violin copper glacier").unwrap();
    age(&ws.root.join("a.txt"), 1_000_000);
    age(&ws.root.join("b.txt"), 2_000_000);

    let root = ws.root.display().to_string();
    let csv = ws.csv.display().to_string();
    let code = run(&ws, &["scan", &root, "--no-table", "-o", &csv, "--dedup"]).unwrap();

    assert_eq!(code, ExitCode::Success);
    assert!(!ws.root.join("a.txt").exists());
    assert!(ws.root.join("Duplicates").join("a.txt").exists());
    assert!(ws.root.join("b.txt").exists());
    assert!(ws.root.join("c.txt").exists());
}

#[test]
fn test_app_scan_uses_configured_duplicates_dir() {
    let ws = workspace();
    fs::write(&ws.config, "duplicates_dir_name = \"Attic\"\n").unwrap();
    fs::write(ws.root.join("a.txt"), SHARED).unwrap();
    fs::write(ws.root.join("b.txt"), SHARED).unwrap();
    age(&ws.root.join("a.txt"), 1_500_000);
    age(&ws.root.join("b.txt"), 1_500_000);

    let root = ws.root.display().to_string();
    let csv = ws.csv.display().to_string();
    run(&ws, &["scan", &root, "--no-table", "-o", &csv, "--dedup", "0.99"]).unwrap();

    // Equal times: the later discovery is the duplicate.
    assert!(ws.root.join("Attic").join("b.txt").exists());
    assert!(ws.root.join("a.txt").exists());
}

#[test]
fn test_app_scan_empty_directory_is_incomplete() {
    let ws = workspace();
    let root = ws.root.display().to_string();
    let csv = ws.csv.display().to_string();

    let err = run(&ws, &["scan", &root, "--no-table", "-o", &csv]).unwrap_err();
    assert_eq!(ExitCode::for_error(&err), ExitCode::Incomplete);
    assert!(!ws.csv.exists());
}

#[test]
fn test_app_scan_single_document_is_incomplete() {
    let ws = workspace();
    fs::write(ws.root.join("a.txt"), SHARED).unwrap();
    fs::write(ws.root.join("b.txt"), "").unwrap();
    let root = ws.root.display().to_string();
    let csv = ws.csv.display().to_string();

    let err = run(&ws, &["scan", &root, "--no-table", "-o", &csv]).unwrap_err();
    assert_eq!(ExitCode::for_error(&err), ExitCode::Incomplete);
}

#[test]
fn test_app_scan_missing_root_is_general_error() {
    let ws = workspace();
    let missing = ws.root.join("nope").display().to_string();

    let err = run(&ws, &["scan", &missing, "--no-table"]).unwrap_err();
    assert_eq!(ExitCode::for_error(&err), ExitCode::GeneralError);
}

#[test]
fn test_app_invalid_config_is_general_error() {
    let ws = workspace();
    fs::write(&ws.config, "dedup_threshold = 3.0\n").unwrap();
    fs::write(ws.root.join("a.txt"), SHARED).unwrap();
    let root = ws.root.display().to_string();

    let err = run(&ws, &["scan", &root, "--no-table"]).unwrap_err();
    assert_eq!(ExitCode::for_error(&err), ExitCode::GeneralError);
    assert!(format!("{err:#}").contains("dedup_threshold"));
}

#[test]
fn test_app_match_runs() {
    let ws = workspace();
    fs::write(ws.root.join("a.txt"), SHARED).unwrap();
    fs::write(ws.root.join("b.txt"), "violin copper glacier").unwrap();
    let sample = ws.config.with_file_name("sample.txt");
    fs::write(&sample, SHARED).unwrap();

    let sample = sample.display().to_string();
    let root = ws.root.display().to_string();
    let code = run(&ws, &["match", &sample, &root, "--hash"]).unwrap();
    assert_eq!(code, ExitCode::Success);
}

#[test]
fn test_app_match_empty_sample_is_incomplete() {
    let ws = workspace();
    fs::write(ws.root.join("a.txt"), SHARED).unwrap();
    let sample = ws.config.with_file_name("sample.txt");
    fs::write(&sample, "").unwrap();

    let sample = sample.display().to_string();
    let root = ws.root.display().to_string();
    let err = run(&ws, &["match", &sample, &root]).unwrap_err();
    assert_eq!(ExitCode::for_error(&err), ExitCode::Incomplete);
}

#[test]
fn test_app_scan_all_extensions() {
    let ws = workspace();
    fs::write(ws.root.join("a.dat"), SHARED).unwrap();
    fs::write(ws.root.join("b.dat"), SHARED).unwrap();
    fs::write(ws.root.join("c.txt"), "violin copper glacier").unwrap();
    age(&ws.root.join("a.dat"), 1_000_000);
    age(&ws.root.join("b.dat"), 1_000_000);
    let root = ws.root.display().to_string();
    let csv = ws.csv.display().to_string();

    // Only c.txt passes the default filter.
    let err = run(&ws, &["scan", &root, "--no-table", "-o", &csv]).unwrap_err();
    assert_eq!(ExitCode::for_error(&err), ExitCode::Incomplete);

    let code = run(&ws, &["scan", &root, "--no-table", "-o", &csv, "--all-extensions"]).unwrap();
    assert_eq!(code, ExitCode::Success);
    let content = fs::read_to_string(&ws.csv).unwrap();
    assert_eq!(content.lines().count(), 3);
    assert!(content.contains(".../a.dat,.../b.dat,1.00000000,1"));
}

#[test]
fn test_app_config_save_creates_file() {
    let ws = workspace();
    let target = ws.config.with_file_name("fresh").join("config.toml");
    assert!(!target.exists());

    let code = run_with_config(&target, &["config", "save"]).unwrap();
    assert_eq!(code, ExitCode::Success);
    assert!(target.is_file());
    let _guard = crate::env_lock();
    assert_eq!(Config::load_from_path(&target).unwrap(), Config::default());
}

#[test]
fn test_app_config_save_keeps_file_values() {
    let ws = workspace();
    fs::write(&ws.config, "metric = \"euclidean\"\nthreads = 3\n").unwrap();

    run(&ws, &["config", "save"]).unwrap();
    let _guard = crate::env_lock();
    let saved = Config::load_from_path(&ws.config).unwrap();
    assert_eq!(saved.threads, Some(3));
    assert_eq!(saved.metric, mostsimilar::similarity::Metric::Euclidean);
    assert_eq!(saved.dedup_threshold, 1.0);
}

#[test]
fn test_app_config_missing_file_still_required_for_scan() {
    let ws = workspace();
    let target = ws.config.with_file_name("absent.toml");
    fs::write(ws.root.join("a.txt"), SHARED).unwrap();
    let root = ws.root.display().to_string();

    let err = run_with_config(&target, &["scan", &root, "--no-table"]).unwrap_err();
    assert_eq!(ExitCode::for_error(&err), ExitCode::GeneralError);
    assert!(!target.exists());
}
