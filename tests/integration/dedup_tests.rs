use filetime::{set_file_mtime, FileTime};
use mostsimilar::actions::relocate_duplicates;
use mostsimilar::duplicates::{EngineConfig, MatchEngine};
use mostsimilar::scanner::path_utils::is_under;
use mostsimilar::scanner::{Walker, WalkerConfig};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

const SHARED: &str = "quantum harbor lantern meadow quantum orchid";

fn duplicates_at(root: &Path, threshold: f64) -> Vec<PathBuf> {
    let dup_dir = root.join("Duplicates");
    let files = Walker::new(
        root,
        WalkerConfig::default().with_exclude_dir(dup_dir.clone()),
    )
    .collect_files()
    .unwrap();
    let report = MatchEngine::new(EngineConfig::default().with_threads(2))
        .find_matches(files)
        .unwrap();
    report.duplicates(threshold, |p| is_under(p, &dup_dir))
}

#[test]
fn test_dedup_moves_older_copy_and_keeps_tree_shape() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("nested")).unwrap();
    let keep = root.join("keep.txt");
    let old = root.join("nested").join("old.txt");
    fs::write(&keep, SHARED).unwrap();
    fs::write(&old, SHARED).unwrap();
    fs::write(root.join("other.txt"), "violin copper glacier").unwrap();
    set_file_mtime(&keep, FileTime::from_unix_time(2_000_000, 0)).unwrap();
    set_file_mtime(&old, FileTime::from_unix_time(1_000_000, 0)).unwrap();

    let sources = duplicates_at(root, 1.0);
    assert_eq!(sources, vec![old.clone()]);

    let dup_dir = root.join("Duplicates");
    let report = relocate_duplicates(&sources, root, &dup_dir).unwrap();
    assert!(report.all_succeeded());
    assert_eq!(report.moved_count(), 1);
    assert_eq!(report.summary(), "moved 1 file(s)");

    assert!(!old.exists());
    assert!(keep.exists());
    assert_eq!(
        fs::read_to_string(dup_dir.join("nested").join("old.txt")).unwrap(),
        SHARED
    );

    // Moved files are not rescanned, so nothing is left to move.
    assert!(duplicates_at(root, 1.0).is_empty());
}

#[test]
fn test_dedup_below_threshold_moves_nothing() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    fs::write(root.join("a.txt"), "quantum harbor lantern meadow").unwrap();
    fs::write(root.join("b.txt"), "quantum harbor lantern glacier").unwrap();

    assert!(duplicates_at(root, 1.0).is_empty());
    assert_eq!(duplicates_at(root, 0.0).len(), 1);
}

#[test]
fn test_dedup_name_collision_gets_suffix() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    let dup_dir = root.join("Duplicates");
    fs::create_dir_all(&dup_dir).unwrap();
    fs::write(dup_dir.join("a.txt"), "earlier run").unwrap();
    let source = root.join("a.txt");
    fs::write(&source, SHARED).unwrap();

    let report = relocate_duplicates(&[source.clone()], root, &dup_dir).unwrap();

    assert_eq!(report.moved[0].1, dup_dir.join("a_1.txt"));
    assert_eq!(fs::read_to_string(dup_dir.join("a.txt")).unwrap(), "earlier run");
    assert!(!source.exists());
}

#[test]
fn test_dedup_missing_source_is_reported_not_fatal() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    let present = root.join("present.txt");
    fs::write(&present, SHARED).unwrap();
    let missing = root.join("missing.txt");

    let report = relocate_duplicates(
        &[missing.clone(), present.clone()],
        root,
        &root.join("Duplicates"),
    )
    .unwrap();

    assert_eq!(report.moved_count(), 1);
    assert_eq!(report.failed_count(), 1);
    assert_eq!(report.failed[0].0, missing);
    assert!(!report.all_succeeded());
    assert_eq!(report.summary(), "moved 1 file(s), 1 could not be moved");
}
