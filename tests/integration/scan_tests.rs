use filetime::{set_file_mtime, FileTime};
use mostsimilar::duplicates::{EngineConfig, EngineError, MatchEngine};
use mostsimilar::output::{report_rows, CsvOutput};
use mostsimilar::scanner::{Walker, WalkerConfig};
use mostsimilar::similarity::Metric;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const SHARED: &str = "quantum harbor lantern meadow quantum orchid";
const OTHER: &str = "violin copper glacier saffron tundra";

fn engine(threads: usize) -> MatchEngine {
    MatchEngine::new(EngineConfig::default().with_threads(threads))
}

fn walk(root: &Path) -> Vec<mostsimilar::scanner::FileEntry> {
    Walker::new(root, WalkerConfig::default())
        .collect_files()
        .unwrap()
}

fn set_age(path: &Path, secs: i64) {
    set_file_mtime(path, FileTime::from_unix_time(secs, 0)).unwrap();
}

#[test]
fn test_scan_newer_copy_is_kept() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.txt");
    let b = dir.path().join("b.txt");
    fs::write(&a, SHARED).unwrap();
    fs::write(&b, SHARED).unwrap();
    fs::write(dir.path().join("c.txt"), OTHER).unwrap();
    set_age(&a, 1_000_000);
    set_age(&b, 2_000_000);

    let report = engine(2).find_matches(walk(dir.path())).unwrap();

    // One row for the reciprocal pair, one for the unrelated file.
    assert_eq!(report.rows.len(), 2);
    let top = &report.rows[0];
    assert!(top.reciprocal);
    assert_eq!(report.documents[top.file].path(), b.as_path());
    assert_eq!(report.documents[top.partner.unwrap()].path(), a.as_path());
    assert!((top.score - 1.0).abs() < 1e-9);
    assert_eq!(top.pair_id, 1);

    let last = &report.rows[1];
    assert!(!last.reciprocal);
    assert_eq!(report.documents[last.file].path(), dir.path().join("c.txt"));
    assert_eq!(last.score, 0.0);
    assert_eq!(last.pair_id, 2);

    assert_eq!(report.summary.discovered, 3);
    assert_eq!(report.summary.usable, 3);
    assert_eq!(report.summary.reciprocal_pairs, 1);
}

#[test]
fn test_scan_version_marker_beats_modification_time() {
    let dir = tempdir().unwrap();
    let v1 = dir.path().join("report_v1.txt");
    let v2 = dir.path().join("report_v2.txt");
    fs::write(&v1, SHARED).unwrap();
    fs::write(&v2, SHARED).unwrap();
    // The higher version is the older file on disk.
    set_age(&v1, 2_000_000);
    set_age(&v2, 1_000_000);

    let report = engine(1).find_matches(walk(dir.path())).unwrap();

    assert_eq!(report.rows.len(), 1);
    let row = &report.rows[0];
    assert_eq!(report.documents[row.file].path(), v2.as_path());
    assert_eq!(report.documents[row.partner.unwrap()].path(), v1.as_path());
}

#[test]
fn test_scan_skips_empty_and_stop_word_only_files() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), SHARED).unwrap();
    fs::write(dir.path().join("b.txt"), OTHER).unwrap();
    fs::write(dir.path().join("empty.txt"), "").unwrap();
    fs::write(dir.path().join("filler.txt"), "the and of the").unwrap();

    let report = engine(2).find_matches(walk(dir.path())).unwrap();

    assert_eq!(report.summary.discovered, 4);
    assert_eq!(report.summary.usable, 2);
    assert_eq!(report.summary.empty, 2);
    assert_eq!(report.skipped.len(), 2);
    assert_eq!(report.rows.len(), 2);
}

#[test]
fn test_scan_ignores_non_text_extensions() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), SHARED).unwrap();
    fs::write(dir.path().join("b.md"), SHARED).unwrap();
    fs::write(dir.path().join("image.png"), SHARED).unwrap();
    fs::write(dir.path().join("noext"), SHARED).unwrap();

    let files = walk(dir.path());
    assert_eq!(files.len(), 2);
    assert_eq!(files[0].index, 0);
    assert_eq!(files[1].index, 1);
}

#[test]
fn test_scan_single_usable_file_is_insufficient() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), SHARED).unwrap();
    fs::write(dir.path().join("b.txt"), "").unwrap();

    let result = engine(1).find_matches(walk(dir.path()));
    assert!(matches!(
        result,
        Err(EngineError::InsufficientCorpus { usable: 1 })
    ));
}

#[test]
fn test_scan_is_identical_across_thread_counts() {
    let dir = tempdir().unwrap();
    let words = [
        "apple", "birch", "cedar", "delta", "ember", "fjord", "grove", "heron", "inlet", "juniper",
    ];
    for i in 0..12 {
        let text: Vec<&str> = (0..30).map(|k| words[(i * 7 + k * k) % words.len()]).collect();
        fs::write(dir.path().join(format!("doc{i:02}.txt")), text.join(" ")).unwrap();
    }
    let files = walk(dir.path());

    for metric in [Metric::TfIdf, Metric::SimHash, Metric::Euclidean] {
        let baseline = MatchEngine::new(
            EngineConfig::default()
                .with_threads(1)
                .with_metric(metric)
                .with_parallel_scoring(false),
        )
        .find_matches(files.clone())
        .unwrap();
        let expected: Vec<_> = baseline
            .rows
            .iter()
            .map(|r| (r.file, r.partner, r.score.to_bits(), r.pair_id))
            .collect();

        for threads in [2, 3, 8] {
            let report = MatchEngine::new(
                EngineConfig::default()
                    .with_threads(threads)
                    .with_metric(metric),
            )
            .find_matches(files.clone())
            .unwrap();
            let actual: Vec<_> = report
                .rows
                .iter()
                .map(|r| (r.file, r.partner, r.score.to_bits(), r.pair_id))
                .collect();
            assert_eq!(actual, expected, "{metric:?} with {threads} threads");
        }
    }
}

#[test]
fn test_scan_csv_uses_masked_paths() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    let a = dir.path().join("a.txt");
    let b = dir.path().join("sub").join("b.txt");
    fs::write(&a, SHARED).unwrap();
    fs::write(&b, SHARED).unwrap();
    set_age(&a, 2_000_000);
    set_age(&b, 1_000_000);

    let report = engine(2).find_matches(walk(dir.path())).unwrap();
    let rows = report_rows(&report, dir.path());
    let csv = CsvOutput::new(&rows).to_string().unwrap();

    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "file,most_similar,score,pair_id");
    assert_eq!(lines[1], ".../a.txt,.../sub/b.txt,1.00000000,1");
    assert_eq!(lines.len(), 2);
}
