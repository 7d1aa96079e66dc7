use mostsimilar::duplicates::{EngineConfig, EngineError, MatchEngine};
use mostsimilar::scanner::{Walker, WalkerConfig};
use mostsimilar::similarity::Metric;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn ranked_names(engine: &MatchEngine, sample: &Path, repo: &Path, recursive: bool) -> Vec<(String, f64)> {
    let sample = engine.load_sample(sample).unwrap();
    let mut config = WalkerConfig::default();
    if !recursive {
        config = config.top_level_only();
    }
    let files = Walker::new(repo, config).collect_files().unwrap();
    let corpus = engine.load_documents(&files).unwrap();
    engine
        .rank_against(&sample, &corpus.documents)
        .into_iter()
        .map(|(i, score)| {
            let name = corpus.documents[i]
                .path()
                .file_name()
                .unwrap()
                .to_string_lossy()
                .into_owned();
            (name, score)
        })
        .collect()
}

fn write_repo(repo: &Path) {
    fs::create_dir_all(repo.join("deeper")).unwrap();
    fs::write(repo.join("copy.txt"), "river stone maple winter river").unwrap();
    fs::write(repo.join("partial.txt"), "river stone cobalt desert").unwrap();
    fs::write(repo.join("unrelated.txt"), "violin copper glacier").unwrap();
    fs::write(repo.join("zz_unrelated.txt"), "saffron tundra orchid").unwrap();
    fs::write(repo.join("deeper").join("nested.txt"), "river stone maple winter").unwrap();
}

#[test]
fn test_match_orders_by_score_then_path() {
    let dir = tempdir().unwrap();
    let sample = dir.path().join("sample.txt");
    fs::write(&sample, "river stone maple winter river").unwrap();
    let repo = dir.path().join("repo");
    write_repo(&repo);

    let engine = MatchEngine::new(EngineConfig::default().with_threads(2));
    let ranked = ranked_names(&engine, &sample, &repo, false);

    let names: Vec<&str> = ranked.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(
        names,
        ["copy.txt", "partial.txt", "unrelated.txt", "zz_unrelated.txt"]
    );
    assert!((ranked[0].1 - 1.0).abs() < 1e-9);
    assert!(ranked[1].1 > 0.0 && ranked[1].1 < 1.0);
    assert_eq!(ranked[2].1, 0.0);
    assert_eq!(ranked[3].1, 0.0);
}

#[test]
fn test_match_recursive_includes_subdirectories() {
    let dir = tempdir().unwrap();
    let sample = dir.path().join("sample.txt");
    fs::write(&sample, "river stone maple winter river").unwrap();
    let repo = dir.path().join("repo");
    write_repo(&repo);

    let engine = MatchEngine::new(EngineConfig::default().with_metric(Metric::Euclidean));
    let ranked = ranked_names(&engine, &sample, &repo, true);

    assert_eq!(ranked.len(), 5);
    assert!(ranked.iter().any(|(n, _)| n == "nested.txt"));
    assert_eq!(ranked[0].0, "copy.txt");
    for pair in ranked.windows(2) {
        assert!(pair[0].1 >= pair[1].1);
    }
}

#[test]
fn test_match_empty_sample_is_rejected() {
    let dir = tempdir().unwrap();
    let sample = dir.path().join("sample.txt");
    fs::write(&sample, "the of and").unwrap();

    let engine = MatchEngine::with_defaults();
    assert!(matches!(
        engine.load_sample(&sample),
        Err(EngineError::EmptySample { .. })
    ));
}

#[test]
fn test_match_missing_sample_is_a_sample_error() {
    let dir = tempdir().unwrap();
    let engine = MatchEngine::with_defaults();
    assert!(matches!(
        engine.load_sample(&dir.path().join("absent.txt")),
        Err(EngineError::Sample(_))
    ));
}

#[test]
fn test_match_ties_compare_whole_path_bytes() {
    let dir = tempdir().unwrap();
    let sample = dir.path().join("sample.txt");
    fs::write(&sample, "harbor lantern meadow").unwrap();
    let repo = dir.path().join("repo");
    fs::create_dir_all(repo.join("a")).unwrap();
    fs::write(repo.join("a").join("b.txt"), "harbor lantern meadow").unwrap();
    fs::write(repo.join("a-b.txt"), "harbor lantern meadow").unwrap();

    let engine = MatchEngine::new(EngineConfig::default());
    let sample = engine.load_sample(&sample).unwrap();
    let files = Walker::new(&repo, WalkerConfig::default())
        .collect_files()
        .unwrap();
    let corpus = engine.load_documents(&files).unwrap();
    let ranked: Vec<_> = engine
        .rank_against(&sample, &corpus.documents)
        .into_iter()
        .map(|(i, _)| corpus.documents[i].path().to_path_buf())
        .collect();

    // '-' is below '/', so the flat name comes first.
    assert_eq!(ranked.len(), 2);
    assert!(ranked[0].ends_with("repo/a-b.txt"), "{ranked:?}");
    assert!(ranked[1].ends_with("repo/a/b.txt"), "{ranked:?}");
}
