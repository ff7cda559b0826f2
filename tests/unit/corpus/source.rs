use super::*;
use std::path::PathBuf;

fn scratch(name: &str) -> PathBuf {
    let dir = PathBuf::from("target").join("unit_source").join(name);
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn fs_corpus_lists_sorted_dirs_and_skips_hidden_entries() {
    let root = scratch("listing");
    for (cat, test) in [("b-cat", "two"), ("b-cat", "one"), ("a-cat", "only")] {
        let dir = root.join(cat).join(test);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("style.json"), "{}").unwrap();
    }
    std::fs::create_dir_all(root.join(".git")).unwrap();
    std::fs::write(root.join("README.md"), "not a category").unwrap();

    let corpus = FsCorpus::new(&root);
    assert_eq!(corpus.list_categories().unwrap(), vec!["a-cat", "b-cat"]);
    assert_eq!(corpus.list_tests("b-cat").unwrap(), vec!["one", "two"]);
    assert_eq!(corpus.read_config("a-cat", "only").unwrap(), "{}");
}

#[test]
fn fs_corpus_reports_missing_paths_as_discovery_errors() {
    let root = scratch("missing");
    let corpus = FsCorpus::with_config_file(root.join("nope"), "config.json");
    assert!(matches!(
        corpus.list_categories(),
        Err(SuiteError::Discovery(_))
    ));
    assert!(matches!(
        corpus.read_config("x", "y"),
        Err(SuiteError::Discovery(_))
    ));
}

#[test]
fn memory_corpus_distinguishes_unreadable_and_unknown() {
    let mut corpus = MemoryCorpus::new();
    corpus.insert("cat", "ok", "{}").insert_unreadable("cat", "broken");

    assert_eq!(corpus.list_tests("cat").unwrap(), vec!["broken", "ok"]);
    assert!(corpus.read_config("cat", "ok").is_ok());
    assert!(
        corpus
            .read_config("cat", "broken")
            .unwrap_err()
            .to_string()
            .contains("unreadable")
    );
    assert!(corpus.list_tests("other").is_err());
}
