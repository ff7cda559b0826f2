use super::*;
use crate::corpus::definition::TestDefinition;
use crate::corpus::style::StyleDocument;
use crate::render::image::RenderedImage;

fn scratch(name: &str) -> PathBuf {
    let dir = PathBuf::from("target").join("unit_persist").join(name);
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

fn results(entries: &[(&str, &str)]) -> ResultMap {
    let mut map = ResultMap::new();
    for (category, name) in entries {
        let def = TestDefinition::new(*category, *name, "{}", StyleDocument::default());
        map.insert(def, RenderedImage::solid(2, 3, [10, 20, 30, 255]).unwrap())
            .unwrap();
    }
    map
}

#[test]
fn writes_one_file_per_result_in_layout() {
    let root = scratch("layout");
    let persister = ResultPersister::new(&root);
    let report = persister
        .persist(&results(&[("fill", "a"), ("fill", "b"), ("line", "a")]))
        .unwrap();

    assert_eq!(report.files.len(), 3);
    assert_eq!(report.files[0], root.join("fill").join("a").join("actual.png"));
    for f in &report.files {
        assert!(f.is_file(), "{} missing", f.display());
    }

    let decoded = image::open(&report.files[2]).unwrap().to_rgba8();
    assert_eq!(decoded.dimensions(), (2, 3));
    assert_eq!(decoded.get_pixel(1, 2).0, [10, 20, 30, 255]);
}

#[test]
fn stale_output_is_removed_before_writing() {
    let root = scratch("stale");
    let persister = ResultPersister::new(&root);
    persister
        .persist(&results(&[("cat", "t1"), ("cat", "t2")]))
        .unwrap();
    std::fs::write(root.join("stray.txt"), "left over").unwrap();

    persister.persist(&results(&[("cat", "t2")])).unwrap();
    assert!(!persister.result_path("cat", "t1").exists());
    assert!(!root.join("stray.txt").exists());
    assert!(persister.result_path("cat", "t2").is_file());
}

#[test]
fn empty_result_set_still_recreates_root() {
    let root = scratch("empty");
    std::fs::create_dir_all(root.join("old")).unwrap();
    let report = ResultPersister::new(&root)
        .persist(&ResultMap::new())
        .unwrap();
    assert!(report.files.is_empty());
    assert!(root.is_dir());
    assert!(!root.join("old").exists());
}

#[test]
fn bmp_format_changes_extension() {
    let root = scratch("bmp");
    let persister = ResultPersister::new(&root).with_format(OutputFormat::Bmp);
    let report = persister.persist(&results(&[("c", "n")])).unwrap();
    assert_eq!(report.files[0].file_name().unwrap(), "actual.bmp");
    assert!(report.files[0].is_file());
}

#[test]
fn root_that_is_a_file_aborts() {
    let root = scratch("blocked");
    std::fs::create_dir_all(root.parent().unwrap()).unwrap();
    std::fs::write(&root, "not a dir").unwrap();

    let err = ResultPersister::new(&root)
        .persist(&results(&[("c", "n")]))
        .unwrap_err();
    assert!(matches!(err, SuiteError::Persist(_)));
}
