use std::fs;
use std::io::Write;
use tempfile::TempDir;

use ragpipe_core::documents::{load_file, DocumentLoader};
use ragpipe_core::error::Error;

#[test]
fn load_directory_single_small_file() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    let file_path = dir.join("a.txt");
    let mut f = fs::File::create(&file_path).unwrap();
    writeln!(f, "Short text").unwrap();

    let docs = DocumentLoader::new().load_directory(dir).expect("load");

    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].doc_id, "a.txt", "doc id is the file name");
    assert_eq!(docs[0].text.trim(), "Short text");
}

#[test]
fn load_directory_limited_two_files_limit_one() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    fs::write(dir.join("a.txt"), "alpha bravo").unwrap();
    fs::write(dir.join("b.txt"), "charlie delta").unwrap();

    let docs = DocumentLoader::new().with_limit(1).load_directory(dir).expect("load limited");

    assert_eq!(docs.len(), 1, "limited to one source document");
    assert_eq!(docs[0].doc_id, "a.txt", "files are taken in sorted order");
}

#[test]
fn load_directory_skips_other_extensions_and_recurses() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    fs::create_dir_all(dir.join("nested/deeper")).unwrap();
    fs::write(dir.join("notes.md"), "# not a txt").unwrap();
    fs::write(dir.join("nested/deeper/c.txt"), "echo foxtrot").unwrap();

    let docs = DocumentLoader::new().load_directory(dir).expect("load");
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].doc_id, "c.txt");

    let md = DocumentLoader::new().with_extension(".md").load_directory(dir).expect("load md");
    assert_eq!(md.len(), 1);
    assert_eq!(md[0].doc_id, "notes.md");
}

#[test]
fn load_file_is_lossy_for_invalid_utf8() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("bin.txt");
    fs::write(&path, [b'o', b'k', 0xff, b'!']).unwrap();
    let text = load_file(&path).expect("lossy read");
    assert!(text.starts_with("ok"));
    assert!(text.ends_with('!'));
}

#[test]
fn missing_directory_is_not_found() {
    let tmp = TempDir::new().unwrap();
    let err = DocumentLoader::new().load_directory(&tmp.path().join("nope")).unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}
