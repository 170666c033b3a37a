use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

fn corpus() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"[
            {{"id": 1, "name": "молоко", "category": "Молочные продукты"}},
            {{"id": 2, "name": "мороженое", "category": "Десерты"}},
            {{"id": 3, "name": "хлеб ржаной", "category": "Выпечка"}}
        ]"#
    )
    .unwrap();
    file
}

fn fs_search() -> Command {
    Command::cargo_bin("fs-search").unwrap()
}

#[test]
fn search_corrects_typos() {
    let corpus = corpus();
    fs_search()
        .args(["--title-field", "name", "--format", "json", "search"])
        .arg(corpus.path())
        .arg("молки")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""corrected": "молоко""#))
        .stdout(predicate::str::contains(r#""matchType": "typo""#));
}

#[test]
fn search_text_output() {
    let corpus = corpus();
    fs_search()
        .args(["--title-field", "name", "search"])
        .arg(corpus.path())
        .arg("батон")
        .assert()
        .success()
        .stdout(predicate::str::contains("хлеб ржаной"));
}

#[test]
fn suggest_prefix() {
    let corpus = corpus();
    fs_search()
        .args(["--title-field", "name", "suggest"])
        .arg(corpus.path())
        .arg("мор")
        .assert()
        .success()
        .stdout(predicate::str::contains("мороженое"));
}

#[test]
fn stats_json() {
    let corpus = corpus();
    fs_search()
        .args(["--title-field", "name", "--format", "json", "stats"])
        .arg(corpus.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""documents": 3"#));
}

#[test]
fn missing_corpus_fails() {
    fs_search()
        .args(["stats", "/nonexistent/catalog.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read corpus"));
}
