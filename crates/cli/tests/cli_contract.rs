use assert_cmd::Command;
use lopdf::{dictionary, Document, Object, Stream};
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

fn cli() -> Command {
    Command::cargo_bin("form-editor-cli").expect("binary should build")
}

/// Write a minimal PDF with one page per `(width, height)` entry.
fn write_sample_pdf(dir: &Path, name: &str, sizes: &[(i64, i64)]) -> PathBuf {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut kids: Vec<Object> = Vec::new();
    for &(width, height) in sizes {
        let content_id = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), width.into(), height.into()],
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
    doc.trailer.set("Root", catalog_id);

    let path = dir.join(name);
    doc.save(&path).expect("fixture save should succeed");
    path
}

fn write_layout(dir: &Path) -> PathBuf {
    let path = dir.join("layout.json");
    fs::write(
        &path,
        r#"{
            "pages": [
                {"pageNumber": 1, "fields": [
                    {"type": "text", "left": 150.0, "top": 200.0,
                     "width": 100.0, "height": 30.0, "content": "hello"}
                ]}
            ]
        }"#,
    )
    .expect("fixture write should succeed");
    path
}

#[test]
fn info_emits_page_sizes_as_json() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let pdf = write_sample_pdf(temp.path(), "two-page.pdf", &[(600, 800), (612, 792)]);

    let output = cli().arg("info").arg(&pdf).assert().success().get_output().stdout.clone();

    let value: Value = serde_json::from_slice(&output).expect("stdout should contain valid json");
    assert_eq!(value["page_count"], 2);
    assert_eq!(value["pages"][0]["width"], 600.0);
    assert_eq!(value["pages"][1]["height"], 792.0);
    assert_eq!(value["field_count"], 0);
}

#[test]
fn render_writes_png_scaled_from_page_size() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let pdf = write_sample_pdf(temp.path(), "page.pdf", &[(600, 800)]);
    let output_path = temp.path().join("page.png");

    cli()
        .arg("render")
        .arg(&pdf)
        .arg("--page")
        .arg("1")
        .arg("--scale")
        .arg("1.5")
        .arg("--output")
        .arg(&output_path)
        .assert()
        .success();

    let image = image::open(&output_path).expect("output should be a readable image");
    assert_eq!((image.width(), image.height()), (900, 1200));
}

#[test]
fn render_rejects_page_zero() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let pdf = write_sample_pdf(temp.path(), "page.pdf", &[(600, 800)]);

    cli()
        .arg("render")
        .arg(&pdf)
        .arg("--page")
        .arg("0")
        .arg("--output")
        .arg(temp.path().join("out.png"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("1-based"));
}

#[test]
fn flatten_applies_layout_and_writes_parseable_pdf() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let pdf = write_sample_pdf(temp.path(), "form.pdf", &[(600, 800)]);
    let layout = write_layout(temp.path());
    let output_path = temp.path().join("flat.pdf");

    cli()
        .arg("flatten")
        .arg(&pdf)
        .arg("--layout")
        .arg(&layout)
        .arg("--output")
        .arg(&output_path)
        .assert()
        .success();

    let bytes = fs::read(&output_path).expect("output should exist");
    let parsed = Document::load_mem(&bytes).expect("output should be a valid PDF");
    assert_eq!(parsed.get_pages().len(), 1);

    let page_id = *parsed.get_pages().values().next().expect("one page");
    let content = parsed.get_page_content(page_id).expect("page content");
    let content = String::from_utf8(content).expect("content should be text operators");
    assert!(content.contains("(hello) Tj"));
}

#[test]
fn preview_and_flatten_produce_identical_bytes() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let pdf = write_sample_pdf(temp.path(), "form.pdf", &[(600, 800), (612, 792)]);
    let layout = write_layout(temp.path());
    let flat = temp.path().join("flat.pdf");
    let preview = temp.path().join("preview.pdf");

    cli()
        .arg("flatten")
        .arg(&pdf)
        .arg("--layout")
        .arg(&layout)
        .arg("--output")
        .arg(&flat)
        .assert()
        .success();
    cli()
        .arg("preview")
        .arg(&pdf)
        .arg("--layout")
        .arg(&layout)
        .arg("--output")
        .arg(&preview)
        .assert()
        .success();

    assert_eq!(fs::read(&flat).unwrap(), fs::read(&preview).unwrap());
}

#[test]
fn info_fails_for_missing_file() {
    cli()
        .arg("info")
        .arg("does-not-exist.pdf")
        .assert()
        .failure()
        .stderr(predicate::str::contains("file does not exist"));
}

#[test]
fn info_fails_for_invalid_pdf() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let path = temp.path().join("not-a.pdf");
    fs::write(&path, b"plain text, not a pdf").expect("fixture write should succeed");

    cli()
        .arg("info")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to open PDF"));
}

#[test]
fn flatten_fails_for_invalid_layout() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let pdf = write_sample_pdf(temp.path(), "form.pdf", &[(600, 800)]);
    let layout = temp.path().join("layout.json");
    fs::write(&layout, "{ not json").expect("fixture write should succeed");

    cli()
        .arg("flatten")
        .arg(&pdf)
        .arg("--layout")
        .arg(&layout)
        .arg("--output")
        .arg(temp.path().join("out.pdf"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid layout"));
}

#[test]
fn version_prints_crate_version() {
    cli()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}
