use dataset_uploader_core::contract::FileDetail;
use dataset_uploader_core::error::PipelineError;
use dataset_uploader_core::metadata::{load_metadata, MetadataDocument};
use dataset_uploader_core::schema::validate_metadata;
use serde_json::json;
use std::fs;
use tempfile::tempdir;

struct TestCase {
    name: &'static str,
    contents: &'static str,
    expect_ok: bool,
}

#[test]
fn load_metadata_table_driven() {
    let cases = vec![
        TestCase {
            name: "two records",
            contents: r#"[{"image_path":"a.jpg","image_type":"jpg"},{"image_path":"b.png","image_type":"png","w":3}]"#,
            expect_ok: true,
        },
        TestCase {
            name: "empty list",
            contents: "[]",
            expect_ok: true,
        },
        TestCase {
            name: "not json",
            contents: "[{image_path: a.jpg",
            expect_ok: false,
        },
        TestCase {
            name: "object at top level",
            contents: r#"{"image_path":"a.jpg"}"#,
            expect_ok: false,
        },
        TestCase {
            name: "array of strings",
            contents: r#"["a.jpg"]"#,
            expect_ok: false,
        },
    ];

    for case in cases {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("metadata.json"), case.contents).unwrap();
        let result = load_metadata(dir.path(), "metadata.json");
        match (case.expect_ok, result) {
            (true, Ok(_)) => {}
            (false, Err(PipelineError::MetadataMalformed { path, .. })) => {
                assert_eq!(path, dir.path().join("metadata.json"), "case: {}", case.name)
            }
            (expected, other) => {
                panic!("case '{}': expected ok={expected}, got {other:?}", case.name)
            }
        }
    }
}

#[test]
fn load_metadata_keeps_order_and_extra_fields() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("custom.json"),
        r#"[{"image_path":"z.jpg","image_type":"jpg","camera":"x100"},{"image_path":"a.png","image_type":"png"}]"#,
    )
    .unwrap();

    let document = load_metadata(dir.path(), "custom.json").expect("should load");
    assert_eq!(document.len(), 2);
    assert_eq!(document.records()[0].image_path(), Ok("z.jpg"));
    assert_eq!(document.records()[0].get("camera"), Some(&json!("x100")));
    assert_eq!(document.records()[1].image_type(), Ok("png"));
    assert!(document.check_required_fields().is_ok());
}

#[test]
fn missing_metadata_file_is_reported_with_its_path() {
    let dir = tempdir().unwrap();
    let err = load_metadata(dir.path(), "metadata.json").unwrap_err();
    match &err {
        PipelineError::MetadataMissing { path } => {
            assert_eq!(path, &dir.path().join("metadata.json"))
        }
        other => panic!("expected MetadataMissing, got {other:?}"),
    }
    assert_eq!(
        err.to_string(),
        format!(
            "metadata file {} does not exist.",
            dir.path().join("metadata.json").display()
        )
    );
}

#[test]
fn required_fields_check_reports_each_gap() {
    let document = MetadataDocument::from_value(json!([
        { "image_path": "a.jpg", "image_type": "jpg" },
        { "image_type": "png" },
        { "image_path": 7 }
    ]))
    .unwrap();

    let problems = document.check_required_fields().unwrap_err();
    assert_eq!(problems.len(), 3, "{problems:?}");
    assert!(problems[0].starts_with("entry 1"));
    assert!(problems[1].starts_with("entry 2") && problems[1].contains("image_path"));
    assert!(problems[2].starts_with("entry 2") && problems[2].contains("image_type"));
}

#[test]
fn set_bucket_adds_a_single_field() {
    let mut record = FileDetail::new(
        json!({ "image_path": "a.jpg", "image_type": "jpg" })
            .as_object()
            .unwrap()
            .clone(),
    );
    record.set_bucket("first");
    record.set_bucket("second");
    assert_eq!(record.fields().len(), 3);
    assert_eq!(record.bucket(), Some("second"));
}

#[test]
fn validation_passes_and_fails_as_a_whole_document() {
    let schema = json!({
        "type": "array",
        "items": {
            "type": "object",
            "required": ["image_path", "image_type", "width"],
            "properties": { "width": { "type": "integer", "minimum": 1 } }
        }
    });
    let good = MetadataDocument::from_value(json!([
        { "image_path": "a.jpg", "image_type": "jpg", "width": 10 }
    ]))
    .unwrap();
    let bad = MetadataDocument::from_value(json!([
        { "image_path": "a.jpg", "image_type": "jpg", "width": 10 },
        { "image_path": "b.jpg", "image_type": "jpg", "width": 0 }
    ]))
    .unwrap();

    assert!(validate_metadata(&good, &schema).is_ok());
    let violations = validate_metadata(&bad, &schema).unwrap_err();
    assert_eq!(violations.len(), 1);
    assert!(violations[0].contains("/1/width"), "{violations:?}");
}

#[test]
fn uncompilable_schema_counts_as_a_mismatch() {
    let document = MetadataDocument::from_value(json!([])).unwrap();
    let schema = json!({ "type": "not-a-real-type" });
    let violations = validate_metadata(&document, &schema).unwrap_err();
    assert!(violations[0].starts_with("invalid schema"));
}
