use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::{tempdir, TempDir};

/// A local port with nothing listening on it.
fn closed_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

/// Command with every connection setting supplied through the environment,
/// pointing at ports nobody listens on. Runs inside `workdir` so no stray
/// `.env` is picked up.
fn uploader(workdir: &Path, api: &str) -> Command {
    let mut cmd = Command::cargo_bin("dataset-uploader").expect("Binary exists");
    let dead = format!("127.0.0.1:{}", closed_port());
    cmd.current_dir(workdir)
        .env_remove("RUST_LOG")
        .env("API", api)
        .env("MINIO_ENDPOINT", &dead)
        .env("MINIO_ACCESS_KEY", "minio")
        .env("MINIO_SECRET_KEY", "minio123")
        .env("RM_QUEUE", "datasets")
        .env("RM_HOST", "127.0.0.1")
        .env("RM_PORT", closed_port().to_string())
        .env("RM_USERNAME", "guest")
        .env("RM_PASSWORD", "guest")
        .env("UPLOADER_LOG_FILE", workdir.join("uploader.log"));
    cmd
}

fn catset(root: &TempDir) -> std::path::PathBuf {
    let dir = root.path().join("catset");
    fs::create_dir(&dir).unwrap();
    fs::write(dir.join("cat1.jpg"), b"jpg-bytes").unwrap();
    fs::write(dir.join("cat2.png"), b"png-bytes").unwrap();
    fs::write(
        dir.join("metadata.json"),
        r#"[{"image_path":"cat1.jpg","image_type":"jpg"},{"image_path":"cat2.png","image_type":"png"}]"#,
    )
    .unwrap();
    dir
}

#[test]
fn missing_metadata_file_is_reported_and_exits_cleanly() {
    let root = tempdir().unwrap();
    let api = format!("http://127.0.0.1:{}", closed_port());

    uploader(root.path(), &api)
        .arg("--dir-path")
        .arg(root.path())
        .arg("--dataclass")
        .arg("animals")
        .assert()
        .success()
        .stdout(predicate::str::contains("Error: metadata file").and(predicate::str::contains("does not exist")));

    let log = fs::read_to_string(root.path().join("uploader.log")).expect("log file written");
    assert!(log.contains("Metadata file does not exist"), "log was: {log}");
}

#[test]
fn underscore_dir_path_flag_is_accepted() {
    let root = tempdir().unwrap();
    let api = format!("http://127.0.0.1:{}", closed_port());

    uploader(root.path(), &api)
        .arg("--dir_path")
        .arg(root.path())
        .arg("--dataclass")
        .arg("animals")
        .arg("--metadatafile")
        .arg("other.json")
        .assert()
        .success()
        .stdout(predicate::str::contains("other.json"));
}

#[test]
fn unreachable_schema_service_is_reported() {
    let root = tempdir().unwrap();
    let dir = catset(&root);
    let api = format!("http://127.0.0.1:{}", closed_port());

    uploader(root.path(), &api)
        .arg("--dir-path")
        .arg(&dir)
        .arg("--dataclass")
        .arg("animals")
        .assert()
        .success()
        .stdout(predicate::str::contains("Error: failed to connect to server."))
        .stdout(predicate::str::contains("Bucket").not());
}

#[test]
fn unknown_dataclass_is_reported() {
    let root = tempdir().unwrap();
    let dir = catset(&root);
    let mut server = mockito::Server::new();
    let mock = server.mock("GET", "/unicorns").with_status(404).create();

    uploader(root.path(), &server.url())
        .arg("--dir-path")
        .arg(&dir)
        .arg("--dataclass")
        .arg("unicorns")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Error: cannot retrieve schema for dataclass unicorns",
        ));
    mock.assert();
}

#[test]
fn schema_mismatch_is_reported_before_any_upload() {
    let root = tempdir().unwrap();
    let dir = catset(&root);
    let mut server = mockito::Server::new();
    let _mock = server
        .mock("GET", "/animals")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"type":"array","items":{"properties":{"image_type":{"enum":["tiff"]}}}}"#)
        .create();

    uploader(root.path(), &server.url())
        .arg("--dir-path")
        .arg(&dir)
        .arg("--dataclass")
        .arg("animals")
        .assert()
        .success()
        .stdout(predicate::str::contains("does not match the schema."))
        .stdout(predicate::str::contains("Bucket").not());
}

#[test]
fn object_store_failure_is_reported_after_validation() {
    let root = tempdir().unwrap();
    let dir = catset(&root);
    let mut server = mockito::Server::new();
    let _mock = server
        .mock("GET", "/animals")
        .with_status(200)
        .with_body(r#"{"type":"array"}"#)
        .create();

    uploader(root.path(), &server.url())
        .arg("--dir-path")
        .arg(&dir)
        .arg("--dataclass")
        .arg("animals")
        .assert()
        .success()
        .stdout(predicate::str::contains("Validated metadata file"))
        .stdout(predicate::str::contains("Error: error uploading file"));
}

#[test]
fn nonexistent_directory_is_rejected_by_the_cli() {
    let root = tempdir().unwrap();
    let api = format!("http://127.0.0.1:{}", closed_port());

    uploader(root.path(), &api)
        .arg("--dir-path")
        .arg(root.path().join("nope"))
        .arg("--dataclass")
        .arg("animals")
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn dataclass_is_required() {
    let root = tempdir().unwrap();
    let api = format!("http://127.0.0.1:{}", closed_port());

    uploader(root.path(), &api)
        .arg("--dir-path")
        .arg(root.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("--dataclass"));
}
