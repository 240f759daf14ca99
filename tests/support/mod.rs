use assert_cmd::{cargo::cargo_bin_cmd, Command};
use std::fs;
use std::io::Read;
use std::path::Path;
use tempfile::TempDir;

/// Get a Command for dupgen isolated from the user's configuration
pub fn dupgen(dir: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("dupgen");
    cmd.current_dir(dir)
        .env("DUPGEN_CONFIG_DIR", dir.join("config"))
        .env_remove("DUPGEN_CONFIG")
        .env_remove("DUPGEN_ENDPOINT")
        .env_remove("DUPGEN_API_KEY")
        .env_remove("DUPGEN_USERNAME")
        .env_remove("DUPGEN_PASSWORD")
        .env_remove("DUPGEN_LOG")
        .env_remove("RUST_LOG");
    cmd
}

/// Widget request: `Widget` with `owner` selected plus a failing `Gizmo`,
/// ids under prefix `T`
#[allow(dead_code)]
pub const WIDGET_REQUEST: &str = r#"{
  "repoId": "repo-1",
  "externalRepositoryName": "Test Repository",
  "idPrefix": "T",
  "classSelections": [
    {
      "className": "Widget",
      "selected": true,
      "fields": [
        {"fieldName": "owner", "selected": true},
        {"fieldName": "colour", "selected": false}
      ]
    },
    {
      "className": "Gizmo",
      "selected": true,
      "fields": [{"fieldName": "description", "selected": true}]
    }
  ]
}"#;

#[allow(dead_code)]
pub const WIDGET_RECORDS: &str = r#"{
  "Widget": [
    {"id": "w1", "name": "Gadget", "className": "Widget", "owner": {"id": "w2"}, "colour": "red"}
  ],
  "Gizmo": "service unavailable"
}"#;

/// Temporary working directory holding the widget request and records
#[allow(dead_code)]
pub fn widget_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("request.json"), WIDGET_REQUEST).unwrap();
    fs::write(dir.path().join("records.json"), WIDGET_RECORDS).unwrap();
    dir
}

/// Entries of a package archive as (name, content), in archive order
#[allow(dead_code)]
pub fn package_entries(path: &Path) -> Vec<(String, String)> {
    let bytes = fs::read(path).unwrap();
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
    let mut entries = Vec::new();
    for i in 0..archive.len() {
        let mut file = archive.by_index(i).unwrap();
        let mut content = String::new();
        file.read_to_string(&mut content).unwrap();
        entries.push((file.name().to_string(), content));
    }
    entries
}
