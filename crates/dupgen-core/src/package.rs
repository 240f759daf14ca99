//! Data update package assembly
//!
//! A package is a zip archive holding the generated import script as
//! `dup_import_script.py` followed by the support files the importer
//! expects next to it.

use std::fs;
use std::io::{Cursor, Write};
use std::path::PathBuf;

use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{DupError, Result};

/// Archive entry holding the generated script
pub const SCRIPT_ENTRY: &str = "dup_import_script.py";

/// Package file extension
pub const PACKAGE_EXTENSION: &str = "dup";

/// Support files shipped with every package unless a support directory is
/// configured
const EMBEDDED_SUPPORT: &[(&str, &str)] = &[
    ("standardFunctions.py", include_str!("../assets/standardFunctions.py")),
    ("update.info", include_str!("../assets/update.info")),
    ("updatepack.xsd", include_str!("../assets/updatepack.xsd")),
];

/// Builds package archives in memory
#[derive(Debug, Clone, Default)]
pub struct PackageBuilder {
    support_dir: Option<PathBuf>,
}

impl PackageBuilder {
    /// Builder using the embedded support files
    pub fn new() -> Self {
        Self::default()
    }

    /// Take support files from `dir` instead of the embedded ones
    pub fn with_support_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.support_dir = Some(dir.into());
        self
    }

    /// Names of the support entries, in archive order
    pub fn support_entries(&self) -> Result<Vec<String>> {
        Ok(self
            .support_files()?
            .into_iter()
            .map(|(name, _)| name)
            .collect())
    }

    fn support_files(&self) -> Result<Vec<(String, Vec<u8>)>> {
        let Some(dir) = &self.support_dir else {
            return Ok(EMBEDDED_SUPPORT
                .iter()
                .map(|(name, content)| (name.to_string(), content.as_bytes().to_vec()))
                .collect());
        };

        if !dir.is_dir() {
            return Err(DupError::packaging(
                "read support files",
                format!("{} is not a directory", dir.display()),
            ));
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .follow_links(true)
        {
            let entry = entry.map_err(|e| DupError::packaging("read support files", e))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            let content = fs::read(entry.path())
                .map_err(|e| DupError::packaging(&format!("read {}", entry.path().display()), e))?;
            files.push((name, content));
        }

        tracing::debug!(dir = %dir.display(), files = files.len(), "collected support files");
        Ok(files)
    }

    /// Build the archive bytes for a generated script
    pub fn build(&self, script: &str) -> Result<Vec<u8>> {
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

        zip.start_file(SCRIPT_ENTRY, options)
            .map_err(|e| DupError::packaging("add script", e))?;
        zip.write_all(script.as_bytes())
            .map_err(|e| DupError::packaging("write script", e))?;

        for (name, content) in self.support_files()? {
            if name == SCRIPT_ENTRY {
                tracing::warn!(file = %name, "support file shadows the generated script, skipped");
                continue;
            }
            zip.start_file(name.as_str(), options)
                .map_err(|e| DupError::packaging(&format!("add {}", name), e))?;
            zip.write_all(&content)
                .map_err(|e| DupError::packaging(&format!("write {}", name), e))?;
        }

        let cursor = zip
            .finish()
            .map_err(|e| DupError::packaging("finish archive", e))?;
        Ok(cursor.into_inner())
    }
}

/// Package file name for an external repository name: every character
/// outside `[A-Za-z0-9_-]` becomes `_`, a blank name becomes `export`
pub fn package_file_name(external_repository_name: &str) -> String {
    let stem = if external_repository_name.trim().is_empty() {
        "export".to_string()
    } else {
        external_repository_name
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    };
    format!("{}.{}", stem, PACKAGE_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::tempdir;

    fn entries(bytes: &[u8]) -> Vec<(String, String)> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut out = Vec::new();
        for i in 0..archive.len() {
            let mut file = archive.by_index(i).unwrap();
            let mut content = String::new();
            file.read_to_string(&mut content).unwrap();
            out.push((file.name().to_string(), content));
        }
        out
    }

    #[test]
    fn test_package_file_name() {
        assert_eq!(package_file_name("Test Repository"), "Test_Repository.dup");
        assert_eq!(package_file_name("a-b_c.1/2"), "a-b_c_1_2.dup");
        assert_eq!(package_file_name("   "), "export.dup");
        assert_eq!(package_file_name("Café"), "Caf_.dup");
    }

    #[test]
    fn test_script_first_then_embedded_support() {
        let bytes = PackageBuilder::new().build("# script\n").unwrap();
        let entries = entries(&bytes);

        let names: Vec<&str> = entries.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(
            names,
            vec![SCRIPT_ENTRY, "standardFunctions.py", "update.info", "updatepack.xsd"]
        );
        assert_eq!(entries[0].1, "# script\n");
        assert!(entries[1].1.contains("def EssentialGetInstance"));
    }

    #[test]
    fn test_support_dir_sorted_and_flat() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.txt"), "b").unwrap();
        fs::write(dir.path().join("a.txt"), "a").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("c.txt"), "c").unwrap();

        let builder = PackageBuilder::new().with_support_dir(dir.path());
        assert_eq!(builder.support_entries().unwrap(), vec!["a.txt", "b.txt"]);

        let entries = entries(&builder.build("x").unwrap());
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[1], ("a.txt".to_string(), "a".to_string()));
    }

    #[test]
    fn test_missing_support_dir_is_packaging_error() {
        let dir = tempdir().unwrap();
        let builder = PackageBuilder::new().with_support_dir(dir.path().join("absent"));
        let err = builder.build("x").unwrap_err();
        assert!(matches!(err, DupError::Packaging(_)));
    }
}
