//! Certificate directory index.
//!
//! Certificates are named `<prefix>-<participant name><extension>`, for
//! example `2025Cert-王小明.pdf`. The participant name is whatever follows
//! the last `-` of the stem, so prefixes may themselves contain dashes.

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// One indexed certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateEntry {
    /// Name extracted from the file name.
    pub participant_name: String,
    /// Full path of the document.
    pub document_path: PathBuf,
}

/// Participant name to certificate path.
#[derive(Debug, Clone, Default)]
pub struct CertificateIndex {
    entries: HashMap<String, PathBuf>,
}

impl CertificateIndex {
    /// Builds the index from file names found in `dir`.
    ///
    /// Only names ending in `extension` (compared case-sensitively) are
    /// kept. When two files yield the same participant name the later one
    /// in `filenames` wins.
    #[must_use]
    pub fn build<I, S>(dir: &Path, filenames: I, extension: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut entries = HashMap::new();
        for filename in filenames {
            let filename = filename.as_ref();
            let Some(name) = participant_name(filename, extension) else {
                continue;
            };
            if name.is_empty() {
                debug!(filename, "No participant name in certificate file name");
                continue;
            }
            let path = dir.join(filename);
            if let Some(previous) = entries.insert(name.to_string(), path) {
                warn!(
                    name,
                    replaced = %previous.display(),
                    "Several certificates for one participant; using the later file"
                );
            }
        }
        Self { entries }
    }

    /// Lists `dir` and indexes its certificates.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Load`] if the directory cannot be read.
    pub fn from_directory(dir: &Path, extension: &str) -> Result<Self> {
        let filenames = list_directory(dir)?;
        let index = Self::build(dir, &filenames, extension);
        debug!(
            dir = %dir.display(),
            files = filenames.len(),
            certificates = index.len(),
            "Indexed certificate directory"
        );
        Ok(index)
    }

    /// Path of the certificate for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Path> {
        self.entries.get(name).map(PathBuf::as_path)
    }

    /// Number of indexed certificates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing was indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries, sorted by participant name.
    #[must_use]
    pub fn entries(&self) -> Vec<CertificateEntry> {
        let mut entries: Vec<_> = self
            .entries
            .iter()
            .map(|(name, path)| CertificateEntry {
                participant_name: name.clone(),
                document_path: path.clone(),
            })
            .collect();
        entries.sort_by(|a, b| a.participant_name.cmp(&b.participant_name));
        entries
    }
}

/// Extracts the participant name from a certificate file name.
///
/// Returns `None` when the file does not carry `extension`. The result is
/// trimmed and may be empty.
#[must_use]
pub fn participant_name<'a>(filename: &'a str, extension: &str) -> Option<&'a str> {
    let stem = filename.strip_suffix(extension)?;
    let name = stem.rsplit_once('-').map_or(stem, |(_, name)| name);
    Some(name.trim())
}

/// Names of the regular files in `dir`, sorted byte-wise.
///
/// # Errors
///
/// Returns [`Error::Load`] if the directory is missing or unreadable.
pub fn list_directory(dir: &Path) -> Result<Vec<String>> {
    let load_error = |e: std::io::Error| Error::Load {
        what: "certificate directory",
        path: dir.to_path_buf(),
        reason: e.to_string(),
    };

    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(load_error)? {
        let entry = entry.map_err(load_error)?;
        if !entry.file_type().map_err(load_error)?.is_file() {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) => names.push(name),
            Err(raw) => warn!(name = ?raw, "Skipping file with a non UTF-8 name"),
        }
    }
    names.sort_unstable();
    Ok(names)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn name_after_last_dash() {
        assert_eq!(participant_name("2025Cert-王小明.pdf", ".pdf"), Some("王小明"));
        assert_eq!(participant_name("a-b-c- Alice .pdf", ".pdf"), Some("Alice"));
    }

    #[test]
    fn whole_stem_without_dash() {
        assert_eq!(participant_name("Alice.pdf", ".pdf"), Some("Alice"));
        assert_eq!(participant_name(" Alice .pdf", ".pdf"), Some("Alice"));
        assert_eq!(participant_name("cert.pdf", ".pdf"), Some("cert"));
    }

    #[test]
    fn extension_filter_is_case_sensitive() {
        assert_eq!(participant_name("cert-Alice.PDF", ".pdf"), None);
        assert_eq!(participant_name("cert-Alice.txt", ".pdf"), None);
    }

    #[test]
    fn later_file_wins() {
        let dir = Path::new("/certs");
        let index = CertificateIndex::build(dir, ["A-Alice.pdf", "B-Alice.pdf"], ".pdf");
        assert_eq!(index.len(), 1);
        assert_eq!(index.get("Alice"), Some(Path::new("/certs/B-Alice.pdf")));
    }

    #[test]
    fn empty_names_and_foreign_files_are_ignored() {
        let dir = Path::new("/certs");
        let index = CertificateIndex::build(
            dir,
            ["cert-.pdf", ".pdf", "notes.txt", "cert-Bob.PDF", "cert-Cat.pdf"],
            ".pdf",
        );
        assert_eq!(
            index.entries(),
            vec![CertificateEntry {
                participant_name: "Cat".into(),
                document_path: PathBuf::from("/certs/cert-Cat.pdf"),
            }]
        );
    }

    #[test]
    fn lists_regular_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b-Bob.pdf"), b"").unwrap();
        std::fs::write(dir.path().join("a-Alice.pdf"), b"").unwrap();
        std::fs::create_dir(dir.path().join("sub-Dir.pdf")).unwrap();

        assert_eq!(
            list_directory(dir.path()).unwrap(),
            vec!["a-Alice.pdf".to_string(), "b-Bob.pdf".to_string()]
        );

        let index = CertificateIndex::from_directory(dir.path(), ".pdf").unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index.get("Bob"), Some(dir.path().join("b-Bob.pdf").as_path()));
    }

    #[test]
    fn missing_directory_is_a_load_error() {
        let err = list_directory(Path::new("/nonexistent/certs")).unwrap_err();
        assert!(err.is_load());
    }
}
