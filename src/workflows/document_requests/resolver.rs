use std::path::{Component, Path, PathBuf};

use tracing::warn;

const PDF_SUFFIX: &str = ".pdf";

/// Outcome of resolving a stored document name against the base directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentLookup {
    Found(PathBuf),
    Missing(PathBuf),
    /// The name would address a file outside the base directory.
    OutsideBase(PathBuf),
}

/// Maps logical document names onto PDFs under a single base directory.
#[derive(Debug, Clone)]
pub struct DocumentResolver {
    base_dir: PathBuf,
}

impl DocumentResolver {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Appends `.pdf` unless the name already carries it, in any case.
    pub fn file_name_for(document_name: &str) -> String {
        if document_name.to_ascii_lowercase().ends_with(PDF_SUFFIX) {
            document_name.to_string()
        } else {
            format!("{document_name}{PDF_SUFFIX}")
        }
    }

    pub fn candidate_path(&self, document_name: &str) -> PathBuf {
        self.base_dir.join(Self::file_name_for(document_name))
    }

    pub async fn lookup(&self, document_name: &str) -> DocumentLookup {
        let candidate = self.candidate_path(document_name);

        let confined = Path::new(&Self::file_name_for(document_name))
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
        if !confined {
            warn!(document = %document_name, "document name escapes the document directory");
            return DocumentLookup::OutsideBase(candidate);
        }

        match tokio::fs::metadata(&candidate).await {
            Ok(metadata) if metadata.is_file() => {}
            _ => return DocumentLookup::Missing(candidate),
        }

        // Symlinks inside the base directory may still point elsewhere.
        let (base, resolved) = match (
            tokio::fs::canonicalize(&self.base_dir).await,
            tokio::fs::canonicalize(&candidate).await,
        ) {
            (Ok(base), Ok(resolved)) => (base, resolved),
            _ => return DocumentLookup::Missing(candidate),
        };

        if resolved.starts_with(&base) {
            DocumentLookup::Found(candidate)
        } else {
            warn!(
                document = %document_name,
                resolved = %resolved.display(),
                "document resolves outside the document directory"
            );
            DocumentLookup::OutsideBase(candidate)
        }
    }
}
