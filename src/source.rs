use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::StatementError;
use crate::models::StatementSource;

/// Produces the plaintext of one statement.
pub(crate) trait TextSource {
    fn read_text(&self, statement_id: &str) -> Result<String, StatementError>;
}

pub(crate) struct PlainTextFile {
    path: PathBuf,
}

impl PlainTextFile {
    pub(crate) fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }
}

impl TextSource for PlainTextFile {
    fn read_text(&self, statement_id: &str) -> Result<String, StatementError> {
        fs::read_to_string(&self.path).map_err(|source| StatementError::Source {
            statement_id: statement_id.to_string(),
            source,
        })
    }
}

/// Password-protected PDF, converted with poppler's `pdftotext -layout`.
/// The layout flag keeps column padding, which the wide-gap row split needs.
pub(crate) struct PdfText {
    path: PathBuf,
    password: String,
    program: String,
}

impl PdfText {
    pub(crate) fn new(path: &Path, password: &str) -> Self {
        Self {
            path: path.to_path_buf(),
            password: password.to_string(),
            program: "pdftotext".into(),
        }
    }

    #[cfg(test)]
    fn with_program(mut self, program: &str) -> Self {
        self.program = program.to_string();
        self
    }
}

impl TextSource for PdfText {
    fn read_text(&self, statement_id: &str) -> Result<String, StatementError> {
        let io_err = |source| StatementError::Source {
            statement_id: statement_id.to_string(),
            source,
        };

        // Removed when `scratch` drops, on every return path.
        let scratch = tempfile::Builder::new()
            .prefix("cardledger-")
            .suffix(".txt")
            .tempfile()
            .map_err(io_err)?;

        log::debug!("{statement_id}: running {} on {}", self.program, self.path.display());
        let output = Command::new(&self.program)
            .arg("-layout")
            .arg("-upw")
            .arg(&self.password)
            .arg(&self.path)
            .arg(scratch.path())
            .output()
            .map_err(io_err)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(StatementError::Decryption {
                statement_id: statement_id.to_string(),
                message: if stderr.is_empty() {
                    format!("{} exited with {}", self.program, output.status)
                } else {
                    stderr
                },
            });
        }

        fs::read_to_string(scratch.path()).map_err(io_err)
    }
}

pub(crate) fn source_for(source: &StatementSource) -> Box<dyn TextSource> {
    match source {
        StatementSource::Text(path) => Box::new(PlainTextFile::new(path)),
        StatementSource::Pdf { path, password } => Box::new(PdfText::new(path, password)),
    }
}
