//! Report export
//!
//! Turns accumulated findings into the downloadable report artifact.
//! Construction is pure string formatting; persistence is a separate,
//! explicit step so callers decide where (and whether) the file lands.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::info;

/// A fully built report, ready to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    /// `APIE_report_<timestamp>.txt`, with `:` and `.` in the timestamp
    /// replaced by `-` so the name is safe on any filesystem.
    pub file_name: String,
    pub contents: String,
}

impl ExportArtifact {
    /// Assemble the report body from a header and the findings.
    ///
    /// An empty findings list renders the literal `No results` body; the
    /// single-shot path exports even when the result map came back empty.
    pub fn build(header: &str, results: &[String], at: DateTime<Utc>) -> Self {
        let body = if results.is_empty() {
            "No results".to_string()
        } else {
            results.join("\n")
        };
        let stamp = at
            .to_rfc3339_opts(SecondsFormat::Millis, true)
            .replace([':', '.'], "-");
        Self {
            file_name: format!("APIE_report_{stamp}.txt"),
            contents: format!("{header}\n\n{body}"),
        }
    }

    /// Write the artifact into `dir` (created if needed) and return the path.
    pub fn write_to(&self, dir: &Path) -> std::io::Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join(&self.file_name);
        fs::write(&path, &self.contents)?;
        info!("report written to {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn stamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 9, 14, 30, 5).unwrap()
    }

    #[test]
    fn test_build_joins_results() {
        let results = vec!["VirtualAlloc".to_string(), "OpenProcess".to_string()];
        let artifact = ExportArtifact::build("APIE report for a.exe", &results, stamp());
        assert_eq!(
            artifact.contents,
            "APIE report for a.exe\n\nVirtualAlloc\nOpenProcess"
        );
    }

    #[test]
    fn test_build_empty_results_renders_no_results() {
        let artifact = ExportArtifact::build("APIE report for a.exe", &[], stamp());
        assert_eq!(artifact.contents, "APIE report for a.exe\n\nNo results");
    }

    #[test]
    fn test_file_name_has_no_colons_or_extra_dots() {
        let artifact = ExportArtifact::build("h", &[], stamp());
        assert_eq!(artifact.file_name, "APIE_report_2024-03-09T14-30-05-000Z.txt");
        assert!(!artifact.file_name.contains(':'));
        assert_eq!(artifact.file_name.matches('.').count(), 1);
    }

    #[test]
    fn test_write_to_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let reports = dir.path().join("reports");
        let artifact = ExportArtifact::build("h", &["x".to_string()], stamp());
        let path = artifact.write_to(&reports).unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "h\n\nx");
    }
}
