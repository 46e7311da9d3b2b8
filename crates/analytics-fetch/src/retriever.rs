//! The retrieval capability shared by every log source.

use std::path::{Path, PathBuf};

use analytics_core::error::Result;
use analytics_data::normalize::JsonlWriter;
use tracing::{debug, info};

/// The full text of one fetched item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedBlob {
    /// Human-readable origin (file name or URL), used in logs.
    pub name: String,
    pub text: String,
}

/// A source of raw log blobs.
///
/// Each implementation owns its own fault-tolerance policy: the folder source
/// skips items that fail, the URL source fails the whole run.
pub trait Retriever {
    /// Short source name for logs.
    fn name(&self) -> &'static str;

    /// Fetch every blob, in the order they should appear in the output.
    fn fetch(&self) -> Result<Vec<FetchedBlob>>;
}

/// Outcome of [`retrieve_to_file`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievalSummary {
    pub path: PathBuf,
    pub blobs: u64,
    pub lines: u64,
}

/// Fetch from `retriever` and write normalized JSON Lines to `output`.
///
/// The output file is only created once fetching succeeded, so a fatal
/// source error leaves any previous output untouched.
pub fn retrieve_to_file(retriever: &dyn Retriever, output: &Path) -> Result<RetrievalSummary> {
    info!("Fetching logs from {} source", retriever.name());
    let blobs = retriever.fetch()?;

    let mut writer = JsonlWriter::create(output)?;
    for blob in &blobs {
        let lines = writer.write_blob(&blob.text)?;
        debug!("{}: {} line(s)", blob.name, lines);
    }
    let (blobs, lines) = writer.finish()?;

    info!(
        "Wrote {} line(s) from {} blob(s) to {}",
        lines,
        blobs,
        output.display()
    );

    Ok(RetrievalSummary {
        path: output.to_path_buf(),
        blobs,
        lines,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use analytics_core::error::AnalyticsError;
    use tempfile::TempDir;

    struct StaticSource(Vec<&'static str>);

    impl Retriever for StaticSource {
        fn name(&self) -> &'static str {
            "static"
        }

        fn fetch(&self) -> Result<Vec<FetchedBlob>> {
            Ok(self
                .0
                .iter()
                .enumerate()
                .map(|(i, text)| FetchedBlob {
                    name: format!("blob-{}", i),
                    text: text.to_string(),
                })
                .collect())
        }
    }

    struct FailingSource;

    impl Retriever for FailingSource {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn fetch(&self) -> Result<Vec<FetchedBlob>> {
            Err(AnalyticsError::HttpStatus {
                status: 500,
                url: "http://example.invalid/logs".to_string(),
            })
        }
    }

    #[test]
    fn test_retrieve_to_file_mixes_blob_shapes() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("raw_logs.jsonl");
        let source = StaticSource(vec![
            r#"[{"ip":"1.1.1.1"},{"ip":"2.2.2.2"}]"#,
            r#"{"ip":"3.3.3.3"}"#,
            "{\"ip\":\"4.4.4.4\"}\n",
        ]);

        let summary = retrieve_to_file(&source, &out).unwrap();
        assert_eq!(summary.blobs, 3);
        assert_eq!(summary.lines, 4);

        let text = std::fs::read_to_string(&out).unwrap();
        let ips: Vec<String> = text
            .lines()
            .map(|l| serde_json::from_str::<serde_json::Value>(l).unwrap()["ip"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(ips, vec!["1.1.1.1", "2.2.2.2", "3.3.3.3", "4.4.4.4"]);
    }

    #[test]
    fn test_fatal_fetch_leaves_existing_output() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("raw_logs.jsonl");
        std::fs::write(&out, "previous\n").unwrap();

        let err = retrieve_to_file(&FailingSource, &out).unwrap_err();
        assert!(err.is_transport());
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "previous\n");
    }
}
