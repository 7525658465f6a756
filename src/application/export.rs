//! Export entry use case

use crate::domain::attachment::file_name_from_url;
use crate::domain::text::strip_html;
use crate::domain::Entry;
use crate::error::Result;
use crate::infrastructure::AttachmentStore;
use futures::future::join_all;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

/// An attachment that could not be exported
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFailure {
    pub url: String,
    pub reason: String,
}

/// Files written by an export, plus attachments that were skipped
#[derive(Debug, Clone, Default)]
pub struct ExportReport {
    pub text_file: PathBuf,
    pub attachments: Vec<PathBuf>,
    pub failures: Vec<ExportFailure>,
}

impl ExportReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Service for writing an entry and its attachments to a local directory
pub struct ExportService {
    attachments: Arc<dyn AttachmentStore>,
}

impl ExportService {
    pub fn new(attachments: Arc<dyn AttachmentStore>) -> Self {
        ExportService { attachments }
    }

    /// Write `<title>.txt` and every attachment into `dest`.
    ///
    /// Existing files in `dest` are never replaced: a taken name gets a
    /// numeric suffix, so repeated exports of same-day entries sit side by side.
    /// The text file is written first and its failure aborts the export.
    /// Attachments are fetched concurrently; each one that cannot be fetched
    /// or written is logged and recorded in the report, and the rest continue.
    pub async fn download(&self, entry: &Entry, dest: &Path) -> Result<ExportReport> {
        tokio::fs::create_dir_all(dest).await?;

        let text_name = format!("{}.txt", entry.display_title());
        let text_file = write_new_file(dest, &text_name, render_text(entry).as_bytes()).await?;

        let fetches = entry.files.iter().map(|url| async move {
            let result = self.attachments.fetch(url).await;
            (url, result)
        });

        let mut report = ExportReport {
            text_file,
            ..ExportReport::default()
        };

        for (url, result) in join_all(fetches).await {
            let written = match result {
                Ok(bytes) => write_new_file(dest, &file_name_from_url(url), &bytes)
                    .await
                    .map_err(|e| e.to_string()),
                Err(e) => Err(e.to_string()),
            };

            match written {
                Ok(path) => report.attachments.push(path),
                Err(reason) => {
                    warn!(%url, %reason, "attachment export failed");
                    report.failures.push(ExportFailure {
                        url: url.clone(),
                        reason,
                    });
                }
            }
        }

        info!(
            id = %entry.id,
            attachments = report.attachments.len(),
            failed = report.failures.len(),
            "exported entry"
        );
        Ok(report)
    }
}

/// Plain-text rendering of an entry with its metadata header
pub fn render_text(entry: &Entry) -> String {
    format!(
        "Title: {}\nDate: {}\nRating: {}\n\n{}\n",
        entry.display_title(),
        entry
            .created_at
            .with_timezone(&chrono::Local)
            .format("%Y-%m-%d %H:%M"),
        entry.rating.stars(),
        strip_html(&entry.content)
    )
}

fn safe_file_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c => c,
        })
        .collect()
}

/// Create `dest/name` and write `bytes` to it. While the name is taken, by an
/// older export or an earlier file of this one, a numeric suffix is tried.
async fn write_new_file(dest: &Path, name: &str, bytes: &[u8]) -> std::io::Result<PathBuf> {
    let name = safe_file_name(name);
    let mut counter = 0;
    loop {
        let path = dest.join(numbered_name(&name, counter));
        let opened = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await;
        match opened {
            Ok(mut file) => {
                file.write_all(bytes).await?;
                file.flush().await?;
                return Ok(path);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => counter += 1,
            Err(e) => return Err(e),
        }
    }
}

fn numbered_name(name: &str, counter: usize) -> String {
    if counter == 0 {
        return name.to_string();
    }
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{} ({}).{}", stem, counter, ext),
        _ => format!("{} ({})", name, counter),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DocumentId, Rating};
    use crate::infrastructure::MemoryBackend;
    use chrono::{TimeZone, Utc};
    use std::fs;
    use tempfile::TempDir;

    fn entry(files: Vec<String>) -> Entry {
        Entry {
            id: DocumentId::new("e1"),
            user_id: "u".to_string(),
            content: "<p>Went <em>hiking</em> &amp; swam.</p>".to_string(),
            rating: Rating::new(4).unwrap(),
            files,
            is_draft: false,
            created_at: Utc.with_ymd_and_hms(2026, 6, 15, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_render_text() {
        let text = render_text(&entry(vec![]));
        assert!(text.starts_with("Title: June 15, 2026\n"));
        assert!(text.contains("Rating: ⭐⭐⭐⭐\n"));
        assert!(text.ends_with("\n\nWent hiking & swam.\n"));
    }

    #[test]
    fn test_numbered_name() {
        assert_eq!(numbered_name("a.png", 0), "a.png");
        assert_eq!(numbered_name("a.png", 1), "a (1).png");
        assert_eq!(numbered_name("a.png", 2), "a (2).png");
        assert_eq!(numbered_name("README", 1), "README (1)");
        assert_eq!(numbered_name(".env", 1), ".env (1)");
    }

    #[tokio::test]
    async fn test_same_day_exports_sit_side_by_side() {
        let backend = Arc::new(MemoryBackend::new());
        let service = ExportService::new(backend);
        let temp = TempDir::new().unwrap();
        let mut morning = entry(vec![]);
        morning.content = "morning entry".to_string();
        let mut evening = entry(vec![]);
        evening.id = DocumentId::new("e2");
        evening.content = "evening entry".to_string();
        evening.created_at = morning.created_at + chrono::Duration::hours(8);

        let first = service.download(&morning, temp.path()).await.unwrap();
        let second = service.download(&evening, temp.path()).await.unwrap();

        assert_ne!(first.text_file, second.text_file);
        assert!(fs::read_to_string(&first.text_file)
            .unwrap()
            .contains("morning entry"));
        assert!(fs::read_to_string(&second.text_file)
            .unwrap()
            .contains("evening entry"));
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 2);
    }

    #[tokio::test]
    async fn test_download_keeps_existing_files() {
        let backend = Arc::new(MemoryBackend::new());
        backend.upload("uploads/u/x_0_photo.png", b"new").await.unwrap();
        backend.upload("uploads/v/x_0_photo.png", b"newer").await.unwrap();
        let a = backend.download_url("uploads/u/x_0_photo.png").await.unwrap();
        let b = backend.download_url("uploads/v/x_0_photo.png").await.unwrap();
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("x_0_photo.png"), b"old").unwrap();

        let report = ExportService::new(backend)
            .download(&entry(vec![a, b]), temp.path())
            .await
            .unwrap();

        assert_eq!(fs::read(temp.path().join("x_0_photo.png")).unwrap(), b"old");
        assert_eq!(
            report.attachments,
            vec![
                temp.path().join("x_0_photo (1).png"),
                temp.path().join("x_0_photo (2).png"),
            ]
        );
        assert_eq!(fs::read(&report.attachments[0]).unwrap(), b"new");
        assert_eq!(fs::read(&report.attachments[1]).unwrap(), b"newer");
    }

    #[tokio::test]
    async fn test_download_writes_text_and_attachments() {
        let backend = Arc::new(MemoryBackend::new());
        backend.upload("uploads/x_0_photo.png", b"png").await.unwrap();
        let url = backend.download_url("uploads/x_0_photo.png").await.unwrap();
        let temp = TempDir::new().unwrap();

        let report = ExportService::new(backend)
            .download(&entry(vec![url]), temp.path())
            .await
            .unwrap();

        assert!(report.is_complete());
        assert!(fs::read_to_string(&report.text_file)
            .unwrap()
            .contains("Went hiking"));
        assert_eq!(report.attachments, vec![temp.path().join("x_0_photo.png")]);
        assert_eq!(fs::read(&report.attachments[0]).unwrap(), b"png");
    }

    #[tokio::test]
    async fn test_download_continues_past_failed_attachment() {
        let backend = Arc::new(MemoryBackend::new());
        backend.upload("uploads/x_0_ok.txt", b"ok").await.unwrap();
        let good = backend.download_url("uploads/x_0_ok.txt").await.unwrap();
        let missing = "memory://attachments/uploads%2Fgone.txt".to_string();
        let temp = TempDir::new().unwrap();

        let report = ExportService::new(backend)
            .download(&entry(vec![missing.clone(), good]), temp.path())
            .await
            .unwrap();

        assert!(!report.is_complete());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].url, missing);
        assert_eq!(report.attachments.len(), 1);
        assert!(report.text_file.exists());
    }

    #[tokio::test]
    async fn test_download_reports_fetch_fault() {
        let backend = Arc::new(MemoryBackend::new());
        backend.upload("uploads/x_0_a.txt", b"a").await.unwrap();
        backend.upload("uploads/x_1_b.txt", b"b").await.unwrap();
        let a = backend.download_url("uploads/x_0_a.txt").await.unwrap();
        let b = backend.download_url("uploads/x_1_b.txt").await.unwrap();
        backend.fail_fetch_of(&a).await;
        let temp = TempDir::new().unwrap();

        let report = ExportService::new(backend)
            .download(&entry(vec![a, b]), temp.path())
            .await
            .unwrap();

        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].reason.contains("rejected"));
        assert_eq!(report.attachments, vec![temp.path().join("x_1_b.txt")]);
    }
}
