use std::io::Write;
use std::path::Path;
use std::process::{Output, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tempfile::NamedTempFile;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::EmbeddingConfig;
use crate::error::AppError;
use crate::models::embedding::EmbeddingVector;
use crate::models::image_ref::ImageReference;
use crate::services::embedding_service::EmbeddingProvider;

const MAX_REPORTED_OUTPUT_CHARS: usize = 200;

/// Last stdout line of the worker: a bare vector, a wrapped vector, or an
/// in-band failure.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WorkerOutput {
    Vector(Vec<f32>),
    Failure { error: String },
    Embedding { embedding: Vec<f32> },
}

/// Computes embeddings in a separate worker process, one process per call.
/// The worker gets the image URL or file path as its last argument.
pub struct WorkerEmbeddingProvider {
    program: String,
    args: Vec<String>,
    timeout: Duration,
    dimensions: Option<usize>,
}

impl WorkerEmbeddingProvider {
    pub fn new(
        program: impl Into<String>,
        args: Vec<String>,
        timeout: Duration,
        dimensions: Option<usize>,
    ) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
            dimensions,
        }
    }

    pub fn from_config(config: &EmbeddingConfig) -> Self {
        Self::new(
            config.worker_program.clone(),
            config.worker_args.clone(),
            config.worker_timeout(),
            config.worker_dimensions,
        )
    }

    async fn run_worker(&self, target: &str) -> Result<Output, AppError> {
        let child = Command::new(&self.program)
            .args(&self.args)
            .arg(target)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                AppError::provider(format!(
                    "failed to start embedding worker '{}': {e}",
                    self.program
                ))
            })?;

        // Dropping the wait future on timeout drops the child, which kills it.
        match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => {
                result.map_err(|e| AppError::provider(format!("embedding worker I/O failed: {e}")))
            }
            Err(_) => {
                warn!(program = %self.program, timeout = ?self.timeout, "embedding worker timed out");
                Err(AppError::provider(format!(
                    "embedding worker timed out after {:?}",
                    self.timeout
                )))
            }
        }
    }
}

#[async_trait]
impl EmbeddingProvider for WorkerEmbeddingProvider {
    async fn embed(&self, image: &ImageReference) -> Result<EmbeddingVector, AppError> {
        let (target, staged) = match image {
            ImageReference::RemoteUrl(url) => (url.clone(), None),
            ImageReference::LocalBinary { bytes, filename } => {
                let file = stage_upload(bytes, filename)?;
                (file.path().to_string_lossy().into_owned(), Some(file))
            }
        };

        debug!(program = %self.program, image = %image.describe(), "spawning embedding worker");
        let output = self.run_worker(&target).await;
        drop(staged);

        parse_worker_output(&output?, self.dimensions)
    }

    fn name(&self) -> &'static str {
        "local"
    }
}

fn stage_upload(bytes: &[u8], filename: &str) -> Result<NamedTempFile, AppError> {
    let suffix = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default();
    let mut file = tempfile::Builder::new()
        .prefix("lookalike-upload-")
        .suffix(&suffix)
        .tempfile()?;
    file.write_all(bytes)?;
    file.flush()?;
    Ok(file)
}

fn truncate_for_report(text: &str) -> String {
    if text.chars().count() <= MAX_REPORTED_OUTPUT_CHARS {
        return text.to_string();
    }
    let head: String = text.chars().take(MAX_REPORTED_OUTPUT_CHARS).collect();
    format!("{head}...")
}

fn parse_worker_output(
    output: &Output,
    dimensions: Option<usize>,
) -> Result<EmbeddingVector, AppError> {
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();
        let reason = if !stderr.is_empty() {
            truncate_for_report(stderr)
        } else {
            match output.status.code() {
                Some(code) => format!("embedding worker exited with code {code}"),
                None => "embedding worker was terminated by a signal".to_string(),
            }
        };
        return Err(AppError::provider(reason));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let line = stdout
        .lines()
        .map(str::trim)
        .rev()
        .find(|line| !line.is_empty())
        .ok_or_else(|| AppError::provider("embedding worker produced no output"))?;

    let parsed: WorkerOutput = serde_json::from_str(line).map_err(|_| {
        AppError::provider(format!(
            "failed to parse embedding output: {}",
            truncate_for_report(line)
        ))
    })?;

    match parsed {
        WorkerOutput::Vector(values) | WorkerOutput::Embedding { embedding: values } => {
            EmbeddingVector::new(values, dimensions)
        }
        WorkerOutput::Failure { error } => Err(AppError::provider(error)),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::Instant;

    fn shell_worker(script: &str, timeout: Duration) -> WorkerEmbeddingProvider {
        WorkerEmbeddingProvider::new(
            "sh",
            vec!["-c".to_string(), script.to_string(), "embed-worker".to_string()],
            timeout,
            None,
        )
    }

    fn reason_of(err: AppError) -> String {
        match err {
            AppError::Provider { reason } => reason,
            other => panic!("expected provider error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_worker_vector_on_last_line() {
        let worker = shell_worker(
            r#"test "$1" = "https://x.test/a.jpg" || exit 9; echo "Device: cpu"; echo '[0.25, 0.5, 0.75]'"#,
            Duration::from_secs(10),
        );
        let image = ImageReference::remote("https://x.test/a.jpg").unwrap();
        let emb = worker.embed(&image).await.unwrap();
        assert_eq!(emb.as_slice(), &[0.25f32, 0.5, 0.75]);
    }

    #[tokio::test]
    async fn test_worker_wrapped_vector() {
        let worker = shell_worker(r#"echo '{"embedding": [1.0, 2.0]}'"#, Duration::from_secs(10));
        let image = ImageReference::remote("https://x.test/a.jpg").unwrap();
        assert_eq!(worker.embed(&image).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_in_band_error_on_clean_exit() {
        let worker = shell_worker(
            r#"echo '{"error": "cannot identify image file"}'"#,
            Duration::from_secs(10),
        );
        let image = ImageReference::remote("https://x.test/a.jpg").unwrap();
        let reason = reason_of(worker.embed(&image).await.unwrap_err());
        assert_eq!(reason, "cannot identify image file");
    }

    #[tokio::test]
    async fn test_non_zero_exit_reports_stderr_or_code() {
        let image = ImageReference::remote("https://x.test/a.jpg").unwrap();

        let noisy = shell_worker(r#"echo "model weights missing" >&2; exit 3"#, Duration::from_secs(10));
        let reason = reason_of(noisy.embed(&image).await.unwrap_err());
        assert!(reason.contains("model weights missing"), "{reason}");

        let quiet = shell_worker("echo '[1.0]'; exit 4", Duration::from_secs(10));
        let reason = reason_of(quiet.embed(&image).await.unwrap_err());
        assert!(reason.contains("code 4"), "{reason}");
    }

    #[tokio::test]
    async fn test_unparsable_or_empty_output() {
        let image = ImageReference::remote("https://x.test/a.jpg").unwrap();

        let garbage = shell_worker("echo 'not json at all'", Duration::from_secs(10));
        let reason = reason_of(garbage.embed(&image).await.unwrap_err());
        assert!(reason.contains("failed to parse"), "{reason}");

        let silent = shell_worker("true", Duration::from_secs(10));
        assert!(matches!(
            silent.embed(&image).await,
            Err(AppError::Provider { .. })
        ));
    }

    #[tokio::test]
    async fn test_timeout_kills_worker() {
        let worker = shell_worker("sleep 5; echo '[1.0]'", Duration::from_millis(200));
        let image = ImageReference::remote("https://x.test/a.jpg").unwrap();

        let started = Instant::now();
        let reason = reason_of(worker.embed(&image).await.unwrap_err());
        assert!(reason.contains("timed out"), "{reason}");
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_missing_program_is_provider_error() {
        let worker = WorkerEmbeddingProvider::new(
            "lookalike-no-such-worker-binary",
            Vec::new(),
            Duration::from_secs(1),
            None,
        );
        let image = ImageReference::remote("https://x.test/a.jpg").unwrap();
        let reason = reason_of(worker.embed(&image).await.unwrap_err());
        assert!(reason.contains("failed to start"), "{reason}");
    }

    #[tokio::test]
    async fn test_upload_is_staged_for_the_call_only() {
        let dir = tempfile::tempdir().unwrap();
        let record = dir.path().join("seen_path");
        let script = format!(
            r#"test -f "$1" || exit 7; case "$1" in *.png) ;; *) exit 8;; esac; echo "$1" > '{}'; echo '[0.5]'"#,
            record.display()
        );
        let worker = shell_worker(&script, Duration::from_secs(10));
        let image = ImageReference::local(vec![1, 2, 3, 4], "sneaker.png").unwrap();

        let emb = worker.embed(&image).await.unwrap();
        assert_eq!(emb.len(), 1);

        let seen = std::fs::read_to_string(&record).unwrap();
        assert!(!Path::new(seen.trim()).exists());
    }

    #[tokio::test]
    async fn test_dimension_check_applies_to_worker_output() {
        let worker = WorkerEmbeddingProvider::new(
            "sh",
            vec!["-c".to_string(), "echo '[0.1, 0.2]'".to_string()],
            Duration::from_secs(10),
            Some(512),
        );
        let image = ImageReference::remote("https://x.test/a.jpg").unwrap();
        assert!(matches!(
            worker.embed(&image).await,
            Err(AppError::Provider { .. })
        ));
    }
}
