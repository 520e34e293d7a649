//! Local renderer process
//!
//! Writes scene code to a fixed script location, runs the renderer against
//! it and reads back the produced video. The renderer runs as a child process
//! awaited asynchronously, so a slow render never blocks other requests.

use crate::error::RenderError;
use async_trait::async_trait;
use bytes::Bytes;
use claiss_core::ComputeConfig;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::sync::Mutex;

const SCRIPT_NAME: &str = "current_animation.py";
const SCRIPT_STEM: &str = "current_animation";
const QUALITY_DIR: &str = "480p15";
/// How long to keep collecting output after the process is gone.
const OUTPUT_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Bytes rendered locally for one scene.
#[derive(Debug, Clone)]
pub struct LocalRender {
    pub video: Bytes,
    pub logs: String,
    /// Wall-clock seconds, measured around the renderer process.
    pub duration: f64,
}

#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, code: &str, class_name: &str) -> Result<LocalRender, RenderError>;
}

pub struct LocalRenderer {
    program: String,
    work_dir: PathBuf,
    timeout: Duration,
    // The script and output locations are fixed, so renders must not overlap.
    lock: Mutex<()>,
}

impl LocalRenderer {
    pub fn new(program: impl Into<String>, work_dir: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            work_dir: work_dir.into(),
            timeout,
            lock: Mutex::new(()),
        }
    }

    pub fn from_config(config: &ComputeConfig) -> Self {
        Self::new(
            config.renderer_path.clone(),
            config.renderer_work_dir.clone(),
            Duration::from_secs(config.renderer_timeout_secs),
        )
    }

    /// `<work_dir>/media/videos/current_animation/480p15/<Class>.mp4`
    pub fn output_path(&self, class_name: &str) -> PathBuf {
        self.work_dir
            .join("media")
            .join("videos")
            .join(SCRIPT_STEM)
            .join(QUALITY_DIR)
            .join(format!("{}.mp4", class_name))
    }

    async fn run(&self, script: &Path, class_name: &str) -> Result<String, RenderError> {
        let mut child = Command::new(&self.program)
            .arg(script)
            .arg(class_name)
            .arg("-ql")
            .arg("--disable_caching")
            .current_dir(&self.work_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stdout = tokio::spawn(drain(child.stdout.take()));
        let stderr = tokio::spawn(drain(child.stderr.take()));

        let status = match tokio::time::timeout(self.timeout, child.wait()).await {
            Ok(status) => Some(status?),
            Err(_) => {
                if let Err(e) = child.kill().await {
                    tracing::warn!(error = %e, "Failed to kill timed out renderer");
                }
                None
            }
        };

        let mut logs = collect(stdout).await;
        let stderr = collect(stderr).await;
        if !stderr.is_empty() {
            if !logs.is_empty() {
                logs.push('\n');
            }
            logs.push_str(&stderr);
        }

        match status {
            None => Err(RenderError::Timeout {
                timeout_secs: self.timeout.as_secs(),
                logs,
            }),
            Some(status) if !status.success() => Err(RenderError::Exit {
                status: status.to_string(),
                logs,
            }),
            Some(_) => Ok(logs),
        }
    }

    /// Log which videos the renderer did produce, to help diagnose a
    /// class-name mismatch.
    async fn log_output_dir(&self, expected: &Path) {
        let Some(dir) = expected.parent() else {
            return;
        };
        match tokio::fs::read_dir(dir).await {
            Ok(mut entries) => {
                let mut videos = Vec::new();
                while let Ok(Some(entry)) = entries.next_entry().await {
                    let name = entry.file_name().to_string_lossy().into_owned();
                    if name.ends_with(".mp4") {
                        videos.push(name);
                    }
                }
                tracing::warn!(
                    dir = %dir.display(),
                    found = ?videos,
                    "Expected video missing from renderer output"
                );
            }
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "Could not read renderer output directory");
            }
        }
    }
}

async fn drain<R: AsyncRead + Unpin>(reader: Option<R>) -> String {
    let mut buf = Vec::new();
    if let Some(mut reader) = reader {
        let _ = reader.read_to_end(&mut buf).await;
    }
    String::from_utf8_lossy(&buf).into_owned()
}

async fn collect(task: tokio::task::JoinHandle<String>) -> String {
    match tokio::time::timeout(OUTPUT_DRAIN_TIMEOUT, task).await {
        Ok(Ok(output)) => output,
        _ => String::new(),
    }
}

#[async_trait]
impl Renderer for LocalRenderer {
    async fn render(&self, code: &str, class_name: &str) -> Result<LocalRender, RenderError> {
        let _guard = self.lock.lock().await;
        let start = Instant::now();

        tokio::fs::create_dir_all(&self.work_dir).await?;
        let script = self.work_dir.join(SCRIPT_NAME);
        tokio::fs::write(&script, code).await?;

        let expected = self.output_path(class_name);
        // A stale artifact from an earlier render must not be mistaken for this one.
        let _ = tokio::fs::remove_file(&expected).await;

        tracing::info!(
            program = %self.program,
            script = %script.display(),
            class_name = %class_name,
            timeout_secs = self.timeout.as_secs(),
            "Starting local render"
        );

        let logs = self.run(&script, class_name).await.inspect_err(|e| {
            tracing::error!(class_name = %class_name, error = %e, "Local render failed");
        })?;

        let video = match tokio::fs::read(&expected).await {
            Ok(video) => Bytes::from(video),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.log_output_dir(&expected).await;
                return Err(RenderError::MissingArtifact {
                    path: expected,
                    logs,
                });
            }
            Err(e) => return Err(e.into()),
        };

        let duration = start.elapsed().as_secs_f64();
        tracing::info!(
            class_name = %class_name,
            size_bytes = video.len(),
            duration_ms = duration * 1000.0,
            "Local render completed"
        );

        Ok(LocalRender {
            video,
            logs,
            duration,
        })
    }
}
