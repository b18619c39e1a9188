//! Screenshot capture through an external command (ImageMagick `import` by default).

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::infra::config::CaptureConfig;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("capture command is empty")]
    NoCommand,
    #[error("cannot prepare {path}: {source}")]
    OutputDir { path: PathBuf, source: std::io::Error },
    #[error("failed to run {program}: {source}")]
    Spawn { program: String, source: std::io::Error },
    #[error("capture timed out after {0} ms")]
    Timeout(u64),
    #[error("capture command exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
    #[error("capture command did not create {0}")]
    Missing(PathBuf),
}

#[derive(Clone, Debug)]
pub struct ScreenCapture {
    command: Vec<String>,
    output_dir: PathBuf,
    timeout: Duration,
}

impl ScreenCapture {
    pub fn new(cfg: &CaptureConfig) -> Self {
        Self {
            command: cfg.command.clone(),
            output_dir: cfg.output_dir.clone(),
            timeout: Duration::from_millis(cfg.timeout_ms),
        }
    }

    /// `<output_dir>/<YYYYmmdd_HHMMSS>.png`
    pub fn next_path(&self) -> PathBuf {
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        self.output_dir.join(format!("{stamp}.png"))
    }

    /// Take a screenshot and return the path of the saved image.
    pub async fn capture(&self) -> Result<PathBuf, CaptureError> {
        let (program, args) = self.command.split_first().ok_or(CaptureError::NoCommand)?;
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|source| CaptureError::OutputDir { path: self.output_dir.clone(), source })?;

        let path = self.next_path();
        let path_str = path.to_string_lossy();
        let args: Vec<String> = args.iter().map(|a| a.replace("{path}", &path_str)).collect();
        tracing::debug!(%program, ?args, "running capture command");

        let child = tokio::process::Command::new(program)
            .args(&args)
            .kill_on_drop(true)
            .output();
        let output = tokio::time::timeout(self.timeout, child)
            .await
            .map_err(|_| CaptureError::Timeout(self.timeout.as_millis() as u64))?
            .map_err(|source| CaptureError::Spawn { program: program.clone(), source })?;

        if !output.status.success() {
            return Err(CaptureError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(CaptureError::Missing(path));
        }
        tracing::info!(path = %path.display(), "screenshot saved");
        Ok(path)
    }
}
