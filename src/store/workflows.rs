//! File-backed store for pipeline results.
//!
//! Layout: `<data_dir>/workflows/workflow_{employee_id}_{YYYYmmdd_HHMMSS}.json`.
//! A second save for the same employee within the same second gets a numeric
//! suffix instead of overwriting. Names are claimed with `create_new`, so
//! concurrent saves never share a file.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Local;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::error::StoreError;
use crate::onboarding::OnboardingResult;

use super::ResultStore;

/// Writes each result to its own pretty-printed JSON file.
#[derive(Debug, Clone)]
pub struct WorkflowStore {
    root: PathBuf,
}

impl WorkflowStore {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            root: data_dir.as_ref().join("workflows"),
        }
    }

    /// Result files for `employee_id`, oldest first.
    pub async fn list(&self, employee_id: &str) -> Result<Vec<PathBuf>, StoreError> {
        let prefix = format!("workflow_{}_", sanitize_id(employee_id));
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error(&self.root, e)),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| io_error(&self.root, e))?
        {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with(&prefix) && name.ends_with(".json") {
                files.push(entry.path());
            }
        }
        files.sort();
        Ok(files)
    }

    /// Read one stored result back.
    pub async fn load(&self, path: &Path) -> Result<OnboardingResult, StoreError> {
        let bytes = tokio::fs::read(path).await.map_err(|e| io_error(path, e))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Create a new file named after `stem`, adding `_N` until a name is free.
    async fn create_unique(&self, stem: &str) -> Result<(PathBuf, File), StoreError> {
        let mut candidate = self.root.join(format!("{stem}.json"));
        let mut n = 1;
        loop {
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&candidate)
                .await
            {
                Ok(file) => return Ok((candidate, file)),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    candidate = self.root.join(format!("{stem}_{n}.json"));
                    n += 1;
                }
                Err(e) => return Err(io_error(&candidate, e)),
            }
        }
    }
}

#[async_trait]
impl ResultStore for WorkflowStore {
    async fn save(
        &self,
        result: &OnboardingResult,
        employee_id: &str,
    ) -> Result<PathBuf, StoreError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| io_error(&self.root, e))?;

        let stem = format!(
            "workflow_{}_{}",
            sanitize_id(employee_id),
            Local::now().format("%Y%m%d_%H%M%S")
        );
        let json = serde_json::to_vec_pretty(result)?;
        let (path, mut file) = self.create_unique(&stem).await?;
        file.write_all(&json)
            .await
            .map_err(|e| io_error(&path, e))?;
        file.flush().await.map_err(|e| io_error(&path, e))?;

        info!(path = %path.display(), "Saved workflow result");
        Ok(path)
    }
}

/// Keep ids filesystem-safe.
fn sanitize_id(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '-' })
        .collect()
}

fn io_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}
