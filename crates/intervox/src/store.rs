// SPDX-FileCopyrightText: 2026 Intervox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! File-backed store implementations under the configured data directory.
//!
//! Layout:
//! - `profiles/<applicant_id>.json` -- one profile document per applicant
//! - `sessions.jsonl`, `turns.jsonl`, `reports.jsonl` -- append-only record
//!   logs, one JSON object per line
//!
//! The logs are write-only from the server's point of view; session upserts
//! append the new row and replay resolves to the latest entry per id.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tokio::io::AsyncWriteExt;

use intervox_core::{
    IntervoxError, ProfileSnapshot, ProfileStore, Report, ReportStore, SessionRecord,
    SessionStore, TurnRecord,
};

pub struct FileStore {
    data_dir: PathBuf,
}

impl FileStore {
    /// Opens the store, creating the data directory layout if needed.
    pub async fn open(data_dir: impl Into<PathBuf>) -> Result<Arc<Self>, IntervoxError> {
        let data_dir = data_dir.into();
        tokio::fs::create_dir_all(data_dir.join("profiles"))
            .await
            .map_err(persistence)?;
        Ok(Arc::new(Self { data_dir }))
    }

    async fn append_line<T: Serialize>(&self, file: &str, value: &T) -> Result<(), IntervoxError> {
        let mut line = serde_json::to_string(value).map_err(persistence)?;
        line.push('\n');
        let mut f = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.data_dir.join(file))
            .await
            .map_err(persistence)?;
        f.write_all(line.as_bytes()).await.map_err(persistence)?;
        Ok(())
    }
}

fn persistence(e: impl std::error::Error + Send + Sync + 'static) -> IntervoxError {
    IntervoxError::Persistence {
        source: Box::new(e),
    }
}

/// Applicant ids come from clients; anything that would escape the profiles
/// directory is treated as an unknown applicant.
fn safe_profile_name(applicant_id: &str) -> Option<String> {
    if applicant_id.is_empty()
        || applicant_id.contains(['/', '\\'])
        || applicant_id.contains("..")
    {
        return None;
    }
    Some(format!("{applicant_id}.json"))
}

#[async_trait]
impl ProfileStore for FileStore {
    async fn load_profile(
        &self,
        applicant_id: &str,
    ) -> Result<Option<ProfileSnapshot>, IntervoxError> {
        let Some(file_name) = safe_profile_name(applicant_id) else {
            return Ok(None);
        };
        let path = self.data_dir.join("profiles").join(file_name);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(persistence(e)),
        };
        let snapshot = serde_json::from_slice(&bytes).map_err(persistence)?;
        Ok(Some(snapshot))
    }
}

#[async_trait]
impl SessionStore for FileStore {
    async fn upsert_session(&self, record: &SessionRecord) -> Result<(), IntervoxError> {
        self.append_line("sessions.jsonl", record).await
    }

    async fn append_turn(&self, record: &TurnRecord) -> Result<(), IntervoxError> {
        self.append_line("turns.jsonl", record).await
    }
}

#[async_trait]
impl ReportStore for FileStore {
    async fn insert_report(&self, report: &Report) -> Result<(), IntervoxError> {
        self.append_line("reports.jsonl", report).await
    }
}
