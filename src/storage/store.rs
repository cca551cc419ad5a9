use std::{
    future::Future,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::Result;
use chrono::{DateTime, Utc};
use fs4::tokio::AsyncFileExt;
use serde::{de::DeserializeOwned, Serialize};
use tokio::{
    fs::File,
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
};
use tracing::{debug, warn};

use super::entities::{DelayEntity, PerformanceRecordEntity, TaskEntity};

const TASKS_FILE: &str = "tasks.jsonl";
const RECORDS_FILE: &str = "records.jsonl";
const DELAYS_FILE: &str = "delays.jsonl";

/// Interface for abstracting storage of tasks, records and delays. The
/// aggregation functions never see this: callers load a snapshot and pass it on.
pub trait TrackerStore {
    fn load_tasks(&self) -> impl Future<Output = Result<Vec<TaskEntity>>> + Send;

    fn load_records(&self) -> impl Future<Output = Result<Vec<PerformanceRecordEntity>>> + Send;

    fn load_delays(&self) -> impl Future<Output = Result<Vec<DelayEntity>>> + Send;

    fn append_task(&self, task: &TaskEntity) -> impl Future<Output = Result<()>> + Send;

    fn append_record(
        &self,
        record: &PerformanceRecordEntity,
    ) -> impl Future<Output = Result<()>> + Send;

    fn append_delay(&self, delay: &DelayEntity) -> impl Future<Output = Result<()>> + Send;

    /// Rewrites the whole record file. Records are immutable, so the only caller
    /// is the dedup utility.
    fn replace_records(
        &self,
        records: &[PerformanceRecordEntity],
    ) -> impl Future<Output = Result<()>> + Send;
}

/// The main realization of [TrackerStore]. Every entity kind lives in its own
/// file with one JSON object per line.
pub struct JsonStore {
    store_dir: PathBuf,
}

impl JsonStore {
    pub fn new(store_dir: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&store_dir)?;

        Ok(Self { store_dir })
    }

    fn path_for(&self, file_name: &str) -> PathBuf {
        self.store_dir.join(file_name)
    }
}

impl TrackerStore for JsonStore {
    async fn load_tasks(&self) -> Result<Vec<TaskEntity>> {
        read_lines(&self.path_for(TASKS_FILE)).await
    }

    async fn load_records(&self) -> Result<Vec<PerformanceRecordEntity>> {
        read_lines(&self.path_for(RECORDS_FILE)).await
    }

    async fn load_delays(&self) -> Result<Vec<DelayEntity>> {
        read_lines(&self.path_for(DELAYS_FILE)).await
    }

    async fn append_task(&self, task: &TaskEntity) -> Result<()> {
        append_line(&self.path_for(TASKS_FILE), task).await
    }

    async fn append_record(&self, record: &PerformanceRecordEntity) -> Result<()> {
        append_line(&self.path_for(RECORDS_FILE), record).await
    }

    async fn append_delay(&self, delay: &DelayEntity) -> Result<()> {
        append_line(&self.path_for(DELAYS_FILE), delay).await
    }

    async fn replace_records(&self, records: &[PerformanceRecordEntity]) -> Result<()> {
        let path = self.path_for(RECORDS_FILE);
        let temp_path = self.path_for("records.jsonl.tmp");

        let mut buffer = Vec::<u8>::new();
        for record in records {
            serde_json::to_writer(&mut buffer, record)?;
            buffer.push(b'\n');
        }

        let mut file = File::create(&temp_path).await?;
        file.write_all(&buffer).await?;
        file.flush().await?;
        drop(file);

        // Rename keeps the swap atomic so a crash never leaves a half-written file.
        tokio::fs::rename(&temp_path, &path).await?;
        Ok(())
    }
}

/// Reuses the stored task matching the (name, target) pair exactly, creating a
/// new one only when no such task exists. This keeps task creation lazy: a task
/// row appears on first record insertion.
pub async fn find_or_create_task(
    store: &impl TrackerStore,
    tasks: &[TaskEntity],
    name: &str,
    target_minutes: f64,
    created_at: DateTime<Utc>,
) -> Result<TaskEntity> {
    if let Some(task) = tasks
        .iter()
        .find(|t| &*t.name == name && t.target_minutes == target_minutes)
    {
        return Ok(task.clone());
    }

    let task = TaskEntity {
        id: tasks.iter().map(|t| t.id).max().unwrap_or(0) + 1,
        name: name.into(),
        target_minutes,
        created_at,
    };
    store.append_task(&task).await?;
    Ok(task)
}

async fn read_lines<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    async fn extract<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, std::io::Error> {
        debug!("Extracting {path:?}");
        let file = File::open(path).await?;
        file.lock_shared()?;
        let buffer = BufReader::new(file);
        let mut lines = buffer.lines();
        let mut entities = vec![];
        while let Ok(Some(v)) = lines.next_line().await {
            match serde_json::from_str::<T>(&v) {
                Ok(v) => entities.push(v),
                Err(e) => {
                    // ignore illegal values. Might happen after shutdowns
                    warn!(
                        "During parsing in path {:?} found illegal json string {}:  {e}",
                        path, &v
                    )
                }
            }
        }

        lines.into_inner().into_inner().unlock_async().await?;

        Ok(entities)
    }

    match extract(path).await {
        Ok(s) => Ok(s),
        Err(e) => {
            if e.kind() == ErrorKind::NotFound {
                Ok(vec![])
            } else {
                Err(e)?
            }
        }
    }
}

async fn append_line<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut file = File::options()
        .append(true)
        .create(true)
        .open(path)
        .await?;

    // Semi-safe acquire-release for a file
    file.lock_exclusive()?;
    let result = append_with_file(&mut file, value).await;
    file.unlock_async().await?;
    result
}

async fn append_with_file<T: Serialize>(file: &mut File, value: &T) -> Result<()> {
    let mut buffer = serde_json::to_vec(value)?;
    buffer.push(b'\n');

    file.write_all(&buffer).await?;
    file.flush().await?;
    Ok(())
}
