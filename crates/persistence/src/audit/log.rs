//! JSONL rule audit log - append-only writer
//!
//! One file per day: `data/audit/2026-01-25.jsonl`.

use crate::error::{PersistenceError, PersistenceResult};
use chrono::Utc;
use prereq_core::RuleEvent;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

/// Append-only log of rule mutations
pub struct RuleAuditLog {
    base_path: PathBuf,
    event_counter: AtomicU64,
    current_writer: Mutex<Option<DayWriter>>,
}

struct DayWriter {
    date: String,
    writer: BufWriter<File>,
}

impl RuleAuditLog {
    /// Open (or create) the audit directory and resume the event counter
    pub fn open<P: AsRef<Path>>(base_path: P) -> PersistenceResult<Self> {
        let base_path = base_path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path)?;

        let event_counter = Self::load_event_counter(&base_path);

        Ok(Self {
            base_path,
            event_counter: AtomicU64::new(event_counter),
            current_writer: Mutex::new(None),
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Highest `EVT_nnnnnn` already on disk, plus one
    fn load_event_counter(base_path: &Path) -> u64 {
        let mut max_id: u64 = 0;

        let Ok(entries) = fs::read_dir(base_path) else {
            return 1;
        };

        for path in entries.flatten().map(|e| e.path()) {
            if !is_jsonl(&path) {
                continue;
            }
            let Ok(content) = fs::read_to_string(&path) else {
                continue;
            };
            for line in content.lines() {
                let Ok(event) = serde_json::from_str::<RuleEvent>(line) else {
                    continue;
                };
                if let Some(num) = event
                    .event_id
                    .strip_prefix("EVT_")
                    .and_then(|n| n.parse::<u64>().ok())
                {
                    max_id = max_id.max(num);
                }
            }
        }

        max_id + 1
    }

    fn file_path(&self, date: &str) -> PathBuf {
        self.base_path.join(format!("{}.jsonl", date))
    }

    fn lock(&self) -> PersistenceResult<MutexGuard<'_, Option<DayWriter>>> {
        self.current_writer
            .lock()
            .map_err(|_| PersistenceError::Other("audit writer lock poisoned".to_string()))
    }

    pub fn next_event_id(&self) -> String {
        let id = self.event_counter.fetch_add(1, Ordering::SeqCst);
        format!("EVT_{:06}", id)
    }

    /// Append one event and flush it
    pub fn append(&self, event: &RuleEvent) -> PersistenceResult<()> {
        let date = event.timestamp.format("%Y-%m-%d").to_string();
        let json = serde_json::to_string(event)?;

        let mut guard = self.lock()?;

        let needs_new_file = guard.as_ref().map_or(true, |w| w.date != date);
        if needs_new_file {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(self.file_path(&date))?;
            *guard = Some(DayWriter {
                date,
                writer: BufWriter::new(file),
            });
        }

        if let Some(ref mut w) = *guard {
            writeln!(w.writer, "{}", json)?;
            w.writer.flush()?;
        }

        tracing::debug!(
            event_id = %event.event_id,
            event_type = %event.event_type,
            rule_id = %event.rule_id(),
            "rule event appended"
        );
        Ok(())
    }

    /// All audit files, oldest first
    pub fn list_files(&self) -> PersistenceResult<Vec<PathBuf>> {
        let mut files: Vec<PathBuf> = fs::read_dir(&self.base_path)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| is_jsonl(p))
            .collect();
        files.sort();
        Ok(files)
    }

    pub fn today_file(&self) -> PathBuf {
        self.file_path(&Utc::now().format("%Y-%m-%d").to_string())
    }

    pub fn flush(&self) -> PersistenceResult<()> {
        let mut guard = self.lock()?;
        if let Some(ref mut w) = *guard {
            w.writer.flush()?;
        }
        Ok(())
    }
}

impl Drop for RuleAuditLog {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

pub(crate) fn is_jsonl(path: &Path) -> bool {
    path.extension().map_or(false, |ext| ext == "jsonl")
}
