//! Audit reader - read rule events back from JSONL files

use crate::audit::log::is_jsonl;
use crate::error::{PersistenceError, PersistenceResult};
use chrono::NaiveDate;
use prereq_core::{RuleEvent, RuleEventType};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

pub struct AuditReader {
    base_path: PathBuf,
}

impl AuditReader {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    pub fn read_file(&self, file_path: &Path) -> PersistenceResult<Vec<RuleEvent>> {
        let reader = BufReader::new(File::open(file_path)?);
        let mut events = Vec::new();

        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            events.push(serde_json::from_str(&line)?);
        }

        Ok(events)
    }

    /// Events of one day (`YYYY-MM-DD`); empty when no file exists
    pub fn read_date(&self, date: &str) -> PersistenceResult<Vec<RuleEvent>> {
        NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|e| PersistenceError::Other(format!("Invalid date {}: {}", date, e)))?;

        let path = self.base_path.join(format!("{}.jsonl", date));
        if path.exists() {
            self.read_file(&path)
        } else {
            Ok(Vec::new())
        }
    }

    pub fn read_all(&self) -> PersistenceResult<Vec<RuleEvent>> {
        if !self.base_path.exists() {
            return Ok(Vec::new());
        }

        let mut files: Vec<PathBuf> = std::fs::read_dir(&self.base_path)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| is_jsonl(p))
            .collect();
        files.sort();

        let mut all_events = Vec::new();
        for path in files {
            all_events.extend(self.read_file(&path)?);
        }
        Ok(all_events)
    }

    pub fn read_filtered(&self, filter: &AuditFilter) -> PersistenceResult<Vec<RuleEvent>> {
        Ok(self
            .read_all()?
            .into_iter()
            .filter(|e| filter.matches(e))
            .collect())
    }
}

/// Filter over rule events
#[derive(Debug, Default, Clone)]
pub struct AuditFilter {
    pub rule_id: Option<String>,
    pub actor_id: Option<String>,
    pub event_types: Option<Vec<RuleEventType>>,
    /// Only events for rules scoped to this client
    pub client_id: Option<String>,
}

impl AuditFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rule(mut self, rule_id: &str) -> Self {
        self.rule_id = Some(rule_id.to_string());
        self
    }

    pub fn actor(mut self, actor_id: &str) -> Self {
        self.actor_id = Some(actor_id.to_string());
        self
    }

    pub fn event_types(mut self, types: Vec<RuleEventType>) -> Self {
        self.event_types = Some(types);
        self
    }

    pub fn client(mut self, client_id: &str) -> Self {
        self.client_id = Some(client_id.to_string());
        self
    }

    pub fn matches(&self, event: &RuleEvent) -> bool {
        if let Some(ref rule_id) = self.rule_id {
            if event.rule_id() != rule_id {
                return false;
            }
        }

        if let Some(ref actor_id) = self.actor_id {
            if event.actor_id != *actor_id {
                return false;
            }
        }

        if let Some(ref types) = self.event_types {
            if !types.contains(&event.event_type) {
                return false;
            }
        }

        if let Some(ref client_id) = self.client_id {
            if event.rule.scope.client_id() != Some(client_id.as_str()) {
                return false;
            }
        }

        true
    }
}
