//! Call store.
//!
//! The trend aggregator reads its window through [`CallWindowReader`].
//! [`JsonFileStore`] implements it over a single JSON file and also
//! persists notes and analyses for the CLI.

use crate::models::{Analysis, AnalyzedCall};
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Supplies the most recent calls, newest first.
pub trait CallWindowReader {
    /// Up to `limit` calls ordered by creation time, newest first.
    fn recent_window(&self, limit: usize) -> Result<Vec<AnalyzedCall>>;
}

/// A stored call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallRecord {
    pub id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    /// Display name of the assigned representative.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub representative: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<CallNote>,
}

/// The notes captured for a call and their latest analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallNote {
    pub raw_text: String,
    /// Stored as written; read through [`CallNote::analysis`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_output: Option<Value>,
    pub updated_at: DateTime<Utc>,
}

impl CallNote {
    /// The stored analysis, if it satisfies the analysis contract.
    pub fn analysis(&self) -> Option<Analysis> {
        let value = self.ai_output.as_ref()?;
        match serde_json::from_value(value.clone()) {
            Ok(analysis) => Some(analysis),
            Err(e) => {
                debug!("Ignoring stored analysis that does not validate: {}", e);
                None
            }
        }
    }
}

impl CallRecord {
    /// Project the record into the aggregator's view.
    pub fn to_analyzed_call(&self) -> AnalyzedCall {
        AnalyzedCall {
            id: self.id.clone(),
            created_at: self.created_at,
            representative_name: self.representative.clone(),
            analysis: self.note.as_ref().and_then(CallNote::analysis),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default)]
    calls: Vec<CallRecord>,
}

/// Call store backed by one JSON file.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    data: StoreFile,
}

impl JsonFileStore {
    /// Open the store at `path`. A missing file is an empty store.
    pub fn open(path: &Path) -> Result<Self> {
        let data = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read call store: {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse call store: {}", path.display()))?
        } else {
            debug!("No call store at {}, starting empty", path.display());
            StoreFile::default()
        };

        info!("Loaded {} calls from {}", data.calls.len(), path.display());

        Ok(Self {
            path: path.to_path_buf(),
            data,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All stored calls, in file order.
    pub fn calls(&self) -> &[CallRecord] {
        &self.data.calls
    }

    /// Look up a call by id.
    pub fn call(&self, id: &str) -> Option<&CallRecord> {
        self.data.calls.iter().find(|c| c.id == id)
    }

    fn call_mut(&mut self, id: &str) -> Result<&mut CallRecord> {
        match self.data.calls.iter_mut().find(|c| c.id == id) {
            Some(call) => Ok(call),
            None => bail!("Call not found: {}", id),
        }
    }

    /// Add a new call with no notes.
    pub fn create_call(
        &mut self,
        id: &str,
        title: &str,
        representative: Option<&str>,
        created_at: DateTime<Utc>,
    ) -> Result<&CallRecord> {
        if self.call(id).is_some() {
            bail!("Call already exists: {}", id);
        }

        self.data.calls.push(CallRecord {
            id: id.to_string(),
            title: title.to_string(),
            created_at,
            representative: representative.map(String::from),
            note: None,
        });
        info!("Created call {}", id);

        self.call_mut(id).map(|call| &*call)
    }

    /// Assign (or clear) the representative of a call.
    pub fn assign_representative(&mut self, id: &str, representative: Option<&str>) -> Result<()> {
        let call = self.call_mut(id)?;
        call.representative = representative
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(String::from);
        Ok(())
    }

    /// Replace the call's note wholesale with new text and a fresh analysis.
    ///
    /// Returns `false` when a newer note is already stored.
    pub fn record_analysis(
        &mut self,
        id: &str,
        raw_text: &str,
        analysis: &Analysis,
        updated_at: DateTime<Utc>,
    ) -> Result<bool> {
        let ai_output = serde_json::to_value(analysis).context("Failed to serialize analysis")?;
        self.write_note(id, updated_at, |_| CallNote {
            raw_text: raw_text.to_string(),
            ai_output: Some(ai_output),
            updated_at,
        })
    }

    /// Save the call's raw text, keeping whatever analysis is stored.
    ///
    /// Returns `false` when a newer note is already stored.
    pub fn save_raw_text(
        &mut self,
        id: &str,
        raw_text: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<bool> {
        self.write_note(id, updated_at, |previous| CallNote {
            raw_text: raw_text.to_string(),
            ai_output: previous.and_then(|note| note.ai_output),
            updated_at,
        })
    }

    /// Last write wins: a write older than the stored note is dropped.
    fn write_note(
        &mut self,
        id: &str,
        updated_at: DateTime<Utc>,
        build: impl FnOnce(Option<CallNote>) -> CallNote,
    ) -> Result<bool> {
        let call = self.call_mut(id)?;

        if let Some(ref existing) = call.note {
            if existing.updated_at > updated_at {
                warn!(
                    "Skipping stale write to call {} ({} is older than stored {})",
                    id, updated_at, existing.updated_at
                );
                return Ok(false);
            }
        }

        call.note = Some(build(call.note.take()));
        debug!("Updated note for call {}", id);
        Ok(true)
    }

    /// Write the store back to disk.
    pub fn save(&self) -> Result<()> {
        let content =
            serde_json::to_string_pretty(&self.data).context("Failed to serialize call store")?;

        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, content)
            .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
        std::fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;

        info!("Saved {} calls to {}", self.data.calls.len(), self.path.display());
        Ok(())
    }
}

impl CallWindowReader for JsonFileStore {
    fn recent_window(&self, limit: usize) -> Result<Vec<AnalyzedCall>> {
        let mut calls: Vec<&CallRecord> = self.data.calls.iter().collect();
        calls.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        calls.truncate(limit);

        Ok(calls.into_iter().map(CallRecord::to_analyzed_call).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CallGrade;
    use chrono::{Duration, TimeZone};
    use tempfile::TempDir;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 9, 30, hour, 0, 0).unwrap()
    }

    fn sample_analysis(grade: CallGrade) -> Analysis {
        let mut analysis = Analysis::new("Pilot agreed. Budget pending.", grade);
        analysis.objections.push("Too expensive".to_string());
        analysis
    }

    #[test]
    fn test_missing_file_is_empty_store() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::open(&dir.path().join("calls.json")).unwrap();
        assert!(store.calls().is_empty());
        assert!(store.recent_window(10).unwrap().is_empty());
    }

    #[test]
    fn test_analysis_round_trips_through_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("calls.json");
        let analysis = sample_analysis(CallGrade::NeedsImprovement);

        let mut store = JsonFileStore::open(&path).unwrap();
        store.create_call("c1", "Acme intro", Some("Jess"), at(9)).unwrap();
        assert!(store.record_analysis("c1", "notes", &analysis, at(10)).unwrap());
        store.save().unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"Needs Improvement\""));

        let reopened = JsonFileStore::open(&path).unwrap();
        let window = reopened.recent_window(10).unwrap();
        assert_eq!(window.len(), 1);
        assert_eq!(window[0].representative_name.as_deref(), Some("Jess"));
        assert_eq!(window[0].analysis.as_ref(), Some(&analysis));
    }

    #[test]
    fn test_window_is_newest_first_and_limited() {
        let dir = TempDir::new().unwrap();
        let mut store = JsonFileStore::open(&dir.path().join("calls.json")).unwrap();
        for (id, hour) in [("old", 1), ("newest", 5), ("middle", 3)] {
            store.create_call(id, id, None, at(hour)).unwrap();
        }

        let window = store.recent_window(2).unwrap();
        let ids: Vec<&str> = window.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["newest", "middle"]);
    }

    #[test]
    fn test_stale_write_is_ignored() {
        let dir = TempDir::new().unwrap();
        let mut store = JsonFileStore::open(&dir.path().join("calls.json")).unwrap();
        store.create_call("c1", "Call", None, at(8)).unwrap();

        let newer = sample_analysis(CallGrade::Strong);
        assert!(store.record_analysis("c1", "explicit save", &newer, at(10)).unwrap());
        assert!(!store.save_raw_text("c1", "autosave", at(10) - Duration::seconds(1)).unwrap());

        let note = store.call("c1").unwrap().note.as_ref().unwrap();
        assert_eq!(note.raw_text, "explicit save");
        assert_eq!(note.analysis(), Some(newer));
    }

    #[test]
    fn test_raw_text_save_keeps_analysis_and_reanalysis_replaces_it() {
        let dir = TempDir::new().unwrap();
        let mut store = JsonFileStore::open(&dir.path().join("calls.json")).unwrap();
        store.create_call("c1", "Call", None, at(8)).unwrap();

        let first = sample_analysis(CallGrade::Okay);
        store.record_analysis("c1", "v1", &first, at(9)).unwrap();
        store.save_raw_text("c1", "v2", at(10)).unwrap();
        let note = store.call("c1").unwrap().note.clone().unwrap();
        assert_eq!(note.raw_text, "v2");
        assert_eq!(note.analysis(), Some(first));

        let second = Analysis::new("Re-run.", CallGrade::Strong);
        store.record_analysis("c1", "v2", &second, at(11)).unwrap();
        let stored = store.call("c1").unwrap().note.as_ref().unwrap().analysis().unwrap();
        assert_eq!(stored, second);
        assert!(stored.objections.is_empty());
    }

    #[test]
    fn test_invalid_stored_analysis_reads_as_unanalyzed_but_is_kept() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("calls.json");
        std::fs::write(
            &path,
            r#"{"calls": [{
                "id": "c1", "title": "Legacy", "created_at": "2026-09-30T08:00:00Z",
                "note": {"raw_text": "x", "updated_at": "2026-09-30T08:00:00Z",
                         "ai_output": {"summary": "s", "call_grade": "Great"}}
            }]}"#,
        )
        .unwrap();

        let store = JsonFileStore::open(&path).unwrap();
        let window = store.recent_window(10).unwrap();
        assert!(!window[0].is_analyzed());

        store.save().unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("Great"));
    }

    #[test]
    fn test_unknown_call_and_duplicate_ids_are_errors() {
        let dir = TempDir::new().unwrap();
        let mut store = JsonFileStore::open(&dir.path().join("calls.json")).unwrap();
        assert!(store.save_raw_text("missing", "x", at(1)).is_err());

        store.create_call("c1", "Call", None, at(1)).unwrap();
        assert!(store.create_call("c1", "Again", None, at(2)).is_err());
    }

    #[test]
    fn test_assign_representative() {
        let dir = TempDir::new().unwrap();
        let mut store = JsonFileStore::open(&dir.path().join("calls.json")).unwrap();
        store.create_call("c1", "Call", None, at(1)).unwrap();

        store.assign_representative("c1", Some(" Sam ")).unwrap();
        assert_eq!(store.call("c1").unwrap().representative.as_deref(), Some("Sam"));

        store.assign_representative("c1", Some("")).unwrap();
        assert!(store.call("c1").unwrap().representative.is_none());
    }
}
