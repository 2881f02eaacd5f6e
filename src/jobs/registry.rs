use std::{
    collections::HashMap,
    sync::{Mutex, PoisonError},
};

use chrono::{DateTime, Utc};

use crate::foundation::core::{PackId, SourceId};

/// Kinds of bulk reconciliation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    /// Recompose every approved artwork, optionally only those using one pack.
    ReapplyAll,
    /// Give mockups to published, approved artworks that have none.
    ApplyMissing,
    /// Recompose the published artworks whose mockups came from one pack.
    ReapplyPack,
}

impl std::str::FromStr for JobKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().replace('-', "_").as_str() {
            "reapply_all" => Ok(Self::ReapplyAll),
            "apply_missing" => Ok(Self::ApplyMissing),
            "reapply_pack" => Ok(Self::ReapplyPack),
            other => Err(format!("unknown job kind '{other}'")),
        }
    }
}

/// Identity of a job slot: one run at a time per key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
pub struct JobKey {
    pub kind: JobKind,
    pub pack_id: Option<PackId>,
}

impl JobKey {
    pub fn new(kind: JobKind, pack_id: Option<PackId>) -> Self {
        Self { kind, pack_id }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobPhase {
    #[default]
    Idle,
    Running,
    Completed,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct JobItemError {
    pub source_id: SourceId,
    pub message: String,
}

/// Progress of a job slot. Stays inspectable after completion until the next run.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct JobSnapshot {
    #[serde(flatten)]
    pub key: JobKey,
    pub phase: JobPhase,
    pub running: bool,
    pub total: usize,
    pub done: usize,
    pub ok: usize,
    pub errors: Vec<JobItemError>,
    /// Another run over a freshly computed item set follows this one.
    pub rerun_queued: bool,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl JobSnapshot {
    fn idle(key: JobKey) -> Self {
        Self {
            key,
            phase: JobPhase::Idle,
            running: false,
            total: 0,
            done: 0,
            ok: 0,
            errors: Vec::new(),
            rerun_queued: false,
            started_at: None,
            finished_at: None,
        }
    }

    fn running(key: JobKey, total: usize) -> Self {
        Self {
            phase: JobPhase::Running,
            running: true,
            total,
            started_at: Some(Utc::now()),
            ..Self::idle(key)
        }
    }
}

/// Result of asking a slot to start.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "outcome", content = "job", rename_all = "snake_case")]
pub enum JobStart {
    Started(JobSnapshot),
    AlreadyRunning(JobSnapshot),
}

impl JobStart {
    pub fn snapshot(&self) -> &JobSnapshot {
        match self {
            Self::Started(s) | Self::AlreadyRunning(s) => s,
        }
    }

    pub fn started(&self) -> bool {
        matches!(self, Self::Started(_))
    }
}

/// Progress store for background jobs, one slot per [`JobKey`].
#[derive(Debug, Default)]
pub struct JobRegistry {
    slots: Mutex<HashMap<JobKey, JobSnapshot>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self) -> std::sync::MutexGuard<'_, HashMap<JobKey, JobSnapshot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claim `key` for a run over `total` items, unless a run already holds it.
    pub fn try_start(&self, key: JobKey, total: usize) -> JobStart {
        let mut slots = self.slots();
        if let Some(current) = slots.get(&key)
            && current.running
        {
            return JobStart::AlreadyRunning(current.clone());
        }
        let snapshot = JobSnapshot::running(key, total);
        slots.insert(key, snapshot.clone());
        JobStart::Started(snapshot)
    }

    /// Like [`JobRegistry::try_start`], but a busy slot queues one more run instead
    /// of refusing. Repeated requests while busy collapse into that single rerun.
    pub fn start_or_queue(&self, key: JobKey, total: usize) -> JobStart {
        let mut slots = self.slots();
        if let Some(current) = slots.get_mut(&key)
            && current.running
        {
            current.rerun_queued = true;
            return JobStart::AlreadyRunning(current.clone());
        }
        let snapshot = JobSnapshot::running(key, total);
        slots.insert(key, snapshot.clone());
        JobStart::Started(snapshot)
    }

    /// End the current run. With a rerun queued the slot instead restarts with fresh
    /// counters and `true` is returned; the caller then reports the new total.
    pub fn finish_or_rerun(&self, key: JobKey) -> bool {
        let mut slots = self.slots();
        let Some(slot) = slots.get_mut(&key) else {
            return false;
        };
        if slot.running && slot.rerun_queued {
            *slot = JobSnapshot::running(key, 0);
            return true;
        }
        slot.running = false;
        slot.phase = JobPhase::Completed;
        slot.finished_at = Some(Utc::now());
        false
    }

    pub fn set_total(&self, key: JobKey, total: usize) {
        if let Some(slot) = self.slots().get_mut(&key) {
            slot.total = total;
        }
    }

    /// Count one processed item.
    pub fn record(&self, key: JobKey, source_id: SourceId, result: Result<(), String>) {
        let mut slots = self.slots();
        let Some(slot) = slots.get_mut(&key) else {
            return;
        };
        slot.done += 1;
        match result {
            Ok(()) => slot.ok += 1,
            Err(message) => slot.errors.push(JobItemError { source_id, message }),
        }
    }

    pub fn finish(&self, key: JobKey) {
        if let Some(slot) = self.slots().get_mut(&key) {
            slot.running = false;
            slot.phase = JobPhase::Completed;
            slot.finished_at = Some(Utc::now());
        }
    }

    pub fn snapshot(&self, key: JobKey) -> JobSnapshot {
        self.slots()
            .get(&key)
            .cloned()
            .unwrap_or_else(|| JobSnapshot::idle(key))
    }

    /// Every slot that has ever run.
    pub fn snapshots(&self) -> Vec<JobSnapshot> {
        self.slots().values().cloned().collect()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/jobs/registry.rs"]
mod tests;
