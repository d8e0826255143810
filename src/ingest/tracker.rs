// src/ingest/tracker.rs
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunKind {
    LocalScrape,
    RemoteModelScrape,
    RemoteHeuristicScrape,
    AutoPublish,
    Notification,
}

impl RunKind {
    pub const ALL: [RunKind; 5] = [
        RunKind::LocalScrape,
        RunKind::RemoteModelScrape,
        RunKind::RemoteHeuristicScrape,
        RunKind::AutoPublish,
        RunKind::Notification,
    ];
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    #[default]
    Idle,
    Running,
    Success,
    Error,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStatus {
    pub state: RunState,
    pub message: Option<String>,
    pub jobs_created: Option<usize>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// Last known state of each run kind, shared by the HTTP handlers
#[derive(Debug, Default)]
pub struct RunTracker {
    runs: Mutex<BTreeMap<RunKind, RunStatus>>,
}

impl RunTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&self, kind: RunKind) {
        info!("Run {:?} started", kind);
        self.lock().insert(
            kind,
            RunStatus {
                state: RunState::Running,
                started_at: Some(Utc::now()),
                ..Default::default()
            },
        );
    }

    pub fn succeed(&self, kind: RunKind, jobs_created: usize, message: impl Into<String>) {
        let message = message.into();
        info!("Run {:?} succeeded: {}", kind, message);
        let mut runs = self.lock();
        let status = runs.entry(kind).or_default();
        status.state = RunState::Success;
        status.jobs_created = Some(jobs_created);
        status.message = Some(message);
        status.finished_at = Some(Utc::now());
    }

    pub fn fail(&self, kind: RunKind, message: impl Into<String>) {
        let message = message.into();
        error!("Run {:?} failed: {}", kind, message);
        let mut runs = self.lock();
        let status = runs.entry(kind).or_default();
        status.state = RunState::Error;
        status.jobs_created = None;
        status.message = Some(message);
        status.finished_at = Some(Utc::now());
    }

    pub fn status(&self, kind: RunKind) -> RunStatus {
        self.lock().get(&kind).cloned().unwrap_or_default()
    }

    /// Every kind, including those never run
    pub fn snapshot(&self) -> BTreeMap<RunKind, RunStatus> {
        let runs = self.lock();
        RunKind::ALL
            .iter()
            .map(|kind| (*kind, runs.get(kind).cloned().unwrap_or_default()))
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<RunKind, RunStatus>> {
        // The map holds plain values; a panic elsewhere cannot leave it half-written
        self.runs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_transitions() {
        let tracker = RunTracker::new();
        assert_eq!(tracker.status(RunKind::AutoPublish).state, RunState::Idle);

        tracker.start(RunKind::AutoPublish);
        assert_eq!(tracker.status(RunKind::AutoPublish).state, RunState::Running);

        tracker.succeed(RunKind::AutoPublish, 15, "15 jobs published");
        let status = tracker.status(RunKind::AutoPublish);
        assert_eq!(status.state, RunState::Success);
        assert_eq!(status.jobs_created, Some(15));
        assert!(status.finished_at.is_some());

        tracker.start(RunKind::LocalScrape);
        tracker.fail(RunKind::LocalScrape, "FIRECRAWL_API_KEY is not configured");
        assert_eq!(tracker.status(RunKind::LocalScrape).state, RunState::Error);
    }

    #[test]
    fn test_snapshot_lists_every_kind() {
        let tracker = RunTracker::new();
        tracker.start(RunKind::Notification);

        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.len(), RunKind::ALL.len());
        assert_eq!(snapshot[&RunKind::Notification].state, RunState::Running);
        assert_eq!(snapshot[&RunKind::AutoPublish].state, RunState::Idle);

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["notification"]["state"], "running");
        assert_eq!(json["auto-publish"]["state"], "idle");
    }
}
