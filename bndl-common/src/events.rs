// bndl-common/src/events.rs
use std::fmt;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

/// How a front end should present an [`InstallEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventLevel {
    Warn,
    Info,
    Confirm,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum SkipReason {
    /// The owning source only provides metadata.
    NotInstallable { source: String },
    /// The spec belongs to at least one group the caller excluded.
    ExcludedGroups { groups: Vec<String> },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum InstallEvent {
    NoDependencies,
    IndexFetchStarted {
        source: String,
    },
    IndexFetchFinished {
        source: String,
        spec_count: usize,
    },
    ResolutionStarted,
    ResolutionFinished {
        spec_count: usize,
    },
    InstallStarted {
        name: String,
        version: String,
        source: String,
    },
    InstallSkipped {
        name: String,
        version: String,
        reason: SkipReason,
    },
    InstallFinished {
        installed: usize,
        skipped: usize,
    },
}

impl InstallEvent {
    pub fn level(&self) -> EventLevel {
        match self {
            Self::NoDependencies => EventLevel::Warn,
            Self::InstallFinished { .. } => EventLevel::Confirm,
            _ => EventLevel::Info,
        }
    }
}

impl fmt::Display for InstallEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoDependencies => write!(f, "The manifest specifies no dependencies"),
            Self::IndexFetchStarted { source } => write!(f, "Fetching index from {source}..."),
            Self::IndexFetchFinished { source, spec_count } => {
                write!(f, "Processed {spec_count} specs from {source}")
            }
            Self::ResolutionStarted => write!(f, "Resolving dependencies..."),
            Self::ResolutionFinished { spec_count } => {
                write!(f, "Resolved {spec_count} packages")
            }
            Self::InstallStarted {
                name,
                version,
                source,
            } => write!(f, "Installing {name} {version} from {source}"),
            Self::InstallSkipped {
                name,
                version,
                reason,
            } => match reason {
                SkipReason::NotInstallable { source } => {
                    write!(f, "Using {name} {version} ({source})")
                }
                SkipReason::ExcludedGroups { groups } => write!(
                    f,
                    "Skipping {name} {version} (excluded groups: {})",
                    groups.join(", ")
                ),
            },
            Self::InstallFinished { installed, skipped } => write!(
                f,
                "Your bundle is complete! {installed} installed, {skipped} skipped."
            ),
        }
    }
}

/// Receives fire-and-forget progress notifications from the installer.
pub trait Notifier {
    fn notify(&self, event: InstallEvent);
}

/// Keeps every event in order; used by front ends that render after the fact and by tests.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<InstallEvent>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<InstallEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, event: InstallEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
