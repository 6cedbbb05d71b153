//! Cache lifecycle events, published for diagnostics.

use serde::{Deserialize, Serialize};

use core_runtime::events::{EventSeverity, Severity};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CacheEvent {
    /// The shell generation was populated.
    Installed { generation: String, assets: usize },
    /// Stale generations were removed.
    Activated { deleted: Vec<String> },
    /// A full track copy was stored by background priming.
    Primed { url: String },
    /// Neither network nor cache could answer; the placeholder was served.
    ServedOffline { url: String },
}

impl Severity for CacheEvent {
    fn severity(&self) -> EventSeverity {
        match self {
            CacheEvent::ServedOffline { .. } => EventSeverity::Warning,
            CacheEvent::Primed { .. } => EventSeverity::Debug,
            _ => EventSeverity::Info,
        }
    }
}
