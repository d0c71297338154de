//! DeployItem - one node of the deployment tree

use serde_json::Value;

use crate::changeset::{Action, FieldChange};
use crate::event::{
    InstanceDurations, InstanceStatus, LinkDurations, LinkStatus, PreciseLinkStatus,
    PreciseResourceStatus, ResourceDurations, ResourceStatus, StatusClass,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ItemKind {
    Resource,
    Child,
    Link,
}

impl ItemKind {
    pub fn label(&self) -> &'static str {
        match self {
            ItemKind::Resource => "resource",
            ItemKind::Child => "child",
            ItemKind::Link => "link",
        }
    }

    /// Sort rank within a level: resources, then children, then links
    pub fn rank(&self) -> u8 {
        match self {
            ItemKind::Resource => 0,
            ItemKind::Child => 1,
            ItemKind::Link => 2,
        }
    }
}

/// Kind-specific status carried by an item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemStatus {
    Resource {
        status: ResourceStatus,
        precise: PreciseResourceStatus,
    },
    Child {
        status: InstanceStatus,
    },
    Link {
        status: LinkStatus,
        precise: PreciseLinkStatus,
    },
}

impl ItemStatus {
    pub fn initial(kind: ItemKind) -> Self {
        match kind {
            ItemKind::Resource => ItemStatus::Resource {
                status: ResourceStatus::default(),
                precise: PreciseResourceStatus::default(),
            },
            ItemKind::Child => ItemStatus::Child {
                status: InstanceStatus::default(),
            },
            ItemKind::Link => ItemStatus::Link {
                status: LinkStatus::default(),
                precise: PreciseLinkStatus::default(),
            },
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ItemStatus::Resource { status, .. } => status.label(),
            ItemStatus::Child { status } => status.label(),
            ItemStatus::Link { status, .. } => status.label(),
        }
    }

    /// Finer-grained label when the engine reports one that differs
    pub fn precise_label(&self) -> Option<&'static str> {
        match self {
            ItemStatus::Resource { status, precise } => {
                let label = precise.label();
                (*precise != PreciseResourceStatus::Unknown && label != status.label())
                    .then_some(label)
            }
            ItemStatus::Link { precise, .. } => {
                (*precise != PreciseLinkStatus::Unknown).then(|| precise.label())
            }
            ItemStatus::Child { .. } => None,
        }
    }

    pub fn class(&self) -> StatusClass {
        match self {
            ItemStatus::Resource { status, .. } => status.class(),
            ItemStatus::Child { status } => status.class(),
            ItemStatus::Link { status, .. } => status.class(),
        }
    }

    /// Swap an in-flight status for its interrupted counterpart
    pub fn interrupt(&mut self) -> bool {
        match self {
            ItemStatus::Resource { status, .. } => status
                .interrupted()
                .map(|s| *status = s)
                .is_some(),
            ItemStatus::Child { status } => status.interrupted().map(|s| *status = s).is_some(),
            ItemStatus::Link { status, .. } => status.interrupted().map(|s| *status = s).is_some(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ItemDurations {
    Resource(ResourceDurations),
    Child(InstanceDurations),
    Link(LinkDurations),
}

impl ItemDurations {
    pub fn total_ms(&self) -> Option<f64> {
        match self {
            ItemDurations::Resource(d) => d.total_ms,
            ItemDurations::Child(d) => d.total_ms,
            ItemDurations::Link(d) => d.total_ms,
        }
    }
}

/// A resource, child blueprint or link in the deployment
#[derive(Debug, Clone)]
pub struct DeployItem {
    pub kind: ItemKind,
    pub name: String,
    /// Full path (`child/child/name`)
    pub path: String,
    /// Child path of the blueprint that owns this item (`""` for root)
    pub parent: String,
    pub action: Action,
    /// Planned by the changeset rather than discovered from the stream
    pub from_changeset: bool,
    pub status: ItemStatus,
    /// Resource ID, child instance ID or link ID once known
    pub element_id: Option<String>,
    pub resource_type: Option<String>,
    pub group: Option<usize>,
    pub failure_reasons: Vec<String>,
    pub attempt: u32,
    pub can_retry: bool,
    pub durations: Option<ItemDurations>,
    /// Unix timestamp of the latest event applied to the item
    pub last_update: Option<i64>,
    /// At least one event was applied, with or without a timestamp
    pub seen: bool,
    /// The deployment finished without touching this item
    pub skipped: bool,
    /// The deployment finished while this item was in flight
    pub interrupted: bool,
    pub modified_fields: Vec<FieldChange>,
    pub new_fields: Vec<FieldChange>,
    pub removed_fields: Vec<String>,
    /// Resolved spec from the instance state (resources only)
    pub spec_data: Option<Value>,
}

impl DeployItem {
    pub fn new(kind: ItemKind, parent: &str, name: &str, action: Action) -> Self {
        Self {
            kind,
            name: name.to_string(),
            path: join_path(parent, name),
            parent: parent.to_string(),
            action,
            from_changeset: false,
            status: ItemStatus::initial(kind),
            element_id: None,
            resource_type: None,
            group: None,
            failure_reasons: Vec::new(),
            attempt: 1,
            can_retry: false,
            durations: None,
            last_update: None,
            seen: false,
            skipped: false,
            interrupted: false,
            modified_fields: Vec::new(),
            new_fields: Vec::new(),
            removed_fields: Vec::new(),
            spec_data: None,
        }
    }

    /// Status class; an interrupted item is terminal even when its status
    /// has no interrupted variant (rolling back, for example)
    pub fn class(&self) -> StatusClass {
        if self.interrupted {
            StatusClass::Interrupted
        } else {
            self.status.class()
        }
    }

    pub fn status_label(&self) -> &'static str {
        if self.skipped {
            "skipped"
        } else if self.interrupted && self.status.class() != StatusClass::Interrupted {
            "interrupted"
        } else if !self.action.is_actionable() && !self.seen {
            "no change"
        } else {
            self.status.label()
        }
    }

    /// Nothing has been reported for this item yet
    pub fn is_waiting(&self) -> bool {
        !self.seen && !self.skipped && self.action.is_actionable()
    }

    /// Item counts toward deployment progress
    pub fn is_actionable(&self) -> bool {
        self.action.is_actionable()
    }

    pub fn is_done(&self) -> bool {
        self.skipped || self.class().is_terminal()
    }

    /// `(resourceA, resourceB)` for links
    pub fn link_endpoints(&self) -> Option<(&str, &str)> {
        match self.kind {
            ItemKind::Link => self.name.split_once("::"),
            _ => None,
        }
    }

    pub fn total_duration_ms(&self) -> Option<f64> {
        self.durations.as_ref().and_then(|d| d.total_ms())
    }

    pub fn has_field_changes(&self) -> bool {
        !self.modified_fields.is_empty()
            || !self.new_fields.is_empty()
            || !self.removed_fields.is_empty()
    }
}

/// Join a child path and an element name
pub fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", parent, name)
    }
}

/// Format a millisecond duration for display (`850ms`, `3.2s`, `2m05s`)
pub fn format_duration_ms(ms: f64) -> String {
    if ms < 1000.0 {
        format!("{:.0}ms", ms)
    } else if ms < 60_000.0 {
        format!("{:.1}s", ms / 1000.0)
    } else {
        let secs = (ms / 1000.0).round() as u64;
        format!("{}m{:02}s", secs / 60, secs % 60)
    }
}
