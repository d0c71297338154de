//! Deploy event messages streamed by the engine
//!
//! One JSON object per event, internally tagged by `type`:
//!
//! ```json
//! {"type":"resource","instance_id":"inst-1","resource_id":"res-1",
//!  "resource_name":"ordersTable","status":"creating","precise_status":"creating",
//!  "update_timestamp":1718000000}
//! ```

use serde::{Deserialize, Serialize};

use super::status::{
    InstanceStatus, LinkStatus, PreciseLinkStatus, PreciseResourceStatus, ResourceStatus,
};

// ═══════════════════════════════════════════════════════════════
// Durations (milliseconds, as reported by the engine)
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceDurations {
    /// Time until the resource config was applied (before stabilisation)
    pub config_complete_ms: Option<f64>,
    pub total_ms: Option<f64>,
    /// One entry per attempt, including retried ones
    pub attempt_ms: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstanceDurations {
    pub prepare_ms: Option<f64>,
    pub total_ms: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkStageDurations {
    pub total_ms: Option<f64>,
    pub attempt_ms: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkDurations {
    pub resource_a_update: Option<LinkStageDurations>,
    pub resource_b_update: Option<LinkStageDurations>,
    pub intermediary_resources: Option<LinkStageDurations>,
    pub total_ms: Option<f64>,
}

// ═══════════════════════════════════════════════════════════════
// Messages
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceUpdate {
    /// Instance that owns the resource (root or a child blueprint)
    pub instance_id: String,
    #[serde(default)]
    pub resource_id: String,
    pub resource_name: String,
    /// Deployment group (batch) the engine placed the resource in
    #[serde(default)]
    pub group: usize,
    pub status: ResourceStatus,
    #[serde(default)]
    pub precise_status: PreciseResourceStatus,
    #[serde(default)]
    pub failure_reasons: Vec<String>,
    #[serde(default = "first_attempt")]
    pub attempt: u32,
    #[serde(default)]
    pub can_retry: bool,
    #[serde(default)]
    pub durations: Option<ResourceDurations>,
    #[serde(default)]
    pub update_timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildUpdate {
    pub parent_instance_id: String,
    pub child_instance_id: String,
    pub child_name: String,
    #[serde(default)]
    pub group: usize,
    pub status: InstanceStatus,
    #[serde(default)]
    pub failure_reasons: Vec<String>,
    #[serde(default)]
    pub durations: Option<InstanceDurations>,
    #[serde(default)]
    pub update_timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkUpdate {
    pub instance_id: String,
    #[serde(default)]
    pub link_id: String,
    /// `resourceA::resourceB`
    pub link_name: String,
    pub status: LinkStatus,
    #[serde(default)]
    pub precise_status: PreciseLinkStatus,
    #[serde(default)]
    pub failure_reasons: Vec<String>,
    #[serde(default = "first_attempt")]
    pub current_stage_attempt: u32,
    #[serde(default)]
    pub can_retry_current_stage: bool,
    #[serde(default)]
    pub durations: Option<LinkDurations>,
    #[serde(default)]
    pub update_timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceUpdate {
    pub instance_id: String,
    pub status: InstanceStatus,
    #[serde(default)]
    pub durations: Option<InstanceDurations>,
    #[serde(default)]
    pub update_timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentFinished {
    pub instance_id: String,
    pub status: InstanceStatus,
    #[serde(default)]
    pub failure_reasons: Vec<String>,
    #[serde(default)]
    pub finish_timestamp: i64,
    #[serde(default)]
    pub update_timestamp: i64,
    #[serde(default)]
    pub durations: Option<InstanceDurations>,
}

fn first_attempt() -> u32 {
    1
}

/// All events the deploy engine streams for a deployment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeployEvent {
    Resource(ResourceUpdate),
    Child(ChildUpdate),
    Link(LinkUpdate),
    Instance(InstanceUpdate),
    Finished(DeploymentFinished),
}

impl DeployEvent {
    /// Instance whose path the event must be resolved against.
    ///
    /// For child updates this is the parent instance.
    pub fn owner_instance_id(&self) -> &str {
        match self {
            Self::Resource(e) => &e.instance_id,
            Self::Child(e) => &e.parent_instance_id,
            Self::Link(e) => &e.instance_id,
            Self::Instance(e) => &e.instance_id,
            Self::Finished(e) => &e.instance_id,
        }
    }

    /// Unix timestamp (seconds) of the update
    pub fn timestamp(&self) -> i64 {
        match self {
            Self::Resource(e) => e.update_timestamp,
            Self::Child(e) => e.update_timestamp,
            Self::Link(e) => e.update_timestamp,
            Self::Instance(e) => e.update_timestamp,
            Self::Finished(e) => e.finish_timestamp.max(e.update_timestamp),
        }
    }

    /// Short description for logging
    pub fn description(&self) -> String {
        match self {
            Self::Resource(e) => format!("resource {} {}", e.resource_name, e.status.label()),
            Self::Child(e) => format!("child {} {}", e.child_name, e.status.label()),
            Self::Link(e) => format!("link {} {}", e.link_name, e.status.label()),
            Self::Instance(e) => format!("instance {} {}", e.instance_id, e.status.label()),
            Self::Finished(e) => {
                format!("deployment {} finished: {}", e.instance_id, e.status.label())
            }
        }
    }
}
