//! Event Module - deploy lifecycle events from the engine
//!
//! Key types:
//! - `DeployEvent`: resource / child / link / instance / finished messages
//! - Status vocabularies (`ResourceStatus`, `InstanceStatus`, `LinkStatus`, ...)
//!   and the shared `StatusClass` bucket
//! - NDJSON decoding helpers

mod decode;
mod message;
mod status;

pub use decode::{parse_event_line, parse_events, to_ndjson};
pub use message::{
    ChildUpdate, DeployEvent, DeploymentFinished, InstanceDurations, InstanceUpdate,
    LinkDurations, LinkStageDurations, LinkUpdate, ResourceDurations, ResourceUpdate,
};
pub use status::{
    InstanceStatus, LinkStatus, PreciseLinkStatus, PreciseResourceStatus, ResourceStatus,
    StatusClass,
};
