//! Engine Bridge - Connector Layer
//!
//! Abstracts the deploy engine for the views. The views only need two
//! things from it: the event stream for a deployment and a read of the
//! resulting blueprint instance.

mod mock;
mod replay;

pub use mock::{demo_changeset, MockEngine, DEMO_INSTANCE_ID};
pub use replay::{EventSource, ReplayEngine};

use async_trait::async_trait;
use tokio_stream::Stream;

use crate::error::Result;
use crate::event::DeployEvent;
use crate::instance::InstanceState;

/// Stream of deploy events; a decode error ends the stream
pub type DeployEventStream = Box<dyn Stream<Item = Result<DeployEvent>> + Send + Unpin>;

/// Bridge trait for the external deploy engine
#[async_trait]
pub trait DeployEngine: Send + Sync {
    /// Subscribe to the lifecycle events of a deployment
    async fn stream_deploy_events(&self, instance_id: Option<&str>) -> Result<DeployEventStream>;

    /// Fetch the current state of a blueprint instance
    async fn get_blueprint_instance(&self, instance_id: &str) -> Result<InstanceState>;
}
