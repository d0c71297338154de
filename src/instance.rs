//! Blueprint instance state as returned by the engine's get-instance call

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DeployViewError, Result};
use crate::event::{InstanceStatus, ResourceStatus};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceState {
    pub resource_id: String,
    pub resource_type: String,
    pub status: ResourceStatus,
    /// Resolved resource spec, including computed outputs
    pub spec_data: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstanceState {
    pub instance_id: String,
    pub instance_name: String,
    pub status: InstanceStatus,
    pub resources: BTreeMap<String, ResourceState>,
    pub child_blueprints: BTreeMap<String, InstanceState>,
    pub exports: BTreeMap<String, Value>,
}

impl InstanceState {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => DeployViewError::FileNotFound {
                path: path.display().to_string(),
            },
            _ => DeployViewError::Io(e),
        })?;

        let parse_error = |details: String| DeployViewError::InstanceStateParse {
            path: path.display().to_string(),
            details,
        };
        // `serde(default)` would read any non-object value as an empty state
        let value: Value =
            serde_json::from_str(&content).map_err(|e| parse_error(e.to_string()))?;
        if !value.is_object() {
            return Err(parse_error("expected a JSON object".to_string()));
        }
        serde_json::from_value(value).map_err(|e| parse_error(e.to_string()))
    }

    /// Walk child blueprints along a `/`-separated child path (`""` is self)
    pub fn descend(&self, child_path: &str) -> Option<&InstanceState> {
        if child_path.is_empty() {
            return Some(self);
        }
        child_path
            .split('/')
            .try_fold(self, |state, name| state.child_blueprints.get(name))
    }

    /// Resource state for a full item path (`child/child/resource`)
    pub fn resource_at(&self, item_path: &str) -> Option<&ResourceState> {
        let (child_path, name) = match item_path.rsplit_once('/') {
            Some((parent, name)) => (parent, name),
            None => ("", item_path),
        };
        self.descend(child_path)?.resources.get(name)
    }
}
