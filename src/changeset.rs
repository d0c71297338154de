//! Changeset model - the diff the engine computed before deploying
//!
//! The changeset is what lets the view show the full plan (including items
//! that have not produced any event yet) from the first frame.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DeployViewError, Result};

/// Planned action for a deploy item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Create,
    Update,
    Delete,
    Recreate,
    NoChange,
}

impl Action {
    pub fn label(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::Recreate => "recreate",
            Action::NoChange => "no change",
        }
    }

    /// Single-character marker used in lists and headless output
    pub fn symbol(&self) -> &'static str {
        match self {
            Action::Create => "+",
            Action::Update => "~",
            Action::Delete => "-",
            Action::Recreate => "±",
            Action::NoChange => "=",
        }
    }

    /// Whether the engine is expected to emit events for this item
    pub fn is_actionable(&self) -> bool {
        !matches!(self, Action::NoChange)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldChange {
    pub field_path: String,
    pub prev_value: Option<Value>,
    pub new_value: Option<Value>,
    pub must_recreate: bool,
}

/// Fields of a resource that does not exist yet
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvisionChanges {
    pub resource_type: String,
    pub new_fields: Vec<FieldChange>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkChanges {
    pub modified_fields: Vec<FieldChange>,
    pub new_fields: Vec<FieldChange>,
    pub removed_fields: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceChanges {
    pub resource_type: String,
    pub modified_fields: Vec<FieldChange>,
    pub new_fields: Vec<FieldChange>,
    pub removed_fields: Vec<String>,
    pub unchanged_fields: Vec<String>,
    /// Fields whose final value depends on other resources being deployed
    pub field_changes_known_on_deploy: Vec<String>,
    pub must_recreate: bool,
    /// Keyed by target resource name
    pub new_outbound_links: BTreeMap<String, LinkChanges>,
    pub outbound_link_changes: BTreeMap<String, LinkChanges>,
    /// Target resource names
    pub removed_outbound_links: Vec<String>,
}

impl ResourceChanges {
    pub fn has_field_changes(&self) -> bool {
        !self.modified_fields.is_empty()
            || !self.new_fields.is_empty()
            || !self.removed_fields.is_empty()
            || !self.field_changes_known_on_deploy.is_empty()
    }

    pub fn has_link_changes(&self) -> bool {
        !self.new_outbound_links.is_empty()
            || !self.outbound_link_changes.is_empty()
            || !self.removed_outbound_links.is_empty()
    }

    pub fn action(&self) -> Action {
        if self.must_recreate {
            Action::Recreate
        } else if self.has_field_changes() || self.has_link_changes() {
            Action::Update
        } else {
            Action::NoChange
        }
    }
}

/// A child blueprint that will be deployed for the first time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewBlueprintDefinition {
    pub new_resources: BTreeMap<String, ProvisionChanges>,
    pub new_children: BTreeMap<String, NewBlueprintDefinition>,
    pub new_exports: BTreeMap<String, FieldChange>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlueprintChanges {
    pub new_resources: BTreeMap<String, ProvisionChanges>,
    pub resource_changes: BTreeMap<String, ResourceChanges>,
    pub removed_resources: Vec<String>,
    pub new_children: BTreeMap<String, NewBlueprintDefinition>,
    pub child_changes: BTreeMap<String, BlueprintChanges>,
    pub recreate_children: Vec<String>,
    pub removed_children: Vec<String>,
    /// Full link names (`resourceA::resourceB`)
    pub removed_links: Vec<String>,
    pub new_exports: BTreeMap<String, FieldChange>,
    pub export_changes: BTreeMap<String, FieldChange>,
    pub removed_exports: Vec<String>,
    pub unchanged_exports: Vec<String>,
    /// Element paths the engine can only resolve during deployment
    pub resolve_on_deploy: Vec<String>,
}

impl BlueprintChanges {
    /// Load a changeset from a JSON file, or YAML for `.yaml`/`.yml`
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => DeployViewError::FileNotFound {
                path: path.display().to_string(),
            },
            _ => DeployViewError::Io(e),
        })?;

        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
            .unwrap_or(false);

        if is_yaml {
            serde_yaml::from_str(&content).map_err(|e| DeployViewError::ChangesetParse {
                path: path.display().to_string(),
                details: e.to_string(),
            })
        } else {
            Self::from_json(&content).map_err(|e| match e {
                DeployViewError::ChangesetParse { details, .. } => {
                    DeployViewError::ChangesetParse {
                        path: path.display().to_string(),
                        details,
                    }
                }
                other => other,
            })
        }
    }

    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| DeployViewError::ChangesetParse {
            path: "<inline>".to_string(),
            details: e.to_string(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Planned action for a resource at this level, if the changeset mentions it
    pub fn action_for_resource(&self, name: &str) -> Option<Action> {
        if self.new_resources.contains_key(name) {
            Some(Action::Create)
        } else if let Some(changes) = self.resource_changes.get(name) {
            Some(changes.action())
        } else if self.removed_resources.iter().any(|r| r == name) {
            Some(Action::Delete)
        } else {
            None
        }
    }

    /// Planned action for a child blueprint at this level
    pub fn action_for_child(&self, name: &str) -> Option<Action> {
        if self.new_children.contains_key(name) {
            Some(Action::Create)
        } else if self.recreate_children.iter().any(|c| c == name) {
            Some(Action::Recreate)
        } else if self.child_changes.contains_key(name) {
            Some(Action::Update)
        } else if self.removed_children.iter().any(|c| c == name) {
            Some(Action::Delete)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn sample() -> BlueprintChanges {
        BlueprintChanges::from_json(
            r#"{
                "new_resources": {"queue": {"resource_type": "aws/sqs/queue"}},
                "resource_changes": {
                    "table": {"modified_fields": [{"field_path": "spec.billingMode"}]},
                    "bucket": {"must_recreate": true},
                    "role": {"unchanged_fields": ["spec.name"]}
                },
                "removed_resources": ["oldFn"],
                "recreate_children": ["cache"],
                "child_changes": {"network": {}}
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_resource_actions() {
        let changes = sample();
        assert_eq!(changes.action_for_resource("queue"), Some(Action::Create));
        assert_eq!(changes.action_for_resource("table"), Some(Action::Update));
        assert_eq!(changes.action_for_resource("bucket"), Some(Action::Recreate));
        assert_eq!(changes.action_for_resource("role"), Some(Action::NoChange));
        assert_eq!(changes.action_for_resource("oldFn"), Some(Action::Delete));
        assert_eq!(changes.action_for_resource("missing"), None);
    }

    #[test]
    fn test_child_actions() {
        let changes = sample();
        assert_eq!(changes.action_for_child("cache"), Some(Action::Recreate));
        assert_eq!(changes.action_for_child("network"), Some(Action::Update));
        assert_eq!(changes.action_for_child("nope"), None);
    }

    #[test]
    fn test_link_only_changes_are_updates() {
        let mut changes = ResourceChanges::default();
        assert_eq!(changes.action(), Action::NoChange);
        changes.removed_outbound_links.push("table".into());
        assert_eq!(changes.action(), Action::Update);
    }

    #[test]
    fn test_empty_changeset() {
        assert!(BlueprintChanges::default().is_empty());
        assert!(!sample().is_empty());
    }

    #[test]
    fn test_load_yaml_by_extension() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "new_resources:\n  queue:\n    resource_type: aws/sqs/queue").unwrap();
        let changes = BlueprintChanges::load(file.path()).unwrap();
        assert_eq!(changes.new_resources["queue"].resource_type, "aws/sqs/queue");
    }

    #[test]
    fn test_load_reports_path_on_parse_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        let err = BlueprintChanges::load(file.path()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("[DV-002]"));
        assert!(msg.contains(&file.path().display().to_string()));
    }

    #[test]
    fn test_load_missing_file() {
        let err = BlueprintChanges::load(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, DeployViewError::FileNotFound { .. }));
    }
}
