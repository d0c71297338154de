//! Status vocabularies reported by the deploy engine
//!
//! Every status maps onto a coarse [`StatusClass`] so the tree, the headless
//! printer and the TUI can reason about progress without matching on dozens
//! of engine-specific variants.

use serde::{Deserialize, Serialize};

use crate::changeset::Action;

/// Coarse outcome bucket shared by all status vocabularies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StatusClass {
    Pending,
    InProgress,
    Succeeded,
    Failed,
    Interrupted,
    RollingBack,
    RolledBack,
    RollbackFailed,
}

impl StatusClass {
    /// No further updates are expected for the item
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Succeeded
                | Self::Failed
                | Self::Interrupted
                | Self::RolledBack
                | Self::RollbackFailed
        )
    }

    /// Item is actively changing (including rollbacks)
    pub fn is_active(&self) -> bool {
        matches!(self, Self::InProgress | Self::RollingBack)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed | Self::Interrupted | Self::RollbackFailed)
    }
}

// ═══════════════════════════════════════════
// RESOURCES
// ═══════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceStatus {
    #[default]
    Unknown,
    Creating,
    Created,
    CreateFailed,
    CreateInterrupted,
    Destroying,
    Destroyed,
    DestroyFailed,
    DestroyInterrupted,
    Updating,
    Updated,
    UpdateFailed,
    UpdateInterrupted,
    RollingBack,
    RollbackFailed,
    RollbackComplete,
}

impl ResourceStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Unknown => "pending",
            Self::Creating => "creating",
            Self::Created => "created",
            Self::CreateFailed => "create failed",
            Self::CreateInterrupted => "create interrupted",
            Self::Destroying => "destroying",
            Self::Destroyed => "destroyed",
            Self::DestroyFailed => "destroy failed",
            Self::DestroyInterrupted => "destroy interrupted",
            Self::Updating => "updating",
            Self::Updated => "updated",
            Self::UpdateFailed => "update failed",
            Self::UpdateInterrupted => "update interrupted",
            Self::RollingBack => "rolling back",
            Self::RollbackFailed => "rollback failed",
            Self::RollbackComplete => "rolled back",
        }
    }

    pub fn class(&self) -> StatusClass {
        match self {
            Self::Unknown => StatusClass::Pending,
            Self::Creating | Self::Destroying | Self::Updating => StatusClass::InProgress,
            Self::Created | Self::Destroyed | Self::Updated => StatusClass::Succeeded,
            Self::CreateFailed | Self::DestroyFailed | Self::UpdateFailed => StatusClass::Failed,
            Self::CreateInterrupted | Self::DestroyInterrupted | Self::UpdateInterrupted => {
                StatusClass::Interrupted
            }
            Self::RollingBack => StatusClass::RollingBack,
            Self::RollbackFailed => StatusClass::RollbackFailed,
            Self::RollbackComplete => StatusClass::RolledBack,
        }
    }

    /// Action implied by a status when the changeset did not plan the item
    pub fn implied_action(&self) -> Option<Action> {
        match self {
            Self::Creating | Self::Created | Self::CreateFailed | Self::CreateInterrupted => {
                Some(Action::Create)
            }
            Self::Updating | Self::Updated | Self::UpdateFailed | Self::UpdateInterrupted => {
                Some(Action::Update)
            }
            Self::Destroying | Self::Destroyed | Self::DestroyFailed | Self::DestroyInterrupted => {
                Some(Action::Delete)
            }
            _ => None,
        }
    }

    /// Interrupted counterpart for an in-flight status
    pub fn interrupted(&self) -> Option<Self> {
        match self {
            Self::Creating => Some(Self::CreateInterrupted),
            Self::Updating => Some(Self::UpdateInterrupted),
            Self::Destroying => Some(Self::DestroyInterrupted),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreciseResourceStatus {
    #[default]
    Unknown,
    Creating,
    ConfigComplete,
    Created,
    CreateFailed,
    CreateInterrupted,
    CreateRollingBack,
    CreateRollbackFailed,
    CreateRollbackComplete,
    Destroying,
    Destroyed,
    DestroyFailed,
    DestroyInterrupted,
    DestroyRollingBack,
    DestroyRollbackFailed,
    DestroyRollbackComplete,
    Updating,
    UpdateConfigComplete,
    Updated,
    UpdateFailed,
    UpdateInterrupted,
    UpdateRollingBack,
    UpdateRollbackFailed,
    UpdateRollbackComplete,
}

impl PreciseResourceStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Unknown => "pending",
            Self::Creating => "creating",
            Self::ConfigComplete => "config complete",
            Self::Created => "created",
            Self::CreateFailed => "create failed",
            Self::CreateInterrupted => "create interrupted",
            Self::CreateRollingBack => "rolling back create",
            Self::CreateRollbackFailed => "create rollback failed",
            Self::CreateRollbackComplete => "create rolled back",
            Self::Destroying => "destroying",
            Self::Destroyed => "destroyed",
            Self::DestroyFailed => "destroy failed",
            Self::DestroyInterrupted => "destroy interrupted",
            Self::DestroyRollingBack => "rolling back destroy",
            Self::DestroyRollbackFailed => "destroy rollback failed",
            Self::DestroyRollbackComplete => "destroy rolled back",
            Self::Updating => "updating",
            Self::UpdateConfigComplete => "update config complete",
            Self::Updated => "updated",
            Self::UpdateFailed => "update failed",
            Self::UpdateInterrupted => "update interrupted",
            Self::UpdateRollingBack => "rolling back update",
            Self::UpdateRollbackFailed => "update rollback failed",
            Self::UpdateRollbackComplete => "update rolled back",
        }
    }
}

// ═══════════════════════════════════════════
// BLUEPRINT INSTANCES (root + child blueprints)
// ═══════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceStatus {
    #[default]
    NotDeployed,
    Preparing,
    Deploying,
    Deployed,
    DeployFailed,
    DeployInterrupted,
    DeployRollingBack,
    DeployRollbackFailed,
    DeployRollbackComplete,
    Updating,
    Updated,
    UpdateFailed,
    UpdateInterrupted,
    UpdateRollingBack,
    UpdateRollbackFailed,
    UpdateRollbackComplete,
    Destroying,
    Destroyed,
    DestroyFailed,
    DestroyInterrupted,
    DestroyRollingBack,
    DestroyRollbackFailed,
    DestroyRollbackComplete,
}

impl InstanceStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::NotDeployed => "pending",
            Self::Preparing => "preparing",
            Self::Deploying => "deploying",
            Self::Deployed => "deployed",
            Self::DeployFailed => "deploy failed",
            Self::DeployInterrupted => "deploy interrupted",
            Self::DeployRollingBack => "rolling back deploy",
            Self::DeployRollbackFailed => "deploy rollback failed",
            Self::DeployRollbackComplete => "deploy rolled back",
            Self::Updating => "updating",
            Self::Updated => "updated",
            Self::UpdateFailed => "update failed",
            Self::UpdateInterrupted => "update interrupted",
            Self::UpdateRollingBack => "rolling back update",
            Self::UpdateRollbackFailed => "update rollback failed",
            Self::UpdateRollbackComplete => "update rolled back",
            Self::Destroying => "destroying",
            Self::Destroyed => "destroyed",
            Self::DestroyFailed => "destroy failed",
            Self::DestroyInterrupted => "destroy interrupted",
            Self::DestroyRollingBack => "rolling back destroy",
            Self::DestroyRollbackFailed => "destroy rollback failed",
            Self::DestroyRollbackComplete => "destroy rolled back",
        }
    }

    pub fn class(&self) -> StatusClass {
        match self {
            Self::NotDeployed => StatusClass::Pending,
            Self::Preparing | Self::Deploying | Self::Updating | Self::Destroying => {
                StatusClass::InProgress
            }
            Self::Deployed | Self::Updated | Self::Destroyed => StatusClass::Succeeded,
            Self::DeployFailed | Self::UpdateFailed | Self::DestroyFailed => StatusClass::Failed,
            Self::DeployInterrupted | Self::UpdateInterrupted | Self::DestroyInterrupted => {
                StatusClass::Interrupted
            }
            Self::DeployRollingBack | Self::UpdateRollingBack | Self::DestroyRollingBack => {
                StatusClass::RollingBack
            }
            Self::DeployRollbackFailed
            | Self::UpdateRollbackFailed
            | Self::DestroyRollbackFailed => StatusClass::RollbackFailed,
            Self::DeployRollbackComplete
            | Self::UpdateRollbackComplete
            | Self::DestroyRollbackComplete => StatusClass::RolledBack,
        }
    }

    pub fn implied_action(&self) -> Option<Action> {
        match self {
            Self::Deploying | Self::Deployed | Self::DeployFailed | Self::DeployInterrupted => {
                Some(Action::Create)
            }
            Self::Updating | Self::Updated | Self::UpdateFailed | Self::UpdateInterrupted => {
                Some(Action::Update)
            }
            Self::Destroying | Self::Destroyed | Self::DestroyFailed | Self::DestroyInterrupted => {
                Some(Action::Delete)
            }
            _ => None,
        }
    }

    pub fn interrupted(&self) -> Option<Self> {
        match self {
            Self::Preparing | Self::Deploying => Some(Self::DeployInterrupted),
            Self::Updating => Some(Self::UpdateInterrupted),
            Self::Destroying => Some(Self::DestroyInterrupted),
            _ => None,
        }
    }

    /// Destroy statuses switch the header title to "DESTROY"
    pub fn is_destroy(&self) -> bool {
        matches!(
            self,
            Self::Destroying
                | Self::Destroyed
                | Self::DestroyFailed
                | Self::DestroyInterrupted
                | Self::DestroyRollingBack
                | Self::DestroyRollbackFailed
                | Self::DestroyRollbackComplete
        )
    }
}

// ═══════════════════════════════════════════
// LINKS
// ═══════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkStatus {
    #[default]
    Unknown,
    Creating,
    Created,
    CreateFailed,
    CreateInterrupted,
    CreateRollingBack,
    CreateRollbackFailed,
    CreateRollbackComplete,
    Updating,
    Updated,
    UpdateFailed,
    UpdateInterrupted,
    UpdateRollingBack,
    UpdateRollbackFailed,
    UpdateRollbackComplete,
    Destroying,
    Destroyed,
    DestroyFailed,
    DestroyInterrupted,
    DestroyRollingBack,
    DestroyRollbackFailed,
    DestroyRollbackComplete,
}

impl LinkStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Unknown => "pending",
            Self::Creating => "creating",
            Self::Created => "created",
            Self::CreateFailed => "create failed",
            Self::CreateInterrupted => "create interrupted",
            Self::CreateRollingBack => "rolling back create",
            Self::CreateRollbackFailed => "create rollback failed",
            Self::CreateRollbackComplete => "create rolled back",
            Self::Updating => "updating",
            Self::Updated => "updated",
            Self::UpdateFailed => "update failed",
            Self::UpdateInterrupted => "update interrupted",
            Self::UpdateRollingBack => "rolling back update",
            Self::UpdateRollbackFailed => "update rollback failed",
            Self::UpdateRollbackComplete => "update rolled back",
            Self::Destroying => "destroying",
            Self::Destroyed => "destroyed",
            Self::DestroyFailed => "destroy failed",
            Self::DestroyInterrupted => "destroy interrupted",
            Self::DestroyRollingBack => "rolling back destroy",
            Self::DestroyRollbackFailed => "destroy rollback failed",
            Self::DestroyRollbackComplete => "destroy rolled back",
        }
    }

    pub fn class(&self) -> StatusClass {
        match self {
            Self::Unknown => StatusClass::Pending,
            Self::Creating | Self::Updating | Self::Destroying => StatusClass::InProgress,
            Self::Created | Self::Updated | Self::Destroyed => StatusClass::Succeeded,
            Self::CreateFailed | Self::UpdateFailed | Self::DestroyFailed => StatusClass::Failed,
            Self::CreateInterrupted | Self::UpdateInterrupted | Self::DestroyInterrupted => {
                StatusClass::Interrupted
            }
            Self::CreateRollingBack | Self::UpdateRollingBack | Self::DestroyRollingBack => {
                StatusClass::RollingBack
            }
            Self::CreateRollbackFailed
            | Self::UpdateRollbackFailed
            | Self::DestroyRollbackFailed => StatusClass::RollbackFailed,
            Self::CreateRollbackComplete
            | Self::UpdateRollbackComplete
            | Self::DestroyRollbackComplete => StatusClass::RolledBack,
        }
    }

    pub fn implied_action(&self) -> Option<Action> {
        match self {
            Self::Creating | Self::Created | Self::CreateFailed | Self::CreateInterrupted => {
                Some(Action::Create)
            }
            Self::Updating | Self::Updated | Self::UpdateFailed | Self::UpdateInterrupted => {
                Some(Action::Update)
            }
            Self::Destroying | Self::Destroyed | Self::DestroyFailed | Self::DestroyInterrupted => {
                Some(Action::Delete)
            }
            _ => None,
        }
    }

    pub fn interrupted(&self) -> Option<Self> {
        match self {
            Self::Creating => Some(Self::CreateInterrupted),
            Self::Updating => Some(Self::UpdateInterrupted),
            Self::Destroying => Some(Self::DestroyInterrupted),
            _ => None,
        }
    }
}

/// Stage-level detail for a link: which side of the link is being updated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreciseLinkStatus {
    #[default]
    Unknown,
    UpdatingResourceA,
    ResourceAUpdated,
    ResourceAUpdateFailed,
    ResourceAUpdateRollingBack,
    ResourceAUpdateRollbackFailed,
    ResourceAUpdateRolledBack,
    UpdatingResourceB,
    ResourceBUpdated,
    ResourceBUpdateFailed,
    ResourceBUpdateRollingBack,
    ResourceBUpdateRollbackFailed,
    ResourceBUpdateRolledBack,
    UpdatingIntermediaryResources,
    IntermediaryResourcesUpdated,
    IntermediaryResourceUpdateFailed,
    IntermediaryResourceUpdateRollingBack,
    IntermediaryResourceUpdateRollbackFailed,
    IntermediaryResourcesUpdateRolledBack,
}

impl PreciseLinkStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Unknown => "pending",
            Self::UpdatingResourceA => "updating resource A",
            Self::ResourceAUpdated => "resource A updated",
            Self::ResourceAUpdateFailed => "resource A update failed",
            Self::ResourceAUpdateRollingBack => "rolling back resource A",
            Self::ResourceAUpdateRollbackFailed => "resource A rollback failed",
            Self::ResourceAUpdateRolledBack => "resource A rolled back",
            Self::UpdatingResourceB => "updating resource B",
            Self::ResourceBUpdated => "resource B updated",
            Self::ResourceBUpdateFailed => "resource B update failed",
            Self::ResourceBUpdateRollingBack => "rolling back resource B",
            Self::ResourceBUpdateRollbackFailed => "resource B rollback failed",
            Self::ResourceBUpdateRolledBack => "resource B rolled back",
            Self::UpdatingIntermediaryResources => "updating intermediary resources",
            Self::IntermediaryResourcesUpdated => "intermediary resources updated",
            Self::IntermediaryResourceUpdateFailed => "intermediary resource update failed",
            Self::IntermediaryResourceUpdateRollingBack => "rolling back intermediary resources",
            Self::IntermediaryResourceUpdateRollbackFailed => {
                "intermediary resource rollback failed"
            }
            Self::IntermediaryResourcesUpdateRolledBack => "intermediary resources rolled back",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_status_serde_names() {
        let status: ResourceStatus = serde_json::from_str("\"create_failed\"").unwrap();
        assert_eq!(status, ResourceStatus::CreateFailed);
        assert_eq!(
            serde_json::to_string(&ResourceStatus::RollbackComplete).unwrap(),
            "\"rollback_complete\""
        );
    }

    #[test]
    fn test_link_precise_status_serde_names() {
        let status: PreciseLinkStatus = serde_json::from_str("\"updating_resource_a\"").unwrap();
        assert_eq!(status, PreciseLinkStatus::UpdatingResourceA);
    }

    #[test]
    fn test_classes() {
        assert_eq!(ResourceStatus::Unknown.class(), StatusClass::Pending);
        assert_eq!(ResourceStatus::Creating.class(), StatusClass::InProgress);
        assert_eq!(ResourceStatus::UpdateFailed.class(), StatusClass::Failed);
        assert_eq!(InstanceStatus::Preparing.class(), StatusClass::InProgress);
        assert_eq!(
            InstanceStatus::DeployRollbackComplete.class(),
            StatusClass::RolledBack
        );
        assert_eq!(LinkStatus::DestroyInterrupted.class(), StatusClass::Interrupted);
    }

    #[test]
    fn test_terminal_and_failure_classes() {
        assert!(StatusClass::Succeeded.is_terminal());
        assert!(StatusClass::RolledBack.is_terminal());
        assert!(!StatusClass::RollingBack.is_terminal());
        assert!(StatusClass::RollingBack.is_active());
        assert!(StatusClass::Interrupted.is_failure());
        assert!(!StatusClass::RolledBack.is_failure());
    }

    #[test]
    fn test_implied_actions() {
        assert_eq!(ResourceStatus::Creating.implied_action(), Some(Action::Create));
        assert_eq!(LinkStatus::Updated.implied_action(), Some(Action::Update));
        assert_eq!(
            InstanceStatus::Destroying.implied_action(),
            Some(Action::Delete)
        );
        assert_eq!(ResourceStatus::RollingBack.implied_action(), None);
    }

    #[test]
    fn test_interrupted_counterparts() {
        assert_eq!(
            ResourceStatus::Updating.interrupted(),
            Some(ResourceStatus::UpdateInterrupted)
        );
        assert_eq!(
            InstanceStatus::Preparing.interrupted(),
            Some(InstanceStatus::DeployInterrupted)
        );
        assert_eq!(LinkStatus::Created.interrupted(), None);
    }
}
