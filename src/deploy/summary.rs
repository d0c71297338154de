//! Outcome counts across the deployment tree

use crate::event::StatusClass;

use super::item::{DeployItem, ItemKind};

/// Outcome counts for one item kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KindCounts {
    pub succeeded: usize,
    pub failed: usize,
    pub interrupted: usize,
    pub rolled_back: usize,
    pub rollback_failed: usize,
    pub in_progress: usize,
    pub pending: usize,
    pub skipped: usize,
    pub no_change: usize,
}

impl KindCounts {
    fn record(&mut self, item: &DeployItem) {
        if item.skipped {
            self.skipped += 1;
            return;
        }
        if !item.is_actionable() && !item.seen {
            self.no_change += 1;
            return;
        }
        match item.class() {
            StatusClass::Pending => self.pending += 1,
            StatusClass::InProgress | StatusClass::RollingBack => self.in_progress += 1,
            StatusClass::Succeeded => self.succeeded += 1,
            StatusClass::Failed => self.failed += 1,
            StatusClass::Interrupted => self.interrupted += 1,
            StatusClass::RolledBack => self.rolled_back += 1,
            StatusClass::RollbackFailed => self.rollback_failed += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.succeeded
            + self.failed
            + self.interrupted
            + self.rolled_back
            + self.rollback_failed
            + self.in_progress
            + self.pending
            + self.skipped
            + self.no_change
    }

    pub fn failures(&self) -> usize {
        self.failed + self.interrupted + self.rollback_failed
    }
}

/// Per-kind outcome counts for a whole deployment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeploySummary {
    pub resources: KindCounts,
    pub children: KindCounts,
    pub links: KindCounts,
}

impl DeploySummary {
    pub fn from_items<'a>(items: impl IntoIterator<Item = &'a DeployItem>) -> Self {
        let mut summary = Self::default();
        for item in items {
            summary.kind_mut(item.kind).record(item);
        }
        summary
    }

    pub fn kind(&self, kind: ItemKind) -> &KindCounts {
        match kind {
            ItemKind::Resource => &self.resources,
            ItemKind::Child => &self.children,
            ItemKind::Link => &self.links,
        }
    }

    fn kind_mut(&mut self, kind: ItemKind) -> &mut KindCounts {
        match kind {
            ItemKind::Resource => &mut self.resources,
            ItemKind::Child => &mut self.children,
            ItemKind::Link => &mut self.links,
        }
    }

    pub fn total_failures(&self) -> usize {
        self.resources.failures() + self.children.failures() + self.links.failures()
    }

    pub fn total_items(&self) -> usize {
        self.resources.total() + self.children.total() + self.links.total()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::changeset::Action;
    use crate::deploy::item::ItemStatus;
    use crate::event::{
        InstanceStatus, LinkStatus, PreciseLinkStatus, PreciseResourceStatus, ResourceStatus,
    };

    fn resource(status: ResourceStatus) -> DeployItem {
        let mut item = DeployItem::new(ItemKind::Resource, "", "r", Action::Create);
        item.status = ItemStatus::Resource {
            status,
            precise: PreciseResourceStatus::Unknown,
        };
        item.last_update = Some(1);
        item.seen = true;
        item
    }

    #[test]
    fn test_counts_by_outcome() {
        let mut skipped = DeployItem::new(ItemKind::Resource, "", "s", Action::Create);
        skipped.skipped = true;
        let unchanged = DeployItem::new(ItemKind::Resource, "", "u", Action::NoChange);
        let mut child = DeployItem::new(ItemKind::Child, "", "c", Action::Update);
        child.status = ItemStatus::Child {
            status: InstanceStatus::UpdateRollbackComplete,
        };
        let mut link = DeployItem::new(ItemKind::Link, "", "a::b", Action::Create);
        link.status = ItemStatus::Link {
            status: LinkStatus::Creating,
            precise: PreciseLinkStatus::UpdatingResourceA,
        };

        let items = vec![
            resource(ResourceStatus::Created),
            resource(ResourceStatus::CreateFailed),
            resource(ResourceStatus::UpdateInterrupted),
            skipped,
            unchanged,
            child,
            link,
        ];
        let summary = DeploySummary::from_items(&items);

        assert_eq!(summary.resources.succeeded, 1);
        assert_eq!(summary.resources.failed, 1);
        assert_eq!(summary.resources.interrupted, 1);
        assert_eq!(summary.resources.skipped, 1);
        assert_eq!(summary.resources.no_change, 1);
        assert_eq!(summary.resources.total(), 5);
        assert_eq!(summary.children.rolled_back, 1);
        assert_eq!(summary.links.in_progress, 1);
        assert_eq!(summary.total_failures(), 2);
        assert_eq!(summary.total_items(), 7);
    }
}
