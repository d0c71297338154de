//! DeployTree - projects the changeset and the event stream into items
//!
//! Items live in an append-only arena so an [`ItemId`] stays valid for the
//! whole session (the TUI keeps selections by id). Lookups go through a
//! `(kind, path)` index.
//!
//! Events are keyed by instance ID, not by path. The tree learns the
//! instance ID → child path mapping from child events; events for instances
//! it cannot place yet are parked and replayed once the owning child shows up.

use std::collections::{HashMap, VecDeque};

use tracing::{debug, warn};

use crate::changeset::{Action, BlueprintChanges, NewBlueprintDefinition};
use crate::event::{
    ChildUpdate, DeployEvent, DeploymentFinished, InstanceDurations, InstanceStatus,
    InstanceUpdate, LinkUpdate, ResourceUpdate, StatusClass,
};
use crate::instance::InstanceState;

use super::item::{join_path, DeployItem, ItemDurations, ItemKind, ItemStatus};
use super::summary::DeploySummary;

pub type ItemId = usize;

/// Events parked while their instance is unknown
pub const DEFAULT_PENDING_LIMIT: usize = 1024;

/// What an applied event changed
#[derive(Debug, Clone, PartialEq)]
pub enum TreeChange {
    Item { id: ItemId, created: bool },
    Instance { status: InstanceStatus, timestamp: i64 },
    Finished,
}

/// Final outcome reported for the root instance
#[derive(Debug, Clone, PartialEq)]
pub struct FinishInfo {
    pub status: InstanceStatus,
    pub failure_reasons: Vec<String>,
    pub finish_timestamp: i64,
    pub durations: Option<InstanceDurations>,
}

#[derive(Debug)]
pub struct DeployTree {
    items: Vec<DeployItem>,
    index: HashMap<(ItemKind, String), ItemId>,
    root_instance_id: Option<String>,
    instance_name: Option<String>,
    instance_paths: HashMap<String, String>,
    pending: VecDeque<DeployEvent>,
    pending_limit: usize,
    root_status: InstanceStatus,
    root_durations: Option<InstanceDurations>,
    first_update: Option<i64>,
    last_update: Option<i64>,
    finish: Option<FinishInfo>,
    instance_state: Option<InstanceState>,
}

impl Default for DeployTree {
    fn default() -> Self {
        Self::new(None)
    }
}

impl DeployTree {
    /// Empty tree; items will be discovered from the stream
    pub fn new(root_instance_id: Option<String>) -> Self {
        let mut tree = Self {
            items: Vec::new(),
            index: HashMap::new(),
            root_instance_id: None,
            instance_name: None,
            instance_paths: HashMap::new(),
            pending: VecDeque::new(),
            pending_limit: DEFAULT_PENDING_LIMIT,
            root_status: InstanceStatus::default(),
            root_durations: None,
            first_update: None,
            last_update: None,
            finish: None,
            instance_state: None,
        };
        if let Some(id) = root_instance_id {
            tree.set_root(&id);
        }
        tree
    }

    /// Tree pre-populated with every item the changeset plans to touch
    pub fn from_changeset(root_instance_id: Option<String>, changes: &BlueprintChanges) -> Self {
        let mut tree = Self::new(root_instance_id);
        tree.add_changes("", changes);
        debug!(items = tree.items.len(), "built deploy tree from changeset");
        tree
    }

    pub fn with_pending_limit(mut self, limit: usize) -> Self {
        self.pending_limit = limit.max(1);
        self
    }

    // ─────────────────────────────────────────────────────────────
    // Changeset projection
    // ─────────────────────────────────────────────────────────────

    fn add_changes(&mut self, parent: &str, changes: &BlueprintChanges) {
        for (name, provision) in &changes.new_resources {
            let id = self.insert_planned(ItemKind::Resource, parent, name, Action::Create);
            let item = &mut self.items[id];
            if !provision.resource_type.is_empty() {
                item.resource_type = Some(provision.resource_type.clone());
            }
            item.new_fields = provision.new_fields.clone();
        }

        // A new resource may also appear here to declare its outbound links;
        // it stays a create and keeps its provisioned fields
        for (name, resource) in &changes.resource_changes {
            let id = self.insert_planned(ItemKind::Resource, parent, name, resource.action());
            let item = &mut self.items[id];
            if item.resource_type.is_none() && !resource.resource_type.is_empty() {
                item.resource_type = Some(resource.resource_type.clone());
            }
            item.modified_fields.extend(resource.modified_fields.iter().cloned());
            item.new_fields.extend(resource.new_fields.iter().cloned());
            item.removed_fields.extend(resource.removed_fields.iter().cloned());

            for (target, link) in &resource.new_outbound_links {
                let link_name = format!("{}::{}", name, target);
                let id = self.insert_planned(ItemKind::Link, parent, &link_name, Action::Create);
                self.items[id].new_fields = link.new_fields.clone();
            }
            for (target, link) in &resource.outbound_link_changes {
                let link_name = format!("{}::{}", name, target);
                let id = self.insert_planned(ItemKind::Link, parent, &link_name, Action::Update);
                let item = &mut self.items[id];
                item.modified_fields = link.modified_fields.clone();
                item.new_fields = link.new_fields.clone();
                item.removed_fields = link.removed_fields.clone();
            }
            for target in &resource.removed_outbound_links {
                let link_name = format!("{}::{}", name, target);
                self.insert_planned(ItemKind::Link, parent, &link_name, Action::Delete);
            }
        }

        for name in &changes.removed_resources {
            self.insert_planned(ItemKind::Resource, parent, name, Action::Delete);
        }

        for (name, definition) in &changes.new_children {
            self.insert_planned(ItemKind::Child, parent, name, Action::Create);
            self.add_new_blueprint(&join_path(parent, name), definition);
        }

        for (name, child) in &changes.child_changes {
            let action = if changes.recreate_children.contains(name) {
                Action::Recreate
            } else {
                Action::Update
            };
            self.insert_planned(ItemKind::Child, parent, name, action);
            self.add_changes(&join_path(parent, name), child);
        }

        for name in &changes.recreate_children {
            self.insert_planned(ItemKind::Child, parent, name, Action::Recreate);
        }

        for name in &changes.removed_children {
            self.insert_planned(ItemKind::Child, parent, name, Action::Delete);
        }

        for link_name in &changes.removed_links {
            self.insert_planned(ItemKind::Link, parent, link_name, Action::Delete);
        }
    }

    fn add_new_blueprint(&mut self, parent: &str, definition: &NewBlueprintDefinition) {
        for (name, provision) in &definition.new_resources {
            let id = self.insert_planned(ItemKind::Resource, parent, name, Action::Create);
            let item = &mut self.items[id];
            if !provision.resource_type.is_empty() {
                item.resource_type = Some(provision.resource_type.clone());
            }
            item.new_fields = provision.new_fields.clone();
        }
        for (name, child) in &definition.new_children {
            self.insert_planned(ItemKind::Child, parent, name, Action::Create);
            self.add_new_blueprint(&join_path(parent, name), child);
        }
    }

    fn insert_planned(
        &mut self,
        kind: ItemKind,
        parent: &str,
        name: &str,
        action: Action,
    ) -> ItemId {
        let (id, created) = self.get_or_insert(kind, parent, name, action);
        if created {
            self.items[id].from_changeset = true;
        }
        id
    }

    fn get_or_insert(
        &mut self,
        kind: ItemKind,
        parent: &str,
        name: &str,
        action: Action,
    ) -> (ItemId, bool) {
        let key = (kind, join_path(parent, name));
        if let Some(&id) = self.index.get(&key) {
            return (id, false);
        }
        let id = self.items.len();
        self.items.push(DeployItem::new(kind, parent, name, action));
        self.index.insert(key, id);
        (id, true)
    }

    /// Make sure every child blueprint along `child_path` has an item
    fn ensure_child_chain(&mut self, child_path: &str, action: Action) {
        if child_path.is_empty() {
            return;
        }
        let (parent, name) = child_path.rsplit_once('/').unwrap_or(("", child_path));
        self.ensure_child_chain(parent, action);
        let (_, created) = self.get_or_insert(ItemKind::Child, parent, name, action);
        if created {
            debug!(path = child_path, "discovered child blueprint from stream");
        }
    }

    fn ensure_item(
        &mut self,
        kind: ItemKind,
        parent: &str,
        name: &str,
        implied: Option<Action>,
    ) -> (ItemId, bool) {
        let action = implied.unwrap_or(Action::Update);
        self.ensure_child_chain(parent, action);
        let (id, created) = self.get_or_insert(kind, parent, name, action);
        if created {
            debug!(kind = kind.label(), path = %self.items[id].path, "item not in changeset");
        }
        (id, created)
    }

    // ─────────────────────────────────────────────────────────────
    // Event projection
    // ─────────────────────────────────────────────────────────────

    /// Apply one engine event, returning everything it changed (including
    /// parked events it unblocked)
    pub fn apply(&mut self, event: &DeployEvent) -> Vec<TreeChange> {
        let mut changes = Vec::new();
        self.apply_inner(event.clone(), &mut changes);
        changes
    }

    fn apply_inner(&mut self, event: DeployEvent, changes: &mut Vec<TreeChange>) {
        let Some(owner_path) = self.resolve_instance(event.owner_instance_id()) else {
            self.park(event);
            return;
        };
        self.note_timestamp(event.timestamp());

        match event {
            DeployEvent::Resource(update) => self.apply_resource(&owner_path, update, changes),
            DeployEvent::Link(update) => self.apply_link(&owner_path, update, changes),
            DeployEvent::Child(update) => {
                let child_instance_id = update.child_instance_id.clone();
                let child_path = join_path(&owner_path, &update.child_name);
                self.instance_paths
                    .insert(child_instance_id.clone(), child_path);
                self.apply_child(&owner_path, update, changes);
                self.replay_parked(&child_instance_id, changes);
            }
            DeployEvent::Instance(update) => self.apply_instance(&owner_path, update, changes),
            DeployEvent::Finished(finished) => self.apply_finished(&owner_path, finished, changes),
        }
    }

    fn resolve_instance(&mut self, instance_id: &str) -> Option<String> {
        if let Some(path) = self.instance_paths.get(instance_id) {
            return Some(path.clone());
        }
        if self.root_instance_id.is_none() {
            debug!(instance_id, "adopting first instance as deployment root");
            self.set_root(instance_id);
            return Some(String::new());
        }
        None
    }

    fn set_root(&mut self, instance_id: &str) {
        self.root_instance_id = Some(instance_id.to_string());
        self.instance_paths
            .insert(instance_id.to_string(), String::new());
    }

    fn park(&mut self, event: DeployEvent) {
        if self.pending.len() >= self.pending_limit {
            if let Some(dropped) = self.pending.pop_front() {
                warn!(
                    event = %dropped.description(),
                    "pending buffer full, dropping oldest unresolved event"
                );
            }
        }
        debug!(
            instance_id = event.owner_instance_id(),
            "parking event for unknown instance"
        );
        self.pending.push_back(event);
    }

    fn replay_parked(&mut self, instance_id: &str, changes: &mut Vec<TreeChange>) {
        if self.pending.is_empty() {
            return;
        }
        let (ready, rest): (Vec<DeployEvent>, Vec<DeployEvent>) =
            std::mem::take(&mut self.pending)
                .into_iter()
                .partition(|e| e.owner_instance_id() == instance_id);
        self.pending = rest.into();
        for event in ready {
            self.apply_inner(event, changes);
        }
    }

    fn note_timestamp(&mut self, timestamp: i64) {
        if timestamp <= 0 {
            return;
        }
        self.first_update = Some(self.first_update.map_or(timestamp, |t| t.min(timestamp)));
        self.last_update = Some(self.last_update.map_or(timestamp, |t| t.max(timestamp)));
    }

    fn apply_resource(
        &mut self,
        parent: &str,
        update: ResourceUpdate,
        changes: &mut Vec<TreeChange>,
    ) {
        let (id, created) = self.ensure_item(
            ItemKind::Resource,
            parent,
            &update.resource_name,
            update.status.implied_action(),
        );
        let item = &mut self.items[id];
        item.status = ItemStatus::Resource {
            status: update.status,
            precise: update.precise_status,
        };
        if !update.resource_id.is_empty() {
            item.element_id = Some(update.resource_id);
        }
        item.group = Some(update.group);
        item.failure_reasons = update.failure_reasons;
        item.attempt = update.attempt;
        item.can_retry = update.can_retry;
        if let Some(durations) = update.durations {
            item.durations = Some(ItemDurations::Resource(durations));
        }
        Self::touch(item, update.update_timestamp);
        changes.push(TreeChange::Item { id, created });
    }

    fn apply_link(&mut self, parent: &str, update: LinkUpdate, changes: &mut Vec<TreeChange>) {
        let (id, created) = self.ensure_item(
            ItemKind::Link,
            parent,
            &update.link_name,
            update.status.implied_action(),
        );
        let item = &mut self.items[id];
        item.status = ItemStatus::Link {
            status: update.status,
            precise: update.precise_status,
        };
        if !update.link_id.is_empty() {
            item.element_id = Some(update.link_id);
        }
        item.failure_reasons = update.failure_reasons;
        item.attempt = update.current_stage_attempt;
        item.can_retry = update.can_retry_current_stage;
        if let Some(durations) = update.durations {
            item.durations = Some(ItemDurations::Link(durations));
        }
        Self::touch(item, update.update_timestamp);
        changes.push(TreeChange::Item { id, created });
    }

    fn apply_child(&mut self, parent: &str, update: ChildUpdate, changes: &mut Vec<TreeChange>) {
        let (id, created) = self.ensure_item(
            ItemKind::Child,
            parent,
            &update.child_name,
            update.status.implied_action(),
        );
        let item = &mut self.items[id];
        item.status = ItemStatus::Child {
            status: update.status,
        };
        item.element_id = Some(update.child_instance_id);
        item.group = Some(update.group);
        item.failure_reasons = update.failure_reasons;
        if let Some(durations) = update.durations {
            item.durations = Some(ItemDurations::Child(durations));
        }
        Self::touch(item, update.update_timestamp);
        changes.push(TreeChange::Item { id, created });
    }

    fn apply_instance(
        &mut self,
        path: &str,
        update: InstanceUpdate,
        changes: &mut Vec<TreeChange>,
    ) {
        if path.is_empty() {
            self.root_status = update.status;
            if update.durations.is_some() {
                self.root_durations = update.durations;
            }
            changes.push(TreeChange::Instance {
                status: update.status,
                timestamp: update.update_timestamp,
            });
            return;
        }

        // A child blueprint reporting on itself
        if let Some(&id) = self.index.get(&(ItemKind::Child, path.to_string())) {
            let item = &mut self.items[id];
            item.status = ItemStatus::Child {
                status: update.status,
            };
            if let Some(durations) = update.durations {
                item.durations = Some(ItemDurations::Child(durations));
            }
            Self::touch(item, update.update_timestamp);
            changes.push(TreeChange::Item { id, created: false });
        }
    }

    fn apply_finished(
        &mut self,
        path: &str,
        finished: DeploymentFinished,
        changes: &mut Vec<TreeChange>,
    ) {
        if !path.is_empty() {
            let update = InstanceUpdate {
                instance_id: finished.instance_id,
                status: finished.status,
                durations: finished.durations,
                update_timestamp: finished.update_timestamp.max(finished.finish_timestamp),
            };
            self.apply_instance(path, update, changes);
            return;
        }

        self.root_status = finished.status;
        if finished.durations.is_some() {
            self.root_durations = finished.durations.clone();
        }

        let mut skipped = 0;
        let mut interrupted = 0;
        for item in &mut self.items {
            if item.is_waiting() {
                item.skipped = true;
                skipped += 1;
            } else if item.class().is_active() {
                // Rollback statuses have no interrupted variant; the flag still ends them
                item.status.interrupt();
                item.interrupted = true;
                interrupted += 1;
            }
        }
        debug!(
            status = finished.status.label(),
            skipped, interrupted, "deployment finished"
        );

        self.finish = Some(FinishInfo {
            status: finished.status,
            failure_reasons: finished.failure_reasons,
            finish_timestamp: finished.finish_timestamp,
            durations: finished.durations,
        });
        changes.push(TreeChange::Finished);
    }

    fn touch(item: &mut DeployItem, timestamp: i64) {
        if timestamp > 0 {
            item.last_update = Some(timestamp);
        }
        item.seen = true;
        item.skipped = false;
        item.interrupted = false;
    }

    // ─────────────────────────────────────────────────────────────
    // Instance state enrichment
    // ─────────────────────────────────────────────────────────────

    /// Attach the instance state fetched from the engine after the
    /// deployment (resource IDs, spec data, exports)
    pub fn attach_instance_state(&mut self, state: InstanceState) {
        if self.root_instance_id.is_none() && !state.instance_id.is_empty() {
            self.set_root(&state.instance_id);
        }
        if self.instance_name.is_none() && !state.instance_name.is_empty() {
            self.instance_name = Some(state.instance_name.clone());
        }

        let mut child_ids = Vec::new();
        collect_child_instance_ids(&state, "", &mut child_ids);
        for (instance_id, path) in &child_ids {
            self.instance_paths
                .entry(instance_id.clone())
                .or_insert_with(|| path.clone());
        }

        for item in &mut self.items {
            match item.kind {
                ItemKind::Resource => {
                    if let Some(resource) = state.resource_at(&item.path) {
                        if item.element_id.is_none() && !resource.resource_id.is_empty() {
                            item.element_id = Some(resource.resource_id.clone());
                        }
                        if item.resource_type.is_none() && !resource.resource_type.is_empty() {
                            item.resource_type = Some(resource.resource_type.clone());
                        }
                        if !resource.spec_data.is_null() {
                            item.spec_data = Some(resource.spec_data.clone());
                        }
                    }
                }
                ItemKind::Child => {
                    if let Some(child) = state.descend(&item.path) {
                        if item.element_id.is_none() && !child.instance_id.is_empty() {
                            item.element_id = Some(child.instance_id.clone());
                        }
                    }
                }
                ItemKind::Link => {}
            }
        }

        self.instance_state = Some(state);

        let mut changes = Vec::new();
        for (instance_id, _) in child_ids {
            self.replay_parked(&instance_id, &mut changes);
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────

    pub fn items(&self) -> &[DeployItem] {
        &self.items
    }

    pub fn item(&self, id: ItemId) -> Option<&DeployItem> {
        self.items.get(id)
    }

    pub fn find(&self, kind: ItemKind, path: &str) -> Option<ItemId> {
        self.index.get(&(kind, path.to_string())).copied()
    }

    pub fn get(&self, kind: ItemKind, path: &str) -> Option<&DeployItem> {
        self.find(kind, path).map(|id| &self.items[id])
    }

    /// Items directly under a child path, ordered resources → children →
    /// links, each by name
    pub fn level(&self, parent: &str) -> Vec<ItemId> {
        let mut ids: Vec<ItemId> = self
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.parent == parent)
            .map(|(id, _)| id)
            .collect();
        ids.sort_by(|&a, &b| {
            let (a, b) = (&self.items[a], &self.items[b]);
            a.kind.rank().cmp(&b.kind.rank()).then_with(|| a.name.cmp(&b.name))
        });
        ids
    }

    /// Every item below a child path (any depth)
    pub fn descendants<'a>(
        &'a self,
        child_path: &'a str,
    ) -> impl Iterator<Item = &'a DeployItem> + 'a {
        let prefix = format!("{}/", child_path);
        self.items
            .iter()
            .filter(move |item| child_path.is_empty() || item.path.starts_with(&prefix))
    }

    pub fn summary(&self) -> DeploySummary {
        DeploySummary::from_items(&self.items)
    }

    /// Summary restricted to a child blueprint's subtree
    pub fn subtree_summary(&self, child_path: &str) -> DeploySummary {
        DeploySummary::from_items(self.descendants(child_path))
    }

    /// `(done, total)` over actionable items
    pub fn progress(&self) -> (usize, usize) {
        self.items
            .iter()
            .filter(|item| item.is_actionable())
            .fold((0, 0), |(done, total), item| {
                (done + usize::from(item.is_done()), total + 1)
            })
    }

    /// Failed, interrupted or rollback-failed items ordered by path
    pub fn failures(&self) -> Vec<&DeployItem> {
        let mut failed: Vec<&DeployItem> = self
            .items
            .iter()
            .filter(|item| item.class().is_failure())
            .collect();
        failed.sort_by(|a, b| a.path.cmp(&b.path));
        failed
    }

    pub fn root_instance_id(&self) -> Option<&str> {
        self.root_instance_id.as_deref()
    }

    /// Name to show for the deployment (instance name, else ID)
    pub fn display_name(&self) -> &str {
        self.instance_name
            .as_deref()
            .or(self.root_instance_id.as_deref())
            .unwrap_or("blueprint")
    }

    pub fn root_status(&self) -> InstanceStatus {
        self.root_status
    }

    pub fn root_durations(&self) -> Option<&InstanceDurations> {
        self.root_durations.as_ref()
    }

    pub fn finish(&self) -> Option<&FinishInfo> {
        self.finish.as_ref()
    }

    pub fn is_finished(&self) -> bool {
        self.finish.is_some()
    }

    /// Finished cleanly with no failed item anywhere in the tree
    pub fn succeeded(&self) -> bool {
        self.finish
            .as_ref()
            .is_some_and(|f| f.status.class() == StatusClass::Succeeded)
            && self.failures().is_empty()
    }

    /// Total deployment time, from engine durations or observed timestamps
    pub fn elapsed_ms(&self) -> Option<f64> {
        self.root_durations
            .as_ref()
            .and_then(|d| d.total_ms)
            .or_else(|| self.observed_span_secs().map(|s| s as f64 * 1000.0))
    }

    /// Seconds between the first and latest event timestamps
    pub fn observed_span_secs(&self) -> Option<i64> {
        Some(self.last_update? - self.first_update?)
    }

    pub fn pending_events(&self) -> usize {
        self.pending.len()
    }

    pub fn instance_state(&self) -> Option<&InstanceState> {
        self.instance_state.as_ref()
    }

    pub fn path_of_instance(&self, instance_id: &str) -> Option<&str> {
        self.instance_paths.get(instance_id).map(String::as_str)
    }
}

fn collect_child_instance_ids(state: &InstanceState, path: &str, out: &mut Vec<(String, String)>) {
    for (name, child) in &state.child_blueprints {
        let child_path = join_path(path, name);
        if !child.instance_id.is_empty() {
            out.push((child.instance_id.clone(), child_path.clone()));
        }
        collect_child_instance_ids(child, &child_path, out);
    }
}
