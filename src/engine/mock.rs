//! Mock Engine - For testing and demo purposes
//!
//! Plays a scripted deployment of a small "orders-api" blueprint: a nested
//! child blueprint, two links, a retried resource and (optionally) a failed
//! update followed by a rollback.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::mpsc;
use tokio::time::{self, Duration};
use tokio_stream::wrappers::ReceiverStream;
use tracing::debug;

use super::{DeployEngine, DeployEventStream};
use crate::changeset::{
    BlueprintChanges, FieldChange, LinkChanges, NewBlueprintDefinition, ProvisionChanges,
    ResourceChanges,
};
use crate::error::{DeployViewError, Result};
use crate::event::{
    ChildUpdate, DeployEvent, DeploymentFinished, InstanceDurations, InstanceStatus,
    InstanceUpdate, LinkDurations, LinkStageDurations, LinkStatus, LinkUpdate,
    PreciseLinkStatus, PreciseResourceStatus, ResourceDurations, ResourceStatus, ResourceUpdate,
};
use crate::instance::{InstanceState, ResourceState};

pub const DEMO_INSTANCE_ID: &str = "demo-orders-api";
const NETWORKING_INSTANCE_ID: &str = "demo-networking";
const DNS_INSTANCE_ID: &str = "demo-dns";

/// Mock engine that plays a scripted deployment
#[derive(Debug, Clone)]
pub struct MockEngine {
    pace: Duration,
    fail: bool,
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEngine {
    pub fn new() -> Self {
        Self {
            pace: Duration::from_millis(350),
            fail: false,
        }
    }

    pub fn with_pace(mut self, pace: Duration) -> Self {
        self.pace = pace;
        self
    }

    /// Fail the API gateway update and roll the deployment back
    pub fn with_failure(mut self, fail: bool) -> Self {
        self.fail = fail;
        self
    }

    /// The full event script, timestamps counting up from `start`
    pub fn script(&self, start: i64) -> Vec<DeployEvent> {
        let mut s = Script::new(start);
        let root = DEMO_INSTANCE_ID;

        s.instance(root, InstanceStatus::Preparing);
        s.instance(root, InstanceStatus::Deploying);

        // Group 0: storage and the removed worker
        s.resource(
            root,
            "ordersTable",
            0,
            ResourceStatus::Creating,
            PreciseResourceStatus::Creating,
        );
        s.resource(
            root,
            "ordersQueue",
            0,
            ResourceStatus::Creating,
            PreciseResourceStatus::Creating,
        );
        s.resource(
            root,
            "legacyWorker",
            0,
            ResourceStatus::Destroying,
            PreciseResourceStatus::Destroying,
        );
        s.child(root, NETWORKING_INSTANCE_ID, "networking", 0, InstanceStatus::Deploying);
        s.resource(
            NETWORKING_INSTANCE_ID,
            "vpc",
            0,
            ResourceStatus::Creating,
            PreciseResourceStatus::Creating,
        );
        s.resource(
            root,
            "ordersTable",
            0,
            ResourceStatus::Creating,
            PreciseResourceStatus::ConfigComplete,
        );
        s.resource_done(
            root,
            "ordersQueue",
            0,
            ResourceStatus::Created,
            PreciseResourceStatus::Created,
            1_840.0,
        );
        s.resource_done(
            root,
            "legacyWorker",
            0,
            ResourceStatus::Destroyed,
            PreciseResourceStatus::Destroyed,
            960.0,
        );
        s.resource_done(
            root,
            "ordersTable",
            0,
            ResourceStatus::Created,
            PreciseResourceStatus::Created,
            6_420.0,
        );

        // Nested child blueprints
        s.resource_done(
            NETWORKING_INSTANCE_ID,
            "vpc",
            0,
            ResourceStatus::Created,
            PreciseResourceStatus::Created,
            3_150.0,
        );
        s.resource(
            NETWORKING_INSTANCE_ID,
            "privateSubnet",
            1,
            ResourceStatus::Creating,
            PreciseResourceStatus::Creating,
        );
        s.child(NETWORKING_INSTANCE_ID, DNS_INSTANCE_ID, "dns", 1, InstanceStatus::Deploying);
        s.resource(
            DNS_INSTANCE_ID,
            "hostedZone",
            0,
            ResourceStatus::Creating,
            PreciseResourceStatus::Creating,
        );
        s.resource_done(
            DNS_INSTANCE_ID,
            "hostedZone",
            0,
            ResourceStatus::Created,
            PreciseResourceStatus::Created,
            2_210.0,
        );
        s.child_done(
            NETWORKING_INSTANCE_ID,
            DNS_INSTANCE_ID,
            "dns",
            1,
            InstanceStatus::Deployed,
            2_600.0,
        );
        s.resource_done(
            NETWORKING_INSTANCE_ID,
            "privateSubnet",
            1,
            ResourceStatus::Created,
            PreciseResourceStatus::Created,
            1_480.0,
        );
        s.child_done(
            root,
            NETWORKING_INSTANCE_ID,
            "networking",
            0,
            InstanceStatus::Deployed,
            8_900.0,
        );

        // Group 1: the function needs a second attempt
        s.resource(
            root,
            "processOrderFn",
            1,
            ResourceStatus::Creating,
            PreciseResourceStatus::Creating,
        );
        let mut failed = s.resource_update(
            root,
            "processOrderFn",
            1,
            ResourceStatus::CreateFailed,
            PreciseResourceStatus::CreateFailed,
        );
        failed.failure_reasons =
            vec!["Rate exceeded: too many concurrent function creations".into()];
        failed.can_retry = true;
        s.push(DeployEvent::Resource(failed));
        let mut retry = s.resource_update(
            root,
            "processOrderFn",
            1,
            ResourceStatus::Creating,
            PreciseResourceStatus::Creating,
        );
        retry.attempt = 2;
        s.push(DeployEvent::Resource(retry));
        let mut created = s.resource_update(
            root,
            "processOrderFn",
            1,
            ResourceStatus::Created,
            PreciseResourceStatus::Created,
        );
        created.attempt = 2;
        created.durations = Some(ResourceDurations {
            config_complete_ms: Some(3_900.0),
            total_ms: Some(7_250.0),
            attempt_ms: vec![1_100.0, 6_150.0],
        });
        s.push(DeployEvent::Resource(created));

        // Group 2: the gateway update
        s.resource(
            root,
            "apiGateway",
            2,
            ResourceStatus::Updating,
            PreciseResourceStatus::Updating,
        );

        if self.fail {
            let mut failed = s.resource_update(
                root,
                "apiGateway",
                2,
                ResourceStatus::UpdateFailed,
                PreciseResourceStatus::UpdateFailed,
            );
            failed.failure_reasons = vec![
                "AccessDenied: not authorized to perform apigateway:UpdateStage".into(),
            ];
            s.push(DeployEvent::Resource(failed));

            s.instance(root, InstanceStatus::DeployRollingBack);
            s.resource(
                root,
                "processOrderFn",
                1,
                ResourceStatus::RollingBack,
                PreciseResourceStatus::CreateRollingBack,
            );
            s.resource(
                root,
                "ordersTable",
                0,
                ResourceStatus::RollingBack,
                PreciseResourceStatus::CreateRollingBack,
            );
            s.resource(
                root,
                "processOrderFn",
                1,
                ResourceStatus::RollbackComplete,
                PreciseResourceStatus::CreateRollbackComplete,
            );
            s.resource(
                root,
                "ordersTable",
                0,
                ResourceStatus::RollbackComplete,
                PreciseResourceStatus::CreateRollbackComplete,
            );
            s.finish(
                root,
                InstanceStatus::DeployRollbackComplete,
                vec!["apiGateway: update failed, deployment rolled back".into()],
            );
            return s.events;
        }

        s.resource_done(
            root,
            "apiGateway",
            2,
            ResourceStatus::Updated,
            PreciseResourceStatus::Updated,
            2_700.0,
        );

        // Links once both ends are in place
        s.link(
            root,
            "processOrderFn::ordersTable",
            LinkStatus::Creating,
            PreciseLinkStatus::UpdatingResourceA,
        );
        s.link(
            root,
            "apiGateway::processOrderFn",
            LinkStatus::Creating,
            PreciseLinkStatus::UpdatingResourceA,
        );
        s.link(
            root,
            "processOrderFn::ordersTable",
            LinkStatus::Creating,
            PreciseLinkStatus::UpdatingResourceB,
        );
        s.link_done(root, "apiGateway::processOrderFn", 1_300.0);
        s.link_done(root, "processOrderFn::ordersTable", 2_450.0);

        s.instance(root, InstanceStatus::Deployed);
        s.finish(root, InstanceStatus::Deployed, Vec::new());
        s.events
    }
}

#[async_trait]
impl DeployEngine for MockEngine {
    async fn stream_deploy_events(&self, instance_id: Option<&str>) -> Result<DeployEventStream> {
        if let Some(id) = instance_id.filter(|id| *id != DEMO_INSTANCE_ID) {
            return Err(DeployViewError::InstanceNotFound {
                instance_id: id.to_string(),
            });
        }

        let events = self.script(chrono::Utc::now().timestamp());
        let pace = self.pace;
        let (tx, rx) = mpsc::channel(events.len().max(1));
        tokio::spawn(async move {
            for event in events {
                if tx.send(Ok(event)).await.is_err() {
                    debug!("demo receiver dropped");
                    return;
                }
                if !pace.is_zero() {
                    time::sleep(pace).await;
                }
            }
        });
        Ok(Box::new(ReceiverStream::new(rx)))
    }

    async fn get_blueprint_instance(&self, instance_id: &str) -> Result<InstanceState> {
        if instance_id != DEMO_INSTANCE_ID {
            return Err(DeployViewError::InstanceNotFound {
                instance_id: instance_id.to_string(),
            });
        }
        Ok(demo_instance_state(self.fail))
    }
}

/// Changeset matching the demo script
pub fn demo_changeset() -> BlueprintChanges {
    let field = |path: &str, prev: Option<serde_json::Value>, new: serde_json::Value| FieldChange {
        field_path: path.to_string(),
        prev_value: prev,
        new_value: Some(new),
        must_recreate: false,
    };
    let provision = |resource_type: &str, fields: Vec<FieldChange>| ProvisionChanges {
        resource_type: resource_type.to_string(),
        new_fields: fields,
    };

    let mut changes = BlueprintChanges::default();
    changes.new_resources.insert(
        "ordersTable".into(),
        provision(
            "aws/dynamodb/table",
            vec![
                field("spec.tableName", None, json!("orders")),
                field("spec.billingMode", None, json!("PAY_PER_REQUEST")),
            ],
        ),
    );
    changes.new_resources.insert(
        "ordersQueue".into(),
        provision("aws/sqs/queue", vec![field("spec.queueName", None, json!("orders"))]),
    );
    changes.new_resources.insert(
        "processOrderFn".into(),
        provision(
            "aws/lambda/function",
            vec![
                field("spec.handler", None, json!("orders.process")),
                field("spec.memorySize", None, json!(512)),
            ],
        ),
    );

    let mut gateway = ResourceChanges {
        resource_type: "aws/apigateway/api".into(),
        modified_fields: vec![field("spec.stageName", Some(json!("v1")), json!("v2"))],
        unchanged_fields: vec!["spec.name".into()],
        ..Default::default()
    };
    gateway
        .new_outbound_links
        .insert("processOrderFn".into(), LinkChanges::default());
    changes.resource_changes.insert("apiGateway".into(), gateway);

    // The new function also links out to the table
    let mut function_links = ResourceChanges {
        resource_type: "aws/lambda/function".into(),
        ..Default::default()
    };
    function_links
        .new_outbound_links
        .insert("ordersTable".into(), LinkChanges::default());
    changes
        .resource_changes
        .insert("processOrderFn".into(), function_links);

    changes.resource_changes.insert(
        "ordersRole".into(),
        ResourceChanges {
            resource_type: "aws/iam/role".into(),
            unchanged_fields: vec!["spec.roleName".into()],
            ..Default::default()
        },
    );
    changes.removed_resources.push("legacyWorker".into());

    let mut dns = NewBlueprintDefinition::default();
    dns.new_resources.insert(
        "hostedZone".into(),
        provision(
            "aws/route53/hostedZone",
            vec![field("spec.name", None, json!("orders.internal"))],
        ),
    );
    let mut networking = NewBlueprintDefinition::default();
    networking.new_resources.insert(
        "vpc".into(),
        provision("aws/ec2/vpc", vec![field("spec.cidrBlock", None, json!("10.0.0.0/16"))]),
    );
    networking.new_resources.insert(
        "privateSubnet".into(),
        provision("aws/ec2/subnet", vec![field("spec.cidrBlock", None, json!("10.0.1.0/24"))]),
    );
    networking.new_children.insert("dns".into(), dns);
    changes.new_children.insert("networking".into(), networking);

    changes.new_exports.insert(
        "apiUrl".into(),
        FieldChange {
            field_path: "exports.apiUrl".into(),
            ..Default::default()
        },
    );
    changes
        .resolve_on_deploy
        .push("resources.processOrderFn.spec.arn".into());
    changes
}

fn demo_instance_state(failed: bool) -> InstanceState {
    let resource = |id: &str, resource_type: &str, status, spec: serde_json::Value| ResourceState {
        resource_id: id.to_string(),
        resource_type: resource_type.to_string(),
        status,
        spec_data: spec,
    };

    let mut dns = InstanceState {
        instance_id: DNS_INSTANCE_ID.into(),
        instance_name: "dns".into(),
        status: InstanceStatus::Deployed,
        ..Default::default()
    };
    dns.resources.insert(
        "hostedZone".into(),
        resource(
            "res-hostedZone",
            "aws/route53/hostedZone",
            ResourceStatus::Created,
            json!({"name": "orders.internal", "id": "Z0832DEMO"}),
        ),
    );

    let mut networking = InstanceState {
        instance_id: NETWORKING_INSTANCE_ID.into(),
        instance_name: "networking".into(),
        status: InstanceStatus::Deployed,
        ..Default::default()
    };
    networking.resources.insert(
        "vpc".into(),
        resource(
            "res-vpc",
            "aws/ec2/vpc",
            ResourceStatus::Created,
            json!({"cidrBlock": "10.0.0.0/16", "vpcId": "vpc-0a1b2c3d"}),
        ),
    );
    networking.resources.insert(
        "privateSubnet".into(),
        resource(
            "res-privateSubnet",
            "aws/ec2/subnet",
            ResourceStatus::Created,
            json!({"cidrBlock": "10.0.1.0/24", "subnetId": "subnet-9f8e7d"}),
        ),
    );
    networking.child_blueprints.insert("dns".into(), dns);

    let mut state = InstanceState {
        instance_id: DEMO_INSTANCE_ID.into(),
        instance_name: "orders-api".into(),
        status: if failed {
            InstanceStatus::DeployRollbackComplete
        } else {
            InstanceStatus::Deployed
        },
        ..Default::default()
    };
    state.child_blueprints.insert("networking".into(), networking);
    state.resources.insert(
        "ordersQueue".into(),
        resource(
            "res-ordersQueue",
            "aws/sqs/queue",
            ResourceStatus::Created,
            json!({"queueName": "orders", "queueUrl": "https://sqs.local/000000000000/orders"}),
        ),
    );
    state.resources.insert(
        "ordersRole".into(),
        resource(
            "res-ordersRole",
            "aws/iam/role",
            ResourceStatus::Created,
            json!({"roleName": "orders"}),
        ),
    );

    if !failed {
        state.resources.insert(
            "ordersTable".into(),
            resource(
                "res-ordersTable",
                "aws/dynamodb/table",
                ResourceStatus::Created,
                json!({"tableName": "orders", "billingMode": "PAY_PER_REQUEST"}),
            ),
        );
        state.resources.insert(
            "processOrderFn".into(),
            resource(
                "res-processOrderFn",
                "aws/lambda/function",
                ResourceStatus::Created,
                json!({
                    "handler": "orders.process",
                    "memorySize": 512,
                    "arn": "arn:aws:lambda:demo:processOrderFn"
                }),
            ),
        );
        state.exports = BTreeMap::from([(
            "apiUrl".to_string(),
            json!("https://api.orders.example.com/v2"),
        )]);
    }
    let stage = if failed { "v1" } else { "v2" };
    state.resources.insert(
        "apiGateway".into(),
        resource(
            "res-apiGateway",
            "aws/apigateway/api",
            ResourceStatus::Updated,
            json!({"name": "orders", "stageName": stage}),
        ),
    );
    state
}

/// Builds the scripted event sequence
struct Script {
    events: Vec<DeployEvent>,
    now: i64,
}

impl Script {
    fn new(start: i64) -> Self {
        Self {
            events: Vec::new(),
            now: start,
        }
    }

    fn push(&mut self, event: DeployEvent) {
        self.events.push(event);
    }

    fn tick(&mut self) -> i64 {
        self.now += 1;
        self.now
    }

    fn instance(&mut self, instance_id: &str, status: InstanceStatus) {
        let update_timestamp = self.tick();
        self.push(DeployEvent::Instance(InstanceUpdate {
            instance_id: instance_id.into(),
            status,
            durations: None,
            update_timestamp,
        }));
    }

    fn resource_update(
        &mut self,
        instance_id: &str,
        name: &str,
        group: usize,
        status: ResourceStatus,
        precise_status: PreciseResourceStatus,
    ) -> ResourceUpdate {
        ResourceUpdate {
            instance_id: instance_id.into(),
            resource_id: format!("res-{}", name),
            resource_name: name.into(),
            group,
            status,
            precise_status,
            failure_reasons: Vec::new(),
            attempt: 1,
            can_retry: false,
            durations: None,
            update_timestamp: self.tick(),
        }
    }

    fn resource(
        &mut self,
        instance_id: &str,
        name: &str,
        group: usize,
        status: ResourceStatus,
        precise: PreciseResourceStatus,
    ) {
        let update = self.resource_update(instance_id, name, group, status, precise);
        self.push(DeployEvent::Resource(update));
    }

    fn resource_done(
        &mut self,
        instance_id: &str,
        name: &str,
        group: usize,
        status: ResourceStatus,
        precise: PreciseResourceStatus,
        total_ms: f64,
    ) {
        let mut update = self.resource_update(instance_id, name, group, status, precise);
        update.durations = Some(ResourceDurations {
            config_complete_ms: Some(total_ms * 0.6),
            total_ms: Some(total_ms),
            attempt_ms: vec![total_ms],
        });
        self.push(DeployEvent::Resource(update));
    }

    fn child_update(
        &mut self,
        parent: &str,
        child: &str,
        name: &str,
        group: usize,
        status: InstanceStatus,
    ) -> ChildUpdate {
        ChildUpdate {
            parent_instance_id: parent.into(),
            child_instance_id: child.into(),
            child_name: name.into(),
            group,
            status,
            failure_reasons: Vec::new(),
            durations: None,
            update_timestamp: self.tick(),
        }
    }

    fn child(
        &mut self,
        parent: &str,
        child: &str,
        name: &str,
        group: usize,
        status: InstanceStatus,
    ) {
        let update = self.child_update(parent, child, name, group, status);
        self.push(DeployEvent::Child(update));
    }

    fn child_done(
        &mut self,
        parent: &str,
        child: &str,
        name: &str,
        group: usize,
        status: InstanceStatus,
        total_ms: f64,
    ) {
        let mut update = self.child_update(parent, child, name, group, status);
        update.durations = Some(InstanceDurations {
            prepare_ms: Some(240.0),
            total_ms: Some(total_ms),
        });
        self.push(DeployEvent::Child(update));
    }

    fn link_update(
        &mut self,
        instance_id: &str,
        name: &str,
        status: LinkStatus,
        precise: PreciseLinkStatus,
    ) -> LinkUpdate {
        LinkUpdate {
            instance_id: instance_id.into(),
            link_id: format!("link-{}", name.replace("::", "-")),
            link_name: name.into(),
            status,
            precise_status: precise,
            failure_reasons: Vec::new(),
            current_stage_attempt: 1,
            can_retry_current_stage: false,
            durations: None,
            update_timestamp: self.tick(),
        }
    }

    fn link(
        &mut self,
        instance_id: &str,
        name: &str,
        status: LinkStatus,
        precise: PreciseLinkStatus,
    ) {
        let update = self.link_update(instance_id, name, status, precise);
        self.push(DeployEvent::Link(update));
    }

    fn link_done(&mut self, instance_id: &str, name: &str, total_ms: f64) {
        let mut update = self.link_update(
            instance_id,
            name,
            LinkStatus::Created,
            PreciseLinkStatus::ResourceBUpdated,
        );
        let half = LinkStageDurations {
            total_ms: Some(total_ms / 2.0),
            attempt_ms: vec![total_ms / 2.0],
        };
        update.durations = Some(LinkDurations {
            resource_a_update: Some(half.clone()),
            resource_b_update: Some(half),
            intermediary_resources: None,
            total_ms: Some(total_ms),
        });
        self.push(DeployEvent::Link(update));
    }

    fn finish(&mut self, instance_id: &str, status: InstanceStatus, failure_reasons: Vec<String>) {
        let finish_timestamp = self.tick();
        self.push(DeployEvent::Finished(DeploymentFinished {
            instance_id: instance_id.into(),
            status,
            failure_reasons,
            finish_timestamp,
            update_timestamp: finish_timestamp,
            durations: Some(InstanceDurations {
                prepare_ms: Some(420.0),
                total_ms: Some(((finish_timestamp - self.events_start()) * 1000) as f64),
            }),
        }));
    }

    fn events_start(&self) -> i64 {
        self.events
            .first()
            .map(|e| e.timestamp())
            .unwrap_or(self.now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deploy::{DeployTree, ItemKind};
    use crate::event::StatusClass;
    use futures::StreamExt;

    fn play(engine: &MockEngine) -> DeployTree {
        let mut tree = DeployTree::from_changeset(Some(DEMO_INSTANCE_ID.into()), &demo_changeset());
        for event in engine.script(1_700_000_000) {
            tree.apply(&event);
        }
        tree
    }

    #[test]
    fn test_successful_demo_deploys_everything() {
        let tree = play(&MockEngine::new());

        assert!(tree.is_finished());
        assert_eq!(tree.root_status(), InstanceStatus::Deployed);
        assert!(tree.failures().is_empty());
        assert_eq!(tree.pending_events(), 0);
        let (done, total) = tree.progress();
        assert_eq!(done, total);

        let subnet = tree.get(ItemKind::Resource, "networking/privateSubnet").unwrap();
        assert_eq!(subnet.class(), StatusClass::Succeeded);
        let zone = tree.get(ItemKind::Resource, "networking/dns/hostedZone").unwrap();
        assert_eq!(zone.class(), StatusClass::Succeeded);

        let function = tree.get(ItemKind::Resource, "processOrderFn").unwrap();
        assert_eq!(function.attempt, 2);

        let link = tree.get(ItemKind::Link, "processOrderFn::ordersTable").unwrap();
        assert!(link.from_changeset);
        assert_eq!(link.class(), StatusClass::Succeeded);
        assert_eq!(function.action, crate::changeset::Action::Create);
        assert_eq!(function.new_fields.len(), 2);
    }

    #[test]
    fn test_failing_demo_rolls_back() {
        let tree = play(&MockEngine::new().with_failure(true));

        assert_eq!(tree.root_status(), InstanceStatus::DeployRollbackComplete);
        let failures: Vec<&str> = tree.failures().iter().map(|i| i.path.as_str()).collect();
        assert_eq!(failures, vec!["apiGateway"]);

        let table = tree.get(ItemKind::Resource, "ordersTable").unwrap();
        assert_eq!(table.class(), StatusClass::RolledBack);
        let link = tree.get(ItemKind::Link, "apiGateway::processOrderFn").unwrap();
        assert!(link.skipped);
    }

    #[tokio::test]
    async fn test_stream_yields_full_script() {
        let engine = MockEngine::new().with_pace(Duration::ZERO);
        let events: Vec<_> = engine
            .stream_deploy_events(Some(DEMO_INSTANCE_ID))
            .await
            .unwrap()
            .collect()
            .await;
        assert_eq!(events.len(), engine.script(0).len());
        assert!(matches!(events.last(), Some(Ok(DeployEvent::Finished(_)))));
    }

    #[tokio::test]
    async fn test_unknown_instance() {
        let engine = MockEngine::new();
        assert!(engine.stream_deploy_events(Some("other")).await.is_err());
        assert!(engine.get_blueprint_instance("other").await.is_err());
        let state = engine.get_blueprint_instance(DEMO_INSTANCE_ID).await.unwrap();
        assert_eq!(state.exports.len(), 1);
    }
}
