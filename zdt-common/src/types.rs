//! Common types used across ZDT components.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a provisioned target (project/namespace-like
/// grouping that workflows run against).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetId(pub String);

impl TargetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TargetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Coordinates needed to launch and later query one workflow instance.
///
/// Immutable after creation; one descriptor is built per verification
/// round, plus one baseline descriptor shared across the whole run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowDescriptor {
    /// Target the workflow runs against.
    pub target: TargetId,
    /// Component within the target (e.g. a service name).
    pub component: String,
    /// Stage within the target's blueprint.
    pub stage: String,
    /// Workflow name as declared in the blueprint.
    pub workflow: String,
}

impl WorkflowDescriptor {
    pub fn new(
        target: TargetId,
        component: impl Into<String>,
        stage: impl Into<String>,
        workflow: impl Into<String>,
    ) -> Self {
        Self {
            target,
            component: component.into(),
            stage: stage.into(),
            workflow: workflow.into(),
        }
    }

    /// Copy of this descriptor pointing at a different workflow name.
    pub fn with_workflow(&self, workflow: impl Into<String>) -> Self {
        Self {
            workflow: workflow.into(),
            ..self.clone()
        }
    }

    /// Event type that launches this workflow.
    pub fn triggered_event_type(&self) -> String {
        format!("{}.{}.triggered", self.stage, self.workflow)
    }

    /// Terminal event type that ends polling for this workflow.
    pub fn finished_event_type(&self) -> String {
        format!("{}.{}.finished", self.stage, self.workflow)
    }
}

impl std::fmt::Display for WorkflowDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.target, self.component, self.stage, self.workflow
        )
    }
}

/// Tracking context returned by a successful workflow launch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchReceipt {
    /// Opaque context identifier assigned by the platform.
    pub context_id: String,
}

/// One event observed on the platform's event store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowEvent {
    /// Fully qualified event type (e.g. `hardening.delivery.finished`).
    #[serde(rename = "type")]
    pub event_type: String,
    /// Context identifier linking the event to its workflow instance.
    pub context_id: String,
    /// Event timestamp.
    pub time: DateTime<Utc>,
    /// Event payload; terminal events are expected to carry one.
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl WorkflowEvent {
    /// Whether the event carries a non-empty payload.
    pub fn has_payload(&self) -> bool {
        match &self.payload {
            serde_json::Value::Null => false,
            serde_json::Value::Object(map) => !map.is_empty(),
            serde_json::Value::String(s) => !s.is_empty(),
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn descriptor_event_types() {
        let desc = WorkflowDescriptor::new(TargetId::new("shop"), "app", "hardening", "delivery");
        assert_eq!(desc.triggered_event_type(), "hardening.delivery.triggered");
        assert_eq!(desc.finished_event_type(), "hardening.delivery.finished");
    }

    #[test]
    fn with_workflow_keeps_coordinates() {
        let desc = WorkflowDescriptor::new(TargetId::new("shop"), "app", "hardening", "delivery");
        let other = desc.with_workflow("rollback");
        assert_eq!(other.target, desc.target);
        assert_eq!(other.stage, desc.stage);
        assert_eq!(other.workflow, "rollback");
        assert_eq!(desc.workflow, "delivery");
    }

    #[test]
    fn event_payload_presence() {
        let mut event = WorkflowEvent {
            event_type: "hardening.delivery.finished".to_string(),
            context_id: "ctx-1".to_string(),
            time: Utc::now(),
            payload: serde_json::Value::Null,
        };
        assert!(!event.has_payload());

        event.payload = json!({});
        assert!(!event.has_payload());

        event.payload = json!({ "result": "pass" });
        assert!(event.has_payload());
    }
}
