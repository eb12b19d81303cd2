//! Declarative orchestration plans.

use parley_a2a::{Artifact, Part};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Where a step's call goes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Target {
    /// Any registered agent advertising this skill
    Skill(String),
    /// The agent registered at this endpoint
    Endpoint(String),
}

impl Target {
    pub fn skill(id: impl Into<String>) -> Self {
        Target::Skill(id.into())
    }

    pub fn endpoint(url: impl Into<String>) -> Self {
        Target::Endpoint(url.into())
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Skill(id) => write!(f, "skill:{id}"),
            Target::Endpoint(url) => write!(f, "endpoint:{url}"),
        }
    }
}

/// One call in a sequential or parallel plan
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub target: Target,
    /// Sent as the first text part, ahead of the step's input
    pub instruction: Option<String>,
}

impl Step {
    /// A step calling an agent by skill
    pub fn skill(id: impl Into<String>) -> Self {
        Self {
            target: Target::skill(id),
            instruction: None,
        }
    }

    /// A step calling the agent registered at an endpoint
    pub fn endpoint(url: impl Into<String>) -> Self {
        Self {
            target: Target::endpoint(url),
            instruction: None,
        }
    }

    /// Prefix the step's input with an instruction
    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = Some(instruction.into());
        self
    }

    /// Message parts for this step: the instruction, then the carried input
    pub(crate) fn parts(&self, input: &[Part]) -> Vec<Part> {
        self.instruction
            .iter()
            .map(Part::text)
            .chain(input.iter().cloned())
            .collect()
    }
}

type ClassifyFn = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Produces the label a routed plan dispatches on
#[derive(Clone)]
pub enum Classifier {
    /// Call an agent with this skill; its first artifact's text is the label
    Skill(String),
    /// Compute the label locally from the task input
    Function(ClassifyFn),
}

impl Classifier {
    pub fn skill(id: impl Into<String>) -> Self {
        Classifier::Skill(id.into())
    }

    pub fn function(f: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        Classifier::Function(Arc::new(f))
    }
}

impl fmt::Debug for Classifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classifier::Skill(id) => f.debug_tuple("Skill").field(id).finish(),
            Classifier::Function(_) => f.write_str("Function(..)"),
        }
    }
}

/// Label → skill mapping for dynamic routing
///
/// Labels are compared after trimming and lowercasing.
#[derive(Debug, Clone)]
pub struct RoutingTable {
    pub classifier: Classifier,
    pub routes: HashMap<String, String>,
    pub default: Option<String>,
}

impl RoutingTable {
    pub fn new(classifier: Classifier) -> Self {
        Self {
            classifier,
            routes: HashMap::new(),
            default: None,
        }
    }

    /// Send tasks classified as `label` to `skill`
    pub fn route(mut self, label: impl AsRef<str>, skill: impl Into<String>) -> Self {
        self.routes.insert(normalize_label(label.as_ref()), skill.into());
        self
    }

    /// Skill used when the label matches no route
    pub fn with_default(mut self, skill: impl Into<String>) -> Self {
        self.default = Some(skill.into());
        self
    }

    /// Resolve a label to `(skill, used_default)`
    pub fn resolve(&self, label: &str) -> Option<(&str, bool)> {
        match self.routes.get(&normalize_label(label)) {
            Some(skill) => Some((skill.as_str(), false)),
            None => self.default.as_deref().map(|skill| (skill, true)),
        }
    }
}

pub(crate) fn normalize_label(label: &str) -> String {
    label.trim().to_lowercase()
}

/// What a delegation node does with one routing key
#[derive(Debug, Clone)]
pub enum Delegate {
    /// Call this target
    Terminal(Target),
    /// Hand the remaining key path to a nested node
    Nested(Box<DelegationNode>),
}

/// A node of a hierarchical plan, keyed by one segment of the routing key
#[derive(Debug, Clone)]
pub struct DelegationNode {
    pub name: String,
    pub routes: HashMap<String, Delegate>,
}

impl DelegationNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            routes: HashMap::new(),
        }
    }

    /// Handle `key` by calling `target`
    pub fn route(mut self, key: impl Into<String>, target: Target) -> Self {
        self.routes.insert(key.into(), Delegate::Terminal(target));
        self
    }

    /// Handle `key` by delegating to a nested node
    pub fn delegate(mut self, key: impl Into<String>, node: DelegationNode) -> Self {
        self.routes.insert(key.into(), Delegate::Nested(Box::new(node)));
        self
    }
}

/// How a set of agent calls composes
#[derive(Debug, Clone)]
pub enum OrchestrationPlan {
    /// Each step receives the previous step's artifacts
    Sequential(Vec<Step>),
    /// All branches receive the task and run concurrently
    Parallel(Vec<Step>),
    /// A classifier picks exactly one skill
    DynamicRouting(RoutingTable),
    /// The task's routing key walks a tree of delegation nodes
    Hierarchical(DelegationNode),
}

impl OrchestrationPlan {
    /// Topology name used in errors and logs
    pub fn topology(&self) -> &'static str {
        match self {
            OrchestrationPlan::Sequential(_) => "sequential",
            OrchestrationPlan::Parallel(_) => "parallel",
            OrchestrationPlan::DynamicRouting(_) => "dynamic-routing",
            OrchestrationPlan::Hierarchical(_) => "hierarchical",
        }
    }
}

/// Input to a plan
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Task {
    /// Text sent to the first call
    pub input: String,
    /// Structured payload sent after the text
    pub data: Option<Value>,
    /// Key path for hierarchical plans, outermost segment first
    pub routing_key: Vec<String>,
}

impl Task {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            ..Self::default()
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_routing_key<I, S>(mut self, key: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.routing_key = key.into_iter().map(Into::into).collect();
        self
    }

    /// The task as message parts: input text, then data
    pub(crate) fn parts(&self) -> Vec<Part> {
        let mut parts = vec![Part::text(self.input.clone())];
        if let Some(data) = &self.data {
            parts.push(Part::json(data.clone()));
        }
        parts
    }
}

/// One executed call
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepRecord {
    /// Position in the plan (declared order)
    pub index: usize,
    pub target: Target,
    /// Agent that served the call
    pub agent_id: String,
    pub artifacts: Vec<Artifact>,
}

/// The branch a routed plan took
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteDecision {
    /// Classifier label, or the routing key path joined with `/`
    pub label: String,
    pub target: Target,
    pub used_default: bool,
}

/// Result of executing a plan
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestrationOutcome {
    /// Final artifacts: the last step's for sequential and routed plans,
    /// every branch's in declared order for parallel plans
    pub artifacts: Vec<Artifact>,
    pub steps: Vec<StepRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<RouteDecision>,
}

impl OrchestrationOutcome {
    /// Text of the final artifacts
    pub fn text(&self) -> String {
        parley_a2a::artifacts_text(&self.artifacts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routing_table_normalizes_labels() {
        let table = RoutingTable::new(Classifier::skill("classify"))
            .route("Legal", "legal-review")
            .with_default("general");

        assert_eq!(table.resolve("  LEGAL\n"), Some(("legal-review", false)));
        assert_eq!(table.resolve("xyz"), Some(("general", true)));
    }

    #[test]
    fn test_routing_table_without_default() {
        let table = RoutingTable::new(Classifier::function(|_| "x".into())).route("legal", "legal");
        assert_eq!(table.resolve("xyz"), None);
    }

    #[test]
    fn test_step_parts_put_instruction_first() {
        let step = Step::skill("summarize").with_instruction("Summarize:");
        let parts = step.parts(&Task::new("long text").with_data(serde_json::json!({"n": 1})).parts());

        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].as_text(), Some("Summarize:"));
        assert_eq!(parts[1].as_text(), Some("long text"));
        assert!(parts[2].as_data().is_some());
    }

    #[test]
    fn test_outcome_serializes_route() {
        let outcome = OrchestrationOutcome {
            artifacts: vec![],
            steps: vec![],
            route: Some(RouteDecision {
                label: "legal".into(),
                target: Target::skill("legal-review"),
                used_default: false,
            }),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["route"]["target"]["kind"], "skill");
        assert_eq!(json["route"]["usedDefault"], false);
    }

    #[test]
    fn test_target_display() {
        assert_eq!(Target::skill("legal").to_string(), "skill:legal");
        assert_eq!(
            Target::endpoint("https://a.example.com").to_string(),
            "endpoint:https://a.example.com"
        );
    }
}
