//! Plan execution over registered agents.

use futures::future::join_all;
use parley_a2a::{Artifact, Message, Part, Role};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::plan::{
    Classifier, Delegate, DelegationNode, OrchestrationOutcome, OrchestrationPlan, RouteDecision,
    RoutingTable, Step, StepRecord, Target, Task, normalize_label,
};
use crate::error::{AgentError, AgentResult};
use crate::registry::{AgentRegistry, RegisteredAgent};

/// Executes orchestration plans against an agent registry.
///
/// # Example
/// ```rust,ignore
/// let orchestrator = Orchestrator::new(Arc::new(registry));
///
/// let plan = OrchestrationPlan::Sequential(vec![
///     Step::skill("extract"),
///     Step::skill("summarize").with_instruction("Summarize the findings"),
/// ]);
///
/// let outcome = orchestrator.execute(&plan, &Task::new("contract text")).await?;
/// println!("{}", outcome.text());
/// ```
#[derive(Debug, Clone)]
pub struct Orchestrator {
    registry: Arc<AgentRegistry>,
}

impl Orchestrator {
    /// Create an orchestrator over a populated registry.
    pub fn new(registry: Arc<AgentRegistry>) -> Self {
        Self { registry }
    }

    /// The registry agents are resolved from.
    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    /// Execute a plan to completion.
    ///
    /// # Errors
    ///
    /// - `AgentError::Routing` when a target cannot be resolved or a routed
    ///   plan has no branch for the task.
    /// - `AgentError::Orchestration` naming the failed step when a call fails.
    pub async fn execute(
        &self,
        plan: &OrchestrationPlan,
        task: &Task,
    ) -> AgentResult<OrchestrationOutcome> {
        let topology = plan.topology();
        debug!(topology, "Executing plan");

        let outcome = match plan {
            OrchestrationPlan::Sequential(steps) => self.run_sequential(steps, task).await,
            OrchestrationPlan::Parallel(branches) => self.run_parallel(branches, task).await,
            OrchestrationPlan::DynamicRouting(table) => self.run_routing(table, task).await,
            OrchestrationPlan::Hierarchical(root) => self.run_hierarchical(root, task).await,
        };

        match &outcome {
            Ok(outcome) => info!(
                topology,
                steps = outcome.steps.len(),
                artifacts = outcome.artifacts.len(),
                "Orchestration completed"
            ),
            Err(e) => warn!(topology, error = %e, "Orchestration failed"),
        }
        outcome
    }

    /// Execute a plan, abandoning it when `signal` completes first.
    ///
    /// Pending calls are dropped on cancellation. Requests already sent are
    /// not recalled.
    pub async fn execute_until<F>(
        &self,
        plan: &OrchestrationPlan,
        task: &Task,
        signal: F,
    ) -> AgentResult<OrchestrationOutcome>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            outcome = self.execute(plan, task) => outcome,
            () = signal => {
                warn!(topology = plan.topology(), "Orchestration cancelled");
                Err(AgentError::Cancelled)
            }
        }
    }

    /// Pick the agent serving a target.
    ///
    /// Among several agents with the same skill, the first one whose circuit
    /// admits calls wins; if none does, the first registered is used.
    fn resolve(&self, target: &Target) -> AgentResult<RegisteredAgent> {
        match target {
            Target::Skill(skill) => {
                let candidates = self.registry.find_by_skill(skill);
                let chosen = candidates
                    .iter()
                    .find(|a| a.client.is_available())
                    .or_else(|| candidates.first())
                    .cloned()
                    .ok_or_else(|| {
                        AgentError::routing(format!(
                            "no registered agent advertises skill '{skill}'"
                        ))
                    })?;
                debug!(
                    skill = %skill,
                    candidates = candidates.len(),
                    agent_id = %chosen.id(),
                    "Resolved skill"
                );
                Ok(chosen)
            }
            Target::Endpoint(url) => self.registry.find_by_endpoint(url).ok_or_else(|| {
                AgentError::routing(format!("no agent registered at endpoint '{url}'"))
            }),
        }
    }

    /// Resolve a target and send it one message.
    async fn call(&self, target: &Target, parts: Vec<Part>) -> AgentResult<(String, Vec<Artifact>)> {
        let agent = self.resolve(target)?;
        let artifacts = agent
            .client
            .send(Message::with_parts(Role::User, parts), None)
            .await?;
        Ok((agent.id().to_string(), artifacts))
    }

    async fn run_sequential(&self, steps: &[Step], task: &Task) -> AgentResult<OrchestrationOutcome> {
        if steps.is_empty() {
            return Err(AgentError::routing("sequential plan has no steps"));
        }

        let mut carried = task.parts();
        let mut records = Vec::with_capacity(steps.len());

        for (index, step) in steps.iter().enumerate() {
            debug!(step = index, target = %step.target, "Running sequential step");
            let (agent_id, artifacts) = self
                .call(&step.target, step.parts(&carried))
                .await
                .map_err(|e| AgentError::step_failed("sequential", index, step.target.to_string(), e))?;

            carried = artifacts.iter().flat_map(|a| a.parts.iter().cloned()).collect();
            records.push(StepRecord {
                index,
                target: step.target.clone(),
                agent_id,
                artifacts,
            });
        }

        Ok(OrchestrationOutcome {
            artifacts: records.last().map(|r| r.artifacts.clone()).unwrap_or_default(),
            steps: records,
            route: None,
        })
    }

    async fn run_parallel(&self, branches: &[Step], task: &Task) -> AgentResult<OrchestrationOutcome> {
        if branches.is_empty() {
            return Err(AgentError::routing("parallel plan has no branches"));
        }

        let input = task.parts();
        let calls = branches
            .iter()
            .map(|branch| self.call(&branch.target, branch.parts(&input)));

        // Every branch settles before the batch is judged.
        let results = join_all(calls).await;

        let mut records = Vec::with_capacity(branches.len());
        let mut first_failure = None;
        for (index, (branch, result)) in branches.iter().zip(results).enumerate() {
            match result {
                Ok((agent_id, artifacts)) => records.push(StepRecord {
                    index,
                    target: branch.target.clone(),
                    agent_id,
                    artifacts,
                }),
                Err(e) => {
                    warn!(branch = index, target = %branch.target, error = %e, "Parallel branch failed");
                    if first_failure.is_none() {
                        first_failure = Some(AgentError::step_failed(
                            "parallel",
                            index,
                            branch.target.to_string(),
                            e,
                        ));
                    }
                }
            }
        }

        if let Some(err) = first_failure {
            return Err(err);
        }

        Ok(OrchestrationOutcome {
            artifacts: records.iter().flat_map(|r| r.artifacts.iter().cloned()).collect(),
            steps: records,
            route: None,
        })
    }

    async fn run_routing(&self, table: &RoutingTable, task: &Task) -> AgentResult<OrchestrationOutcome> {
        let mut records = Vec::new();

        let label = match &table.classifier {
            Classifier::Function(classify) => normalize_label(&classify(&task.input)),
            Classifier::Skill(skill) => {
                let target = Target::skill(skill.clone());
                let (agent_id, artifacts) = self
                    .call(&target, task.parts())
                    .await
                    .map_err(|e| AgentError::step_failed("dynamic-routing", 0, target.to_string(), e))?;
                let label = normalize_label(
                    &artifacts.first().map(Artifact::text_content).unwrap_or_default(),
                );
                records.push(StepRecord {
                    index: 0,
                    target,
                    agent_id,
                    artifacts,
                });
                label
            }
        };

        let (skill, used_default) = table.resolve(&label).ok_or_else(|| {
            AgentError::routing(format!(
                "label '{label}' matches no route and no default is configured"
            ))
        })?;

        info!(label = %label, skill = %skill, used_default, "Routing task");

        let target = Target::skill(skill);
        let index = records.len();
        let (agent_id, artifacts) = self
            .call(&target, task.parts())
            .await
            .map_err(|e| AgentError::step_failed("dynamic-routing", index, target.to_string(), e))?;

        records.push(StepRecord {
            index,
            target: target.clone(),
            agent_id,
            artifacts: artifacts.clone(),
        });

        Ok(OrchestrationOutcome {
            artifacts,
            steps: records,
            route: Some(RouteDecision {
                label,
                target,
                used_default,
            }),
        })
    }

    async fn run_hierarchical(
        &self,
        root: &DelegationNode,
        task: &Task,
    ) -> AgentResult<OrchestrationOutcome> {
        let (target, depth) = delegate(root, &task.routing_key)?;
        let path = task.routing_key[..=depth].join("/");

        info!(path = %path, target = %target, "Delegating task");

        let (agent_id, artifacts) = self
            .call(target, task.parts())
            .await
            .map_err(|e| AgentError::step_failed("hierarchical", 0, target.to_string(), e))?;

        Ok(OrchestrationOutcome {
            artifacts: artifacts.clone(),
            steps: vec![StepRecord {
                index: 0,
                target: target.clone(),
                agent_id,
                artifacts,
            }],
            route: Some(RouteDecision {
                label: path,
                target: target.clone(),
                used_default: false,
            }),
        })
    }
}

/// Walk the delegation tree along `key`, returning the terminal target and
/// the depth of the key segment that selected it
fn delegate<'a>(root: &'a DelegationNode, key: &[String]) -> AgentResult<(&'a Target, usize)> {
    let mut node = root;
    let mut depth = 0;

    loop {
        let segment = key.get(depth).ok_or_else(|| {
            AgentError::routing(format!(
                "routing key ends at node '{}' before reaching a target",
                node.name
            ))
        })?;

        match node.routes.get(segment) {
            None => {
                return Err(AgentError::routing(format!(
                    "node '{}' has no route for key '{segment}'",
                    node.name
                )));
            }
            Some(Delegate::Terminal(target)) => {
                if depth + 1 < key.len() {
                    debug!(
                        node = %node.name,
                        ignored = ?&key[depth + 1..],
                        "Terminal target reached, ignoring remaining key segments"
                    );
                }
                return Ok((target, depth));
            }
            Some(Delegate::Nested(child)) => {
                node = child;
                depth += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> DelegationNode {
        DelegationNode::new("region")
            .route("us", Target::skill("us-support"))
            .delegate(
                "eu",
                DelegationNode::new("eu-country")
                    .route("de", Target::skill("de-support"))
                    .route("fr", Target::skill("fr-support")),
            )
    }

    fn key(segments: &[&str]) -> Vec<String> {
        segments.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_delegate_terminal_at_top() {
        let tree = tree();
        let (target, depth) = delegate(&tree, &key(&["us"])).unwrap();
        assert_eq!(target, &Target::skill("us-support"));
        assert_eq!(depth, 0);
    }

    #[test]
    fn test_delegate_nested() {
        let tree = tree();
        let (target, depth) = delegate(&tree, &key(&["eu", "fr"])).unwrap();
        assert_eq!(target, &Target::skill("fr-support"));
        assert_eq!(depth, 1);
    }

    #[test]
    fn test_delegate_extra_segments_ignored() {
        let tree = tree();
        let (target, _) = delegate(&tree, &key(&["us", "ca"])).unwrap();
        assert_eq!(target, &Target::skill("us-support"));
    }

    #[test]
    fn test_delegate_unknown_top_level_key() {
        let err = delegate(&tree(), &key(&["apac"])).unwrap_err();
        assert!(matches!(err, AgentError::Routing { ref reason } if reason.contains("'apac'")));
    }

    #[test]
    fn test_delegate_key_too_short() {
        let err = delegate(&tree(), &key(&["eu"])).unwrap_err();
        assert!(matches!(err, AgentError::Routing { ref reason } if reason.contains("eu-country")));
    }

    #[tokio::test]
    async fn test_empty_plans_rejected() {
        let orchestrator = Orchestrator::new(Arc::new(AgentRegistry::new()));
        let task = Task::new("x");

        for plan in [
            OrchestrationPlan::Sequential(vec![]),
            OrchestrationPlan::Parallel(vec![]),
        ] {
            let err = orchestrator.execute(&plan, &task).await.unwrap_err();
            assert_eq!(err.error_code(), "ROUTING_ERROR");
        }
    }

    #[tokio::test]
    async fn test_unknown_skill_is_routing_error() {
        let orchestrator = Orchestrator::new(Arc::new(AgentRegistry::new()));
        let plan = OrchestrationPlan::Sequential(vec![Step::skill("missing")]);

        let err = orchestrator.execute(&plan, &Task::new("x")).await.unwrap_err();
        assert_eq!(err.root_cause().error_code(), "ROUTING_ERROR");
    }
}
