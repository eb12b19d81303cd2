//! Agent orchestration over registered peers.
//!
//! A plan describes how calls compose:
//! - **Sequential**: chain steps, each receiving the previous step's artifacts
//! - **Parallel**: fan a task out to every branch and fail the batch if any
//!   branch fails, once all have settled
//! - **Dynamic routing**: classify the task, then call the skill mapped to
//!   the label (or a default)
//! - **Hierarchical**: walk a tree of delegation nodes along the task's
//!   routing key
//!
//! Failures never disappear: a failed call surfaces as
//! [`AgentError::Orchestration`](crate::AgentError::Orchestration) naming the
//! step and target, and unresolvable routes surface as
//! [`AgentError::Routing`](crate::AgentError::Routing).

mod orchestrator;
mod plan;

pub use orchestrator::Orchestrator;
pub use plan::{
    Classifier, Delegate, DelegationNode, OrchestrationOutcome, OrchestrationPlan, RouteDecision,
    RoutingTable, Step, StepRecord, Target, Task,
};
