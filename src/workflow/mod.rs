pub mod create;
pub mod delete;
pub mod engine;
pub mod machine;
pub mod run;

pub use create::CreateWorkflow;
pub use delete::DeleteWorkflow;
pub use engine::WorkflowEngine;
pub use machine::{Effect, LifecycleState, Step, Transition, CREATE_CHAIN, DELETE_CHAIN};
pub use run::{StepResult, WorkflowFailure, WorkflowKind, WorkflowRun};
