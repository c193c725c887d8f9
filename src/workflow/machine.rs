use std::fmt;

use crate::error::{AppError, AppResult};
use crate::models::{EnvStatus, EnvironmentRecord};
use crate::provisioning::{JobKind, JobRequest};

/// Where an environment is in its lifecycle, including the two states that
/// have no persisted `envStatus`: before insertion and after removal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Absent,
    Starting,
    Creating,
    Deleting,
    Deleted,
}

impl LifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Absent => "Absent",
            Self::Starting => "Starting",
            Self::Creating => "Creating",
            Self::Deleting => "Deleting",
            Self::Deleted => "Deleted",
        }
    }

    /// Persisted status for this state, if a record exists in it
    pub fn env_status(&self) -> Option<EnvStatus> {
        match self {
            Self::Starting => Some(EnvStatus::Starting),
            Self::Creating => Some(EnvStatus::Creating),
            Self::Deleting => Some(EnvStatus::Deleting),
            Self::Absent | Self::Deleted => None,
        }
    }
}

impl From<EnvStatus> for LifecycleState {
    fn from(status: EnvStatus) -> Self {
        match status {
            EnvStatus::Starting => Self::Starting,
            EnvStatus::Creating => Self::Creating,
            EnvStatus::Deleting => Self::Deleting,
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One step of a lifecycle chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    PutRecord,
    CreateDatabase,
    CreateStack,
    MarkCreating,
    MarkDeleting,
    DeleteStack,
    RemoveRecord,
}

/// Create chain: insert, provision database, provision stack, mark Creating
pub const CREATE_CHAIN: [Step; 4] = [
    Step::PutRecord,
    Step::CreateDatabase,
    Step::CreateStack,
    Step::MarkCreating,
];

/// Delete chain: mark Deleting, tear down stack, remove record
pub const DELETE_CHAIN: [Step; 3] = [Step::MarkDeleting, Step::DeleteStack, Step::RemoveRecord];

/// Side effect a transition asks the engine to perform
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    PutRecord(EnvironmentRecord),
    SetStatus { id: String, status: EnvStatus },
    RunJob(JobRequest),
    RemoveRecord { id: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub step: Step,
    pub from: LifecycleState,
    pub to: LifecycleState,
    pub effect: Effect,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PutRecord => "Record-StatusStarting",
            Self::CreateDatabase => "Job-CreateDatabase",
            Self::CreateStack => "Job-CreateStack",
            Self::MarkCreating => "Record-StatusCreating",
            Self::MarkDeleting => "Record-StatusDeleting",
            Self::DeleteStack => "Job-DeleteStack",
            Self::RemoveRecord => "Record-DeleteItem",
        }
    }

    /// States this step may run from
    pub fn sources(&self) -> &'static [LifecycleState] {
        use LifecycleState::*;
        match self {
            Self::PutRecord => &[Absent],
            Self::CreateDatabase | Self::CreateStack | Self::MarkCreating => &[Starting],
            Self::MarkDeleting => &[Starting, Creating, Deleting],
            Self::DeleteStack | Self::RemoveRecord => &[Deleting],
        }
    }

    /// State reached once the step's effect has been applied
    pub fn target(&self) -> LifecycleState {
        match self {
            Self::PutRecord | Self::CreateDatabase | Self::CreateStack => LifecycleState::Starting,
            Self::MarkCreating => LifecycleState::Creating,
            Self::MarkDeleting | Self::DeleteStack => LifecycleState::Deleting,
            Self::RemoveRecord => LifecycleState::Deleted,
        }
    }

    /// Plan this step against the current state and record
    pub fn transition(&self, from: LifecycleState, record: &EnvironmentRecord) -> AppResult<Transition> {
        if !self.sources().contains(&from) {
            return Err(AppError::InvalidTransition {
                step: self.as_str(),
                from: from.as_str(),
            });
        }

        let effect = match self {
            Self::PutRecord => Effect::PutRecord(EnvironmentRecord {
                env_status: EnvStatus::Starting,
                ..record.clone()
            }),
            Self::CreateDatabase => Effect::RunJob(
                JobRequest::new(JobKind::CreateDatabase).with_var("URL", record.url.as_str()),
            ),
            Self::CreateStack => Effect::RunJob(
                JobRequest::new(JobKind::CreateStack)
                    .with_var("URL", record.url.as_str())
                    .with_var("BRANCH", record.branch.as_str()),
            ),
            Self::MarkCreating => Effect::SetStatus {
                id: record.id.clone(),
                status: EnvStatus::Creating,
            },
            Self::MarkDeleting => Effect::SetStatus {
                id: record.id.clone(),
                status: EnvStatus::Deleting,
            },
            Self::DeleteStack => Effect::RunJob(
                JobRequest::new(JobKind::DeleteStack).with_var("URL", record.url.as_str()),
            ),
            Self::RemoveRecord => Effect::RemoveRecord {
                id: record.id.clone(),
            },
        };

        Ok(Transition {
            step: *self,
            from,
            to: self.target(),
            effect,
        })
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
