use serde::Deserialize;
use serde::Serialize;

use crate::DealId;
use crate::TaskId;
use crate::TaskSnapshot;
use crate::TaskStatus;

/// Lifecycle event of a single task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskEvent {
    Updated(TaskSnapshot),
    Completed(TaskSnapshot),
    Failed(TaskSnapshot),
    TimedOut(TaskSnapshot),
}

impl TaskEvent {
    pub fn snapshot(&self) -> &TaskSnapshot {
        match self {
            TaskEvent::Updated(s) | TaskEvent::Completed(s) | TaskEvent::Failed(s) | TaskEvent::TimedOut(s) => s,
        }
    }

    pub fn into_snapshot(self) -> TaskSnapshot {
        match self {
            TaskEvent::Updated(s) | TaskEvent::Completed(s) | TaskEvent::Failed(s) | TaskEvent::TimedOut(s) => s,
        }
    }

    /// No further event follows a terminal one
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TaskEvent::Updated(_))
    }

    pub fn message(&self) -> &'static str {
        match self {
            TaskEvent::Updated(_) => "TASK_UPDATED",
            TaskEvent::Completed(_) => "TASK_COMPLETED",
            TaskEvent::Failed(_) => "TASK_FAILED",
            TaskEvent::TimedOut(_) => "TASK_TIMEDOUT",
        }
    }
}

/// Latest known state of one task inside a deal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskProgress {
    /// Position in the deal's task batch
    pub index: usize,
    pub task_id: TaskId,
    pub status: TaskStatus,
    pub timed_out: bool,
}

/// Deal-wide counts plus the full per-index table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealProgress {
    pub deal_id: DealId,
    pub tasks: Vec<TaskProgress>,
    pub completed_tasks_count: usize,
    /// Tasks that timed out without completing
    pub failed_tasks_count: usize,
    pub tasks_count: usize,
}

/// Lifecycle event of a deal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DealEvent {
    Updated(DealProgress),
    Completed(DealProgress),
    TimedOut(DealProgress),
}

impl DealEvent {
    pub fn progress(&self) -> &DealProgress {
        match self {
            DealEvent::Updated(p) | DealEvent::Completed(p) | DealEvent::TimedOut(p) => p,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, DealEvent::Updated(_))
    }

    pub fn message(&self) -> &'static str {
        match self {
            DealEvent::Updated(_) => "DEAL_UPDATED",
            DealEvent::Completed(_) => "DEAL_COMPLETED",
            DealEvent::TimedOut(_) => "DEAL_TIMEDOUT",
        }
    }
}
