use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::utils::time::deadline_reached;

macro_rules! ledger_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(
                &self,
                f: &mut fmt::Formatter<'_>,
            ) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self::new(id)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

ledger_id!(
    /// Ledger identifier of a single task
    TaskId
);
ledger_id!(
    /// Ledger identifier of a deal
    DealId
);
ledger_id!(
    /// Hash of a submitted transaction
    TxHash
);

/// On-chain task status.
///
/// Codes follow the ledger encoding: `UNSET=0 < ACTIVE < REVEALING < COMPLETED < FAILED`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Unset = 0,
    Active = 1,
    Revealing = 2,
    Completed = 3,
    Failed = 4,
}

impl TaskStatus {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(TaskStatus::Unset),
            1 => Some(TaskStatus::Active),
            2 => Some(TaskStatus::Revealing),
            3 => Some(TaskStatus::Completed),
            4 => Some(TaskStatus::Failed),
            _ => None,
        }
    }

    /// `COMPLETED` or `FAILED`
    pub fn is_final(self) -> bool {
        self >= TaskStatus::Completed
    }

    /// Initialized on the ledger but not finished (`0 < status < COMPLETED`)
    pub fn is_initialized_pending(self) -> bool {
        self > TaskStatus::Unset && self < TaskStatus::Completed
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Unset => "UNSET",
            TaskStatus::Active => "ACTIVE",
            TaskStatus::Revealing => "REVEALING",
            TaskStatus::Completed => "COMPLETED",
            TaskStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time view of a task record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSnapshot {
    pub task_id: TaskId,
    pub deal_id: Option<DealId>,
    pub status: TaskStatus,
    pub timed_out: bool,
    /// Unix seconds
    pub final_deadline: u64,
}

impl TaskSnapshot {
    /// Stand-in for a task the ledger has no record of yet.
    pub fn pending(
        task_id: TaskId,
        deal_id: Option<DealId>,
        final_deadline: u64,
        now: u64,
    ) -> Self {
        Self {
            task_id,
            deal_id,
            status: TaskStatus::Unset,
            timed_out: deadline_reached(final_deadline, now),
            final_deadline,
        }
    }
}

/// Point-in-time view of a deal record.
///
/// `task_ids` is index-significant and never changes once the deal exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealSnapshot {
    pub deal_id: DealId,
    pub task_ids: Vec<TaskId>,
    /// Unix seconds
    pub final_time: u64,
    pub deadline_reached: bool,
}

impl DealSnapshot {
    pub fn tasks_count(&self) -> usize {
        self.task_ids.len()
    }
}

/// Confirmation returned once a transaction is mined
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub tx_hash: TxHash,
    pub block_number: u64,
    pub resource_used: u64,
}
