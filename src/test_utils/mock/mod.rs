mod scripted_ledger;

pub use scripted_ledger::*;
