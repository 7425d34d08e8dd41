//! Rule audit trail
//!
//! Every administrator change to a prerequisite rule is written to JSONL
//! files, one per day, and can be read back with filters.

pub mod log;
pub mod reader;

pub use log::RuleAuditLog;
pub use reader::{AuditFilter, AuditReader};
