//! Shared types used across all modules.
//!
//! This module defines the core data structures for function contexts,
//! code changes, impact records, and maintenance results. Other modules
//! import from here rather than reaching into each other's internals.

pub mod change;
pub mod context;
pub mod impact;
pub mod maintenance;

pub use change::{ChangeSummary, ChangeType, CodeChange};
pub use context::{FunctionBodyAnalysis, FunctionContext, FunctionSignature};
pub use impact::{AffectedTestCase, ImpactLevel};
pub use maintenance::{
    BatchFixResult, MaintenanceResult, TestFixOutcome, UserDecision, UserDecisionKind,
};
