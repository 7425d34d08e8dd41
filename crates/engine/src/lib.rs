//! # Prereq Engine
//!
//! The document prerequisite compliance engine:
//!
//! - [`RuleResolver`] merges global rules with a client's overrides
//! - [`ComplianceEvaluator`] classifies a person's documents against them
//! - [`RuleMutationService`] creates, updates and deletes rules
//!
//! All three borrow an [`EngineContext`], which owns the store handles,
//! the configuration, the optional effective-rule cache and audit log.
//!
//! ```rust,ignore
//! let ctx = EngineContext::from_store(store, EngineConfig::default());
//! let result = ComplianceEvaluator::new(&ctx)
//!     .evaluate("12345678-5", Some("C1"), today)
//!     .await?;
//! ```

pub mod cache;
pub mod config;
pub mod context;
pub mod error;
pub mod evaluator;
pub mod mutation;
pub mod resolver;

pub use cache::EffectiveRuleCache;
pub use config::{AppConfig, ConfigError, ConfigLoader, EngineConfig};
pub use context::EngineContext;
pub use error::{EngineError, EngineResult};
pub use evaluator::ComplianceEvaluator;
pub use mutation::{RuleMutationService, SYSTEM_ACTOR};
pub use resolver::RuleResolver;
