//! Framework rule system: TOML-driven, user-extensible file-name signatures.
//!
//! Architecture:
//! - `types.rs`: FrameworkType and the rule pack serde schema
//! - `loader.rs`: TOML parsing → CompiledRulePack (globs pre-compiled)
//! - `matcher.rs`: FrameworkPatternMatcher over library file names
//! - `registry.rs`: built-in packs + custom packs from a directory
//! - `diagnostics.rs`: load counters

pub mod diagnostics;
pub mod loader;
pub mod matcher;
pub mod registry;
pub mod types;

pub use diagnostics::RuleDiagnostics;
pub use loader::{CompiledFrameworkRule, CompiledRulePack};
pub use matcher::FrameworkPatternMatcher;
pub use registry::RulePackRegistry;
pub use types::FrameworkType;
