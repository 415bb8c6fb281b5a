//! Rule pack registry: loads built-in packs + user custom packs.
//!
//! Built-in packs are embedded at compile time via `include_str!`.
//! Custom packs are `*.toml` files loaded from a directory at runtime.

use std::path::Path;

use libprobe_core::{DetectionError, ProbeConfig};

use super::diagnostics::RuleDiagnostics;
use super::loader::{self, CompiledRulePack};
use super::matcher::FrameworkPatternMatcher;
use super::types::FrameworkType;

/// Registry of all loaded rule packs.
pub struct RulePackRegistry {
    packs: Vec<CompiledRulePack>,
    diag: RuleDiagnostics,
    disabled: Vec<FrameworkType>,
}

impl RulePackRegistry {
    /// Create registry with only built-in packs.
    pub fn with_builtins() -> Self {
        Self::with_builtins_filtered(&[])
    }

    /// Create registry with built-in packs, dropping rules for `disabled` frameworks.
    pub fn with_builtins_filtered(disabled: &[FrameworkType]) -> Self {
        let mut registry = Self {
            packs: Vec::new(),
            diag: RuleDiagnostics::default(),
            disabled: disabled.to_vec(),
        };

        for (name, toml_str) in builtin_packs() {
            match loader::load_from_str(toml_str) {
                Ok(pack) => {
                    registry.diag.builtin_packs_loaded += 1;
                    registry.push(pack);
                }
                Err(e) => {
                    tracing::warn!(pack = %name, error = %e, "failed to load built-in rule pack");
                    registry.diag.builtin_packs_skipped += 1;
                }
            }
        }
        registry
    }

    /// Create registry with built-in packs + custom packs from a directory.
    /// Custom rules come after the built-ins.
    pub fn with_builtins_and_custom(custom_dir: &Path, disabled: &[FrameworkType]) -> Self {
        let mut registry = Self::with_builtins_filtered(disabled);
        if !custom_dir.is_dir() {
            tracing::warn!(dir = %custom_dir.display(), "custom rules directory not found");
            return registry;
        }

        let mut paths: Vec<_> = match std::fs::read_dir(custom_dir) {
            Ok(entries) => entries
                .flatten()
                .map(|e| e.path())
                .filter(|p| p.extension().is_some_and(|ext| ext == "toml"))
                .collect(),
            Err(e) => {
                tracing::warn!(dir = %custom_dir.display(), error = %e, "cannot read custom rules");
                return registry;
            }
        };
        // Directory order is platform-dependent.
        paths.sort();

        for path in paths {
            match loader::load_from_file(&path) {
                Ok(pack) => {
                    registry.diag.custom_packs_loaded += 1;
                    registry.push(pack);
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "failed to load custom rule pack");
                    registry.diag.custom_packs_skipped += 1;
                }
            }
        }
        registry
    }

    /// Build the registry described by a [`ProbeConfig`].
    pub fn from_config(config: &ProbeConfig) -> Self {
        let disabled: Vec<FrameworkType> = config
            .disabled_frameworks
            .iter()
            .filter_map(|name| {
                let parsed = FrameworkType::parse_str(name);
                if parsed.is_none() {
                    tracing::warn!(framework = %name, "ignoring unknown disabled framework");
                }
                parsed
            })
            .collect();

        let registry = match &config.custom_rules_dir {
            Some(dir) => Self::with_builtins_and_custom(dir, &disabled),
            None => Self::with_builtins_filtered(&disabled),
        };
        tracing::info!("{}", registry.diag.summary());
        registry
    }

    /// Load a single pack from a TOML string.
    pub fn load_single(toml_str: &str) -> Result<CompiledRulePack, DetectionError> {
        loader::load_from_str(toml_str)
    }

    pub fn pack_count(&self) -> usize {
        self.packs.len()
    }

    pub fn rule_count(&self) -> usize {
        self.packs.iter().map(|p| p.rules.len()).sum()
    }

    pub fn diagnostics(&self) -> &RuleDiagnostics {
        &self.diag
    }

    pub fn packs(&self) -> &[CompiledRulePack] {
        &self.packs
    }

    /// Consume the registry into a matcher over every loaded rule.
    pub fn into_matcher(self) -> FrameworkPatternMatcher {
        FrameworkPatternMatcher::from_packs(self.packs)
    }

    fn push(&mut self, mut pack: CompiledRulePack) {
        if !self.disabled.is_empty() {
            let before = pack.rules.len();
            pack.rules.retain(|r| !self.disabled.contains(&r.framework));
            self.diag.rules_skipped += before - pack.rules.len();
        }
        self.diag.rules_compiled += pack.rules.len();
        self.diag.rules_skipped += pack.rules_skipped;
        self.diag.patterns_skipped += pack.patterns_skipped;
        if let Some(ver) = &pack.version {
            self.diag.pack_versions.insert(pack.name.clone(), ver.clone());
        }
        self.packs.push(pack);
    }
}

/// Built-in rule packs embedded at compile time.
fn builtin_packs() -> Vec<(&'static str, &'static str)> {
    vec![
        ("cross-platform", include_str!("packs/cross_platform.toml")),
        ("game-engines", include_str!("packs/game_engines.toml")),
        ("system", include_str!("packs/system.toml")),
    ]
}
