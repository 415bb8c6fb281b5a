//! Rule loading diagnostics.

use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct RuleDiagnostics {
    pub builtin_packs_loaded: usize,
    pub builtin_packs_skipped: usize,
    pub custom_packs_loaded: usize,
    pub custom_packs_skipped: usize,
    pub rules_compiled: usize,
    pub rules_skipped: usize,
    pub patterns_skipped: usize,
    pub pack_versions: HashMap<String, String>,
}

impl RuleDiagnostics {
    pub fn summary(&self) -> String {
        format!(
            "{} rule packs ({} builtin, {} custom, {} skipped), {} rules, {} invalid patterns",
            self.builtin_packs_loaded + self.custom_packs_loaded,
            self.builtin_packs_loaded,
            self.custom_packs_loaded,
            self.builtin_packs_skipped + self.custom_packs_skipped,
            self.rules_compiled,
            self.patterns_skipped,
        )
    }
}
