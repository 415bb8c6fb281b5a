//! File-name matcher over compiled framework rules.

use std::collections::BTreeSet;

use super::loader::{CompiledFrameworkRule, CompiledRulePack};
use super::types::FrameworkType;

/// Maps a library file name to the set of candidate frameworks.
///
/// Within one framework, patterns are tried in priority order and the first
/// hit settles it. An empty result means nothing matched; substituting the
/// `Unknown` sentinel is the caller's job.
#[derive(Debug, Clone, Default)]
pub struct FrameworkPatternMatcher {
    rules: Vec<CompiledFrameworkRule>,
}

impl FrameworkPatternMatcher {
    pub fn new(rules: Vec<CompiledFrameworkRule>) -> Self {
        Self { rules }
    }

    pub fn from_packs(packs: Vec<CompiledRulePack>) -> Self {
        Self::new(packs.into_iter().flat_map(|p| p.rules).collect())
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn pattern_count(&self) -> usize {
        self.rules.iter().map(|r| r.patterns.len()).sum()
    }

    pub fn match_name(&self, file_name: &str) -> BTreeSet<FrameworkType> {
        let mut matched = BTreeSet::new();
        for rule in &self.rules {
            if matched.contains(&rule.framework) {
                continue;
            }
            if let Some(pattern) = rule.first_match(file_name) {
                tracing::trace!(
                    file = %file_name,
                    framework = %rule.framework,
                    pattern = %pattern.as_str(),
                    "file name matched"
                );
                matched.insert(rule.framework);
            }
        }
        matched
    }
}
