//! TOML rule pack loader: parses and compiles framework signatures.
//!
//! Globs are compiled at load time so matching a file name allocates nothing.

use std::path::Path;

use libprobe_core::DetectionError;
use smallvec::SmallVec;

use super::types::{FrameworkRuleDef, FrameworkType, RulePackSpec};

/// A compiled rule pack ready for matching.
#[derive(Debug, Clone)]
pub struct CompiledRulePack {
    pub name: String,
    pub version: Option<String>,
    pub rules: Vec<CompiledFrameworkRule>,
    /// Patterns dropped because they failed to compile.
    pub patterns_skipped: usize,
    /// Rules dropped for an unknown framework or no usable pattern.
    pub rules_skipped: usize,
}

/// One framework's signatures, in priority order.
#[derive(Debug, Clone)]
pub struct CompiledFrameworkRule {
    pub framework: FrameworkType,
    pub patterns: SmallVec<[glob::Pattern; 4]>,
    pub description: Option<String>,
}

impl CompiledFrameworkRule {
    /// The first pattern matching `file_name`, if any.
    pub fn first_match(&self, file_name: &str) -> Option<&glob::Pattern> {
        self.patterns.iter().find(|p| p.matches(file_name))
    }
}

/// Load and compile a rule pack from a TOML string.
pub fn load_from_str(toml_str: &str) -> Result<CompiledRulePack, DetectionError> {
    let spec: RulePackSpec = toml::from_str(toml_str)
        .map_err(|e| DetectionError::InvalidRule(format!("TOML parse error: {e}")))?;
    Ok(compile_spec(spec))
}

/// Load and compile a rule pack from a file path.
pub fn load_from_file(path: &Path) -> Result<CompiledRulePack, DetectionError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        DetectionError::InvalidRule(format!("failed to read {}: {e}", path.display()))
    })?;
    load_from_str(&content)
}

fn compile_spec(spec: RulePackSpec) -> CompiledRulePack {
    let mut rules = Vec::with_capacity(spec.rules.len());
    let mut patterns_skipped = 0;
    let mut rules_skipped = 0;

    for def in spec.rules {
        match compile_rule(def, &spec.pack.name, &mut patterns_skipped) {
            Ok(rule) => rules.push(rule),
            Err(e) => {
                tracing::warn!(pack = %spec.pack.name, error = %e, "skipping rule");
                rules_skipped += 1;
            }
        }
    }

    CompiledRulePack {
        name: spec.pack.name,
        version: spec.pack.version,
        rules,
        patterns_skipped,
        rules_skipped,
    }
}

fn compile_rule(
    def: FrameworkRuleDef,
    pack_name: &str,
    patterns_skipped: &mut usize,
) -> Result<CompiledFrameworkRule, DetectionError> {
    let framework = FrameworkType::parse_str(&def.framework).ok_or_else(|| {
        DetectionError::InvalidRule(format!("unknown framework '{}'", def.framework))
    })?;
    if framework == FrameworkType::Unknown {
        return Err(DetectionError::InvalidRule(
            "'unknown' is a sentinel and cannot carry rules".into(),
        ));
    }

    let mut patterns = SmallVec::new();
    for raw in &def.patterns {
        if raw.trim().is_empty() {
            *patterns_skipped += 1;
            continue;
        }
        match glob::Pattern::new(raw) {
            Ok(p) => patterns.push(p),
            Err(e) => {
                tracing::warn!(
                    pack = %pack_name,
                    framework = %framework,
                    pattern = %raw,
                    error = %e,
                    "skipping invalid pattern"
                );
                *patterns_skipped += 1;
            }
        }
    }

    if patterns.is_empty() {
        return Err(DetectionError::InvalidRule(format!(
            "rule for '{framework}' has no usable patterns"
        )));
    }

    Ok(CompiledFrameworkRule {
        framework,
        patterns,
        description: def.description,
    })
}
