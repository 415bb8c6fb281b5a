//! Framework vocabulary and the TOML schema for rule packs.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A runtime framework a native library can be attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FrameworkType {
    Flutter,
    ReactNative,
    Unity,
    Xamarin,
    KotlinMultiplatform,
    Cocos2dx,
    UnrealEngine,
    Godot,
    Qt,
    /// Platform or toolchain runtime library (libc++, liblog, ...).
    System,
    /// Sentinel for "nothing identified".
    Unknown,
}

impl FrameworkType {
    pub const ALL: [FrameworkType; 11] = [
        Self::Flutter,
        Self::ReactNative,
        Self::Unity,
        Self::Xamarin,
        Self::KotlinMultiplatform,
        Self::Cocos2dx,
        Self::UnrealEngine,
        Self::Godot,
        Self::Qt,
        Self::System,
        Self::Unknown,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Flutter => "flutter",
            Self::ReactNative => "react-native",
            Self::Unity => "unity",
            Self::Xamarin => "xamarin",
            Self::KotlinMultiplatform => "kotlin-multiplatform",
            Self::Cocos2dx => "cocos2dx",
            Self::UnrealEngine => "unreal-engine",
            Self::Godot => "godot",
            Self::Qt => "qt",
            Self::System => "system",
            Self::Unknown => "unknown",
        }
    }

    /// Parse a kebab-case name. Also accepts `kmp` for Kotlin-Multiplatform.
    pub fn parse_str(s: &str) -> Option<Self> {
        let lower = s.trim().to_ascii_lowercase();
        if lower == "kmp" {
            return Some(Self::KotlinMultiplatform);
        }
        Self::ALL.iter().copied().find(|f| f.name() == lower)
    }

    /// True for real frameworks, false for the `System` and `Unknown` tags.
    pub fn is_framework(&self) -> bool {
        !matches!(self, Self::System | Self::Unknown)
    }
}

impl fmt::Display for FrameworkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Top-level rule pack (one per TOML file).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulePackSpec {
    pub pack: PackMeta,
    #[serde(default)]
    pub rules: Vec<FrameworkRuleDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackMeta {
    /// Unique pack identifier (e.g., "native-frameworks").
    pub name: String,
    /// Pack version string (e.g., "1.0.0").
    pub version: Option<String>,
}

/// File-name signatures for one framework.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameworkRuleDef {
    /// Framework name, e.g. "flutter" or "kotlin-multiplatform".
    pub framework: String,
    /// Literal names or globs, tried in priority order.
    pub patterns: Vec<String>,
    pub description: Option<String>,
}
