//! Dart package enumeration from `package:<name>[@<version>]` references.

use std::sync::OnceLock;

use libprobe_core::FxHashSet;
use regex::Regex;
use serde::Serialize;

/// A Dart package referenced by a compiled Flutter library.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DartPackage {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl DartPackage {
    /// Dedup key: `name@version`, with `unknown` standing in for a missing version.
    pub fn key(&self) -> String {
        format!("{}@{}", self.name, self.version.as_deref().unwrap_or("unknown"))
    }
}

const PACKAGE_PATTERN: &str =
    r"package:([a-zA-Z_][a-zA-Z0-9_]*)(?:@(\d+\.\d+\.\d+(?:[-+][0-9A-Za-z.\-+]*)?))?";

fn package_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(PACKAGE_PATTERN).ok()).as_ref()
}

/// Every distinct package reference, in first-seen order.
pub fn extract_packages<S: AsRef<str>>(strings: &[S]) -> Vec<DartPackage> {
    let Some(re) = package_regex() else {
        return Vec::new();
    };
    let mut seen = FxHashSet::default();
    let mut packages = Vec::new();

    for s in strings {
        for caps in re.captures_iter(s.as_ref()) {
            let package = DartPackage {
                name: caps[1].to_string(),
                version: caps.get(2).map(|m| m.as_str().to_string()),
            };
            if seen.insert(package.key()) {
                packages.push(package);
            }
        }
    }
    packages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_and_version() {
        let pkgs = extract_packages(&["package:my_custom_app@1.2.3"]);
        assert_eq!(
            pkgs,
            vec![DartPackage {
                name: "my_custom_app".into(),
                version: Some("1.2.3".into())
            }]
        );
    }

    #[test]
    fn test_import_paths_yield_bare_names() {
        let pkgs = extract_packages(&[
            "package:flutter/src/widgets/framework.dart",
            "package:provider/provider.dart",
            "package:flutter/material.dart",
        ]);
        let names: Vec<&str> = pkgs.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["flutter", "provider"]);
        assert!(pkgs.iter().all(|p| p.version.is_none()));
    }

    #[test]
    fn test_same_name_different_versions_are_distinct() {
        let pkgs = extract_packages(&["package:http@0.13.6", "package:http@1.1.0", "package:http"]);
        let keys: Vec<String> = pkgs.iter().map(DartPackage::key).collect();
        assert_eq!(keys, vec!["http@0.13.6", "http@1.1.0", "http@unknown"]);
    }

    #[test]
    fn test_multiple_references_in_one_string() {
        let pkgs = extract_packages(&["import package:a_pkg/a.dart; import package:b_pkg@2.0.0-dev.1"]);
        assert_eq!(pkgs.len(), 2);
        assert_eq!(pkgs[1].version.as_deref(), Some("2.0.0-dev.1"));
    }

    #[test]
    fn test_no_references() {
        let empty: Vec<String> = Vec::new();
        assert!(extract_packages(&empty).is_empty());
        assert!(extract_packages(&["packages: none here", "package:"]).is_empty());
    }
}
