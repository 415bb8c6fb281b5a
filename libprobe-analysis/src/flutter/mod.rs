//! Flutter sub-analysis over a library's embedded strings.
//!
//! Two independent passes: Dart package enumeration and engine build-id
//! resolution against a version table.

pub mod analyzer;
pub mod catalog;
pub mod packages;
pub mod version;

pub use analyzer::{FlutterAnalysisResult, FlutterEvidence, FlutterSubAnalyzer};
pub use catalog::PackageCatalog;
pub use packages::{extract_packages, DartPackage};
pub use version::{find_build_ids, resolve_version, FlutterVersionInfo, VersionSource, VersionTable};
