//! Combines package enumeration and version resolution into one result.

use chrono::{DateTime, Utc};
use libprobe_core::{FxHashSet, ProbeConfig};
use serde::Serialize;

use super::catalog::PackageCatalog;
use super::packages::{extract_packages, DartPackage};
use super::version::{self, find_build_ids, FlutterVersionInfo, VersionTable};

/// String evidence of one file plus the timestamp used on fallback.
#[derive(Debug, Clone)]
pub struct FlutterEvidence {
    pub strings: Vec<String>,
    pub modified: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlutterAnalysisResult {
    /// Set when an application-authored package was found or a version resolved.
    pub is_flutter: bool,
    pub dart_packages: Vec<DartPackage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flutter_version: Option<FlutterVersionInfo>,
}

/// Holds the static resources; analysis itself is stateless.
#[derive(Debug, Clone, Default)]
pub struct FlutterSubAnalyzer {
    catalog: PackageCatalog,
    versions: VersionTable,
}

impl FlutterSubAnalyzer {
    pub fn new(catalog: PackageCatalog, versions: VersionTable) -> Self {
        Self { catalog, versions }
    }

    /// Built-in catalog unless a path is configured; version table only from a path.
    pub fn from_config(config: &ProbeConfig) -> Self {
        let catalog = match &config.package_catalog_path {
            Some(path) => PackageCatalog::load(path),
            None => PackageCatalog::builtin(),
        };
        let versions = match &config.version_table_path {
            Some(path) => VersionTable::load(path),
            None => {
                tracing::info!("no Flutter version table configured, fallback resolution only");
                VersionTable::new()
            }
        };
        Self::new(catalog, versions)
    }

    pub fn catalog(&self) -> &PackageCatalog {
        &self.catalog
    }

    pub fn versions(&self) -> &VersionTable {
        &self.versions
    }

    pub fn extract_packages<S: AsRef<str>>(&self, strings: &[S]) -> Vec<DartPackage> {
        extract_packages(strings)
    }

    /// True when at least one package is absent from the catalog.
    pub fn has_custom_package(&self, packages: &[DartPackage]) -> bool {
        packages.iter().any(|p| !self.catalog.contains(&p.name))
    }

    pub fn resolve_version<S: AsRef<str>>(
        &self,
        strings: &[S],
        file_mtime: DateTime<Utc>,
    ) -> Option<FlutterVersionInfo> {
        version::resolve_version(strings, &self.versions, file_mtime)
    }

    /// Analyze a library together with related files (e.g. a co-located
    /// `libflutter.so`). Sources are considered in the order given.
    pub fn analyze(&self, sources: &[FlutterEvidence]) -> FlutterAnalysisResult {
        let mut seen = FxHashSet::default();
        let mut dart_packages: Vec<DartPackage> = Vec::new();
        let mut candidates = Vec::new();
        for source in sources {
            for package in extract_packages(&source.strings) {
                if seen.insert(package.key()) {
                    dart_packages.push(package);
                }
            }
            candidates.extend(
                find_build_ids(&source.strings)
                    .into_iter()
                    .map(|id| (id, source.modified)),
            );
        }

        let flutter_version = version::resolve_candidates(&candidates, &self.versions);
        let is_flutter = self.has_custom_package(&dart_packages) || flutter_version.is_some();

        FlutterAnalysisResult {
            is_flutter,
            dart_packages,
            flutter_version,
        }
    }
}
