//! Catalog of known public Dart packages.
//!
//! A package that is *not* in the catalog is taken as application-authored,
//! which is the positive signal that a library is an app's own Flutter bundle.

use std::path::Path;

use libprobe_core::FxHashSet;

#[derive(Debug, Clone, Default)]
pub struct PackageCatalog {
    names: FxHashSet<String>,
}

impl PackageCatalog {
    /// An empty catalog: every discovered package counts as custom.
    /// Conservative, but noisy for engine-only binaries.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The catalog embedded in the crate.
    pub fn builtin() -> Self {
        Self::parse(include_str!("resources/package_catalog.txt"))
    }

    /// One package name per line. Blank lines and `#` comments are ignored.
    pub fn parse(text: &str) -> Self {
        let names = text
            .lines()
            .map(|line| line.split('#').next().unwrap_or_default().trim())
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        Self { names }
    }

    /// Load a catalog file. A missing file degrades to the empty catalog.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(text) => {
                let catalog = Self::parse(&text);
                tracing::info!(path = %path.display(), packages = catalog.len(), "loaded package catalog");
                catalog
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "package catalog unavailable, treating every package as custom"
                );
                Self::empty()
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
