use std::path::{Path, PathBuf};

use ignore::WalkBuilder;

use crate::error::Result;

/// Sidecar names the reflection tool writes next to an extension
pub const MANIFEST_FILENAMES: &[&str] = &["kl.symbols.yaml", "kl.symbols.yml", "kl.symbols.json"];

/// Finds symbol manifests under extension search roots
pub struct ManifestWalker;

impl ManifestWalker {
    pub fn new() -> Self {
        Self
    }

    pub fn walk(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let mut manifests = Vec::new();

        if !root.exists() {
            tracing::warn!("Search path {} does not exist", root.display());
            return Ok(manifests);
        }

        let walker = WalkBuilder::new(root)
            .hidden(true)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .ignore(true)
            .build();

        for entry in walker.flatten() {
            let path = entry.path();
            if path.is_file() && self.is_manifest(path) {
                manifests.push(path.to_path_buf());
            }
        }

        manifests.sort();
        Ok(manifests)
    }

    /// Walks each root in order and concatenates the results
    pub fn walk_all(&self, roots: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let mut manifests = Vec::new();
        for root in roots {
            for manifest in self.walk(root)? {
                if !manifests.contains(&manifest) {
                    manifests.push(manifest);
                }
            }
        }
        Ok(manifests)
    }

    pub fn is_manifest(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|name| name.to_str())
            .map(|name| MANIFEST_FILENAMES.contains(&name))
            .unwrap_or(false)
    }

    /// Manifest sitting next to a KL file, if any
    pub fn sidecar_for(&self, file: &Path) -> Option<PathBuf> {
        let dir = file.parent()?;
        MANIFEST_FILENAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|candidate| candidate.is_file())
    }
}

impl Default for ManifestWalker {
    fn default() -> Self {
        Self::new()
    }
}
