//! Symbol manifests dumped by the KL reflection tool.
//!
//! A manifest lists, per KL file, everything the reflection layer knows about
//! it. File paths are resolved against the manifest's own directory.
//!
//! Format (`kl.symbols.yaml`, or the same shape as JSON):
//! ```yaml
//! files:
//!   - path: Solvers/SpringStrandSolver.kl
//!     extension: Solvers
//!     requires: [Math, Geometry]
//!     interfaces: [Solver]
//!     structs:
//!       - name: Spring
//!         members:
//!           - { name: stiffness, type: Float32 }
//!     objects:
//!       - name: SpringStrand
//!         methods:
//!           - { name: UpdatePose, this_type: SpringStrand }
//!           - { name: reset, this_type: SolverBase, inherited: true }
//!     functions:
//!       - { name: solveAll, internal: false }
//!     operators:
//!       - { name: solveTask }
//! ```
//!
//! Leaving out `operators` in every file means the manifest cannot
//! enumerate operators at all.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TagsError};
use crate::provider::{
    same_path, EntityKind, FileSelection, SourceFile, SymbolEntity, SymbolProvider,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub files: Vec<ManifestFile>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManifestFile {
    pub path: PathBuf,

    /// Owning extension
    #[serde(default)]
    pub extension: Option<String>,

    /// Part of a builtin extension
    #[serde(default)]
    pub builtin: bool,

    #[serde(default)]
    pub requires: Vec<String>,

    #[serde(default)]
    pub interfaces: Vec<String>,

    #[serde(default)]
    pub structs: Vec<ManifestType>,

    #[serde(default)]
    pub objects: Vec<ManifestType>,

    #[serde(default)]
    pub functions: Vec<ManifestFunction>,

    #[serde(default)]
    pub operators: Option<Vec<ManifestFunction>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManifestType {
    pub name: String,

    #[serde(default)]
    pub methods: Vec<ManifestMethod>,

    #[serde(default)]
    pub members: Vec<ManifestMember>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManifestMethod {
    pub name: String,

    /// Declared `this` type, defaults to the owning type
    #[serde(default)]
    pub this_type: Option<String>,

    #[serde(default)]
    pub inherited: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManifestMember {
    pub name: String,

    #[serde(default, rename = "type")]
    pub ty: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManifestFunction {
    pub name: String,

    #[serde(default)]
    pub internal: bool,
}

impl Manifest {
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| TagsError::Manifest(format!("Invalid manifest YAML: {}", e)))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| TagsError::Manifest(format!("Invalid manifest JSON: {}", e)))
    }

    /// Reads a manifest, picking the decoder from the file extension
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(TagsError::FileNotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json(&content),
            _ => Self::from_yaml(&content),
        }
    }
}

struct ManifestEntry {
    source: SourceFile,
    builtin: bool,
    file: ManifestFile,
}

/// [`SymbolProvider`] backed by one or more symbol manifests
#[derive(Default)]
pub struct ManifestProvider {
    entries: Vec<ManifestEntry>,
    by_path: HashMap<PathBuf, usize>,
    supports_operators: bool,
}

impl ManifestProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let mut provider = Self::new();
        provider.load(path)?;
        Ok(provider)
    }

    /// Loads every manifest in order; a file listed twice keeps its first entry
    pub fn from_paths(paths: &[PathBuf]) -> Result<Self> {
        let mut provider = Self::new();
        for path in paths {
            provider.load(path)?;
        }
        Ok(provider)
    }

    pub fn load(&mut self, path: &Path) -> Result<()> {
        let manifest = Manifest::load(path)?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
        tracing::debug!(
            "Loaded manifest {} ({} files)",
            path.display(),
            manifest.files.len()
        );
        self.add_manifest(manifest, base_dir);
        Ok(())
    }

    pub fn add_manifest(&mut self, manifest: Manifest, base_dir: &Path) {
        if manifest.files.iter().any(|f| f.operators.is_some()) {
            self.supports_operators = true;
        }

        for file in manifest.files {
            let path = if file.path.is_absolute() {
                file.path.clone()
            } else {
                base_dir.join(&file.path)
            };

            if self.by_path.contains_key(&path) {
                tracing::debug!("Skipping duplicate manifest entry for {}", path.display());
                continue;
            }

            let source = SourceFile::new(path.clone(), file.extension.clone().unwrap_or_default());
            self.by_path.insert(path, self.entries.len());
            self.entries.push(ManifestEntry {
                source,
                builtin: file.builtin,
                file,
            });
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry(&self, path: &Path) -> Option<&ManifestEntry> {
        if let Some(&idx) = self.by_path.get(path) {
            return self.entries.get(idx);
        }
        self.entries.iter().find(|e| same_path(&e.source.path, path))
    }

    fn owner_type(&self, owner: &SymbolEntity) -> Option<&ManifestType> {
        let entry = self.entry(&owner.file)?;
        let types = match owner.kind {
            EntityKind::Struct => &entry.file.structs,
            EntityKind::Object => &entry.file.objects,
            _ => return None,
        };
        types.iter().find(|t| t.name == owner.name)
    }

    fn types(&self, file: &SourceFile, kind: EntityKind) -> Vec<SymbolEntity> {
        let Some(entry) = self.entry(&file.path) else {
            return Vec::new();
        };
        let types = match kind {
            EntityKind::Struct => &entry.file.structs,
            _ => &entry.file.objects,
        };
        types
            .iter()
            .map(|t| {
                SymbolEntity::new(&t.name, kind, &file.path)
                    .with_extension(&file.extension)
                    .with_this_type(&t.name)
            })
            .collect()
    }

    fn functions(
        file: &SourceFile,
        functions: &[ManifestFunction],
        kind: EntityKind,
        include_internal: bool,
    ) -> Vec<SymbolEntity> {
        functions
            .iter()
            .filter(|f| include_internal || !f.internal)
            .map(|f| {
                SymbolEntity::new(&f.name, kind, &file.path)
                    .with_extension(&file.extension)
            })
            .collect()
    }
}

impl SymbolProvider for ManifestProvider {
    fn files(&self, selection: &FileSelection) -> Result<Vec<SourceFile>> {
        // A dedicated builtin manifest does not need to flag each file
        let any_builtin = self.entries.iter().any(|e| e.builtin);

        let mut files: Vec<SourceFile> = match selection {
            FileSelection::Builtin if !any_builtin => {
                self.entries.iter().map(|e| e.source.clone()).collect()
            }
            FileSelection::SearchPaths(roots) => {
                // Root order decides file order
                let mut files = Vec::new();
                for root in roots {
                    let single = FileSelection::SearchPaths(vec![root.clone()]);
                    for entry in &self.entries {
                        if single.matches(&entry.source.path, entry.builtin)
                            && !files.contains(&entry.source)
                        {
                            files.push(entry.source.clone());
                        }
                    }
                }
                files
            }
            _ => self
                .entries
                .iter()
                .filter(|e| selection.matches(&e.source.path, e.builtin))
                .map(|e| e.source.clone())
                .collect(),
        };

        if let FileSelection::File(path) = selection {
            if files.is_empty() {
                tracing::warn!("{} is not listed in any symbol manifest", path.display());
            }
        }

        files.dedup();
        Ok(files)
    }

    fn requires(&self, file: &SourceFile) -> Vec<SymbolEntity> {
        self.entry(&file.path)
            .map(|entry| {
                entry
                    .file
                    .requires
                    .iter()
                    .map(|name| {
                        SymbolEntity::new(name, EntityKind::Require, &file.path)
                            .with_extension(&file.extension)
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn interfaces(&self, file: &SourceFile) -> Vec<SymbolEntity> {
        self.entry(&file.path)
            .map(|entry| {
                entry
                    .file
                    .interfaces
                    .iter()
                    .map(|name| {
                        SymbolEntity::new(name, EntityKind::Interface, &file.path)
                            .with_extension(&file.extension)
                            .with_this_type(name)
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn structs(&self, file: &SourceFile) -> Vec<SymbolEntity> {
        self.types(file, EntityKind::Struct)
    }

    fn objects(&self, file: &SourceFile) -> Vec<SymbolEntity> {
        self.types(file, EntityKind::Object)
    }

    fn free_functions(&self, file: &SourceFile, include_internal: bool) -> Vec<SymbolEntity> {
        self.entry(&file.path)
            .map(|entry| {
                Self::functions(file, &entry.file.functions, EntityKind::Function, include_internal)
            })
            .unwrap_or_default()
    }

    fn free_operators(
        &self,
        file: &SourceFile,
        include_internal: bool,
    ) -> Option<Vec<SymbolEntity>> {
        if !self.supports_operators {
            return None;
        }

        let operators = self
            .entry(&file.path)
            .and_then(|entry| entry.file.operators.as_deref())
            .map(|ops| Self::functions(file, ops, EntityKind::Operator, include_internal))
            .unwrap_or_default();
        Some(operators)
    }

    fn methods(&self, owner: &SymbolEntity, include_inherited: bool) -> Vec<SymbolEntity> {
        let Some(ty) = self.owner_type(owner) else {
            return Vec::new();
        };

        ty.methods
            .iter()
            .filter(|m| include_inherited || !m.inherited)
            .map(|m| {
                let this_type = m.this_type.clone().unwrap_or_else(|| owner.name.clone());
                SymbolEntity::new(&m.name, EntityKind::Method, &owner.file)
                    .with_extension(&owner.extension)
                    .with_this_type(this_type)
                    .with_parent(owner.as_parent())
            })
            .collect()
    }

    fn members(&self, owner: &SymbolEntity) -> Vec<SymbolEntity> {
        let Some(ty) = self.owner_type(owner) else {
            return Vec::new();
        };

        ty.members
            .iter()
            .map(|m| {
                SymbolEntity::new(&m.name, EntityKind::Member, &owner.file)
                    .with_extension(&owner.extension)
                    .with_this_type(m.ty.clone().unwrap_or_default())
                    .with_parent(owner.as_parent())
            })
            .collect()
    }
}
