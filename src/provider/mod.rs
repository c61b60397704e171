//! Symbol entities supplied by the upstream KL reflection layer.
//!
//! The tag engine never parses KL itself. It asks a [`SymbolProvider`] which
//! files exist and which requires, types, functions, operators, methods and
//! members each of them declares, then searches the file text for them.

pub mod manifest;
pub mod walker;

pub use manifest::{
    Manifest, ManifestFile, ManifestFunction, ManifestMember, ManifestMethod, ManifestProvider,
    ManifestType,
};
pub use walker::{ManifestWalker, MANIFEST_FILENAMES};

use std::path::{Path, PathBuf};

use crate::error::Result;

/// Runtime type name reported for object declarations
pub const OBJECT_TYPE_TAG: &str = "KLObject";
/// Runtime type name reported for struct declarations
pub const STRUCT_TYPE_TAG: &str = "KLStruct";
pub const INTERFACE_TYPE_TAG: &str = "KLInterface";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Require,
    Interface,
    Struct,
    Object,
    Function,
    Operator,
    Method,
    Member,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Require => "require",
            EntityKind::Interface => "interface",
            EntityKind::Struct => "struct",
            EntityKind::Object => "object",
            EntityKind::Function => "function",
            EntityKind::Operator => "operator",
            EntityKind::Method => "method",
            EntityKind::Member => "member",
        }
    }

    /// Runtime type name the reflection layer reports for this kind
    pub fn type_tag(&self) -> &'static str {
        match self {
            EntityKind::Require => "KLRequire",
            EntityKind::Interface => INTERFACE_TYPE_TAG,
            EntityKind::Struct => STRUCT_TYPE_TAG,
            EntityKind::Object => OBJECT_TYPE_TAG,
            EntityKind::Function => "KLFunction",
            EntityKind::Operator => "KLOperator",
            EntityKind::Method => "KLMethod",
            EntityKind::Member => "KLMember",
        }
    }
}

/// A KL source file known to the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Owning extension name, empty when the file is not part of one
    pub extension: String,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            extension: extension.into(),
        }
    }
}

/// Declaring type of a method or member
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentRef {
    pub name: String,
    pub type_tag: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolEntity {
    pub name: String,
    pub kind: EntityKind,
    /// Declared `this` type for methods, value type for members
    pub this_type: String,
    pub type_tag: String,
    pub file: PathBuf,
    pub extension: String,
    pub parent: Option<ParentRef>,
}

impl SymbolEntity {
    pub fn new(name: impl Into<String>, kind: EntityKind, file: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            kind,
            this_type: String::new(),
            type_tag: kind.type_tag().to_string(),
            file: file.into(),
            extension: String::new(),
            parent: None,
        }
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn with_this_type(mut self, this_type: impl Into<String>) -> Self {
        self.this_type = this_type.into();
        self
    }

    pub fn with_parent(mut self, parent: ParentRef) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Reference used as the parent of this type's methods and members
    pub fn as_parent(&self) -> ParentRef {
        ParentRef {
            name: self.name.clone(),
            type_tag: self.type_tag.clone(),
        }
    }
}

/// Which files a run covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSelection {
    /// Every file the provider knows about
    All,
    /// Files shipped with the builtin extensions
    Builtin,
    /// Files under any of these roots, in root order
    SearchPaths(Vec<PathBuf>),
    /// Exactly one file
    File(PathBuf),
}

impl FileSelection {
    pub fn matches(&self, path: &Path, builtin: bool) -> bool {
        match self {
            FileSelection::All => true,
            FileSelection::Builtin => builtin,
            FileSelection::SearchPaths(roots) => roots.iter().any(|root| is_under(path, root)),
            FileSelection::File(file) => same_path(path, file),
        }
    }
}

pub trait SymbolProvider {
    fn files(&self, selection: &FileSelection) -> Result<Vec<SourceFile>>;
    fn requires(&self, file: &SourceFile) -> Vec<SymbolEntity>;
    fn interfaces(&self, file: &SourceFile) -> Vec<SymbolEntity>;
    fn structs(&self, file: &SourceFile) -> Vec<SymbolEntity>;
    fn objects(&self, file: &SourceFile) -> Vec<SymbolEntity>;
    fn free_functions(&self, file: &SourceFile, include_internal: bool) -> Vec<SymbolEntity>;

    /// Free operators, or `None` when the provider cannot enumerate them
    fn free_operators(
        &self,
        _file: &SourceFile,
        _include_internal: bool,
    ) -> Option<Vec<SymbolEntity>> {
        None
    }

    fn methods(&self, owner: &SymbolEntity, include_inherited: bool) -> Vec<SymbolEntity>;
    fn members(&self, owner: &SymbolEntity) -> Vec<SymbolEntity>;
}

fn normalize(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

pub(crate) fn same_path(a: &Path, b: &Path) -> bool {
    a == b || normalize(a) == normalize(b)
}

pub(crate) fn is_under(path: &Path, root: &Path) -> bool {
    path.starts_with(root) || normalize(path).starts_with(normalize(root))
}
