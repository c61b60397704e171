pub mod config;
pub mod error;
pub mod provider;
pub mod tags;

pub use config::{TagsConfig, CONFIG_FILENAME};
pub use error::{Result, TagsError};
pub use provider::{
    EntityKind, FileSelection, Manifest, ManifestProvider, ManifestWalker, ParentRef, SourceFile,
    SymbolEntity, SymbolProvider,
};
pub use tags::{
    BuildOptions, BuildStats, CategoryRule, IndexBuilder, LineLocator, OwnerCategory, TagKind,
    TagRecord, TagWriter,
};
