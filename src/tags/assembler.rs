use std::path::Path;

use regex::Regex;

use crate::config::TagsConfig;
use crate::error::Result;
use crate::provider::{FileSelection, ParentRef, SourceFile, SymbolEntity, SymbolProvider};
use crate::tags::kind::{CategoryRule, TagKind};
use crate::tags::locator::LineLocator;
use crate::tags::record::TagRecord;

/// Counters collected over one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    pub files_scanned: usize,
    pub missing_files: usize,
    pub symbols_seen: usize,
    pub records: usize,
    /// Symbols whose declaration line could not be found
    pub dropped_symbols: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct BuildOptions {
    pub category_rule: CategoryRule,
    pub cache_lines: bool,
    pub include_internal: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            category_rule: CategoryRule::default(),
            cache_lines: true,
            include_internal: true,
        }
    }
}

impl From<&TagsConfig> for BuildOptions {
    fn from(config: &TagsConfig) -> Self {
        Self {
            category_rule: CategoryRule::new(config.distinguish_structs),
            cache_lines: config.cache_lines,
            include_internal: config.include_internal,
        }
    }
}

/// Turns the entities of one kind into tag records
pub struct TagAssembler {
    locator: LineLocator,
    rule: CategoryRule,
    stats: BuildStats,
}

impl TagAssembler {
    pub fn new(locator: LineLocator, rule: CategoryRule) -> Self {
        Self {
            locator,
            rule,
            stats: BuildStats::default(),
        }
    }

    pub fn stats(&self) -> BuildStats {
        self.stats
    }

    /// Drops cached file contents so the next lookup re-reads from disk
    pub fn clear_cache(&mut self) {
        self.locator.clear();
    }

    /// Tags every entity of `kind` declared in `file_path`.
    ///
    /// Entities whose declaration line cannot be found are dropped. Struct and
    /// object kinds also tag the methods (inherited included) and members of
    /// each type.
    pub fn assemble(
        &mut self,
        provider: &dyn SymbolProvider,
        file_path: &Path,
        extension: &str,
        kind: TagKind,
        entities: &[SymbolEntity],
        parent: Option<&ParentRef>,
    ) -> Result<Vec<TagRecord>> {
        let mut records = Vec::new();

        for entity in entities {
            self.stats.symbols_seen += 1;
            if let Some(record) = self.tag(file_path, extension, kind, entity, parent)? {
                records.push(record);
            }
        }

        if kind.recurses() {
            for owner in entities {
                records.extend(self.assemble_members(provider, owner)?);
            }
        }

        self.stats.records += records.len();
        Ok(records)
    }

    fn assemble_members(
        &mut self,
        provider: &dyn SymbolProvider,
        owner: &SymbolEntity,
    ) -> Result<Vec<TagRecord>> {
        let owner_parent = owner.as_parent();
        let mut records = Vec::new();

        let methods = provider.methods(owner, true);
        let members = provider.members(owner);
        let children = methods
            .iter()
            .map(|m| (TagKind::Method, m))
            .chain(members.iter().map(|m| (TagKind::Member, m)));

        for (kind, child) in children {
            self.stats.symbols_seen += 1;
            // a provider-supplied parent wins over the owner being walked
            let parent = child.parent.as_ref().unwrap_or(&owner_parent);
            if let Some(record) =
                self.tag(&owner.file, &owner.extension, kind, child, Some(parent))?
            {
                records.push(record);
            }
        }

        Ok(records)
    }

    fn tag(
        &mut self,
        file_path: &Path,
        extension: &str,
        kind: TagKind,
        entity: &SymbolEntity,
        parent: Option<&ParentRef>,
    ) -> Result<Option<TagRecord>> {
        let name = kind.tag_name(entity);
        let pattern = Regex::new(&kind.pattern(&name))?;

        let Some(found) = self.locator.locate(file_path, &pattern)? else {
            tracing::trace!(
                "No declaration line for {} {} in {}",
                entity.kind.as_str(),
                name,
                file_path.display()
            );
            self.stats.dropped_symbols += 1;
            return Ok(None);
        };

        let mut fields = kind.fields(extension, entity, parent, self.rule);
        fields.push(format!("line:{}", found.line));

        Ok(Some(TagRecord {
            name,
            file: file_path.display().to_string(),
            address: found.address(),
            kind,
            line: found.line,
            fields,
        }))
    }
}

/// Collects tag records for every kind of every selected file
pub struct IndexBuilder<'p> {
    provider: &'p dyn SymbolProvider,
    assembler: TagAssembler,
    include_internal: bool,
    files_scanned: usize,
    missing_files: usize,
}

impl<'p> IndexBuilder<'p> {
    pub fn new(provider: &'p dyn SymbolProvider, options: BuildOptions) -> Self {
        let locator = if options.cache_lines {
            LineLocator::cached()
        } else {
            LineLocator::new()
        };

        Self {
            provider,
            assembler: TagAssembler::new(locator, options.category_rule),
            include_internal: options.include_internal,
            files_scanned: 0,
            missing_files: 0,
        }
    }

    /// Unordered records for all files in `selection`
    pub fn build(&mut self, selection: &FileSelection) -> Result<Vec<TagRecord>> {
        let files = self.provider.files(selection)?;
        tracing::debug!("Building tags for {} files", files.len());

        let mut records = Vec::new();
        for file in &files {
            records.extend(self.build_file(file)?);
        }

        let stats = self.stats();
        tracing::info!(
            "Tagged {} symbols in {} files ({} dropped, {} missing files)",
            stats.records,
            stats.files_scanned,
            stats.dropped_symbols,
            stats.missing_files
        );

        Ok(records)
    }

    pub fn build_file(&mut self, file: &SourceFile) -> Result<Vec<TagRecord>> {
        if !file.path.exists() {
            tracing::warn!("File not found, skipping: {}", file.path.display());
            self.missing_files += 1;
            return Ok(Vec::new());
        }

        let provider = self.provider;
        let path = file.path.as_path();
        let ext = file.extension.as_str();
        let mut records = Vec::new();

        let kinds = [
            (TagKind::Require, provider.requires(file)),
            (TagKind::Struct, provider.structs(file)),
            (TagKind::Object, provider.objects(file)),
            (TagKind::Interface, provider.interfaces(file)),
            (TagKind::Function, provider.free_functions(file, self.include_internal)),
        ];
        for (kind, entities) in &kinds {
            records.extend(self.assembler.assemble(provider, path, ext, *kind, entities, None)?);
        }

        match provider.free_operators(file, self.include_internal) {
            Some(operators) => {
                records.extend(self.assembler.assemble(
                    provider,
                    path,
                    ext,
                    TagKind::Operator,
                    &operators,
                    None,
                )?);
            }
            None => tracing::trace!("Operators not enumerable for {}", path.display()),
        }

        // each file is read once per build; drop its lines before moving on
        self.assembler.clear_cache();
        self.files_scanned += 1;
        tracing::debug!("{}: {} tags", path.display(), records.len());
        Ok(records)
    }

    pub fn stats(&self) -> BuildStats {
        BuildStats {
            files_scanned: self.files_scanned,
            missing_files: self.missing_files,
            ..self.assembler.stats()
        }
    }
}
