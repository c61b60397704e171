use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use clap::Parser;

use kl_ctags::error::{Result, TagsError};
use kl_ctags::provider::{FileSelection, ManifestProvider, ManifestWalker};
use kl_ctags::tags::{BuildOptions, IndexBuilder, TagRecord, TagWriter};
use kl_ctags::TagsConfig;

#[derive(Parser)]
#[command(name = "kl-ctags")]
#[command(about = "Generate extended ctags files for KL extensions")]
#[command(version)]
#[command(after_long_help = r#"
EXAMPLES:
    # Tags for the builtin extensions (written to kl.builtin.ctags)
    kl-ctags --builtin --symbols /opt/fabric/Exts/kl.symbols.yaml

    # Tags for user extensions under the configured search paths
    kl-ctags --custom -p ~/kl/exts -p ./exts

    # Tags for one file, printed to stdout
    kl-ctags -f Solvers/SpringStrandSolver.kl

    # Combine modes into one tag file
    kl-ctags -b -c -o tags
"#)]
pub struct Cli {
    /// Generate tags for the builtin extensions
    #[arg(short, long)]
    pub builtin: bool,

    /// Generate tags for user extensions found under the search paths
    #[arg(short, long)]
    pub custom: bool,

    /// Generate tags for a single KL file
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Output tag file. Defaults to kl.builtin.ctags (-b), kl.user.ctags (-c), stdout (-f)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Symbol manifest to read instead of the discovered ones
    #[arg(short, long)]
    pub symbols: Option<PathBuf>,

    /// Extension search path, may be repeated (overrides the config)
    #[arg(short = 'p', long = "search-path")]
    pub search_paths: Vec<PathBuf>,

    /// Path to the config file
    #[arg(long, default_value = ".kl-ctags.toml")]
    pub config: PathBuf,

    /// Value of the !_TAG_FILE_ENCODING header
    #[arg(long)]
    pub encoding: Option<String>,

    /// Report struct:<Type> for members of structs instead of class:<Type>
    #[arg(long)]
    pub distinguish_structs: bool,

    /// Re-read source files for every symbol instead of caching their lines
    #[arg(long)]
    pub no_cache: bool,
}

/// One generation mode resolved against the config
struct Job {
    label: &'static str,
    provider: ManifestProvider,
    selection: FileSelection,
    /// `None` writes to stdout
    default_output: Option<PathBuf>,
}

pub fn generate(cli: &Cli) -> Result<()> {
    let mut config = TagsConfig::load(&cli.config)?;
    if !cli.search_paths.is_empty() {
        config.search_paths = cli.search_paths.clone();
    }
    if let Some(encoding) = &cli.encoding {
        config.encoding = encoding.clone();
    }
    if cli.distinguish_structs {
        config.distinguish_structs = true;
    }
    if cli.no_cache {
        config.cache_lines = false;
    }

    let jobs = plan_jobs(cli, &config)?;
    if jobs.is_empty() {
        return Err(TagsError::NoSelection);
    }

    let options = BuildOptions::from(&config);

    // With an explicit output every mode goes into the same file
    let mut combined: Vec<TagRecord> = Vec::new();

    for job in &jobs {
        let mut builder = IndexBuilder::new(&job.provider, options);
        let records = builder.build(&job.selection)?;
        tracing::debug!("{} mode: {} records", job.label, records.len());

        if cli.output.is_some() {
            combined.extend(records);
        } else {
            let written = write_tags(job.default_output.as_deref(), &config.encoding, &records)?;
            log_written(job.default_output.as_deref(), written);
        }
    }

    if let Some(output) = &cli.output {
        let written = write_tags(Some(output), &config.encoding, &combined)?;
        log_written(Some(output), written);
    }

    Ok(())
}

fn plan_jobs(cli: &Cli, config: &TagsConfig) -> Result<Vec<Job>> {
    let walker = ManifestWalker::new();
    let mut jobs = Vec::new();

    if cli.builtin {
        let manifest = cli
            .symbols
            .clone()
            .or_else(|| config.builtin_manifest.clone())
            .ok_or_else(|| {
                TagsError::Config(
                    "no builtin manifest (set builtin_manifest or pass --symbols)".to_string(),
                )
            })?;

        jobs.push(Job {
            label: "builtin",
            provider: ManifestProvider::from_path(&manifest)?,
            selection: FileSelection::Builtin,
            default_output: Some(config.builtin_output.clone()),
        });
    }

    if cli.custom {
        let manifests = match &cli.symbols {
            Some(manifest) => vec![manifest.clone()],
            None => walker.walk_all(&config.search_paths)?,
        };
        let provider = ManifestProvider::from_paths(&manifests)?;
        if provider.is_empty() {
            tracing::warn!(
                "No custom symbols found (searched {} paths)",
                config.search_paths.len()
            );
        }

        // an explicit manifest with no search paths covers everything it lists
        let selection = if cli.symbols.is_some() && config.search_paths.is_empty() {
            FileSelection::All
        } else {
            FileSelection::SearchPaths(config.search_paths.clone())
        };

        jobs.push(Job {
            label: "custom",
            provider,
            selection,
            default_output: Some(config.custom_output.clone()),
        });
    }

    if let Some(file) = &cli.file {
        if !file.exists() {
            return Err(TagsError::FileNotFound(file.display().to_string()));
        }

        let manifest = cli
            .symbols
            .clone()
            .or_else(|| walker.sidecar_for(file))
            .ok_or_else(|| {
                TagsError::FileNotFound(format!("symbol manifest for {}", file.display()))
            })?;

        jobs.push(Job {
            label: "file",
            provider: ManifestProvider::from_path(&manifest)?,
            selection: FileSelection::File(file.clone()),
            default_output: None,
        });
    }

    Ok(jobs)
}

fn write_tags(dest: Option<&Path>, encoding: &str, records: &[TagRecord]) -> Result<usize> {
    match dest {
        Some(path) => {
            let file = File::create(path)?;
            TagWriter::new(BufWriter::new(file), encoding).write(records)
        }
        None => {
            let stdout = io::stdout();
            TagWriter::new(stdout.lock(), encoding).write(records)
        }
    }
}

fn log_written(dest: Option<&Path>, count: usize) {
    match dest {
        Some(path) => tracing::info!("Wrote {} tags to {}", count, path.display()),
        None => tracing::debug!("Wrote {} tags to stdout", count),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["kl-ctags"];
        argv.extend_from_slice(args);
        Cli::parse_from(argv)
    }

    fn setup_extension(dir: &Path) {
        std::fs::write(dir.join("foo.kl"), "require Math;\nfunction doThing() {}\n").unwrap();
        std::fs::write(
            dir.join("kl.symbols.yaml"),
            "files:\n  - path: foo.kl\n    extension: Foo\n    requires: [Math]\n    functions: [{ name: doThing }]\n",
        )
        .unwrap();
    }

    #[test]
    fn test_parse_flags() {
        let args = cli(&["-b", "-c", "-o", "tags", "-p", "/a", "-p", "/b", "--no-cache"]);
        assert!(args.builtin);
        assert!(args.custom);
        assert_eq!(args.output, Some(PathBuf::from("tags")));
        assert_eq!(args.search_paths, vec![PathBuf::from("/a"), PathBuf::from("/b")]);
        assert!(args.no_cache);
        assert!(args.file.is_none());
    }

    #[test]
    fn test_no_mode_selected() {
        let temp_dir = TempDir::new().unwrap();
        let config = temp_dir.path().join("missing.toml");
        let args = cli(&["--config", config.to_str().unwrap()]);
        assert!(matches!(generate(&args), Err(TagsError::NoSelection)));
    }

    #[test]
    fn test_custom_mode_writes_output() {
        let temp_dir = TempDir::new().unwrap();
        let ext_dir = temp_dir.path().join("exts");
        std::fs::create_dir_all(&ext_dir).unwrap();
        setup_extension(&ext_dir);

        let output = temp_dir.path().join("tags");
        let config = temp_dir.path().join("missing.toml");
        let args = cli(&[
            "-c",
            "-p",
            ext_dir.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
            "--config",
            config.to_str().unwrap(),
        ]);
        generate(&args).unwrap();

        let content = std::fs::read_to_string(&output).unwrap();
        let tags: Vec<_> = content.lines().skip(3).collect();
        assert_eq!(tags.len(), 2);
        assert!(tags[0].starts_with("Math\t"));
        assert!(tags[0].ends_with("kind:r\tnamespace:Foo\tline:1"));
        assert!(tags[1].starts_with("doThing\t"));
    }

    #[test]
    fn test_custom_mode_explicit_manifest_without_search_paths() {
        let temp_dir = TempDir::new().unwrap();
        setup_extension(temp_dir.path());

        let manifest = temp_dir.path().join("kl.symbols.yaml");
        let output = temp_dir.path().join("tags");
        let config = temp_dir.path().join("missing.toml");
        let args = cli(&[
            "-c",
            "-s",
            manifest.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
            "--config",
            config.to_str().unwrap(),
        ]);
        generate(&args).unwrap();

        let content = std::fs::read_to_string(&output).unwrap();
        let tags: Vec<_> = content.lines().skip(3).collect();
        assert_eq!(tags.len(), 2);
        assert!(tags[0].starts_with("Math\t"));
        assert!(tags[1].starts_with("doThing\t"));
    }

    #[test]
    fn test_file_mode_uses_sidecar() {
        let temp_dir = TempDir::new().unwrap();
        setup_extension(temp_dir.path());

        let output = temp_dir.path().join("one.tags");
        let config = temp_dir.path().join("missing.toml");
        let file = temp_dir.path().join("foo.kl");
        let args = cli(&[
            "-f",
            file.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
            "--config",
            config.to_str().unwrap(),
        ]);
        generate(&args).unwrap();

        let content = std::fs::read_to_string(&output).unwrap();
        assert_eq!(content.lines().count(), 5);
    }

    #[test]
    fn test_builtin_mode_requires_manifest() {
        let temp_dir = TempDir::new().unwrap();
        let config = temp_dir.path().join("missing.toml");
        let args = cli(&["-b", "--config", config.to_str().unwrap()]);
        assert!(matches!(generate(&args), Err(TagsError::Config(_))));
    }
}
