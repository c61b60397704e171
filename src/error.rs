use thiserror::Error;

#[derive(Error, Debug)]
pub enum TagsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid search pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Manifest error: {0}")]
    Manifest(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("No generation mode selected (use --builtin, --custom or --file)")]
    NoSelection,
}

pub type Result<T> = std::result::Result<T, TagsError>;
