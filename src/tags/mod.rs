pub mod assembler;
pub mod kind;
pub mod locator;
pub mod record;
pub mod writer;

pub use assembler::{BuildOptions, BuildStats, IndexBuilder, TagAssembler};
pub use kind::{CategoryRule, OwnerCategory, TagKind};
pub use locator::{LineLocator, LineMatch};
pub use record::{line_number, sort_lines, sort_records, TagRecord};
pub use writer::{header, TagWriter};
