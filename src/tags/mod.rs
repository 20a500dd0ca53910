pub mod models;
pub mod parser;

pub use models::{TagKind, TagRecord};
pub use parser::{ParseOutcome, TagFileParser, TagRecords, METADATA_PREFIX};
