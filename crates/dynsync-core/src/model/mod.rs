pub mod record;
pub mod tag;

pub use record::{SnapshotRecord, StoredRecord};
pub use tag::{DataType, Tag};
