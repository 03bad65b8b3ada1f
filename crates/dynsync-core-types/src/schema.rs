//! Field and event names shared by sync run logging
//!
//! Emitters in `dynsync-core` and `dynsync-engine` and the test capture layer
//! read the same names from here.

// Boundary event fields
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";
pub const FIELD_RUN_ID: &str = "run_id";

// Scope of a run or of one record
pub const FIELD_COLLECTION: &str = "collection";
pub const FIELD_IDENTITY: &str = "identity";
pub const FIELD_TAG_PATH: &str = "tag_path";

// Error fields
pub const FIELD_ERR_KIND: &str = "err_kind";
pub const FIELD_ERR_CODE: &str = "err_code";

// Values of `event`
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
