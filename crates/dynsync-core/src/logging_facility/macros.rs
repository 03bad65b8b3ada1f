//! Boundary events of sync operations
//!
//! `sync_collection`, `reconcile` and `analyze_schema` each open with a
//! `start` event and close with `end` or `end_error`. Each macro stamps
//! `component`, `op` and `event`; extra fields such as `collection`,
//! `run_id` or the run counters are passed through as given.

/// Emit the `start` event of `op`
///
/// # Example
///
/// ```
/// # use dynsync_core::log_op_start;
/// log_op_start!("reconcile", collection = "articles", incoming = 120_u64);
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = dynsync_core_types::schema::EVENT_START,
        );
    };
    ($op:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = dynsync_core_types::schema::EVENT_START,
            $($field)*
        );
    };
}

/// Emit the `end` event of `op`
///
/// `duration_ms` comes first; run counters follow it.
///
/// # Example
///
/// ```
/// # use dynsync_core::log_op_end;
/// log_op_end!("reconcile", duration_ms = 42, collection = "articles", new = 3_u64, deleted = 1_u64);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = dynsync_core_types::schema::EVENT_END,
            duration_ms = $duration,
        );
    };
    ($op:expr, duration_ms = $duration:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = dynsync_core_types::schema::EVENT_END,
            duration_ms = $duration,
            $($field)*
        );
    };
}

/// Emit the `end_error` event of an aborted `op`
///
/// Takes a `SyncError` or an `ExError` and records its `err_kind`,
/// `err_code` and `err_message`.
///
/// # Example
///
/// ```
/// # use dynsync_core::{log_op_error, errors::SyncError};
/// let err = SyncError::EmptySnapshot { collection: "articles".to_string() };
/// log_op_error!("sync_collection", err, duration_ms = 10, collection = "articles");
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr) => {{
        use $crate::errors::ExError;
        let ex_err: ExError = $err.into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = dynsync_core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?ex_err.kind(),
            err_code = ex_err.code(),
            err_message = ex_err.message(),
        );
    }};
    ($op:expr, $err:expr, duration_ms = $duration:expr, $($field:tt)*) => {{
        use $crate::errors::ExError;
        let ex_err: ExError = $err.into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = dynsync_core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?ex_err.kind(),
            err_code = ex_err.code(),
            err_message = ex_err.message(),
            $($field)*
        );
    }};
}
