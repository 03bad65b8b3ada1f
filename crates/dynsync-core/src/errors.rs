use dynsync_core_types::RunId;
use thiserror::Error;

/// Result type alias using SyncError
pub type Result<T> = std::result::Result<T, SyncError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code that can be used for programmatic
/// error handling, test assertions and the persisted sync log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Input/Validation
    /// A snapshot item is not a JSON object
    InvalidRecord,
    /// Snapshot bytes are not valid JSON or lack a record array
    InvalidSnapshot,
    /// Snapshot holds zero records and the collection does not allow that
    EmptySnapshot,
    NotFound,
    ConstraintViolation,

    // Configuration
    Config,

    // Integration/IO
    Io,
    Serialization,
    Persistence,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidRecord => "ERR_INVALID_RECORD",
            ExErrorKind::InvalidSnapshot => "ERR_INVALID_SNAPSHOT",
            ExErrorKind::EmptySnapshot => "ERR_EMPTY_SNAPSHOT",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::ConstraintViolation => "ERR_CONSTRAINT_VIOLATION",
            ExErrorKind::Config => "ERR_CONFIG",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries a classification for programmatic handling plus the collection and
/// record identity the failure is scoped to, when known.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    collection: Option<String>,
    identity: Option<String>,
    run_id: Option<RunId>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            collection: None,
            identity: None,
            run_id: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add collection context
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    /// Add record identity context
    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = Some(identity.into());
        self
    }

    /// Add run id context
    pub fn with_run_id(mut self, run_id: RunId) -> Self {
        self.run_id = Some(run_id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the collection context, if any
    pub fn collection(&self) -> Option<&str> {
        self.collection.as_deref()
    }

    /// Get the record identity context, if any
    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    /// Get the run id context, if any
    pub fn run_id(&self) -> Option<&RunId> {
        self.run_id.as_ref()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the source error, if any
    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(collection) = &self.collection {
            write!(f, " (collection: {})", collection)?;
        }
        if let Some(identity) = &self.identity {
            write!(f, " (identity: {})", identity)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Domain error taxonomy for pure reconciliation and decoding logic
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SyncError {
    /// A snapshot item is not a JSON object and has no fields to key on
    #[error("Record is not a JSON object (found {found})")]
    RecordNotObject { found: String },

    /// Record is absent from the collection
    #[error("Record not found: {collection}/{identity}")]
    RecordNotFound { collection: String, identity: String },

    /// Snapshot carried zero records for a collection that forbids it
    #[error("Empty snapshot refused for collection {collection}")]
    EmptySnapshot { collection: String },

    /// Snapshot payload could not be decoded into records
    #[error("Invalid snapshot: {reason}")]
    InvalidSnapshot { reason: String },

    /// Configuration rejected during validation
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// JSON serialization failed
    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

/// Conversion from SyncError to ExError
impl From<SyncError> for ExError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::RecordNotObject { found } => ExError::new(ExErrorKind::InvalidRecord)
                .with_message(format!("record is not a JSON object (found {})", found)),

            SyncError::RecordNotFound {
                collection,
                identity,
            } => ExError::new(ExErrorKind::NotFound)
                .with_collection(collection)
                .with_identity(identity)
                .with_message("Record not found"),

            SyncError::EmptySnapshot { collection } => ExError::new(ExErrorKind::EmptySnapshot)
                .with_collection(collection)
                .with_message("snapshot holds zero records; refusing to mark every record deleted"),

            SyncError::InvalidSnapshot { reason } => {
                ExError::new(ExErrorKind::InvalidSnapshot).with_message(reason)
            }

            SyncError::InvalidConfig { reason } => {
                ExError::new(ExErrorKind::Config).with_message(reason)
            }

            SyncError::Serialization { message } => {
                ExError::new(ExErrorKind::Serialization).with_message(message)
            }
        }
    }
}

/// Conversion from serde_json::Error to SyncError
impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::Serialization {
            message: err.to_string(),
        }
    }
}
