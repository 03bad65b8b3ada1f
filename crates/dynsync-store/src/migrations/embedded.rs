//! Embedded SQL migrations
//!
//! Migrations are embedded at compile time using include_str!

/// Migration metadata
pub struct Migration {
    pub id: &'static str,
    pub sql: &'static str,
}

/// Get all embedded migrations in order
pub fn get_migrations() -> Vec<Migration> {
    vec![
        Migration {
            id: "001_records",
            sql: include_str!("../../migrations/001_records.sql"),
        },
        Migration {
            id: "002_schema_tags",
            sql: include_str!("../../migrations/002_schema_tags.sql"),
        },
        Migration {
            id: "003_sync_logs",
            sql: include_str!("../../migrations/003_sync_logs.sql"),
        },
    ]
}
