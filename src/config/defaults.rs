//! Default values for configuration

use crate::plan::{Predicate, StepScope, StepTemplate};

/// Default PostgreSQL host (`PGHOST`, falls back to localhost)
pub fn default_pg_host() -> String {
    std::env::var("PGHOST").unwrap_or_else(|_| "localhost".to_string())
}

/// Default PostgreSQL port (`PGPORT`, falls back to 5432)
pub fn default_pg_port() -> u16 {
    std::env::var("PGPORT")
        .ok()
        .and_then(|p| p.trim().parse().ok())
        .unwrap_or(5432)
}

/// Default PostgreSQL user (`PGUSER`)
pub fn default_pg_user() -> String {
    std::env::var("PGUSER").unwrap_or_else(|_| "postgres".to_string())
}

/// Default PostgreSQL password (`PGPASSWORD`, unset means no password)
pub fn default_pg_password() -> Option<String> {
    std::env::var("PGPASSWORD").ok()
}

/// Default PostgreSQL database name (`PGDATABASE`)
pub fn default_pg_database() -> String {
    std::env::var("PGDATABASE").unwrap_or_else(|_| "postgres".to_string())
}

// Values equal to their environment default stay out of saved config files,
// so a later change to the environment still takes effect.

pub(crate) fn is_default_pg_host(host: &str) -> bool {
    host == default_pg_host()
}

pub(crate) fn is_default_pg_port(port: &u16) -> bool {
    *port == default_pg_port()
}

pub(crate) fn is_default_pg_user(user: &str) -> bool {
    user == default_pg_user()
}

pub(crate) fn is_default_pg_database(name: &str) -> bool {
    name == default_pg_database()
}

/// Default catalog table (full document records)
pub fn default_catalog_table() -> String {
    "lightrag_doc_full".to_string()
}

/// Default catalog identifier column
pub fn default_catalog_id_column() -> String {
    "id".to_string()
}

/// Default cascade deadline in seconds
pub fn default_cascade_timeout() -> u64 {
    30
}

/// Built-in cascade, in execution order.
///
/// Chunks go first so no chunk ever outlives its parent document. The vector
/// index steps match on `chunk_ids` membership or a `file_path` substring;
/// the substring test is a heuristic and can catch rows of other documents
/// whose path contains this id.
pub fn default_cascade_steps() -> Vec<StepTemplate> {
    vec![
        StepTemplate::new(
            "lightrag_doc_chunks",
            Predicate::key("full_doc_id"),
            StepScope::Core,
        ),
        StepTemplate::new("lightrag_doc_full", Predicate::key("id"), StepScope::Core),
        StepTemplate::new("lightrag_doc_status", Predicate::key("id"), StepScope::Core),
        StepTemplate::new("lightrag_llm_cache", Predicate::key("id"), StepScope::Extended),
        StepTemplate::new(
            "lightrag_vdb_entity",
            Predicate::chunk_or_path("chunk_ids", "file_path"),
            StepScope::Extended,
        ),
        StepTemplate::new(
            "lightrag_vdb_relation",
            Predicate::chunk_or_path("chunk_ids", "file_path"),
            StepScope::Extended,
        ),
    ]
}
