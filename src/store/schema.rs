//! LightRAG table layout
//!
//! Only the columns the cascade and the catalog touch, plus enough payload
//! columns to make fixtures look like real rows. Vector columns are left out
//! so the PostgreSQL schema does not need the pgvector extension.

/// PostgreSQL schema for the default tables
pub const POSTGRES_SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS lightrag_doc_full (
    id VARCHAR(255) PRIMARY KEY,
    content TEXT,
    create_time TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS lightrag_doc_status (
    id VARCHAR(255) PRIMARY KEY,
    content_summary TEXT,
    chunks_count INTEGER,
    status VARCHAR(64) NOT NULL,
    file_path TEXT,
    updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS lightrag_doc_chunks (
    id VARCHAR(255) PRIMARY KEY,
    full_doc_id VARCHAR(255) NOT NULL,
    chunk_order_index INTEGER,
    content TEXT,
    file_path TEXT
);

CREATE TABLE IF NOT EXISTS lightrag_llm_cache (
    id VARCHAR(255) PRIMARY KEY,
    mode VARCHAR(32),
    original_prompt TEXT,
    return_value TEXT
);

CREATE TABLE IF NOT EXISTS lightrag_vdb_entity (
    id VARCHAR(255) PRIMARY KEY,
    entity_name VARCHAR(255),
    content TEXT,
    chunk_ids VARCHAR(255)[],
    file_path TEXT
);

CREATE TABLE IF NOT EXISTS lightrag_vdb_relation (
    id VARCHAR(255) PRIMARY KEY,
    source_id VARCHAR(255),
    target_id VARCHAR(255),
    content TEXT,
    chunk_ids VARCHAR(255)[],
    file_path TEXT
);

CREATE INDEX IF NOT EXISTS idx_lightrag_doc_chunks_doc ON lightrag_doc_chunks(full_doc_id);
"#;

/// SQLite schema for the default tables (`chunk_ids` holds a JSON array)
pub const SQLITE_SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS lightrag_doc_full (
    id TEXT PRIMARY KEY,
    content TEXT,
    create_time TEXT DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS lightrag_doc_status (
    id TEXT PRIMARY KEY,
    content_summary TEXT,
    chunks_count INTEGER,
    status TEXT NOT NULL,
    file_path TEXT,
    updated_at TEXT DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS lightrag_doc_chunks (
    id TEXT PRIMARY KEY,
    full_doc_id TEXT NOT NULL,
    chunk_order_index INTEGER,
    content TEXT,
    file_path TEXT
);

CREATE TABLE IF NOT EXISTS lightrag_llm_cache (
    id TEXT PRIMARY KEY,
    mode TEXT,
    original_prompt TEXT,
    return_value TEXT
);

CREATE TABLE IF NOT EXISTS lightrag_vdb_entity (
    id TEXT PRIMARY KEY,
    entity_name TEXT,
    content TEXT,
    chunk_ids TEXT,
    file_path TEXT
);

CREATE TABLE IF NOT EXISTS lightrag_vdb_relation (
    id TEXT PRIMARY KEY,
    source_id TEXT,
    target_id TEXT,
    content TEXT,
    chunk_ids TEXT,
    file_path TEXT
);

CREATE INDEX IF NOT EXISTS idx_lightrag_doc_chunks_doc ON lightrag_doc_chunks(full_doc_id);
"#;
