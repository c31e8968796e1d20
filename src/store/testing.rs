//! Fixtures for store-backed tests

use super::{Backend, Store};
use crate::config::Config;
use std::collections::BTreeMap;
use tempfile::TempDir;

pub(crate) const CHUNKS_PER_DOC: usize = 3;

pub(crate) const TABLES: [&str; 6] = [
    "lightrag_doc_full",
    "lightrag_doc_status",
    "lightrag_doc_chunks",
    "lightrag_llm_cache",
    "lightrag_vdb_entity",
    "lightrag_vdb_relation",
];

/// SQLite store with the default schema in a fresh temp dir (`store.db`)
pub(crate) async fn setup_test_store() -> (Store, TempDir) {
    let tmp = TempDir::new().unwrap();
    let mut store = Store::open_sqlite(&tmp.path().join("store.db"), &Config::default())
        .await
        .unwrap();
    store.init_schema().await.unwrap();
    (store, tmp)
}

pub(crate) async fn exec(store: &mut Store, sql: &str, binds: &[&str]) {
    let Backend::Sqlite(conn) = store.backend_mut().unwrap() else {
        panic!("fixtures need a SQLite store");
    };
    let mut query = sqlx::query(sql);
    for b in binds {
        query = query.bind(*b);
    }
    query.execute(&mut *conn).await.unwrap();
}

/// Insert a document with the rows LightRAG derives from it.
///
/// Every row id starts with `doc_id`. Each vector table gets one row linked
/// through `chunk_ids` (path `unknown_source`) and one linked through
/// `file_path = /docs/<doc_id>.txt`.
pub(crate) async fn seed_document(store: &mut Store, doc_id: &str) {
    let path = format!("/docs/{}.txt", doc_id);

    exec(
        store,
        "INSERT INTO lightrag_doc_full (id, content) VALUES (?1, 'full text')",
        &[doc_id],
    )
    .await;
    exec(
        store,
        "INSERT INTO lightrag_doc_status (id, status, chunks_count, file_path) VALUES (?1, 'processed', 3, ?2)",
        &[doc_id, &path],
    )
    .await;
    for i in 0..CHUNKS_PER_DOC {
        let chunk_id = format!("{}-chunk-{}", doc_id, i);
        exec(
            store,
            "INSERT INTO lightrag_doc_chunks (id, full_doc_id, chunk_order_index, content, file_path) VALUES (?1, ?2, 0, 'chunk', ?3)",
            &[&chunk_id, doc_id, &path],
        )
        .await;
    }
    exec(
        store,
        "INSERT INTO lightrag_llm_cache (id, mode, original_prompt, return_value) VALUES (?1, 'default', 'p', 'r')",
        &[doc_id],
    )
    .await;

    let by_array = serde_json::json!([doc_id]).to_string();
    let by_path = serde_json::json!([format!("{}-chunk-0", doc_id)]).to_string();
    for (table, kind) in [
        ("lightrag_vdb_entity", "entity"),
        ("lightrag_vdb_relation", "relation"),
    ] {
        let sql = format!(
            "INSERT INTO {} (id, content, chunk_ids, file_path) VALUES (?1, 'c', ?2, ?3)",
            table
        );
        let array_id = format!("{}-array-{}", doc_id, kind);
        let path_id = format!("{}-path-{}", doc_id, kind);
        exec(store, &sql, &[&array_id, &by_array, "unknown_source"]).await;
        exec(store, &sql, &[&path_id, &by_path, &path]).await;
    }
}

/// Row ids of every table, sorted
pub(crate) async fn snapshot(store: &mut Store) -> BTreeMap<String, Vec<String>> {
    let mut out = BTreeMap::new();
    for table in TABLES {
        let Backend::Sqlite(conn) = store.backend_mut().unwrap() else {
            panic!("fixtures need a SQLite store");
        };
        let ids: Vec<String> = sqlx::query_scalar(&format!("SELECT id FROM {} ORDER BY id", table))
            .fetch_all(&mut *conn)
            .await
            .unwrap();
        out.insert(table.to_string(), ids);
    }
    out
}

/// Whether any row in the snapshot belongs to `doc_id`
pub(crate) fn references(snapshot: &BTreeMap<String, Vec<String>>, doc_id: &str) -> bool {
    let prefix = format!("{}-", doc_id);
    snapshot
        .values()
        .flatten()
        .any(|id| id == doc_id || id.starts_with(&prefix))
}
