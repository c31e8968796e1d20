//! Catalog listing

use crate::error::Result;
use crate::plan::DocumentId;
use crate::store::DocumentStore;
use std::io::Write;
use tracing::info;

/// List document ids in ascending order
pub async fn cmd_list_documents<S: DocumentStore + ?Sized>(store: &mut S) -> Result<Vec<DocumentId>> {
    info!("Listing documents");
    store.list_document_ids().await
}

/// Write the numbered catalog (1-based)
pub fn write_documents<W: Write + ?Sized>(out: &mut W, ids: &[DocumentId]) -> std::io::Result<()> {
    if ids.is_empty() {
        return writeln!(out, "No documents found.");
    }

    writeln!(out, "Available Document IDs:")?;
    for (i, id) in ids.iter().enumerate() {
        writeln!(out, "{}. {}", i + 1, id)?;
    }
    Ok(())
}

/// Print the numbered catalog to console
pub fn print_documents(ids: &[DocumentId]) -> Result<()> {
    write_documents(&mut std::io::stdout().lock(), ids)?;
    Ok(())
}
