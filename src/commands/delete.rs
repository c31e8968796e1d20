//! Delete command - interactive selection and direct-id deletion

use crate::commands::list::write_documents;
use crate::error::Result;
use crate::plan::{DocumentId, Planner};
use crate::store::{CascadeReport, DocumentStore};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, Write};
use tracing::{info, warn};

/// What happened to a deletion request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DeletionOutcome {
    /// The catalog is empty
    NoDocuments,
    /// Selection was not a number in range; nothing was deleted
    InvalidSelection { input: String },
    /// A direct deletion was requested with a blank id
    MissingId,
    /// The operator did not confirm
    Cancelled { doc_id: DocumentId },
    /// The cascade committed
    Deleted { report: CascadeReport },
    /// The cascade rolled back
    Failed { doc_id: DocumentId, error: String },
}

impl DeletionOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, DeletionOutcome::Failed { .. })
    }
}

/// Parse a 1-based selection into a 0-based index, if in range
pub fn parse_selection(input: &str, len: usize) -> Option<usize> {
    match input.trim().parse::<usize>() {
        Ok(n) if n >= 1 && n <= len => Some(n - 1),
        _ => None,
    }
}

/// Only `y` (any case, surrounding whitespace ignored) confirms
pub fn is_confirmed(input: &str) -> bool {
    input.trim().eq_ignore_ascii_case("y")
}

fn prompt<R, W>(input: &mut R, out: &mut W, label: &str) -> Result<String>
where
    R: BufRead + ?Sized,
    W: Write + ?Sized,
{
    write!(out, "{}", label)?;
    out.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// List the catalog, ask which document to delete, confirm, then run the cascade.
///
/// Nothing but the catalog query touches the store unless the operator picks
/// a valid entry and answers `y`. A failed cascade is returned as an error.
pub async fn cmd_delete_interactive<S, R, W>(
    store: &mut S,
    planner: &Planner,
    input: &mut R,
    out: &mut W,
) -> Result<DeletionOutcome>
where
    S: DocumentStore + ?Sized,
    R: BufRead + ?Sized,
    W: Write + ?Sized,
{
    let ids = store.list_document_ids().await?;
    write_documents(out, &ids)?;
    if ids.is_empty() {
        return Ok(DeletionOutcome::NoDocuments);
    }

    let choice = prompt(
        input,
        out,
        "\nEnter the number of the document to delete: ",
    )?;
    let Some(index) = parse_selection(&choice, ids.len()) else {
        writeln!(out, "Invalid selection.")?;
        return Ok(DeletionOutcome::InvalidSelection { input: choice });
    };
    let selected = ids[index].clone();

    let answer = prompt(
        input,
        out,
        &format!(
            "Are you sure you want to delete document '{}'? (y/n): ",
            selected
        ),
    )?;
    if !is_confirmed(&answer) {
        writeln!(out, "Deletion cancelled.")?;
        info!(doc_id = %selected, "Deletion cancelled by operator");
        return Ok(DeletionOutcome::Cancelled { doc_id: selected });
    }

    let report = store.execute(&planner.plan(selected.clone())).await?;
    writeln!(
        out,
        "✅ Document '{}' and related data deleted successfully.",
        selected
    )?;
    Ok(DeletionOutcome::Deleted { report })
}

/// Ask for a raw document id
pub fn read_document_id<R, W>(input: &mut R, out: &mut W) -> Result<String>
where
    R: BufRead + ?Sized,
    W: Write + ?Sized,
{
    prompt(input, out, "Enter the document ID to delete: ")
}

/// Delete `doc_id` without consulting the catalog or asking for confirmation.
///
/// An id that exists nowhere still runs the full cascade and removes nothing.
/// Cascade failures are reported in the outcome rather than returned.
pub async fn cmd_delete_direct<S, W>(
    store: &mut S,
    planner: &Planner,
    doc_id: &str,
    out: &mut W,
) -> Result<DeletionOutcome>
where
    S: DocumentStore + ?Sized,
    W: Write + ?Sized,
{
    let doc_id = doc_id.trim();
    // An empty id would turn the path predicate into LIKE '%%'
    if doc_id.is_empty() {
        writeln!(out, "No document ID entered.")?;
        return Ok(DeletionOutcome::MissingId);
    }

    let doc_id = DocumentId::new(doc_id);
    match store.execute(&planner.plan(doc_id.clone())).await {
        Ok(report) => {
            if report.total_rows() == 0 {
                info!(doc_id = %doc_id, "No rows referenced this document");
            }
            writeln!(
                out,
                "✅ Document {} and all related data deleted successfully.",
                doc_id
            )?;
            Ok(DeletionOutcome::Deleted { report })
        }
        Err(e) => {
            warn!(doc_id = %doc_id, "Direct deletion failed: {}", e);
            writeln!(out, "❌ Error while deleting document {}: {}", doc_id, e)?;
            Ok(DeletionOutcome::Failed {
                doc_id,
                error: e.to_string(),
            })
        }
    }
}

/// Print the per-step row counts of a committed cascade
pub fn print_report(report: &CascadeReport) {
    println!("\n🧹 Cascade ({} plan)\n", report.variant);
    for step in &report.steps {
        println!(
            "{}. {}: {} rows removed",
            step.position, step.table, step.rows_affected
        );
    }
    println!("Total rows removed: {}", report.total_rows());
}
