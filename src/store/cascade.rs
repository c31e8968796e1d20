//! Atomic cascade execution

use super::{Backend, Store};
use crate::plan::{CascadePlan, DocumentId, PlanVariant};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::{Connection, Postgres, Sqlite, Transaction};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Why a cascade did not commit. In every case nothing was committed.
#[derive(Error, Debug)]
pub enum DeletionError {
    #[error("store connection is closed")]
    Disconnected,

    #[error("could not begin transaction: {0}")]
    Begin(#[source] sqlx::Error),

    #[error("step {position} ({table}) failed: {source}")]
    Step {
        position: usize,
        table: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("could not commit transaction: {0}")]
    Commit(#[source] sqlx::Error),

    #[error("cascade for '{doc_id}' timed out after {after:?}")]
    Timeout { doc_id: DocumentId, after: Duration },
}

/// Rows removed by one step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepOutcome {
    pub position: usize,
    pub table: String,
    pub rows_affected: u64,
}

/// Result of a committed cascade
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CascadeReport {
    pub doc_id: DocumentId,
    pub variant: PlanVariant,
    pub started_at: String,
    pub committed_at: String,
    pub steps: Vec<StepOutcome>,
}

impl CascadeReport {
    pub fn total_rows(&self) -> u64 {
        self.steps.iter().map(|s| s.rows_affected).sum()
    }
}

enum Tx<'c> {
    Postgres(Transaction<'c, Postgres>),
    Sqlite(Transaction<'c, Sqlite>),
}

impl Tx<'_> {
    async fn delete(&mut self, sql: &str, doc_id: &str) -> Result<u64, sqlx::Error> {
        let result = match self {
            Tx::Postgres(tx) => sqlx::query(sql)
                .bind(doc_id)
                .execute(&mut **tx)
                .await?
                .rows_affected(),
            Tx::Sqlite(tx) => sqlx::query(sql)
                .bind(doc_id)
                .execute(&mut **tx)
                .await?
                .rows_affected(),
        };
        Ok(result)
    }

    async fn commit(self) -> Result<(), sqlx::Error> {
        match self {
            Tx::Postgres(tx) => tx.commit().await,
            Tx::Sqlite(tx) => tx.commit().await,
        }
    }

    async fn rollback(self) -> Result<(), sqlx::Error> {
        match self {
            Tx::Postgres(tx) => tx.rollback().await,
            Tx::Sqlite(tx) => tx.rollback().await,
        }
    }
}

impl Store {
    /// Execute a cascade plan atomically.
    ///
    /// Steps run in plan order inside one transaction. The first failing step
    /// rolls the whole transaction back. If the configured deadline passes
    /// first, the connection is dropped with the transaction still open, so
    /// nothing commits, and this store cannot be used again.
    pub async fn execute(&mut self, plan: &CascadePlan) -> Result<CascadeReport, DeletionError> {
        if plan.is_approximate() {
            warn!(
                doc_id = %plan.doc_id(),
                "Plan matches vector rows by path substring; rows of other documents may be removed"
            );
        }

        let deadline = self.timeout;
        match tokio::time::timeout(deadline, self.run_cascade(plan)).await {
            Ok(result) => result,
            Err(_) => {
                error!(doc_id = %plan.doc_id(), "Cascade timed out after {:?}", deadline);
                self.abandon();
                Err(DeletionError::Timeout {
                    doc_id: plan.doc_id().clone(),
                    after: deadline,
                })
            }
        }
    }

    async fn run_cascade(&mut self, plan: &CascadePlan) -> Result<CascadeReport, DeletionError> {
        let dialect = self.dialect;
        let doc_id = plan.doc_id().as_str();
        let started_at = Utc::now().to_rfc3339();

        info!(doc_id = %doc_id, steps = plan.steps().len(), "Starting cascade");

        let mut tx = match self.backend.as_mut() {
            Some(Backend::Postgres(conn)) => Tx::Postgres(conn.begin().await.map_err(DeletionError::Begin)?),
            Some(Backend::Sqlite(conn)) => Tx::Sqlite(conn.begin().await.map_err(DeletionError::Begin)?),
            None => return Err(DeletionError::Disconnected),
        };

        let mut outcomes = Vec::with_capacity(plan.steps().len());
        for step in plan.steps() {
            let sql = step.to_sql(dialect);
            debug!(step = step.position, table = %step.table, "{}", sql);

            match tx.delete(&sql, doc_id).await {
                Ok(rows) => {
                    debug!(step = step.position, table = %step.table, rows, "Step done");
                    outcomes.push(StepOutcome {
                        position: step.position,
                        table: step.table.clone(),
                        rows_affected: rows,
                    });
                }
                Err(source) => {
                    error!(
                        doc_id = %doc_id,
                        step = step.position,
                        table = %step.table,
                        "Step failed, rolling back: {}",
                        source
                    );
                    if let Err(e) = tx.rollback().await {
                        warn!("Rollback failed: {}", e);
                    }
                    return Err(DeletionError::Step {
                        position: step.position,
                        table: step.table.clone(),
                        source,
                    });
                }
            }
        }

        tx.commit().await.map_err(DeletionError::Commit)?;

        let report = CascadeReport {
            doc_id: plan.doc_id().clone(),
            variant: plan.variant,
            started_at,
            committed_at: Utc::now().to_rfc3339(),
            steps: outcomes,
        };
        info!(doc_id = %doc_id, rows = report.total_rows(), "Cascade committed");
        Ok(report)
    }
}
