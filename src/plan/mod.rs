//! Cascade planning
//!
//! A plan is the ordered list of per-table deletes that removes one document
//! and everything derived from it. Plans are pure data: building one never
//! touches the store, and every step is safe to run against rows that do not
//! exist.

mod predicate;

pub use predicate::*;

use crate::error::{Error, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Stable external identifier of an ingested document
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for DocumentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Which plan variants a step belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepScope {
    /// Runs in every plan
    Core,
    /// Runs only in extended plans
    #[default]
    Extended,
}

/// Plan variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PlanVariant {
    /// Chunks, document and status records only
    Core,
    /// Core plus LLM cache and vector index cleanup
    #[default]
    Extended,
}

impl PlanVariant {
    pub fn includes(&self, scope: StepScope) -> bool {
        match self {
            PlanVariant::Core => scope == StepScope::Core,
            PlanVariant::Extended => true,
        }
    }
}

impl std::fmt::Display for PlanVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlanVariant::Core => write!(f, "core"),
            PlanVariant::Extended => write!(f, "extended"),
        }
    }
}

/// One entry of the configured cascade, independent of any document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepTemplate {
    pub table: String,
    pub predicate: Predicate,
    #[serde(default)]
    pub scope: StepScope,
}

impl StepTemplate {
    pub fn new(table: &str, predicate: Predicate, scope: StepScope) -> Self {
        Self {
            table: table.to_string(),
            predicate,
            scope,
        }
    }

    /// Check table and column names are plain identifiers
    pub fn validate(&self) -> Result<()> {
        validate_identifier(&self.table)?;
        validate_predicate(&self.predicate)
    }
}

fn validate_predicate(predicate: &Predicate) -> Result<()> {
    match predicate {
        Predicate::AnyOf { predicates } if predicates.is_empty() => Err(Error::Config(
            "any_of predicate needs at least one alternative".to_string(),
        )),
        Predicate::AnyOf { predicates } => predicates.iter().try_for_each(validate_predicate),
        _ => predicate
            .columns()
            .into_iter()
            .try_for_each(validate_identifier),
    }
}

/// Reject anything that is not a bare SQL identifier
pub fn validate_identifier(name: &str) -> Result<()> {
    static IDENT: OnceLock<regex::Regex> = OnceLock::new();
    let re = IDENT.get_or_init(|| {
        regex::Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier regex is valid")
    });
    if re.is_match(name) {
        Ok(())
    } else {
        Err(Error::InvalidIdentifier(name.to_string()))
    }
}

/// A planned delete against one table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteStep {
    /// 1-based position in the plan
    pub position: usize,
    pub table: String,
    pub predicate: Predicate,
}

impl DeleteStep {
    /// Parameterized DELETE statement; the document id binds to the only placeholder
    pub fn to_sql(&self, dialect: Dialect) -> String {
        format!(
            "DELETE FROM {} WHERE {}",
            dialect.quote_ident(&self.table),
            self.predicate.to_sql(dialect)
        )
    }
}

/// The full cascade for one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascadePlan {
    pub doc_id: DocumentId,
    pub variant: PlanVariant,
    pub steps: Vec<DeleteStep>,
}

impl CascadePlan {
    pub fn doc_id(&self) -> &DocumentId {
        &self.doc_id
    }

    pub fn steps(&self) -> &[DeleteStep] {
        &self.steps
    }

    /// Whether any step matches by substring and may over-delete
    pub fn is_approximate(&self) -> bool {
        self.steps.iter().any(|s| s.predicate.is_approximate())
    }
}

/// Builds plans from the configured step templates
#[derive(Debug, Clone)]
pub struct Planner {
    templates: Vec<StepTemplate>,
    variant: PlanVariant,
}

impl Planner {
    pub fn new(templates: Vec<StepTemplate>, variant: PlanVariant) -> Result<Self> {
        if !templates.iter().any(|t| t.scope == StepScope::Core) {
            return Err(Error::Config(
                "cascade needs at least one core step".to_string(),
            ));
        }
        for template in &templates {
            template.validate()?;
        }
        Ok(Self { templates, variant })
    }

    pub fn variant(&self) -> PlanVariant {
        self.variant
    }

    /// Plan the deletion of `doc_id`. Does not consult the store.
    pub fn plan(&self, doc_id: impl Into<DocumentId>) -> CascadePlan {
        let steps = self
            .templates
            .iter()
            .filter(|t| self.variant.includes(t.scope))
            .enumerate()
            .map(|(i, t)| DeleteStep {
                position: i + 1,
                table: t.table.clone(),
                predicate: t.predicate.clone(),
            })
            .collect();

        CascadePlan {
            doc_id: doc_id.into(),
            variant: self.variant,
            steps,
        }
    }
}
