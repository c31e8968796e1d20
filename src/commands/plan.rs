//! Plan command - show the cascade without running it

use crate::plan::{CascadePlan, Dialect, DocumentId, Planner};
use std::io::Write;

/// Build the plan for `doc_id`
pub fn cmd_plan(planner: &Planner, doc_id: &str) -> CascadePlan {
    planner.plan(DocumentId::new(doc_id.trim()))
}

/// Write each step and the statement it will run
pub fn write_plan<W: Write + ?Sized>(
    out: &mut W,
    plan: &CascadePlan,
    dialect: Dialect,
) -> std::io::Result<()> {
    writeln!(
        out,
        "\n📋 Deletion plan for '{}' ({} variant, {})\n",
        plan.doc_id(),
        plan.variant,
        dialect
    )?;

    for step in plan.steps() {
        writeln!(out, "{}. {}", step.position, step.table)?;
        writeln!(out, "   where {}", step.predicate)?;
        writeln!(out, "   {}", step.to_sql(dialect))?;
    }

    if plan.is_approximate() {
        writeln!(
            out,
            "\n⚠️  Path matching is a substring test: rows whose file_path merely \
             contains '{}' are deleted too.",
            plan.doc_id()
        )?;
    }
    Ok(())
}

pub fn print_plan(plan: &CascadePlan, dialect: Dialect) -> crate::error::Result<()> {
    write_plan(&mut std::io::stdout().lock(), plan, dialect)?;
    Ok(())
}
