//! Row predicates for delete steps and their SQL rendering

use serde::{Deserialize, Serialize};

/// SQL flavor a predicate is rendered for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    Postgres,
    Sqlite,
}

impl Dialect {
    /// Placeholder for the single bound document id
    pub fn placeholder(&self) -> &'static str {
        match self {
            Dialect::Postgres => "$1",
            Dialect::Sqlite => "?1",
        }
    }

    /// Quote a validated identifier.
    ///
    /// SQLite reads a double-quoted name that matches no column as a string
    /// literal, so it gets backticks, which always resolve as identifiers and
    /// fail on unknown names.
    pub fn quote_ident(&self, name: &str) -> String {
        match self {
            Dialect::Postgres => format!("\"{}\"", name),
            Dialect::Sqlite => format!("`{}`", name),
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dialect::Postgres => write!(f, "postgres"),
            Dialect::Sqlite => write!(f, "sqlite"),
        }
    }
}

/// How a table references the document being deleted.
///
/// The document id is always the only bound parameter; column names come from
/// validated configuration and are quoted on rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Predicate {
    /// `column = id`
    KeyEquality { column: String },

    /// `id` is an element of the array in `column`.
    ///
    /// PostgreSQL arrays are native; SQLite stores them as JSON text.
    ArrayMembership { column: String },

    /// `column LIKE '%' || id || '%'`
    ///
    /// Best effort: matches any path containing the id, including ids of
    /// other documents that share the prefix (`doc-1` in `doc-10.txt`), and
    /// `%`/`_` inside the id act as wildcards.
    SubstringOfPath { column: String },

    /// Disjunction of the inner predicates
    AnyOf { predicates: Vec<Predicate> },
}

impl Predicate {
    pub fn key(column: &str) -> Self {
        Predicate::KeyEquality {
            column: column.to_string(),
        }
    }

    /// Vector index membership: the id is in `array_column` or a substring of `path_column`
    pub fn chunk_or_path(array_column: &str, path_column: &str) -> Self {
        Predicate::AnyOf {
            predicates: vec![
                Predicate::ArrayMembership {
                    column: array_column.to_string(),
                },
                Predicate::SubstringOfPath {
                    column: path_column.to_string(),
                },
            ],
        }
    }

    /// All column names referenced, in rendering order
    pub fn columns(&self) -> Vec<&str> {
        match self {
            Predicate::KeyEquality { column }
            | Predicate::ArrayMembership { column }
            | Predicate::SubstringOfPath { column } => vec![column.as_str()],
            Predicate::AnyOf { predicates } => {
                predicates.iter().flat_map(|p| p.columns()).collect()
            }
        }
    }

    /// Whether the predicate can match rows of unrelated documents
    pub fn is_approximate(&self) -> bool {
        match self {
            Predicate::SubstringOfPath { .. } => true,
            Predicate::AnyOf { predicates } => predicates.iter().any(|p| p.is_approximate()),
            _ => false,
        }
    }

    /// Render as a SQL boolean expression
    pub fn to_sql(&self, dialect: Dialect) -> String {
        let param = dialect.placeholder();
        match self {
            Predicate::KeyEquality { column } => {
                format!("{} = {}", dialect.quote_ident(column), param)
            }
            Predicate::ArrayMembership { column } => match dialect {
                Dialect::Postgres => format!("{} = ANY({})", param, dialect.quote_ident(column)),
                // Rows whose array text is not valid JSON are treated as empty
                Dialect::Sqlite => {
                    let column = dialect.quote_ident(column);
                    format!(
                        "EXISTS (SELECT 1 FROM json_each(CASE WHEN json_valid({col}) THEN {col} ELSE '[]' END) WHERE json_each.value = {param})",
                        col = column,
                        param = param
                    )
                }
            },
            Predicate::SubstringOfPath { column } => {
                format!("{} LIKE '%' || {} || '%'", dialect.quote_ident(column), param)
            }
            Predicate::AnyOf { predicates } => match predicates.as_slice() {
                [single] => single.to_sql(dialect),
                _ => predicates
                    .iter()
                    .map(|p| format!("({})", p.to_sql(dialect)))
                    .collect::<Vec<_>>()
                    .join(" OR "),
            },
        }
    }
}

impl std::fmt::Display for Predicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Predicate::KeyEquality { column } => write!(f, "{} = id", column),
            Predicate::ArrayMembership { column } => write!(f, "id in {}", column),
            Predicate::SubstringOfPath { column } => write!(f, "{} contains id", column),
            Predicate::AnyOf { predicates } => {
                let parts: Vec<String> = predicates.iter().map(|p| p.to_string()).collect();
                write!(f, "{}", parts.join(" or "))
            }
        }
    }
}
