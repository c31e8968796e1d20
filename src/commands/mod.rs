//! CLI commands implementation

pub mod delete;
pub mod list;
pub mod plan;
pub mod status;

pub use delete::*;
pub use list::*;
pub use plan::*;
pub use status::*;
