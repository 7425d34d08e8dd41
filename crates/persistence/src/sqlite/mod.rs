//! SQLite persistence module
//!
//! Repository pattern for SQLite access, plus [`SqliteStore`] which exposes
//! the repos through the store traits.

pub mod repos;
pub mod schema;
pub mod store;

pub use repos::{
    create_pool, create_schema, init_database, AssignmentRepo, ClientRepo, DocumentRepo,
    PersonRepo, RuleRepo,
};
pub use schema::{AssignmentRow, ClientRow, DocumentRow, PersonRow, RuleRow, SCHEMA_SQL};
pub use store::SqliteStore;
