//! Subcommand handlers

pub mod compliance;
pub mod directory;
pub mod rules;

/// Canonical person id from any RUT spelling
pub(crate) fn person_id(rut: &str) -> anyhow::Result<String> {
    Ok(prereq_core::Rut::parse(rut)?.to_string())
}
