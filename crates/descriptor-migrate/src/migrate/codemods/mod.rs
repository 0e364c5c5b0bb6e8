use descriptor_yaml::{Document, EmitOptions, Value};
use std::path::PathBuf;

use super::MigrationError;

pub mod artifacts;
pub mod labels;
pub mod modules;
pub mod osbs;
pub mod packages;
pub mod run;
pub mod schema_version;

/// Schema revision stamped on every migrated descriptor
pub const SCHEMA_VERSION: u64 = 1;

/// Context passed to all codemods during migration
#[derive(Debug, Clone)]
pub struct MigrateContext {
    /// Directory containing the descriptor being migrated
    pub descriptor_dir: PathBuf,
    /// Layout used for module descriptors written next to it
    pub emit: EmitOptions,
    /// Plan filesystem side effects without performing them
    pub dry_run: bool,
    /// Module descriptors written (or planned, when `dry_run` is set)
    pub module_descriptors: Vec<PathBuf>,
    /// Whether `scripts/` was (or would be) renamed to `modules/`
    pub renamed_scripts_dir: bool,
}

impl MigrateContext {
    pub fn new(descriptor_dir: PathBuf, emit: EmitOptions, dry_run: bool) -> Self {
        Self {
            descriptor_dir,
            emit,
            dry_run,
            module_descriptors: Vec::new(),
            renamed_scripts_dir: false,
        }
    }
}

/// One self-contained rewrite of the descriptor. A codemod whose trigger
/// key is absent leaves the descriptor untouched.
pub trait Codemod {
    fn name(&self) -> &'static str;
    fn apply(
        &self,
        ctx: &mut MigrateContext,
        descriptor: &mut Document,
    ) -> Result<(), MigrationError>;
}

pub(crate) fn string(s: &str) -> Value {
    Value::String(s.to_string())
}

pub(crate) fn mapping<const N: usize>(entries: [(&str, Value); N]) -> Value {
    Value::Mapping(entries.into_iter().map(|(k, v)| (string(k), v)).collect())
}

pub(crate) fn schema_version() -> Value {
    Value::Number(SCHEMA_VERSION.into())
}

/// Remove `key` from the descriptor, requiring a sequence if present.
/// An explicit `null` counts as an empty sequence.
pub(crate) fn take_sequence(
    descriptor: &mut Document,
    key: &str,
) -> Result<Option<Vec<Value>>, MigrationError> {
    match descriptor.remove(key) {
        None => Ok(None),
        Some(Value::Sequence(items)) => Ok(Some(items)),
        Some(Value::Null) => Ok(Some(Vec::new())),
        Some(other) => Err(MigrationError::unexpected(key, "sequence", &other)),
    }
}

/// Look up a required field of a sequence entry.
pub(crate) fn required<'a>(
    entry: &'a Value,
    section: &'static str,
    field: &'static str,
) -> Result<&'a Value, MigrationError> {
    entry
        .get(field)
        .ok_or(MigrationError::MissingField { section, field })
}

pub(crate) fn required_str<'a>(
    entry: &'a Value,
    section: &'static str,
    field: &'static str,
) -> Result<&'a str, MigrationError> {
    let value = required(entry, section, field)?;
    value
        .as_str()
        .ok_or_else(|| MigrationError::unexpected(format!("{section}.{field}"), "string", value))
}
