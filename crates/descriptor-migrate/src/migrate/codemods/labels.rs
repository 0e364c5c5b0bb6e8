use descriptor_yaml::{Document, Value};

use super::{Codemod, MigrateContext, mapping, string, take_sequence};
use crate::migrate::MigrationError;

/// Key position `labels` is reinserted at
const LABELS_INDEX: usize = 5;

/// Fold `maintainer` into `labels` and move `labels` to its fixed position
pub struct Labels;

impl Codemod for Labels {
    fn name(&self) -> &'static str {
        "labels"
    }

    fn apply(
        &self,
        _ctx: &mut MigrateContext,
        descriptor: &mut Document,
    ) -> Result<(), MigrationError> {
        let mut labels = take_sequence(descriptor, "labels")?.unwrap_or_default();

        if let Some(maintainer) = descriptor.remove("maintainer") {
            labels.push(mapping([
                ("name", string("maintainer")),
                ("value", maintainer),
            ]));
        }

        if !labels.is_empty() {
            descriptor.insert_at(LABELS_INDEX, "labels", Value::Sequence(labels));
        }
        Ok(())
    }
}
