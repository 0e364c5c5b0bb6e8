use descriptor_yaml::Document;

use super::{Codemod, MigrateContext, schema_version};
use crate::migrate::MigrationError;

/// Stamp `schema_version: 1` as the first key, followed by a blank line
pub struct SchemaVersion;

impl Codemod for SchemaVersion {
    fn name(&self) -> &'static str {
        "schema_version"
    }

    fn apply(
        &self,
        _ctx: &mut MigrateContext,
        descriptor: &mut Document,
    ) -> Result<(), MigrationError> {
        descriptor.insert_at(0, "schema_version", schema_version());
        descriptor.set_blank_line_after("schema_version");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrate::codemods::test_support::{apply, keys};
    use descriptor_yaml::{EmitOptions, Value};

    #[test]
    fn test_schema_version_is_first() {
        let doc = apply(&SchemaVersion, "name: foo\nversion: '1.0'\n");
        assert_eq!(keys(&doc), ["schema_version", "name", "version"]);
        assert_eq!(doc.get("schema_version"), Some(&Value::Number(1.into())));
        assert!(doc.annotation("schema_version").unwrap().blank_line_after);
    }

    #[test]
    fn test_schema_version_output_layout() {
        let doc = apply(&SchemaVersion, "name: foo\n");
        assert_eq!(
            doc.to_yaml_string(&EmitOptions::default()).unwrap(),
            "schema_version: 1\n\nname: foo\n"
        );
    }
}
