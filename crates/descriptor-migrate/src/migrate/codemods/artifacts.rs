use descriptor_yaml::{Document, Mapping, Value};

use super::{Codemod, MigrateContext, string, take_sequence};
use crate::migrate::MigrationError;

/// Rename `sources` to `artifacts`, turning each entry's `artifact` into
/// `url` or `path` and `hint` into `description`
pub struct Artifacts;

impl Codemod for Artifacts {
    fn name(&self) -> &'static str {
        "artifacts"
    }

    fn apply(
        &self,
        _ctx: &mut MigrateContext,
        descriptor: &mut Document,
    ) -> Result<(), MigrationError> {
        let Some(sources) = take_sequence(descriptor, "sources")? else {
            return Ok(());
        };

        let artifacts = sources.into_iter().map(convert_source).collect();
        descriptor.insert("artifacts", Value::Sequence(artifacts));
        Ok(())
    }
}

fn convert_source(source: Value) -> Value {
    let Value::Mapping(entry) = source else {
        return source;
    };

    let mut artifact = None;
    let mut hint = None;
    let mut rest: Vec<(Value, Value)> = Vec::with_capacity(entry.len());
    for (key, value) in entry {
        match key.as_str() {
            Some("artifact") => artifact = Some(value),
            Some("hint") => hint = Some(value),
            _ => rest.push((key, value)),
        }
    }

    if let Some(artifact) = artifact {
        let key = if artifact.as_str().is_some_and(|a| a.starts_with("http")) {
            "url"
        } else {
            "path"
        };
        rest.insert(0, (string(key), artifact));
    }

    if let Some(hint) = hint {
        rest.insert(rest.len().min(1), (string("description"), hint));
    }

    Value::Mapping(rest.into_iter().collect::<Mapping>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrate::codemods::test_support::{apply, keys, yaml};

    fn entry_keys(value: &Value) -> Vec<&str> {
        value
            .as_mapping()
            .unwrap()
            .iter()
            .filter_map(|(k, _)| k.as_str())
            .collect()
    }

    #[test]
    fn test_http_artifact_becomes_url() {
        let doc = apply(
            &Artifacts,
            "sources:\n- md5: abc\n  artifact: https://example.com/a.zip\n  hint: Get it\n",
        );
        let artifacts = doc.get("artifacts").unwrap();
        assert_eq!(
            artifacts,
            &yaml("[{url: 'https://example.com/a.zip', description: Get it, md5: abc}]")
        );
        assert_eq!(
            entry_keys(&artifacts[0]),
            ["url", "description", "md5"]
        );
    }

    #[test]
    fn test_local_artifact_becomes_path() {
        let doc = apply(&Artifacts, "sources:\n- artifact: jolokia.jar\n  md5: x\n");
        let entry = &doc.get("artifacts").unwrap()[0];
        assert_eq!(entry.get("path"), Some(&yaml("jolokia.jar")));
        assert!(entry.get("url").is_none());
        assert!(entry.get("artifact").is_none());
    }

    #[test]
    fn test_hint_without_artifact() {
        let doc = apply(&Artifacts, "sources:\n- name: a\n  md5: x\n  hint: h\n");
        let entry = &doc.get("artifacts").unwrap()[0];
        assert_eq!(entry_keys(entry), ["name", "description", "md5"]);
    }

    #[test]
    fn test_sources_renamed_and_appended() {
        let doc = apply(&Artifacts, "sources: []\nname: a\n");
        assert_eq!(keys(&doc), ["name", "artifacts"]);
        assert_eq!(doc.get("artifacts"), Some(&Value::Sequence(vec![])));
    }
}
