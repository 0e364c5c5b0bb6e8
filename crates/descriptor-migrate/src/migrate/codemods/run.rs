use descriptor_yaml::{Document, Mapping, Value};

use super::{Codemod, MigrateContext, string};
use crate::migrate::MigrationError;

/// Legacy top-level keys collected into `run`, in output order
const RUN_KEYS: [&str; 4] = ["user", "entrypoint", "cmd", "workdir"];

/// Collect runtime settings into a nested `run` section
pub struct Run;

impl Codemod for Run {
    fn name(&self) -> &'static str {
        "run"
    }

    fn apply(
        &self,
        _ctx: &mut MigrateContext,
        descriptor: &mut Document,
    ) -> Result<(), MigrationError> {
        let mut run = Mapping::new();
        for key in RUN_KEYS {
            if let Some(value) = descriptor.remove(key) {
                run.insert(string(key), value);
            }
        }

        if !run.is_empty() {
            descriptor.insert("run", Value::Mapping(run));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrate::codemods::test_support::{apply, keys, yaml};

    #[test]
    fn test_run_keys_collected_in_fixed_order() {
        let doc = apply(
            &Run,
            "workdir: /home\nname: a\ncmd: [run.sh]\nuser: 185\n",
        );
        assert_eq!(keys(&doc), ["name", "run"]);
        assert_eq!(
            doc.get("run"),
            Some(&yaml("{user: 185, cmd: [run.sh], workdir: /home}"))
        );
    }

    #[test]
    fn test_no_run_keys() {
        let doc = apply(&Run, "name: a\n");
        assert_eq!(keys(&doc), ["name"]);
    }
}
