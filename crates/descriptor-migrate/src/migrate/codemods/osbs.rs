use descriptor_yaml::{Document, Value};

use super::{Codemod, MigrateContext, mapping};
use crate::migrate::MigrationError;

const DIST_GIT: &str = "dogen.plugins.dist_git";

/// Replace the `dogen` section with an `osbs` repository reference taken
/// from its dist-git plugin settings
pub struct Osbs;

impl Codemod for Osbs {
    fn name(&self) -> &'static str {
        "osbs"
    }

    fn apply(
        &self,
        _ctx: &mut MigrateContext,
        descriptor: &mut Document,
    ) -> Result<(), MigrationError> {
        let Some(dogen) = descriptor.remove("dogen") else {
            return Ok(());
        };

        let dist_git = match dogen.get("plugins").and_then(|p| p.get("dist_git")) {
            Some(Value::Mapping(dist_git)) if !dist_git.is_empty() => dist_git,
            None | Some(Value::Null) | Some(Value::Mapping(_)) => return Ok(()),
            Some(other) => return Err(MigrationError::unexpected(DIST_GIT, "mapping", other)),
        };

        let field = |field: &'static str| {
            dist_git
                .get(field)
                .cloned()
                .ok_or(MigrationError::MissingField {
                    section: DIST_GIT,
                    field,
                })
        };
        let repository = mapping([("name", field("repo")?), ("branch", field("branch")?)]);

        descriptor.insert("osbs", mapping([("repository", repository)]));
        Ok(())
    }
}
