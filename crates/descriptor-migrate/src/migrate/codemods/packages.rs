use descriptor_yaml::{Document, Value};

use super::{Codemod, MigrateContext, mapping, string};
use crate::migrate::MigrationError;

/// Package repositories enabled for every migrated descriptor
const PACKAGE_REPOSITORIES: [&str; 3] = ["jboss-os", "jboss-ocp", "jboss-rhscl"];

/// Nest the legacy package list under `packages.install`
pub struct Packages;

impl Codemod for Packages {
    fn name(&self) -> &'static str {
        "packages"
    }

    fn apply(
        &self,
        _ctx: &mut MigrateContext,
        descriptor: &mut Document,
    ) -> Result<(), MigrationError> {
        let Some(packages) = descriptor.remove("packages") else {
            return Ok(());
        };

        let repositories = PACKAGE_REPOSITORIES.iter().map(|r| string(r)).collect();
        descriptor.insert(
            "packages",
            mapping([
                ("install", packages),
                ("repositories", Value::Sequence(repositories)),
            ]),
        );
        Ok(())
    }
}
