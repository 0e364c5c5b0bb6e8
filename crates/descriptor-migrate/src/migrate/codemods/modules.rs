use descriptor_yaml::{Document, EmitOptions, Mapping, Value};
use log::{debug, warn};
use std::fs;
use std::path::{Component, Path};

use super::{
    Codemod, MigrateContext, mapping, required, required_str, schema_version, string,
    take_sequence,
};
use crate::migrate::MigrationError;

/// File name of a module descriptor inside `modules/<package>/`
pub const MODULE_DESCRIPTOR: &str = "module.yaml";

const CCT_MODULE_REPOSITORY: &str = "https://github.com/jboss-openshift/cct_module.git";
const CCT_MODULE_REF: &str = "master";

/// Length of the namespace prefix on CCT change keys
const CCT_PREFIX_LEN: usize = 11;

const PASSWD_SCRIPT: &str = "configure_passwd_sh";
const PASSWD_MODULE: &str = "openshift-passwd";

/// Convert `scripts` and `cct` sections into a `modules` section.
///
/// Each script entry becomes a standalone module descriptor under
/// `modules/<package>/module.yaml` and an install reference. CCT changes
/// become install references resolved from the CCT module repository.
pub struct Modules;

impl Codemod for Modules {
    fn name(&self) -> &'static str {
        "modules"
    }

    fn apply(
        &self,
        ctx: &mut MigrateContext,
        descriptor: &mut Document,
    ) -> Result<(), MigrationError> {
        let mut install = Vec::new();
        let mut repositories = Vec::new();

        if let Some(scripts) = take_sequence(descriptor, "scripts")? {
            convert_scripts(ctx, &scripts, &mut install)?;
        }

        if let Some(cct) = take_sequence(descriptor, "cct")? {
            repositories.push(mapping([(
                "git",
                mapping([
                    ("url", string(CCT_MODULE_REPOSITORY)),
                    ("ref", string(CCT_MODULE_REF)),
                ]),
            )]));
            convert_cct(&cct, &mut install)?;
        }

        let mut modules = Mapping::new();
        if !repositories.is_empty() {
            modules.insert(string("repositories"), Value::Sequence(repositories));
        }
        if !install.is_empty() {
            modules.insert(string("install"), Value::Sequence(install));
        }

        if !modules.is_empty() {
            descriptor.insert("modules", Value::Mapping(modules));
        }
        Ok(())
    }
}

fn convert_scripts(
    ctx: &mut MigrateContext,
    scripts: &[Value],
    install: &mut Vec<Value>,
) -> Result<(), MigrationError> {
    let scripts_dir = ctx.descriptor_dir.join("scripts");
    let modules_dir = ctx.descriptor_dir.join("modules");

    if scripts_dir.exists() {
        if ctx.dry_run {
            debug!(
                "Would rename {} to {}",
                scripts_dir.display(),
                modules_dir.display()
            );
        } else {
            fs::rename(&scripts_dir, &modules_dir)
                .map_err(|e| MigrationError::io("rename", &scripts_dir, e))?;
        }
        ctx.renamed_scripts_dir = true;
    }

    for script in scripts {
        let package = required_str(script, "scripts", "package")?;
        let exec = required(script, "scripts", "exec")?;
        if !is_plain_name(package) {
            return Err(MigrationError::InvalidPackage(package.to_string()));
        }

        install.push(mapping([("name", string(package))]));

        let module_dir = modules_dir.join(package);
        let module_path = module_dir.join(MODULE_DESCRIPTOR);
        if !ctx.dry_run {
            let module = module_descriptor(package, exec.clone());
            write_module_descriptor(&module_dir, &module_path, &module, &ctx.emit)?;
        }
        debug!("Module descriptor for '{package}': {}", module_path.display());
        ctx.module_descriptors.push(module_path);
    }

    Ok(())
}

/// A package name must name exactly one directory below `modules/`.
fn is_plain_name(package: &str) -> bool {
    let mut components = Path::new(package).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// Standalone descriptor for a former script package.
pub fn module_descriptor(package: &str, exec: Value) -> Document {
    let mut module = Document::new();
    module.insert("schema_version", schema_version());
    module.set_blank_line_after("schema_version");
    module.insert("name", string(package));
    module.insert(
        "execute",
        Value::Sequence(vec![mapping([("script", exec)])]),
    );
    module
}

fn write_module_descriptor(
    dir: &Path,
    path: &Path,
    module: &Document,
    emit: &EmitOptions,
) -> Result<(), MigrationError> {
    fs::create_dir_all(dir).map_err(|e| MigrationError::io("create", dir, e))?;
    let content = module.to_yaml_string(emit)?;
    fs::write(path, content).map_err(|e| MigrationError::io("write", path, e))
}

fn convert_cct(cct: &[Value], install: &mut Vec<Value>) -> Result<(), MigrationError> {
    for entry in cct {
        let changes = required(entry, "cct", "changes")?;
        let changes = changes
            .as_sequence()
            .ok_or_else(|| MigrationError::unexpected("cct.changes", "sequence", changes))?;

        for change in changes {
            let Some((key, scripts)) = change.as_mapping().and_then(|m| m.iter().next()) else {
                warn!("Skipping CCT change that is not a mapping");
                continue;
            };
            let Some(key) = key.as_str() else {
                warn!("Skipping CCT change with a non-string key");
                continue;
            };

            let name: String = key.chars().skip(CCT_PREFIX_LEN).collect();
            if name.is_empty() {
                warn!("Skipping CCT change '{key}': no module name after prefix");
                continue;
            }

            let configures_passwd = scripts.as_sequence().is_some_and(|items| {
                items
                    .iter()
                    .any(|item| script_name(item) == Some(PASSWD_SCRIPT))
            });

            let module = if configures_passwd {
                PASSWD_MODULE
            } else {
                name.as_str()
            };
            install.push(mapping([("name", string(module))]));
        }
    }
    Ok(())
}

fn script_name(item: &Value) -> Option<&str> {
    match item {
        Value::Mapping(m) => m.iter().next().and_then(|(k, _)| k.as_str()),
        Value::String(s) => Some(s),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrate::codemods::test_support::{apply, apply_in, yaml};

    fn migrate_in(dir: &Path, source: &str) -> (Document, MigrateContext) {
        let mut descriptor = Document::parse(source).unwrap();
        let mut ctx = MigrateContext::new(dir.to_path_buf(), EmitOptions::default(), false);
        Modules.apply(&mut ctx, &mut descriptor).unwrap();
        (descriptor, ctx)
    }

    #[test]
    fn test_nothing_to_convert() {
        let doc = apply(&Modules, "name: foo\n");
        assert!(!doc.contains_key("modules"));
    }

    #[test]
    fn test_scripts_become_modules() {
        let temp = tempfile::tempdir().unwrap();
        fs::create_dir_all(temp.path().join("scripts/foo")).unwrap();
        fs::write(temp.path().join("scripts/foo/install.sh"), "#!/bin/sh\n").unwrap();

        let (doc, ctx) = migrate_in(
            temp.path(),
            "name: img\nscripts:\n- package: foo\n  exec: /bin/foo.sh\n",
        );

        assert!(!doc.contains_key("scripts"));
        assert_eq!(doc.get("modules"), Some(&yaml("{install: [{name: foo}]}")));

        assert!(ctx.renamed_scripts_dir);
        assert!(!temp.path().join("scripts").exists());
        assert!(temp.path().join("modules/foo/install.sh").exists());

        let module_path = temp.path().join("modules/foo/module.yaml");
        assert_eq!(ctx.module_descriptors, vec![module_path.clone()]);
        assert_eq!(
            fs::read_to_string(module_path).unwrap(),
            "schema_version: 1\n\nname: foo\nexecute:\n    - script: /bin/foo.sh\n"
        );
    }

    #[test]
    fn test_one_module_per_script_entry() {
        let temp = tempfile::tempdir().unwrap();
        let (doc, ctx) = migrate_in(
            temp.path(),
            "scripts:\n- package: foo\n  exec: foo.sh\n- package: bar\n  exec: bar.sh\n",
        );

        assert_eq!(
            doc.get("modules"),
            Some(&yaml("{install: [{name: foo}, {name: bar}]}"))
        );
        assert_eq!(
            ctx.module_descriptors,
            vec![
                temp.path().join("modules/foo/module.yaml"),
                temp.path().join("modules/bar/module.yaml"),
            ]
        );
        assert_eq!(
            fs::read_to_string(temp.path().join("modules/bar/module.yaml")).unwrap(),
            "schema_version: 1\n\nname: bar\nexecute:\n    - script: bar.sh\n"
        );
    }

    #[test]
    fn test_package_name_must_stay_below_modules() {
        for package in ["../escape", "/abs", "a/b", ".", ""] {
            let temp = tempfile::tempdir().unwrap();
            let mut descriptor = Document::parse(&format!(
                "scripts:\n- package: '{package}'\n  exec: run.sh\n"
            ))
            .unwrap();
            let mut ctx =
                MigrateContext::new(temp.path().to_path_buf(), EmitOptions::default(), false);
            let err = Modules.apply(&mut ctx, &mut descriptor).unwrap_err();
            assert!(
                matches!(&err, MigrationError::InvalidPackage(p) if p == package),
                "{package}: {err}"
            );
            assert!(!temp.path().join("modules").exists());
        }
    }

    #[test]
    fn test_module_directory_created_when_missing() {
        let temp = tempfile::tempdir().unwrap();
        let (_, ctx) = migrate_in(
            temp.path(),
            "scripts:\n- package: bar\n  exec: run.sh\n",
        );
        assert!(!ctx.renamed_scripts_dir);
        assert!(temp.path().join("modules/bar/module.yaml").is_file());
    }

    #[test]
    fn test_dry_run_touches_nothing() {
        let temp = tempfile::tempdir().unwrap();
        fs::create_dir_all(temp.path().join("scripts/foo")).unwrap();

        let doc = apply_in(
            &Modules,
            temp.path(),
            "scripts:\n- package: foo\n  exec: /bin/foo.sh\n",
        );

        assert!(doc.contains_key("modules"));
        assert!(temp.path().join("scripts/foo").is_dir());
        assert!(!temp.path().join("modules").exists());
    }

    #[test]
    fn test_script_missing_exec() {
        let temp = tempfile::tempdir().unwrap();
        let mut descriptor = Document::parse("scripts:\n- package: foo\n").unwrap();
        let mut ctx = MigrateContext::new(temp.path().to_path_buf(), EmitOptions::default(), false);
        let err = Modules.apply(&mut ctx, &mut descriptor).unwrap_err();
        assert!(matches!(
            err,
            MigrationError::MissingField {
                section: "scripts",
                field: "exec"
            }
        ));
    }

    #[test]
    fn test_cct_changes_become_modules() {
        let doc = apply(
            &Modules,
            r#"
cct:
- name: eap
  changes:
  - cct_module.launch:
    - configure_launch_sh: {}
  - cct_module.passwd:
    - configure_passwd_sh: {}
    - configure_other_sh: {}
"#,
        );

        assert!(!doc.contains_key("cct"));
        assert_eq!(
            doc.get("modules"),
            Some(&yaml(
                "{repositories: [{git: {url: 'https://github.com/jboss-openshift/cct_module.git', ref: master}}], install: [{name: launch}, {name: openshift-passwd}]}"
            ))
        );
    }

    #[test]
    fn test_scripts_and_cct_share_install_list() {
        let temp = tempfile::tempdir().unwrap();
        let (doc, _) = migrate_in(
            temp.path(),
            "scripts:\n- package: foo\n  exec: a.sh\ncct:\n- changes:\n  - 12345678901module: []\n",
        );
        let install = doc.get("modules").and_then(|m| m.get("install")).unwrap();
        assert_eq!(install, &yaml("[{name: foo}, {name: module}]"));
    }

    #[test]
    fn test_short_cct_key_is_skipped() {
        let doc = apply(&Modules, "cct:\n- changes:\n  - short: []\n");
        let modules = doc.get("modules").unwrap();
        assert!(modules.get("repositories").is_some());
        assert!(modules.get("install").is_none());
    }

    #[test]
    fn test_cct_entry_without_changes() {
        let mut descriptor = Document::parse("cct:\n- name: x\n").unwrap();
        let mut ctx = MigrateContext::new(".".into(), EmitOptions::default(), true);
        let err = Modules.apply(&mut ctx, &mut descriptor).unwrap_err();
        assert!(matches!(err, MigrationError::MissingField { section: "cct", .. }));
    }
}
