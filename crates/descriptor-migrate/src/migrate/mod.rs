use anyhow::Result;
use clap::Args;
use colored::Colorize;
use descriptor_yaml::{Document, EmitOptions};
use log::debug;
use similar::TextDiff;
use std::fs;
use std::path::{Path, PathBuf};

pub mod codemods;
mod error;

pub use codemods::MigrateContext;
use codemods::{
    Codemod, artifacts::Artifacts, labels::Labels, modules::Modules, osbs::Osbs,
    packages::Packages, run::Run, schema_version::SchemaVersion,
};
pub use error::MigrationError;

/// Arguments for the migration
#[derive(Args, Debug, Clone)]
pub struct MigrateArgs {
    /// Path to the image descriptor to migrate
    #[arg(
        long,
        value_name = "PATH",
        default_value = "image.yaml",
        value_hint = clap::ValueHint::FilePath
    )]
    pub descriptor: PathBuf,

    /// Show the resulting diff instead of writing any files
    #[arg(long)]
    pub diff: bool,
}

#[derive(Debug, Clone, Default)]
pub struct MigrateOptions {
    /// Leave the filesystem untouched
    pub dry_run: bool,
    pub emit: EmitOptions,
}

/// Outcome of a migration run
#[derive(Debug, Clone)]
pub struct MigrationReport {
    /// Descriptor text before migration
    pub original: String,
    /// Descriptor text after migration
    pub migrated: String,
    /// Module descriptors created (or planned, on a dry run)
    pub module_descriptors: Vec<PathBuf>,
    pub renamed_scripts_dir: bool,
}

/// The rewrite passes, in the order they are applied.
fn codemods() -> Vec<Box<dyn Codemod>> {
    vec![
        Box::new(SchemaVersion),
        Box::new(Labels),
        Box::new(Modules),
        Box::new(Packages),
        Box::new(Artifacts),
        Box::new(Run),
        Box::new(Osbs),
    ]
}

/// Migrate the descriptor at `path` to the current schema.
///
/// The descriptor itself is only written after every codemod succeeded.
/// Module descriptors written before a failure are left on disk.
pub fn migrate(path: &Path, options: &MigrateOptions) -> Result<MigrationReport, MigrationError> {
    let original = fs::read_to_string(path).map_err(|e| MigrationError::io("read", path, e))?;
    let mut descriptor = Document::parse(&original)?;

    let descriptor_dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."))
        .to_path_buf();
    let mut ctx = MigrateContext::new(descriptor_dir, options.emit, options.dry_run);

    for codemod in codemods() {
        debug!("Applying codemod '{}'", codemod.name());
        codemod.apply(&mut ctx, &mut descriptor)?;
    }

    let migrated = descriptor.to_yaml_string(&options.emit)?;
    if !options.dry_run {
        fs::write(path, &migrated).map_err(|e| MigrationError::io("write", path, e))?;
    }

    Ok(MigrationReport {
        original,
        migrated,
        module_descriptors: ctx.module_descriptors,
        renamed_scripts_dir: ctx.renamed_scripts_dir,
    })
}

/// Execute the migration command
pub fn execute(args: MigrateArgs) -> Result<()> {
    if !args.descriptor.exists() {
        eprintln!(
            "{}",
            format!(
                "Descriptor file '{}' does not exist, make sure you provided correct path!",
                args.descriptor.display()
            )
            .red()
        );
        std::process::exit(1);
    }

    let options = MigrateOptions {
        dry_run: args.diff,
        ..Default::default()
    };
    let report = migrate(&args.descriptor, &options)?;

    if args.diff {
        print_diff(&args.descriptor, &report);
        return Ok(());
    }

    if report.renamed_scripts_dir {
        eprintln!("{} Renamed scripts/ to modules/", "✓".green());
    }
    for path in &report.module_descriptors {
        eprintln!("{} Created {}", "✓".green(), path.display());
    }
    println!("Conversion is done, please review changes.");

    Ok(())
}

fn print_diff(path: &Path, report: &MigrationReport) {
    let diff = TextDiff::from_lines(report.original.as_str(), report.migrated.as_str());
    print!(
        "{}",
        diff.unified_diff().context_radius(3).header(
            &format!("old/{}", path.display()),
            &format!("new/{}", path.display())
        )
    );

    if report.renamed_scripts_dir {
        eprintln!("{}", "Would rename scripts/ to modules/".yellow());
    }
    for module in &report.module_descriptors {
        eprintln!("{} {}", "Would create".yellow(), module.display());
    }
}
