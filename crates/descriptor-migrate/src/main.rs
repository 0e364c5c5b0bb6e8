use clap::Parser;
use colored::Colorize;
use env_logger::Env;

mod migrate;

#[derive(Parser)]
#[command(name = "descriptor-migrate")]
#[command(about = "Migrate a legacy image descriptor to schema version 1", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short = 'd', long = "debug", hide = true)]
    debug: bool,

    #[command(flatten)]
    migrate: migrate::MigrateArgs,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {e}", "Error:".red());
        for cause in e.chain().skip(1) {
            eprintln!("  {cause}");
        }
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Default level depends on --debug, RUST_LOG overrides it
    let env = if cli.debug {
        Env::default().default_filter_or("debug")
    } else {
        Env::default().default_filter_or("error")
    };
    env_logger::Builder::from_env(env).init();

    migrate::execute(cli.migrate)
}
