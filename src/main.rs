use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use vlug::cli::{Cli, OutputFormat};
use vlug::console::CONSOLE_TARGET;
use vlug::suite;

/// Initialize the tracing subscriber that carries console timer output
fn init_tracing(debug: bool) {
    let mut filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{}=info", CONSOLE_TARGET)));
    if debug {
        filter = filter.add_directive(tracing::Level::TRACE.into());
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn main() -> Result<()> {
    let args = Cli::parse();

    init_tracing(args.debug);

    let config = args.resolve()?;
    let output = suite::run_suite(&config)?;

    match config.cli.format {
        OutputFormat::Text => {
            output.functions.print_summary();
            eprintln!("\nSuite runs (timed by interceptor):");
            eprint!("{}", output.runs.render_table());
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
