// Copyright (C) 2024 Bellande Architecture Mechanism Research Innovation Center, Ronaldson Bellande

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use clap::{Parser, Subcommand};
use cosmo::{Config, ConsoleDispatcher, Executor, RunError, StdoutOutput};
use std::path::PathBuf;
use std::process;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "cosmo")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Cosmo script and macro runner", long_about = None)]
struct Args {
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one or more script files (wildcards allowed)
    Run {
        #[arg(value_name = "PATTERN", required = true)]
        scripts: Vec<String>,

        /// Comma-separated values for the declared parameters
        #[arg(short, long, value_delimiter = ',')]
        args: Vec<String>,

        /// Collect PRINT output as commands and replay them as a macro
        #[arg(long)]
        external: bool,
    },
    /// Run a program given inline; `\n` separates lines
    Eval {
        source: String,

        #[arg(short, long, value_delimiter = ',')]
        args: Vec<String>,

        #[arg(long)]
        external: bool,
    },
    /// Run a comma-separated macro such as `say hi, wait 1, help`
    Macro { commands: String },
}

fn init_tracing(verbose: u8) {
    let fallback = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run_source(
    executor: &Executor,
    source: &str,
    args: &[String],
    external: bool,
) -> Result<(), RunError> {
    let args = (!args.is_empty()).then_some(args);
    if external {
        executor
            .run_and_replay(source, args, &mut ConsoleDispatcher)
            .await
    } else {
        executor
            .run_direct(source, args, Box::new(StdoutOutput))
            .await
            .map(|_| ())
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::discover(args.config.as_deref())?;
    let executor = Executor::new(config)?;

    match args.command {
        Commands::Run {
            scripts,
            args,
            external,
        } => {
            for pattern in &scripts {
                for path in executor.expand_scripts(pattern) {
                    info!(path = %path.display(), "running script");
                    let source = executor.load_script(&path)?;
                    run_source(&executor, &source, &args, external).await?;
                }
            }
        }
        Commands::Eval {
            source,
            args,
            external,
        } => {
            let source = source.replace("\\n", "\n");
            run_source(&executor, &source, &args, external).await?;
        }
        Commands::Macro { commands } => {
            executor.run_macro(&commands, &mut ConsoleDispatcher).await?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    if let Err(e) = run(args).await {
        eprintln!("Application error: {}", e);
        process::exit(1);
    }
}
