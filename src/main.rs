use clap::{Parser as ClapParser, Subcommand};
use sift_lang::cli::{self, CliError, RunOptions};
use std::io::{self, Read};

#[derive(ClapParser)]
#[command(name = "sift")]
#[command(about = "Sift - an embeddable feature-pipeline language for row-wise record transformation")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a JSON-serialized query
    Run {
        /// The query as a JSON expression tree
        query: String,

        /// Query arguments as a JSON object (reads from stdin if not provided)
        #[arg(short, long)]
        args: Option<String>,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,
    },

    /// Validate a serialized query and print its debug rendering
    Check {
        /// The query as a JSON expression tree
        query: String,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            query,
            args,
            pretty,
        } => run(query, args, pretty),
        Commands::Check { query } => match cli::check_query(&query) {
            Ok(rendered) => {
                println!("{}", rendered);
                Ok(())
            }
            Err(e) => Err(e),
        },
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn run(query: String, args: Option<String>, pretty: bool) -> Result<(), CliError> {
    let args = match args {
        Some(s) => Some(s),
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .map_err(CliError::Io)?;
            Some(buffer)
        }
        None => None,
    };

    let options = RunOptions {
        query,
        args,
        pretty,
    };

    let output = cli::execute_run(&options)?;
    println!("{}", output);
    Ok(())
}
