use std::path::PathBuf;

use structopt::clap::AppSettings::*;
use structopt::StructOpt;

mod commands;
mod error;

#[derive(Debug, StructOpt)]
enum Commands {
    #[structopt(name = "check", about = "Parse a definition file and print its tree")]
    Check {
        #[structopt(
            name = "definition",
            parse(from_os_str),
            help = "Path to the definition file"
        )]
        definition: PathBuf,
    },

    #[structopt(name = "dump", about = "Print every item of a tagfile")]
    Dump {
        #[structopt(
            name = "definition",
            parse(from_os_str),
            help = "Path to the definition file"
        )]
        definition: PathBuf,

        #[structopt(name = "data", parse(from_os_str), help = "Path to the tagfile")]
        data: PathBuf,

        #[structopt(long, help = "Print the items as JSON")]
        json: bool,
    },
}

#[derive(Debug, StructOpt)]
#[structopt(
    name = "tagfile",
    about = "Inspect tagfile definitions and the data files written with them.",
    settings = &[SubcommandRequiredElseHelp, DisableHelpSubcommand, VersionlessSubcommands],
)]
struct CliOpts {
    #[structopt(short, long, help = "Show verbose output", global = true)]
    verbose: bool,

    #[structopt(subcommand)]
    cmd: Commands,
}

fn main() {
    let opts = CliOpts::from_args();

    let level = if opts.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let result = match opts.cmd {
        Commands::Check { definition } => commands::check(&definition),
        Commands::Dump {
            definition,
            data,
            json,
        } => commands::dump(&definition, &data, json),
    };

    if let Err(e) = result {
        eprintln!("{:?}", e);
        std::process::exit(1);
    }
}
