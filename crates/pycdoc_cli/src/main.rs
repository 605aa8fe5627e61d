#![allow(missing_docs)]

use clap::{Parser, Subcommand};
use tracing_subscriber::filter::LevelFilter;

mod cmd;

#[derive(Parser)]
#[command(name = "pycdoc", about = "Python .pyc inspection tools")]
struct Cli {
	/// Log decoder activity at debug level.
	#[arg(long, short, global = true)]
	verbose: bool,
	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand)]
enum Commands {
	/// Show the header, variant, and object counts.
	Info(cmd::info::Args),
	/// Print the annotated chunk tree.
	Chunks(cmd::chunks::Args),
}

fn main() {
	if let Err(err) = run() {
		eprintln!("error: {err}");
		std::process::exit(1);
	}
}

fn run() -> pycdoc::pyc::Result<()> {
	let cli = Cli::parse();
	init_tracing(cli.verbose);

	match cli.command {
		Commands::Info(args) => cmd::info::run(args),
		Commands::Chunks(args) => cmd::chunks::run(args),
	}
}

fn init_tracing(verbose: bool) {
	let level = if verbose { LevelFilter::DEBUG } else { LevelFilter::INFO };
	tracing_subscriber::fmt().with_max_level(level).with_writer(std::io::stderr).without_time().init();
}
