mod convert;
mod ui;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use crate::convert::cli::{ConvertArgs, InspectArgs};
use crate::ui::prelude::*;

/// Boxfit main parser
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Activate debug mode
    #[arg(short, long, global = true)]
    debug: bool,

    /// Emit machine-readable JSON events instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert all videos in a directory to 1920x1080
    Convert(ConvertArgs),
    /// Probe a single video and show the conversion plan
    Inspect(InspectArgs),
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

fn main() {
    let cli = Cli::parse();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };
    ui::init(format, !cli.json);
    ui::set_debug_mode(cli.debug);

    let result = match cli.command {
        Commands::Convert(args) => convert::handle_convert(args),
        Commands::Inspect(args) => convert::handle_inspect(args),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "boxfit", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(err) = result {
        emit(Level::Error, "boxfit.error", &format!("{err:#}"), None);
        std::process::exit(1);
    }
}
