//! vmgen CLI entry point.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use vmgen_cli::{CliError, Config, Overrides};

#[derive(Parser)]
#[command(name = "vmgen")]
#[command(about = "Generate VM dispatch, size and dump code from an instruction definition")]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Common {
    /// Instruction definition file
    input: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Naming prefix for generated functions and include guards
    #[arg(long)]
    prefix: Option<String>,

    /// Sequence number of the first opcode
    #[arg(long)]
    first_opcode: Option<u32>,

    /// Instruction header width in bytes
    #[arg(long)]
    header_size: Option<u32>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the generated artifacts
    Generate {
        #[command(flatten)]
        common: Common,

        /// Interpreter dispatch source
        #[arg(long)]
        dispatch: Option<PathBuf>,

        /// Opcode size header
        #[arg(long)]
        metadata: Option<PathBuf>,

        /// Disassembler header
        #[arg(long)]
        dump: Option<PathBuf>,

        /// Opcode enum header
        #[arg(long)]
        opcodes: Option<PathBuf>,

        /// Print the single selected artifact instead of writing it
        #[arg(long)]
        stdout: bool,
    },

    /// Print the encoded size of every opcode
    Sizes {
        #[command(flatten)]
        common: Common,

        /// Guard symbol defined in the build configuration
        #[arg(short = 'D', long = "define")]
        defines: Vec<String>,
    },

    /// Print the parsed instruction set as JSON
    Schema {
        #[command(flatten)]
        common: Common,
    },
}

impl Common {
    fn load(self, outputs: Overrides) -> Result<Config, CliError> {
        let overrides = Overrides {
            input: self.input,
            prefix: self.prefix,
            first_opcode: self.first_opcode,
            header_size: self.header_size,
            ..outputs
        };
        Config::load(self.config.as_deref(), overrides)
    }
}

fn run(command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Generate {
            common,
            dispatch,
            metadata,
            dump,
            opcodes,
            stdout,
        } => {
            let config = common.load(Overrides {
                dispatch,
                metadata,
                dump,
                opcodes,
                ..Overrides::default()
            })?;

            if stdout {
                print!("{}", vmgen_cli::render_single(&config)?);
            } else {
                let written = vmgen_cli::run(&config)?;
                info!("generated {} artifact(s)", written.len());
            }
        }

        Commands::Sizes { common, defines } => {
            let config = common.load(Overrides::default())?;
            print!("{}", vmgen_cli::size_report(&config, &defines)?);
        }

        Commands::Schema { common } => {
            let config = common.load(Overrides::default())?;
            println!("{}", vmgen_cli::schema_json(&config)?);
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "vmgen=debug" } else { "vmgen=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
