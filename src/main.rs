use std::fs::File;
use std::io::BufReader;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use clap::Parser as ClapParser;
use clap::Subcommand;

use treelox as lox;

use lox::host::{CancelToken, Host, StdioHost};

#[derive(ClapParser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Prints the token stream for a given source file
    Tokenize { filename: PathBuf },

    /// Parses a single expression and prints its AST
    Parse { filename: PathBuf },

    /// Evaluates a single expression and prints its value
    Evaluate { filename: PathBuf },

    /// Executes a program
    Run { filename: PathBuf },
}

/// Read the whole source file, exiting with code 1 when it is unreadable.
fn read_source(filename: &Path) -> Vec<u8> {
    let mut buf: Vec<u8> = Vec::new();

    let file = match File::open(filename) {
        Ok(file) => file,

        Err(e) => {
            eprintln!("Error reading file: {}", e);

            std::process::exit(1);
        }
    };

    let mut reader: BufReader<File> = BufReader::new(file);

    if let Err(e) = reader.read_to_end(&mut buf) {
        eprintln!("Error reading file: {}", e);

        std::process::exit(1);
    }

    buf
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args: Cli = match Cli::try_parse() {
        Ok(args) => args,

        Err(e) => {
            // Usage problems exit 1, reserving 65/70 for language errors.
            e.print()?;

            std::process::exit(1);
        }
    };

    let host: Rc<dyn Host> = Rc::new(StdioHost);

    let exit_code: i32 = match args.command {
        Commands::Tokenize { filename } => lox::tokenize(&read_source(&filename), host),

        Commands::Parse { filename } => lox::parse(&read_source(&filename), host),

        Commands::Evaluate { filename } => lox::evaluate(&read_source(&filename), host),

        Commands::Run { filename } => {
            let source = read_source(&filename);

            // Ctrl-C ends the run cleanly instead of killing the process.
            let cancel = CancelToken::new();
            let handler_token = cancel.clone();

            ctrlc::set_handler(move || handler_token.cancel())?;

            lox::run(&source, host, cancel)
        }
    };

    if exit_code != 0 {
        std::process::exit(exit_code);
    }

    Ok(())
}
