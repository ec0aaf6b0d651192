use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};

use scopeconf::{Configuration, Library, LibraryError, RecordingTransport};

#[derive(Debug, Parser)]
#[command(name = "scopeconf", version, about = "Build, store and apply oscilloscope test setups")]
struct Cli {
    /// Directory holding the `test<ID>.xml` setups.
    #[arg(long, global = true, env = "SCOPECONF_LIBRARY", default_value = scopeconf::DEFAULT_LIBRARY_ROOT)]
    library: PathBuf,

    /// I/O timeout for instrument sessions, in milliseconds.
    #[arg(long, global = true, env = "SCOPECONF_TIMEOUT_MS", default_value_t = scopeconf::DEFAULT_TIMEOUT.as_millis() as u64)]
    timeout_ms: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the SCPI commands for a setup file.
    Compile { file: PathBuf },
    /// Report settings the instrument would reject; fails if there are any.
    Check { file: PathBuf },
    /// Print a setup file as it would be saved.
    Show { file: PathBuf },
    /// Create a new test with default settings.
    New { id: String },
    /// List the tests in the library.
    List,
    /// Copy a test under a new number.
    Clone { source: String, target: String },
    /// Delete a test.
    Delete { id: String },
    /// Send a test (by number or file path) to an instrument.
    Apply {
        test: String,
        /// VISA resource, e.g. `TCPIP0::192.168.1.20::5025::SOCKET`.
        resource: String,
        /// Print the commands instead of connecting.
        #[arg(long)]
        dry_run: bool,
    },
}

fn load_test(library: &Library, test: &str) -> scopeconf::Result<Configuration> {
    let path = Path::new(test);
    if path.is_file() {
        scopeconf::load_file(path)
    } else {
        library.load(test)
    }
}

fn warn_issues(config: &Configuration) {
    for issue in config.issues() {
        log::warn!("{}", issue);
    }
}

fn run(cli: Cli) -> scopeconf::Result<bool> {
    let library = Library::new(cli.library);
    match cli.command {
        Command::Compile { file } => {
            let config = scopeconf::load_file(&file)?;
            warn_issues(&config);
            for command in scopeconf::compile(&config) {
                println!("{}", command);
            }
        }
        Command::Check { file } => {
            let issues = scopeconf::load_file(&file)?.issues();
            for issue in issues.iter() {
                println!("{}", issue);
            }
            return Ok(issues.is_empty())
        }
        Command::Show { file } => {
            print!("{}", scopeconf::serialize(&scopeconf::load_file(&file)?)?);
        }
        Command::New { id } => {
            let path = library.path_for(&id)?;
            if path.exists() {
                return Err(LibraryError::AlreadyExists { path }.into())
            }
            let path = library.save(&id, &Configuration::default())?;
            println!("{}", path.display());
        }
        Command::List => {
            for id in library.list()? {
                println!("{}", id);
            }
        }
        Command::Clone { source, target } => {
            let path = library.clone_test(&source, &target)?;
            println!("{}", path.display());
        }
        Command::Delete { id } => {
            library.delete(&id)?;
        }
        Command::Apply { test, resource, dry_run } => {
            let config = load_test(&library, &test)?;
            warn_issues(&config);
            let commands = scopeconf::compile(&config);
            if dry_run {
                let mut transport = RecordingTransport::new().with_identity(&resource);
                scopeconf::apply(&mut transport, &commands)?;
                for command in transport.into_writes() {
                    println!("{}", command);
                }
            } else {
                let timeout = Duration::from_millis(cli.timeout_ms);
                scopeconf::with_session(&resource, timeout, |transport| {
                    scopeconf::apply(transport, &commands)
                })?;
                log::info!("sent {} command(s) to {}", commands.len(), resource);
            }
        }
    }
    Ok(true)
}

fn main() -> ExitCode {
    env_logger::init();
    match run(Cli::parse()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(error) => {
            eprintln!("error: {}", error);
            ExitCode::FAILURE
        }
    }
}
