/*!

`cloudctl` checks the parameters of an Azure cloud profile before they are handed to a build
server, and shows the image templates the server would parse from them.

!*/

mod check;
mod images;

use anyhow::{Context, Result};
use clap::Parser;
use cloud_model::ClientParameters;
use env_logger::Builder;
use log::{debug, LevelFilter};
use std::path::{Path, PathBuf};

/// Offline tooling for Azure cloud profiles.
#[derive(Debug, Parser)]
#[clap(author, version, about)]
struct Args {
    /// Set logging verbosity [trace|debug|info|warn|error]. If the environment variable `RUST_LOG`
    /// is present, it overrides the default logging behavior. See https://docs.rs/env_logger/latest
    #[clap(long = "log-level", default_value = "warn")]
    log_level: LevelFilter,
    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Parser)]
enum Command {
    /// Validate the credentials and image data of a profile.
    Check(check::Check),
    /// Print the image templates of a profile. Passwords are never printed.
    Images(images::Images),
}

fn main() {
    let args = Args::parse();
    init_logger(args.log_level);
    if let Err(e) = run(args) {
        eprintln!("{:#}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    match args.command {
        Command::Check(check) => check.run(),
        Command::Images(images) => images.run(),
    }
}

/// The profile file is a JSON object of parameter names to string values, as the build server
/// stores them.
#[derive(Debug, Parser)]
pub(crate) struct ProfileFile {
    /// Path to the profile parameters file.
    #[clap(long = "profile", short = 'p')]
    path: PathBuf,
}

impl ProfileFile {
    pub(crate) fn load(&self) -> Result<ClientParameters> {
        load_parameters(&self.path)
    }
}

fn load_parameters(path: &Path) -> Result<ClientParameters> {
    let data = std::fs::read_to_string(path)
        .context(format!("Unable to read profile file '{}'", path.display()))?;
    let params: ClientParameters = serde_json::from_str(&data)
        .context(format!("Unable to parse profile file '{}'", path.display()))?;
    debug!("Loaded profile parameters {:?}", params);
    Ok(params)
}

/// Initialize the logger with the value passed by `--log-level` (or its default) when the
/// `RUST_LOG` environment variable is not present. If present, the `RUST_LOG` environment variable
/// overrides `--log-level`/`level`.
fn init_logger(level: LevelFilter) {
    match std::env::var(env_logger::DEFAULT_FILTER_ENV).ok() {
        Some(_) => {
            // RUST_LOG exists; env_logger will use it.
            Builder::from_default_env().init();
        }
        None => {
            // RUST_LOG does not exist; use default log level for our crates only.
            Builder::new()
                .filter(Some(env!("CARGO_CRATE_NAME")), level)
                .filter(Some("cloud_client"), level)
                .init();
        }
    }
}
