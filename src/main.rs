use std::process::ExitCode;

use anyhow::Context;
use buneary::cli::{self, Cli};
use buneary::{telemetry, Error, ErrorKind, Settings};
use clap::Parser;

#[tokio::main]
async fn main() -> ExitCode {
    telemetry::init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::from(exit_code(&err))
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = Settings::load().context("invalid settings in environment")?;
    cli::run(cli, settings).await?;
    Ok(())
}

/// The single place where a failure becomes a process exit status.
fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<Error>().map(Error::kind) {
        Some(ErrorKind::Argument) => 2,
        Some(ErrorKind::Connection) => 3,
        Some(ErrorKind::Auth) => 4,
        Some(ErrorKind::Protocol) => 5,
        Some(ErrorKind::NotFound) => 6,
        Some(ErrorKind::CredentialInput) => 7,
        Some(ErrorKind::Cancelled) => 130,
        None => 1,
    }
}
