mod extract;
mod pipelines;
mod run;

use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::cli::{Cli, Command};
use crate::error::CliError;

pub async fn run(cli: &Cli) -> Result<(), CliError> {
    match &cli.command {
        Command::Extract(args) => extract::run(args, cli.format, cli.pretty).await,
        Command::Run(args) => run::run(args, cli.pretty).await,
        Command::Pipelines => pipelines::run(cli.pretty),
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<String, CliError> {
    let payload = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(payload)
}

/// Writes `payload` to `output` when given, otherwise prints it.
fn emit(payload: &str, output: Option<&Path>) -> Result<(), CliError> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, payload)?;
        }
        None if payload.ends_with('\n') => print!("{payload}"),
        None => println!("{payload}"),
    }
    Ok(())
}
