//! ArgMatches → CliAction conversion.

use clap::ArgMatches;
use std::path::PathBuf;

use tablesnap_core::ServerName;

/// The result of parsing the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliAction {
    /// Snapshot a table discovered under the root
    Snapshot {
        table: String,
        name: String,
        server: ServerName,
        workers: Option<usize>,
        timeout_ms: Option<u64>,
    },
    /// List committed snapshots
    List,
    /// Re-check a committed snapshot
    Verify { name: String },
}

/// Global options shared by every subcommand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalOptions {
    pub root: PathBuf,
    pub config: Option<PathBuf>,
}

/// Extract the global options.
pub fn global_options(matches: &ArgMatches) -> Result<GlobalOptions, String> {
    let root = matches
        .get_one::<String>("root")
        .map(PathBuf::from)
        .ok_or_else(|| "--root is required".to_string())?;
    let config = matches.get_one::<String>("config").map(PathBuf::from);
    Ok(GlobalOptions { root, config })
}

/// Convert the matched subcommand into an action.
pub fn matches_to_action(matches: &ArgMatches) -> Result<CliAction, String> {
    match matches.subcommand() {
        Some(("snapshot", sub)) => {
            let server = sub
                .get_one::<String>("server")
                .map(String::as_str)
                .unwrap_or("localhost,16020,0");
            let server = ServerName::parse(server).map_err(|e| e.to_string())?;
            Ok(CliAction::Snapshot {
                table: required(sub, "table")?,
                name: required(sub, "name")?,
                server,
                workers: sub.get_one::<usize>("workers").copied(),
                timeout_ms: sub.get_one::<u64>("timeout-ms").copied(),
            })
        }
        Some(("list", _)) => Ok(CliAction::List),
        Some(("verify", sub)) => Ok(CliAction::Verify {
            name: required(sub, "name")?,
        }),
        Some((other, _)) => Err(format!("unknown command '{}'", other)),
        None => Err("no command given".to_string()),
    }
}

fn required(matches: &ArgMatches, id: &str) -> Result<String, String> {
    matches
        .get_one::<String>(id)
        .cloned()
        .ok_or_else(|| format!("--{} is required", id))
}
