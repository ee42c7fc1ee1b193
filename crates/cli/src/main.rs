//! tablesnap CLI: take, list and verify offline table snapshots.
//!
//! `tablesnap --root <dir> [--config <file>] [--json] <command>`

mod commands;
mod format;
mod parse;

use std::process;

use tablesnap_core::SnapshotDescription;
use tablesnap_engine::{DisabledTableSnapshot, SnapshotConfig, SnapshotRunner, CONFIG_FILE_NAME};
use tablesnap_storage::{
    discover_regions, filesystem_collaborators, inspect_snapshot, list_snapshots, SnapshotLayout,
};

use commands::build_cli;
use format::{format_completed, format_error, format_list, format_verified, OutputMode};
use parse::{global_options, matches_to_action, CliAction, GlobalOptions};

fn main() {
    let matches = build_cli().get_matches();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let mode = if matches.get_flag("json") {
        OutputMode::Json
    } else {
        OutputMode::Human
    };

    let result = global_options(&matches)
        .and_then(|opts| matches_to_action(&matches).map(|action| (opts, action)))
        .and_then(|(opts, action)| execute(&opts, action, mode));

    match result {
        Ok(output) => println!("{}", output),
        Err(e) => {
            eprintln!("{}", format_error(&e, mode));
            process::exit(1);
        }
    }
}

fn execute(opts: &GlobalOptions, action: CliAction, mode: OutputMode) -> Result<String, String> {
    let layout = SnapshotLayout::from_root(&opts.root);
    match action {
        CliAction::Snapshot {
            table,
            name,
            server,
            workers,
            timeout_ms,
        } => {
            let mut config = load_config(opts)?;
            if let Some(workers) = workers {
                config.region_workers = workers;
            }
            config.validate().map_err(|e| e.to_string())?;

            let mut snapshot = SnapshotDescription::new(name, table);
            if let Some(timeout_ms) = timeout_ms {
                snapshot = snapshot.with_timeout_ms(timeout_ms);
            }
            let locations =
                discover_regions(&layout, &snapshot.table, &server).map_err(|e| e.to_string())?;
            let procedure = DisabledTableSnapshot::new(
                layout.clone(),
                filesystem_collaborators(&layout),
                snapshot,
                &config,
            );
            let completed = SnapshotRunner::new(&config)
                .take(&procedure, &locations)
                .map_err(|f| f.to_string())?;
            Ok(format_completed(&completed, mode))
        }
        CliAction::List => {
            let names = list_snapshots(&layout).map_err(|e| e.to_string())?;
            Ok(format_list(&names, mode))
        }
        CliAction::Verify { name } => {
            let verified = inspect_snapshot(&layout.completed_snapshot_dir(&name))
                .map_err(|e| e.to_string())?;
            Ok(format_verified(&verified, mode))
        }
    }
}

/// Explicit `--config`, else `<root>/tablesnap.toml` if present, else defaults.
fn load_config(opts: &GlobalOptions) -> Result<SnapshotConfig, String> {
    let path = match &opts.config {
        Some(path) => path.clone(),
        None => {
            let default_path = opts.root.join(CONFIG_FILE_NAME);
            if !default_path.exists() {
                return Ok(SnapshotConfig::default());
            }
            default_path
        }
    };
    SnapshotConfig::from_file(&path).map_err(|e| e.to_string())
}
