//! Clap command tree definition.

use clap::{Arg, ArgAction, Command};

/// Build the complete CLI command tree.
pub fn build_cli() -> Command {
    Command::new("tablesnap")
        .about("Offline snapshots of disabled tables")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("root")
                .long("root")
                .help("Root directory holding data/ and .snapshots/")
                .required(true),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .help("Config file (default: <root>/tablesnap.toml if present)")
                .global(true),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("JSON output mode")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(
            Command::new("snapshot")
                .about("Snapshot a disabled table")
                .arg(
                    Arg::new("table")
                        .long("table")
                        .help("Table to snapshot")
                        .required(true),
                )
                .arg(
                    Arg::new("name")
                        .long("name")
                        .help("Snapshot name")
                        .required(true),
                )
                .arg(
                    Arg::new("server")
                        .long("server")
                        .help("Server reported for every region, as host,port,startcode")
                        .default_value("localhost,16020,0"),
                )
                .arg(
                    Arg::new("workers")
                        .long("workers")
                        .help("Regions processed concurrently")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    Arg::new("timeout-ms")
                        .long("timeout-ms")
                        .help("Deadline for this snapshot in milliseconds")
                        .value_parser(clap::value_parser!(u64)),
                ),
        )
        .subcommand(Command::new("list").about("List committed snapshots"))
        .subcommand(
            Command::new("verify")
                .about("Check the shape of a committed snapshot")
                .arg(
                    Arg::new("name")
                        .long("name")
                        .help("Snapshot name")
                        .required(true),
                ),
        )
}
