//! Argument definitions

use clap::{value_parser, Arg, ArgAction, Command};
use std::path::PathBuf;
use storyboard_graph::NodeKind;

fn target_args() -> [Arg; 7] {
    [
        Arg::new("config")
            .long("config")
            .short('c')
            .global(true)
            .value_parser(value_parser!(PathBuf))
            .help("TOML config file"),
        Arg::new("store")
            .long("store")
            .global(true)
            .value_parser(value_parser!(PathBuf))
            .help("Directory holding record files"),
        Arg::new("backend")
            .long("backend")
            .global(true)
            .conflicts_with("store")
            .help("Remote API root instead of a local store"),
        Arg::new("token")
            .long("token")
            .global(true)
            .requires("backend")
            .help("Bearer token for the remote API"),
        Arg::new("document")
            .long("document")
            .short('d')
            .global(true)
            .help("Document id"),
        Arg::new("key")
            .long("key")
            .short('k')
            .global(true)
            .conflicts_with("passphrase")
            .help("Hex-encoded 32-byte key"),
        Arg::new("passphrase")
            .long("passphrase")
            .global(true)
            .help("Derive the key from a passphrase, salted with the document id"),
    ]
}

pub(crate) fn command() -> Command {
    Command::new("storyboard")
        .version(storyboard_session::VERSION)
        .about("Encrypted investigative storyboards")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines"),
        )
        .args(target_args())
        .subcommand(Command::new("keygen").about("Print a fresh random key"))
        .subcommand(
            Command::new("inspect").about("Summarise the stored storyboard"),
        )
        .subcommand(
            Command::new("export")
                .about("Decrypt the stored storyboard to a JSON file")
                .arg(
                    Arg::new("out")
                        .long("out")
                        .short('o')
                        .value_parser(value_parser!(PathBuf))
                        .help("Output file, defaults to storyboard_<date>.json"),
                )
                .arg(
                    Arg::new("stdout")
                        .long("stdout")
                        .action(ArgAction::SetTrue)
                        .conflicts_with("out")
                        .help("Write JSON to stdout"),
                ),
        )
        .subcommand(
            Command::new("import")
                .about("Encrypt a JSON export and store it, replacing the stored copy")
                .arg(
                    Arg::new("file")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("JSON export, current or element-array format"),
                ),
        )
        .subcommand(
            Command::new("add-node")
                .about("Add a node through an editing session")
                .arg(Arg::new("label").required(true).help("Node label"))
                .arg(
                    Arg::new("kind")
                        .long("kind")
                        .default_value("source")
                        .value_parser(value_parser!(NodeKind))
                        .help("source, lead, evidence or theory"),
                )
                .arg(Arg::new("notes").long("notes").default_value("").help("Notes"))
                .arg(
                    Arg::new("connect-from")
                        .long("connect-from")
                        .help("Existing node to draw an edge from"),
                )
                .arg(
                    Arg::new("edge-label")
                        .long("edge-label")
                        .requires("connect-from")
                        .help("Label for the new edge"),
                ),
        )
}
