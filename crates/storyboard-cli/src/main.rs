//! `storyboard` command-line tool
//!
//! Key generation, inspection, export and import of encrypted storyboards
//! held in a local record directory or behind the storyboard API.

mod cli;
mod commands;
mod config;
mod telemetry;

use anyhow::Context;
use commands::{ExportDestination, NewNode};
use std::path::PathBuf;
use storyboard_graph::{NodeId, NodeKind};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = cli::command().get_matches();
    let Some((name, args)) = matches.subcommand() else {
        return Ok(());
    };
    telemetry::init_tracing(args.get_flag("log-json"))?;

    match name {
        "keygen" => println!("{}", commands::keygen()),
        "inspect" => {
            let target = commands::resolve_target(args)?;
            println!("{}", commands::inspect(&target).await?);
        }
        "export" => {
            let target = commands::resolve_target(args)?;
            let destination = if args.get_flag("stdout") {
                ExportDestination::Stdout
            } else if let Some(path) = args.get_one::<PathBuf>("out") {
                ExportDestination::File(path.clone())
            } else {
                ExportDestination::Dated(PathBuf::from("."))
            };
            if let Some(path) = commands::export(&target, destination).await? {
                println!("Exported to {}", path.display());
            }
        }
        "import" => {
            let target = commands::resolve_target(args)?;
            let file = args
                .get_one::<PathBuf>("file")
                .context("missing input file")?;
            let record = commands::import(&target, file).await?;
            println!("Stored record {record}");
        }
        "add-node" => {
            let target = commands::resolve_target(args)?;
            let node = NewNode {
                label: args
                    .get_one::<String>("label")
                    .cloned()
                    .context("missing label")?,
                kind: args.get_one::<NodeKind>("kind").copied().unwrap_or_default(),
                notes: args.get_one::<String>("notes").cloned().unwrap_or_default(),
                connect_from: args.get_one::<String>("connect-from").map(|raw| NodeId::from(raw.as_str())),
                edge_label: args.get_one::<String>("edge-label").cloned(),
            };
            let id = commands::add_node(target, node).await?;
            println!("Added node {id}");
        }
        other => anyhow::bail!("unknown command {other}"),
    }
    Ok(())
}
