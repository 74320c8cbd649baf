use colored::Colorize;
use strata_client::{IndexClient, ObjectGateway, StorageClient};
use strata_index::NodeDescriptor;
use strata_server::{ServerConfig, StrataServer};
use strata_store::ObjectId;
use tracing::warn;

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Serve(args) => cmd_serve(args).await,
        Command::Put(args) => cmd_put(args).await,
        Command::Get(args) => cmd_get(args).await,
        Command::Nodes(args) => cmd_nodes(args).await,
        Command::Register(args) => cmd_register(args).await,
        Command::BlobGet(args) => cmd_blob_get(args).await,
        Command::BlobPut(args) => cmd_blob_put(args).await,
    }
}

async fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let config = match &args.config {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    let bound = StrataServer::new(config).bind(&args.service.tiers()).await?;
    for tier in bound.tiers() {
        if let Some(addr) = bound.local_addr(tier) {
            println!("{} {} on {}", "✓".green().bold(), tier.as_str().bold(), addr.to_string().cyan());
        }
    }
    bound
        .run_until(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!(%err, "cannot listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        })
        .await?;
    Ok(())
}

async fn gateway(args: &GatewayArgs) -> anyhow::Result<ObjectGateway> {
    Ok(ObjectGateway::connect(&args.transport, &args.index)
        .await?
        .with_key_prefix(args.prefix.clone()))
}

async fn cmd_put(args: PutArgs) -> anyhow::Result<()> {
    let mut gw = gateway(&args.gateway).await?;
    let id = gw.put(&args.payload).await?;
    println!("{} Stored as {}", "✓".green().bold(), id.to_string().yellow().bold());
    Ok(())
}

async fn cmd_get(args: GetArgs) -> anyhow::Result<()> {
    let mut gw = gateway(&args.gateway).await?;
    let payload = gw.get(&ObjectId::from_wire(args.id)).await?;
    println!("{payload}");
    Ok(())
}

async fn cmd_nodes(args: IndexArgs) -> anyhow::Result<()> {
    let mut index = IndexClient::connect(&args.index).await?;
    let snapshot = index.partitions().await?;
    if snapshot.values().all(Vec::is_empty) {
        println!("No storage nodes registered.");
        return Ok(());
    }
    for (partition, nodes) in &snapshot {
        println!("partition {}", partition.to_string().yellow().bold());
        for node in nodes {
            match node.address() {
                Some(addr) => println!("  {}", addr.cyan()),
                None => println!("  {} {}", node, "(no address)".dimmed()),
            }
        }
    }
    Ok(())
}

/// Accept a JSON descriptor, or fall back to a bare `host:port`.
fn parse_node(text: &str) -> NodeDescriptor {
    NodeDescriptor::parse(text).unwrap_or_else(|_| NodeDescriptor::from_addr(text))
}

async fn cmd_register(args: RegisterArgs) -> anyhow::Result<()> {
    let node = parse_node(&args.node);
    let mut index = IndexClient::connect(&args.index.index).await?;
    index.register(&node).await?;
    let total = index.partitions().await?.values().map(Vec::len).sum::<usize>();
    println!("{} Registered {} ({} nodes known)", "✓".green().bold(), node.to_string().cyan(), total);
    Ok(())
}

async fn cmd_blob_get(args: BlobGetArgs) -> anyhow::Result<()> {
    let mut storage = StorageClient::connect(&args.storage.storage).await?;
    println!("{}", storage.get(&args.key).await?);
    Ok(())
}

async fn cmd_blob_put(args: BlobPutArgs) -> anyhow::Result<()> {
    let mut storage = StorageClient::connect(&args.storage.storage).await?;
    storage.put(&args.key, &args.body).await?;
    println!("{} Wrote {}", "✓".green().bold(), args.key.bold());
    Ok(())
}
