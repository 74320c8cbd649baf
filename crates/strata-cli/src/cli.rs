use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use strata_server::Tier;

#[derive(Parser)]
#[command(
    name = "strata",
    about = "Strata: a three-tier object store over a line protocol",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run one or all of the services
    Serve(ServeArgs),
    /// Store an object through the gateway
    Put(PutArgs),
    /// Fetch an object through the gateway
    Get(GetArgs),
    /// Show the partition map held by the index
    Nodes(IndexArgs),
    /// Register a storage node with the index
    Register(RegisterArgs),
    /// Read a blob directly from a storage node
    BlobGet(BlobGetArgs),
    /// Write a blob directly to a storage node
    BlobPut(BlobPutArgs),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum ServiceArg {
    Transport,
    Index,
    Storage,
    All,
}

impl ServiceArg {
    pub fn tiers(self) -> Vec<Tier> {
        match self {
            Self::Transport => vec![Tier::Transport],
            Self::Index => vec![Tier::Index],
            Self::Storage => vec![Tier::Storage],
            Self::All => Tier::ALL.to_vec(),
        }
    }
}

#[derive(Args)]
pub struct ServeArgs {
    /// TOML configuration file; defaults apply when omitted
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    #[arg(short, long, value_enum, default_value = "all")]
    pub service: ServiceArg,
}

#[derive(Args)]
pub struct GatewayArgs {
    #[arg(long, default_value = "localhost:12000")]
    pub transport: String,
    #[arg(long, default_value = "localhost:12001")]
    pub index: String,
    /// Prefix for storage keys, e.g. `objects/`
    #[arg(long, default_value = "")]
    pub prefix: String,
}

#[derive(Args)]
pub struct PutArgs {
    pub payload: String,
    #[command(flatten)]
    pub gateway: GatewayArgs,
}

#[derive(Args)]
pub struct GetArgs {
    pub id: String,
    #[command(flatten)]
    pub gateway: GatewayArgs,
}

#[derive(Args)]
pub struct IndexArgs {
    #[arg(long, default_value = "localhost:12001")]
    pub index: String,
}

#[derive(Args)]
pub struct RegisterArgs {
    /// `host:port`, or a JSON descriptor such as `{"addr":"host:port"}`
    pub node: String,
    #[command(flatten)]
    pub index: IndexArgs,
}

#[derive(Args)]
pub struct StorageArgs {
    #[arg(long, default_value = "localhost:12002")]
    pub storage: String,
}

#[derive(Args)]
pub struct BlobGetArgs {
    pub key: String,
    #[command(flatten)]
    pub storage: StorageArgs,
}

#[derive(Args)]
pub struct BlobPutArgs {
    pub key: String,
    pub body: String,
    #[command(flatten)]
    pub storage: StorageArgs,
}
