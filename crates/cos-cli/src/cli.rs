use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use cos_types::{ContentHash, HashAlgorithm};

#[derive(Parser)]
#[command(
    name = "cos",
    about = "Cross-origin storage: share content-addressed files between origins",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Directory holding the blob store and cache index
    #[arg(long, global = true, default_value = ".cos")]
    pub root: PathBuf,

    /// Origin the request is made on behalf of
    #[arg(long, global = true, default_value = "localhost")]
    pub origin: String,

    /// Answer permission prompts automatically instead of asking on the terminal
    #[arg(long, global = true)]
    pub assume: Option<Assume>,

    /// TOML file with [client], [host] and [cache] tables
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum Assume {
    Once,
    Session,
    Never,
    Decline,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the content hash of a file
    Hash(HashArgs),
    /// Store a file under its content hash
    Put(PutArgs),
    /// Fetch a stored file by hash
    Get(GetArgs),
    /// Keyed cache over the store
    Cache(CacheArgs),
    /// Serve the store over HTTP
    Serve(ServeArgs),
}

#[derive(Args)]
pub struct HashArgs {
    pub file: PathBuf,
    /// Digest to use; defaults to the configured algorithm
    #[arg(long)]
    pub algorithm: Option<HashAlgorithm>,
}

#[derive(Args)]
pub struct PutArgs {
    pub file: PathBuf,
}

#[derive(Args)]
pub struct GetArgs {
    /// Hash as ALGORITHM:value
    pub hash: ContentHash,
    /// Write to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub action: CacheAction,
}

#[derive(Subcommand)]
pub enum CacheAction {
    /// Store a file under a key
    Put { key: String, file: PathBuf },
    /// Fetch the file cached under a key
    Get {
        key: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args)]
pub struct ServeArgs {
    /// Overrides [host].bind_addr
    #[arg(long)]
    pub bind: Option<SocketAddr>,
}
