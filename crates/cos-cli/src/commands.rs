use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use colored::Colorize;
use cos_crypto::ContentHasher;
use cos_gate::PermissionPrompter;
use cos_host::{HostServer, StorageHost};
use cos_sdk::{CacheConfig, ContentHash, CrossOriginStorage, HashCache, Origin, RequestOptions};
use cos_store::FsBlobStore;
use serde_json::json;

use crate::cli::*;
use crate::config::CliConfig;
use crate::prompt::{assumed, TerminalPrompter};

/// Resolved global options shared by every command.
struct Context {
    root: PathBuf,
    origin: Origin,
    prompter: Arc<dyn PermissionPrompter>,
    config: CliConfig,
    format: OutputFormat,
}

impl Context {
    fn new(cli: &Cli) -> anyhow::Result<Self> {
        let prompter: Arc<dyn PermissionPrompter> = match cli.assume {
            Some(assume) => Arc::new(assumed(assume)),
            None => Arc::new(TerminalPrompter),
        };
        Ok(Self {
            root: cli.root.clone(),
            origin: Origin::new(&cli.origin).context("invalid --origin")?,
            prompter,
            config: CliConfig::load(cli.config.as_deref())?,
            format: cli.format.clone(),
        })
    }

    fn host(&self) -> anyhow::Result<StorageHost> {
        let blobs = self.root.join("blobs");
        let store = FsBlobStore::open(&blobs)
            .with_context(|| format!("opening store at {}", blobs.display()))?;
        Ok(StorageHost::new(Arc::new(store), self.config.host.clone()))
    }

    fn storage(&self) -> anyhow::Result<CrossOriginStorage> {
        Ok(CrossOriginStorage::connect_in_process(
            self.origin.clone(),
            Arc::new(self.host()?),
            self.prompter.clone(),
            self.config.client.clone(),
        ))
    }

    fn cache_config(&self) -> CacheConfig {
        let mut cache = self.config.cache.clone();
        if cache.index_path.is_none() {
            cache.index_path = Some(self.root.join("cache-index.json"));
        }
        cache
    }

    fn json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }
}

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let ctx = Context::new(&cli)?;
    match cli.command {
        Command::Hash(args) => cmd_hash(&ctx, args),
        Command::Put(args) => cmd_put(&ctx, args).await,
        Command::Get(args) => cmd_get(&ctx, args).await,
        Command::Cache(CacheArgs { action }) => match action {
            CacheAction::Put { key, file } => cmd_cache_put(&ctx, &key, &file).await,
            CacheAction::Get { key, output } => cmd_cache_get(&ctx, &key, output.as_deref()).await,
        },
        Command::Serve(args) => cmd_serve(ctx, args).await,
    }
}

fn cmd_hash(ctx: &Context, args: HashArgs) -> anyhow::Result<()> {
    let algorithm = args
        .algorithm
        .unwrap_or(ctx.config.client.default_algorithm);
    let file = File::open(&args.file)
        .with_context(|| format!("opening {}", args.file.display()))?;
    let hash = ContentHasher::for_algorithm(algorithm).hash_reader(file)?;
    if ctx.json() {
        println!(
            "{}",
            json!({ "file": args.file, "algorithm": hash.algorithm(), "value": hash.value() })
        );
    } else {
        println!("{}  {}", hash.to_string().yellow(), args.file.display());
    }
    Ok(())
}

async fn cmd_put(ctx: &Context, args: PutArgs) -> anyhow::Result<()> {
    let bytes = std::fs::read(&args.file)
        .with_context(|| format!("reading {}", args.file.display()))?;
    let storage = ctx.storage()?;
    let hash = storage.hash(&bytes);
    let handles = storage
        .request_file_handles(std::slice::from_ref(&hash), RequestOptions::create())
        .await?;
    let handle = handles
        .into_iter()
        .next()
        .context("host returned no handle")?;
    let mut stream = handle.open_write_stream();
    let ack = stream.write(bytes).await?;
    stream.close().await?;

    if ctx.json() {
        println!("{}", json!({ "hash": ack.hash, "size": ack.size }));
    } else {
        println!("{} Stored {} ({} bytes)", "✓".green().bold(), ack.hash.to_string().yellow(), ack.size);
    }
    Ok(())
}

async fn cmd_get(ctx: &Context, args: GetArgs) -> anyhow::Result<()> {
    let storage = ctx.storage()?;
    let handles = storage
        .request_file_handles(std::slice::from_ref(&args.hash), RequestOptions::read())
        .await?;
    let handle = handles
        .into_iter()
        .next()
        .context("host returned no handle")?;
    let bytes = handle.read().await?;
    emit_bytes(ctx, &args.hash, &bytes, args.output.as_deref())
}

async fn cmd_cache_put(ctx: &Context, key: &str, file: &Path) -> anyhow::Result<()> {
    let bytes = std::fs::read(file).with_context(|| format!("reading {}", file.display()))?;
    let cache = HashCache::from_config(Arc::new(ctx.storage()?), &ctx.cache_config())?;
    let hash = cache.put(key, &bytes).await?;
    if ctx.json() {
        println!("{}", json!({ "key": key, "hash": hash, "size": bytes.len() }));
    } else {
        println!("{} Cached {} as {}", "✓".green().bold(), key.bold(), hash.to_string().yellow());
    }
    Ok(())
}

async fn cmd_cache_get(ctx: &Context, key: &str, output: Option<&Path>) -> anyhow::Result<()> {
    let cache = HashCache::from_config(Arc::new(ctx.storage()?), &ctx.cache_config())?;
    let Some(hash) = cache.hash_for(key).await else {
        return report_miss(ctx, key);
    };
    match cache.get(key).await? {
        Some(bytes) => emit_bytes(ctx, &hash, &bytes, output),
        None => report_miss(ctx, key),
    }
}

async fn cmd_serve(mut ctx: Context, args: ServeArgs) -> anyhow::Result<()> {
    if let Some(bind) = args.bind {
        ctx.config.host.bind_addr = bind;
    }
    let host = Arc::new(ctx.host()?);
    if !ctx.json() {
        println!(
            "Storage host on {} (root: {})",
            ctx.config.host.bind_addr.to_string().bold(),
            ctx.root.display()
        );
    }
    HostServer::new(host).serve().await?;
    Ok(())
}

fn report_miss(ctx: &Context, key: &str) -> anyhow::Result<()> {
    if ctx.json() {
        println!("{}", json!({ "key": key, "hit": false }));
    } else {
        eprintln!("{} {}", "miss:".yellow(), key);
    }
    Ok(())
}

/// Write fetched bytes to `output`, or raw to stdout.
fn emit_bytes(
    ctx: &Context,
    hash: &ContentHash,
    bytes: &[u8],
    output: Option<&Path>,
) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))?;
            if ctx.json() {
                println!("{}", json!({ "hash": hash, "size": bytes.len(), "output": path }));
            } else {
                println!(
                    "{} Wrote {} bytes to {}",
                    "✓".green().bold(),
                    bytes.len(),
                    path.display()
                );
            }
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(bytes)?;
            stdout.flush()?;
        }
    }
    Ok(())
}
