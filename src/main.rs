mod cli;

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use tc_av::ToolRegistry;
use tc_core::config::Config;
use tc_core::AssetId;

async fn start_server(
    host: Option<String>,
    port: Option<u16>,
    config_path: Option<&Path>,
) -> Result<()> {
    let mut config = Config::load_or_default(config_path);

    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    tracing::info!("Starting tunecast server");
    tracing::info!(
        "Server will listen on {}:{}",
        config.server.host,
        config.server.port
    );

    tc_server::start(config).await?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins; otherwise pick defaults by verbosity.
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "tunecast=trace,tc_stream=trace,tc_av=trace,tc_server=trace,tc_db=debug,tower_http=debug"
                .to_string()
        } else {
            "tunecast=debug,tc_stream=debug,tc_av=debug,tc_server=debug,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::Register { id, path } => register(id, &path, cli.config.as_deref()),
        Commands::List => list_assets(cli.config.as_deref()),
        Commands::Sweep => sweep(cli.config.as_deref()),
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("tunecast {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn register(id: i64, source: &Path, config_path: Option<&Path>) -> Result<()> {
    let config = Config::load_or_default(config_path);
    let id = AssetId::new(id)?;

    if !source.is_file() {
        anyhow::bail!("Source file does not exist: {}", source.display());
    }
    let source = source
        .canonicalize()
        .with_context(|| format!("resolving {}", source.display()))?;

    let signature = tc_core::signature::file_signature(&source)?;
    let pool = tc_db::init_pool(&config.server.db_path)?;
    let conn = tc_db::get_conn(&pool)?;
    let row = tc_db::queries::assets::upsert_asset(
        &conn,
        id,
        &source.to_string_lossy(),
        &signature,
    )?;

    println!("Registered asset {} -> {}", row.id, source.display());
    println!("  Signature: {signature}");
    Ok(())
}

fn list_assets(config_path: Option<&Path>) -> Result<()> {
    let config = Config::load_or_default(config_path);
    let pool = tc_db::init_pool(&config.server.db_path)?;
    let rows = tc_db::queries::assets::list_assets(&*tc_db::get_conn(&pool)?)?;

    if rows.is_empty() {
        println!("No assets registered");
        return Ok(());
    }

    for row in rows {
        let cached = [("low", &row.sig_low), ("medium", &row.sig_medium), ("high", &row.sig_high)]
            .into_iter()
            .filter(|(_, sig)| sig.as_deref() == Some(row.file_signature.as_str()))
            .map(|(q, _)| q)
            .collect::<Vec<_>>();
        println!("{:>8}  {}", row.id, row.source_path);
        if !cached.is_empty() {
            println!("          transcodes: {}", cached.join(", "));
        }
    }
    Ok(())
}

fn sweep(config_path: Option<&Path>) -> Result<()> {
    let config = Config::load_or_default(config_path);
    let report = tc_stream::sweep(&config.storage.hls_dir, config.reaper.ttl())?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    println!("Checking external tools...\n");

    let config = Config::load_or_default(config_path);
    let tools = ToolRegistry::discover(&config.tools).check_all();
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({version})");
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Streaming needs both ffmpeg and ffprobe.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {}", p.display());
            let text = std::fs::read_to_string(p)
                .with_context(|| format!("reading {}", p.display()))?;
            let config = Config::from_json(&text)?;
            println!("✓ Configuration is valid");
            config
        }
        None => {
            println!("No config file specified, using defaults");
            Config::default()
        }
    };

    println!("  Server: {}:{}", config.server.host, config.server.port);
    println!("  Database: {}", config.server.db_path.display());
    println!("  Streams: {}", config.storage.hls_dir.display());
    println!("  Transcodes: {}", config.storage.transcode_dir.display());
    println!(
        "  Reaper: {} (every {}s, ttl {}s)",
        if config.reaper.enabled { "enabled" } else { "disabled" },
        config.reaper.interval_secs,
        config.reaper.ttl_secs
    );

    for warning in config.validate() {
        println!("  ! {warning}");
    }

    Ok(())
}
