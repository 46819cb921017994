//! ChainPool CLI: query configured networks through the endpoint pool.
//!
//! # Commands
//! ```text
//! chainpool networks
//! chainpool chain-id --network <name> [--strategy next|random] [--all]
//! chainpool call     --network <name> --method <rpc method> [--params <json array>]
//! ```

use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;

use chainpool_core::{NetworkConnection, NetworkPool, RpcTransport};
use chainpool_endpoint::{autoconfig, init_tracing, PoolConfig};

#[derive(Parser)]
#[command(
    name = "chainpool",
    about = "Multi-network JSON-RPC endpoint pool: ChainPool CLI",
    long_about = "
ChainPool CLI: load a network → endpoints configuration, build the pool and
send requests through it. HTTP(S) URLs use HTTP; any other address is an IPC
path (Unix socket, or named pipe on Windows).

ENVIRONMENT VARIABLES:
  CHAINPOOL_CONFIG   Path to the YAML configuration (default: chainpool.yaml)
  RUST_LOG           Overrides the configured log filter
",
    version
)]
struct Cli {
    /// YAML configuration file
    #[arg(short, long, global = true, env = "CHAINPOOL_CONFIG", default_value = "chainpool.yaml")]
    config: PathBuf,

    /// Log at debug level (includes HTTP request/response bodies)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List configured networks and their endpoints
    Networks,

    /// Resolve the chain id of a network
    #[command(name = "chain-id")]
    ChainId {
        /// Network name, as configured
        #[arg(short, long)]
        network: String,
        /// How to pick the connection
        #[arg(long, value_enum, default_value_t = Strategy::Next)]
        strategy: Strategy,
        /// Query every connection of the network instead of one
        #[arg(long)]
        all: bool,
    },

    /// Send a raw JSON-RPC call and print the result
    Call {
        /// Network name, as configured
        #[arg(short, long)]
        network: String,
        /// RPC method, e.g. eth_blockNumber
        #[arg(short, long)]
        method: String,
        /// Parameters as a JSON array, e.g. '["latest", false]'
        #[arg(long, default_value = "[]")]
        params: String,
        /// How to pick the connection
        #[arg(long, value_enum, default_value_t = Strategy::Next)]
        strategy: Strategy,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Strategy {
    /// Round-robin
    Next,
    /// Uniformly random
    Random,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = PoolConfig::load(&cli.config)
        .with_context(|| format!("load config '{}'", cli.config.display()))?;
    if cli.verbose {
        config.log.level = "debug".to_string();
    }
    // Before the pool: HTTP transports decide body logging when built.
    init_tracing(&config.log)?;

    let pool = match autoconfig::build_pool(&config) {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!(error = %e, "startup failed");
            return Err(e).context("build network pool");
        }
    };

    match cli.command {
        Commands::Networks => cmd_networks(&pool),
        Commands::ChainId { network, strategy, all } => cmd_chain_id(&pool, &network, strategy, all).await,
        Commands::Call { network, method, params, strategy } => {
            cmd_call(&pool, &network, &method, &params, strategy).await
        }
    }
}

fn select<'a>(pool: &'a NetworkPool, network: &str, strategy: Strategy) -> Result<&'a NetworkConnection> {
    let conn = match strategy {
        Strategy::Next => pool.next_connection_for(network),
        Strategy::Random => pool.random_connection_for(network),
    };
    conn.ok_or_else(|| anyhow!("unknown network '{network}' (configured: {})", pool.networks().join(", ")))
}

fn cmd_networks(pool: &NetworkPool) -> Result<()> {
    for network in pool.networks() {
        println!("{network}");
        for conn in pool.connections_for(network) {
            println!("  {:12} {}", conn.kind().to_string(), conn.endpoint());
        }
    }
    Ok(())
}

async fn cmd_chain_id(pool: &NetworkPool, network: &str, strategy: Strategy, all: bool) -> Result<()> {
    if !all {
        let conn = select(pool, network, strategy)?;
        let id = conn
            .chain_id()
            .await
            .with_context(|| format!("eth_chainId via {}", conn.endpoint()))?;
        println!("{id}");
        return Ok(());
    }

    let conns = pool.connections_for(network);
    if conns.is_empty() {
        bail!("unknown network '{network}'");
    }
    let mut failed = 0;
    for conn in conns {
        match conn.chain_id().await {
            Ok(id) => println!("  ✓ {:50} {id}", conn.endpoint()),
            Err(e) => {
                failed += 1;
                eprintln!("  ✗ {:50} {e}", conn.endpoint());
            }
        }
    }
    if failed > 0 {
        bail!("{failed} of {} connections failed", conns.len());
    }
    Ok(())
}

async fn cmd_call(
    pool: &NetworkPool,
    network: &str,
    method: &str,
    params: &str,
    strategy: Strategy,
) -> Result<()> {
    let params: Vec<Value> = serde_json::from_str(params).context("--params must be a JSON array")?;
    let conn = select(pool, network, strategy)?;
    tracing::debug!(endpoint = %conn.endpoint(), method, "sending call");
    let result = conn
        .call_raw(method, params)
        .await
        .with_context(|| format!("{method} via {}", conn.endpoint()))?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
