//! Talks to a Phat worker from the command line.
//!
//! ```bash
//! RUST_LOG=debug phat-demo --worker http://127.0.0.1:8000 info
//! phat-demo --worker http://127.0.0.1:8000 --chain http://127.0.0.1:9933 \
//!     query --metadata flipper.json --contract 0x... --contract-key 0x... \
//!     --cluster 0x... --seed 0x... get
//! ```

use std::{path::PathBuf, sync::Arc};

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use parity_scale_codec::Encode;
use phat_contract_client::{
    defaults, Certificate, ChainRpc, ClientConfig, ClusterInfo, CommandOptions, ContractAbi,
    HttpWorkerClient, JsonRpcChainClient, PhatContract, PhatRegistry, QueryOptions, WorkerRpc,
};
use phat_contract_primitives::{AccountId, Hash, Weight, WeightV2};
use phat_crypto::Keypair;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Opts {
    /// Base url of the worker's prpc endpoint.
    #[arg(long, env = "PHAT_WORKER", default_value = "http://127.0.0.1:8000")]
    worker: String,

    /// JSON-RPC endpoint of the chain node.
    #[arg(long, env = "PHAT_CHAIN", default_value = "http://127.0.0.1:9933")]
    chain: String,

    /// Client configuration as JSON. Missing fields keep their defaults.
    #[arg(long, env = "PHAT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the worker status.
    Info,
    /// Print the height of a block.
    Block {
        /// Block hash, 0x-prefixed hex.
        hash: String,
    },
    /// Run a read-only message against a contract.
    Query {
        #[command(flatten)]
        target: Target,
        /// Origin account seed, 0x-prefixed hex.
        #[arg(long, env = "PHAT_SEED")]
        seed: String,
        /// Report gas and deposit instead of the plain result.
        #[arg(long)]
        estimate: bool,
    },
    /// Build the encrypted `push_contract_message` call for a mutating
    /// message and print it without submitting.
    Command {
        #[command(flatten)]
        target: Target,
        #[arg(long, default_value_t = 0)]
        gas_limit: u64,
        #[arg(long)]
        storage_deposit_limit: Option<u128>,
        #[arg(long)]
        transfer: Option<u128>,
        /// Leave the command unencrypted.
        #[arg(long)]
        plain: bool,
    },
}

#[derive(Args, Debug)]
struct Target {
    /// Contract metadata JSON.
    #[arg(long)]
    metadata: PathBuf,
    /// Contract address, SS58 or hex.
    #[arg(long)]
    contract: String,
    /// The contract's public encryption key, hex.
    #[arg(long)]
    contract_key: String,
    /// Cluster id, hex.
    #[arg(long)]
    cluster: String,
    #[arg(long, default_value_t = 1)]
    gas_price: u128,
    /// Message label or 0x selector.
    message: String,
    /// SCALE encoded arguments, hex.
    #[arg(long, default_value = "")]
    args: String,
}

fn decode_hex<const N: usize>(text: &str, what: &str) -> Result<[u8; N]> {
    let mut out = [0u8; N];
    hex::decode_to_slice(text.trim_start_matches("0x"), &mut out)
        .with_context(|| format!("malformed {what}"))?;
    Ok(out)
}

fn load_config(path: Option<&PathBuf>) -> Result<ClientConfig> {
    let Some(path) = path else {
        return Ok(ClientConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    Ok(ClientConfig::from_json(&text)?)
}

async fn open_contract(
    opts: &Opts,
    target: &Target,
    config: ClientConfig,
) -> Result<PhatContract> {
    let chain: Arc<dyn ChainRpc> = Arc::new(JsonRpcChainClient::new(&opts.chain));
    let worker: Arc<dyn WorkerRpc> = Arc::new(HttpWorkerClient::new(&opts.worker));
    let cluster = ClusterInfo {
        id: decode_hex::<32>(&target.cluster, "cluster id")?,
        gas_price: target.gas_price,
    };
    let registry = PhatRegistry::connect(chain, worker, cluster, config).await?;

    let metadata = std::fs::read_to_string(&target.metadata)
        .with_context(|| format!("reading {}", target.metadata.display()))?;
    let abi = Arc::new(ContractAbi::from_json(&metadata)?);
    let address: AccountId = target
        .contract
        .parse()
        .map_err(|e| anyhow!("malformed contract address: {e}"))?;
    let key = decode_hex::<32>(&target.contract_key, "contract key")?;
    Ok(PhatContract::new(registry, abi, address, &key)?)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let opts = Opts::parse();
    let config = load_config(opts.config.as_ref())?;

    match &opts.command {
        Command::Info => {
            let info = HttpWorkerClient::new(&opts.worker).get_info().await?;
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
        Command::Block { hash } => {
            let hash: Hash = decode_hex::<32>(hash, "block hash")?;
            let number = JsonRpcChainClient::new(&opts.chain).block_number(hash).await?;
            println!("{number}");
        }
        Command::Query { target, seed, estimate } => {
            let contract = open_contract(&opts, target, config.clone()).await?;
            let account = Keypair::from_seed(&decode_hex::<32>(seed, "seed")?)?;
            let cert = Certificate::sign_with(&account, defaults::CERTIFICATE_TTL)
                .with_ss58_prefix(config.ss58_prefix);
            info!(origin = %cert.address(), message = %target.message, "querying");

            let args = hex::decode(target.args.trim_start_matches("0x")).context("malformed args")?;
            let options = QueryOptions::with_cert(&cert);
            let origin = *cert.account();
            let result = if *estimate {
                contract.estimate::<()>(&target.message, &origin, &options, &args).await?
            } else {
                contract.query::<()>(&target.message, &origin, &options, &args).await?
            };

            println!("gas consumed: {:?}", result.gas_consumed);
            println!("gas required: {:?}", result.gas_required);
            println!("storage deposit: {:?}", result.storage_deposit);
            if !result.debug_message.is_empty() {
                println!("debug: {}", result.debug_message);
            }
            match &result.result {
                Ok(ret) if ret.did_revert() => println!("reverted: 0x{}", hex::encode(&ret.data)),
                Ok(ret) => println!("output (flags {}): 0x{}", ret.flags, hex::encode(&ret.data)),
                Err(e) => println!("dispatch error: {e:?}"),
            }
        }
        Command::Command { target, gas_limit, storage_deposit_limit, transfer, plain } => {
            let contract = open_contract(&opts, target, config).await?;
            let args = hex::decode(target.args.trim_start_matches("0x")).context("malformed args")?;
            let options = CommandOptions {
                gas_limit: Some(Weight::V2(WeightV2 { ref_time: *gas_limit, proof_size: 0 })),
                storage_deposit_limit: *storage_deposit_limit,
                transfer: *transfer,
                plain: *plain,
            };
            let command = contract.command(&target.message, &options, &args)?;
            println!("deposit: {}", command.deposit());
            println!("nonce: 0x{}", hex::encode(command.nonce()));
            println!("call: 0x{}", hex::encode(command.call().encode()));
        }
    }
    Ok(())
}
