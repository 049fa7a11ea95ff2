//! Rill history indexer binary.
//!
//! Replays a saved chain file into the RocksDB history index and answers
//! lookups against it. Query results are printed as JSON on stdout.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};

use rill_core::ledger::MemoryLedger;
use rill_core::types::Hash256;
use rill_history_lib::outputs::HistoryUxOut;
use rill_history_lib::transactions::HistoryTransaction;
use rill_history_lib::{HistoryConfig, HistoryDb, RocksStore};

/// Rill history indexer.
#[derive(Parser, Debug)]
#[command(
    name = "rill-history",
    version,
    about = "Transaction, output, and address history for a Rill chain"
)]
struct Args {
    /// Data directory holding the history database
    #[arg(long, default_value = None)]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log output format ("text" or "json")
    #[arg(long, default_value = "text")]
    log_format: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Index every block of a saved chain file.
    Replay {
        /// Chain file written by `MemoryLedger::save`
        chain: PathBuf,

        /// Only index blocks above the current indexed head
        #[arg(long)]
        incremental: bool,
    },
    /// Show an indexed transaction.
    Tx {
        /// Transaction ID (hex)
        txid: String,
    },
    /// Show an indexed output and its spend status.
    Uxout {
        /// Output ID (hex)
        uxid: String,
    },
    /// Show the outputs an address received and spent.
    Address {
        /// Pubkey hash (hex)
        pubkey_hash: String,
    },
}

impl Args {
    fn config(&self) -> HistoryConfig {
        let default = HistoryConfig::default();
        HistoryConfig {
            data_dir: self.data_dir.clone().unwrap_or(default.data_dir),
            log_level: self.log_level.clone(),
            log_format: self.log_format.clone(),
        }
    }
}

#[derive(Serialize)]
struct TxOutputJson {
    value: u64,
    pubkey_hash: String,
}

#[derive(Serialize)]
struct TransactionJson {
    txid: String,
    block_seq: u64,
    version: u64,
    lock_time: u64,
    inputs: Vec<String>,
    outputs: Vec<TxOutputJson>,
}

#[derive(Serialize)]
struct SpentJson {
    block_seq: u64,
    txid: String,
}

#[derive(Serialize)]
struct UxOutJson {
    uxid: String,
    src_txid: String,
    index: u64,
    pubkey_hash: String,
    value: u64,
    time: u64,
    block_seq: u64,
    spent: Option<SpentJson>,
}

#[derive(Serialize)]
struct AddressJson {
    pubkey_hash: String,
    received: Vec<String>,
    spent: Vec<String>,
}

#[derive(Serialize)]
struct ReplayJson {
    blocks_processed: u64,
    indexed_head: Option<u64>,
}

fn encode_all(ids: &[Hash256]) -> Vec<String> {
    ids.iter().map(|id| hex::encode(id.as_bytes())).collect()
}

fn transaction_json(rec: &HistoryTransaction) -> Result<TransactionJson> {
    Ok(TransactionJson {
        txid: hex::encode(rec.txid()?.as_bytes()),
        block_seq: rec.block_seq,
        version: rec.tx.version,
        lock_time: rec.tx.lock_time,
        inputs: encode_all(&rec.tx.inputs),
        outputs: rec
            .tx
            .outputs
            .iter()
            .map(|o| TxOutputJson {
                value: o.value,
                pubkey_hash: hex::encode(o.pubkey_hash.as_bytes()),
            })
            .collect(),
    })
}

fn uxout_json(rec: &HistoryUxOut) -> UxOutJson {
    let body = &rec.out.body;
    UxOutJson {
        uxid: hex::encode(rec.hash().as_bytes()),
        src_txid: hex::encode(body.src_txid.as_bytes()),
        index: body.index,
        pubkey_hash: hex::encode(body.pubkey_hash.as_bytes()),
        value: body.value,
        time: rec.out.head.time,
        block_seq: rec.out.head.block_seq,
        spent: rec.spent.map(|m| SpentJson {
            block_seq: m.block_seq,
            txid: hex::encode(m.txid.as_bytes()),
        }),
    }
}

fn parse_hash(s: &str) -> Result<Hash256> {
    s.parse::<Hash256>()
        .with_context(|| format!("invalid hash '{s}'"))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = args.config();

    init_logging(&config.log_level, &config.log_format);

    info!("Rill History v{}", env!("CARGO_PKG_VERSION"));
    info!("data_dir: {:?}", config.data_dir);

    std::fs::create_dir_all(&config.data_dir)
        .with_context(|| format!("failed to create data_dir {:?}", config.data_dir))?;

    let store = Arc::new(
        RocksStore::open(config.db_path())
            .with_context(|| format!("failed to open history db at {:?}", config.db_path()))?,
    );
    let mut db = HistoryDb::new(Arc::clone(&store))?;

    match args.command {
        Command::Replay { chain, incremental } => {
            let ledger = MemoryLedger::load(&chain)
                .with_context(|| format!("failed to load chain file {chain:?}"))?;
            if ledger.is_empty() {
                warn!(chain = %chain.display(), "chain file holds no blocks");
            }
            info!(blocks = ledger.len(), incremental, "replaying chain");

            let blocks_processed = if incremental {
                db.sync(&ledger)?
            } else {
                db.process_blockchain(&ledger)?
            };
            store.flush()?;

            print_json(&ReplayJson {
                blocks_processed,
                indexed_head: db.indexed_head()?,
            })?;
        }
        Command::Tx { txid } => {
            let txid = parse_hash(&txid)?;
            let Some(rec) = db.get_transaction(&txid)? else {
                bail!("transaction {txid} not found");
            };
            print_json(&transaction_json(&rec)?)?;
        }
        Command::Uxout { uxid } => {
            let uxid = parse_hash(&uxid)?;
            let Some(rec) = db.get_uxout(&uxid)? else {
                bail!("output {uxid} not found");
            };
            print_json(&uxout_json(&rec))?;
        }
        Command::Address { pubkey_hash } => {
            let pkh = parse_hash(&pubkey_hash)?;
            print_json(&AddressJson {
                pubkey_hash: hex::encode(pkh.as_bytes()),
                received: encode_all(&db.get_address_in(&pkh)?),
                spent: encode_all(&db.get_address_out(&pkh)?),
            })?;
        }
    }

    Ok(())
}

/// Initialize tracing subscriber with the given log level and output format.
///
/// Pass `format = "json"` for structured JSON output. Any other value
/// defaults to human-readable text. Logs go to stderr so query output on
/// stdout stays machine-readable.
fn init_logging(level_str: &str, format: &str) {
    use tracing_subscriber::filter::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_str));

    if format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}
