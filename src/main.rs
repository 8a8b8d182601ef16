use clap::Parser;
use khata_engine::application::orchestrator::LedgerEngine;
use khata_engine::config::EngineConfig;
use khata_engine::domain::owner::{Language, Owner};
use khata_engine::domain::ports::{LedgerStoreRef, OwnerStoreRef};
use khata_engine::infrastructure::in_memory::{
    InMemoryEvidenceStore, InMemoryLedgerStore, InMemoryOwnerStore, LogChannel,
};
use khata_engine::interfaces::csv::balance_writer::BalanceWriter;
use khata_engine::interfaces::csv::request_reader::RequestReader;
use miette::{IntoDiagnostic, Result};
use serde::Deserialize;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

/// Batch front end for the voice ledger engine: streams extracted
/// transaction requests through the full request cycle and prints final
/// per-customer balances.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input requests CSV file
    /// (owner,customer,amount,kind,transcript,audio_ref,confidence)
    input: PathBuf,

    /// Registered owners CSV file (id,name,contact,language)
    #[arg(long)]
    owners: PathBuf,

    /// Path to persistent database (optional). Requires the
    /// storage-rocksdb feature.
    #[arg(long)]
    db_path: Option<PathBuf>,
}

#[derive(Deserialize)]
struct OwnerRecord {
    id: Uuid,
    name: String,
    contact: String,
    language: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .init();

    let cli = Cli::parse();

    #[cfg(feature = "storage-rocksdb")]
    if let Some(db_path) = &cli.db_path {
        let store = khata_engine::infrastructure::rocksdb::RocksDbStore::open(db_path)
            .into_diagnostic()?;
        let owners: OwnerStoreRef = Arc::new(store.clone());
        let ledger: LedgerStoreRef = Arc::new(store);
        return run(&cli, owners, ledger).await;
    }
    if cli.db_path.is_some() {
        return Err(miette::miette!(
            "--db-path requires building with --features storage-rocksdb"
        ));
    }

    let owners: OwnerStoreRef = Arc::new(InMemoryOwnerStore::new());
    let ledger: LedgerStoreRef = Arc::new(InMemoryLedgerStore::new());
    run(&cli, owners, ledger).await
}

async fn run(cli: &Cli, owners: OwnerStoreRef, ledger: LedgerStoreRef) -> Result<()> {
    seed_owners(&cli.owners, &owners).await?;

    let engine = LedgerEngine::new(
        &EngineConfig::default(),
        Arc::clone(&owners),
        Arc::clone(&ledger),
        Arc::new(LogChannel),
        Arc::new(InMemoryEvidenceStore::new()),
    );

    let file = File::open(&cli.input).into_diagnostic()?;
    for request in RequestReader::new(file).requests() {
        match request {
            Ok(request) => {
                let response = engine.submit(request).await;
                if response.success {
                    info!(
                        balance = %response.updated_balance.unwrap_or_default(),
                        "{}",
                        response.confirmation_text.as_deref().unwrap_or_default()
                    );
                } else if let Some(error) = &response.error {
                    warn!(code = %error.code, "request rejected: {}", error.message);
                }
            }
            Err(e) => {
                warn!("error reading request: {e}");
            }
        }
    }

    let customers = ledger.all_customers().await.into_diagnostic()?;
    let stdout = io::stdout();
    let mut writer = BalanceWriter::new(stdout.lock());
    writer.write_customers(customers).into_diagnostic()?;
    Ok(())
}

async fn seed_owners(path: &PathBuf, owners: &OwnerStoreRef) -> Result<()> {
    let file = File::open(path).into_diagnostic()?;
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(file);
    for record in reader.deserialize::<OwnerRecord>() {
        let record = record.into_diagnostic()?;
        let owner = Owner {
            id: record.id,
            name: record.name,
            contact: record.contact,
            language: Language::parse(&record.language),
            created_at: chrono::Utc::now(),
        };
        owners.store(owner).await.into_diagnostic()?;
    }
    Ok(())
}
