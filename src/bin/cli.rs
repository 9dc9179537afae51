//! Quaderno CLI
//!
//! Command-line interface for syncing a Zotero library to a device.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quaderno::catalog::{read_local_folder_set, read_local_snapshot};
use quaderno::error::{QuadernoError, Result};
use quaderno::remote::{read_remote_snapshot, DirectoryStore, RemoteStore};
use quaderno::sync::{catalog_paths, plan_sync, LogLevel, SyncEvent, SyncWorker};
use quaderno::types::SyncConfig;

#[derive(Parser)]
#[command(name = "quaderno")]
#[command(about = "Sync a Zotero library to a DigitalPaper device")]
#[command(version)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(long, env = "QUADERNO_CONFIG")]
    config: Option<PathBuf>,

    /// Document root on the device
    #[arg(long, env = "QUADERNO_REMOTE_ROOT")]
    remote_root: Option<String>,

    /// Zotero storage folder (or the Zotero data directory)
    #[arg(long, env = "QUADERNO_STORAGE")]
    storage: Option<PathBuf>,

    /// Zotero database file (or the directory holding zotero.sqlite)
    #[arg(long, env = "QUADERNO_CATALOG")]
    catalog: Option<PathBuf>,

    /// Directory the device file system is mounted at
    #[arg(long, env = "QUADERNO_DEVICE_ROOT")]
    device_root: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bring the device in line with the library
    Sync {
        /// Log what would happen without touching the device
        #[arg(short, long)]
        simulate: bool,
        /// Skip the existence check after deleting a file
        #[arg(long)]
        no_verify: bool,
    },
    /// Show the operations a sync would perform
    Plan {
        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },
    /// List folders derived from collections
    Folders,
    /// List PDFs that belong on the device
    Files,
    /// List the device tree below the remote root
    Remote,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false),
        )
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    if let Err(e) = run(Cli::parse()).await {
        eprintln!("Error: {}", e);
        std::process::exit(e.code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => {
            let path = shellexpand::tilde(&path.to_string_lossy()).to_string();
            SyncConfig::from_toml_file(std::path::Path::new(&path))?
        }
        None => SyncConfig::default(),
    };
    if let Some(remote_root) = cli.remote_root {
        config.remote_root = remote_root;
    }
    if cli.storage.is_some() {
        config.storage_root = cli.storage;
    }
    if cli.catalog.is_some() {
        config.catalog_path = cli.catalog;
    }
    let device_root = cli.device_root;

    match cli.command {
        Commands::Sync {
            simulate,
            no_verify,
        } => {
            config.simulate |= simulate;
            if no_verify {
                config.verify_deletes = false;
            }
            let store = open_device(device_root.as_deref())?;

            let (worker, mut events) = SyncWorker::spawn(config, store);
            while let Some(event) = events.recv().await {
                if let SyncEvent::Line(line) = event {
                    match line.level {
                        LogLevel::Info => println!("{}", line),
                        LogLevel::Warning | LogLevel::Error => println!("! {}", line),
                    }
                }
            }

            let report = worker.wait().await?;
            if report.log.failed > 0 {
                return Err(QuadernoError::Sync(format!(
                    "{} operation(s) failed",
                    report.log.failed
                )));
            }
        }

        Commands::Plan { json } => {
            let store = open_device(device_root.as_deref())?;
            let plan = plan_sync(&config, store.as_ref())?;

            if json {
                println!("{}", serde_json::to_string_pretty(&plan)?);
            } else {
                for op in &plan {
                    println!("{}", op);
                }
                println!("{}", plan.summary());
            }
        }

        Commands::Folders => {
            let paths = catalog_paths(&config)?;
            for folder in read_local_folder_set(&paths)? {
                println!("{}", folder);
            }
        }

        Commands::Files => {
            let paths = catalog_paths(&config)?;
            let snapshot = read_local_snapshot(&paths)?;
            for (path, file) in &snapshot.files {
                println!(
                    "{}  {}  <- {}",
                    file.modified.format("%Y-%m-%d %H:%M"),
                    path,
                    file.source.display()
                );
            }
        }

        Commands::Remote => {
            let store = open_device(device_root.as_deref())?;
            let snapshot = read_remote_snapshot(store.as_ref(), &config.remote_root)?;
            for folder in &snapshot.folders {
                println!("{}/", folder);
            }
            for file in &snapshot.files {
                println!("{}", file);
            }
        }
    }

    Ok(())
}

fn open_device(device_root: Option<&str>) -> Result<Arc<dyn RemoteStore>> {
    let root = device_root.ok_or_else(|| {
        QuadernoError::Config("--device-root (or QUADERNO_DEVICE_ROOT) is required".to_string())
    })?;
    let root = PathBuf::from(shellexpand::tilde(root).into_owned());
    Ok(Arc::new(DirectoryStore::new(root)?))
}
