//! Chatkeep - local conversation store CLI
//!
#![doc = "Chatkeep - local conversation store CLI"]
#![doc = "Main entry point for the chatkeep binary."]

use anyhow::Result;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use chatkeep::cli::{Cli, Commands};
use chatkeep::commands;
use chatkeep::config::{Config, StorageConfig};
use chatkeep::conversation::ConversationStore;
use chatkeep::identity::{AnonymousSession, CookieJar, IdentityRegistry};
use chatkeep::storage::{ConversationPersistence, SledBackend};
use chatkeep::sync::SyncManager;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    let data_dir = config.storage.resolve_data_dir()?;
    tracing::debug!("Using data directory: {}", data_dir.display());

    let backend = Arc::new(SledBackend::open(StorageConfig::database_path(&data_dir))?);
    let persistence = ConversationPersistence::new(backend, &config.storage.conversations_key);

    let jar = Arc::new(CookieJar::open(StorageConfig::cookie_jar_path(&data_dir))?);
    let max_age = config.cookies.max_age();
    let registry = IdentityRegistry::with_max_age(jar.clone(), max_age);
    let session = AnonymousSession::with_max_age(jar, max_age);

    let mut store = ConversationStore::init(persistence, registry);
    let sync = SyncManager::new(&config.history)?.with_session(session.clone());

    if cli.wants_startup_sync() && sync.is_configured() {
        tracing::info!("Running startup sync");
        let outcome = sync.run(&mut store).await;
        tracing::info!("Startup sync finished: {}", outcome);
    }

    // Execute command
    let result = match cli.command {
        Commands::List => {
            commands::conversations::list(&store);
            Ok(())
        }
        Commands::New => {
            commands::conversations::create(&mut store);
            Ok(())
        }
        Commands::Show { id } => commands::conversations::show(&store, id.as_deref()),
        Commands::Say { id, content, role } => {
            commands::conversations::say(&mut store, &id, &content, &role)
        }
        Commands::Rename { id, title } => commands::conversations::rename(&mut store, &id, &title),
        Commands::Delete { id } => commands::conversations::delete(&mut store, &id),
        Commands::Sync => {
            commands::sync::run_sync(&sync, &mut store).await;
            Ok(())
        }
        Commands::Check => commands::sync::check(&sync).await,
        Commands::Registry => commands::identity::show_registry(&store, &session),
    };

    store.dispose()?;
    result
}

/// Initialize tracing subscriber with environment filter
fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "chatkeep=debug"
    } else {
        "chatkeep=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
