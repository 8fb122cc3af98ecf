use clap::Parser;
use mimalloc::MiMalloc;
use modules::{
    context::Runtime,
    error::MailSyncResult,
    fetch::{fetch_mailbox, FetchScope},
    logger,
    message::mv::move_message,
    settings::{
        cli::{Operation, Settings},
        config::Config,
    },
    sync::sync_all,
    utils::timing::OpTimer,
};
use std::sync::Arc;
use tracing::{debug, error, info};

mod modules;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> MailSyncResult<()> {
    let settings = Settings::parse();
    let config = match Config::load(&settings.config_path()) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("{:?}", error);
            return Err(error);
        }
    };
    let verbosity = if settings.verbose > 0 {
        settings.verbose
    } else {
        config.verbose
    };
    logger::initialize_logging(verbosity);
    info!("Starting rustmailsync");
    info!("Version:  {}", env!("CARGO_PKG_VERSION"));
    info!("Git:      [{}]", env!("GIT_HASH"));
    config.announce();

    let runtime = match Runtime::initialize(config).await {
        Ok(runtime) => runtime,
        Err(error) => {
            error!("startup failed: {:?}", error);
            return Err(error);
        }
    };

    let result = run_operation(&runtime, &settings).await;
    // Logout is attempted on every session regardless of earlier errors.
    runtime.shutdown().await;
    if let Err(error) = &result {
        error!("operation '{}' failed: {:?}", settings.op, error);
    }
    result
}

async fn run_operation(runtime: &Arc<Runtime>, settings: &Settings) -> MailSyncResult<()> {
    let profiler = settings.profiler_path(&runtime.config);
    let _timer = OpTimer::start(settings.op.as_str(), profiler);
    match settings.op {
        Operation::FetchNew => fetch_servers(runtime, &settings.folder, FetchScope::New).await,
        Operation::FetchAll => fetch_servers(runtime, &settings.folder, FetchScope::All).await,
        Operation::Move => {
            for server in runtime.sessions.server_names() {
                move_message(runtime, &server, &settings.mid, &settings.folder).await?;
            }
            Ok(())
        }
        Operation::Sync => sync_all(runtime, settings.dry_run).await,
    }
}

async fn fetch_servers(
    runtime: &Arc<Runtime>,
    folder: &str,
    scope: FetchScope,
) -> MailSyncResult<()> {
    for server in runtime.sessions.server_names() {
        info!("Fetch {} from {}", folder, server);
        let messages = fetch_mailbox(runtime, &server, folder, scope).await?;
        for message in &messages {
            debug!("fetch {}", message);
        }
    }
    Ok(())
}
