use std::sync::Arc;
use tokio::sync::Notify;

mod api;
mod config;
mod handler;
mod http;
mod logger;
mod server;

use api::ApiBackend;
use handler::{Dispatcher, FallbackDocument, ServerInfo, StaticRoot};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Optional config file path as the first argument
    let cfg = match std::env::args().nth(1) {
        Some(path) => config::Config::load_from(&path)?,
        None => config::Config::load()?,
    };

    logger::init(&cfg)?;

    // Build the Tokio runtime, sized by the workers setting
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
        logger::log_info(&format!("Using {workers} worker threads"));
    } else {
        logger::log_info("Using default worker threads (CPU cores)");
    }

    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: config::Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;

    let static_root = StaticRoot::new(&cfg.site.static_root).map_err(|e| {
        format!(
            "Static root '{}' is unusable: {e}",
            cfg.site.static_root.display()
        )
    })?;

    logger::log_info(&format!(
        "Serving static files from {}",
        static_root.path().display()
    ));

    let fallback_path = cfg.site.fallback_document_path();
    let fallback = FallbackDocument::load(&fallback_path).await.map_err(|e| {
        format!(
            "Failed to load fallback document '{}': {e}",
            fallback_path.display()
        )
    })?;

    let api = ApiBackend::from_config(&cfg.api)?;
    let info = ServerInfo {
        message: cfg.site.message.clone(),
        version: cfg.site.version.clone(),
    };

    let listener = server::create_reusable_listener(addr)?;
    logger::log_server_start(&addr, &cfg);

    let dispatcher = Dispatcher::new(static_root, fallback, info, api);
    let state = Arc::new(config::AppState::new(cfg, dispatcher));

    let shutdown = Arc::new(Notify::new());
    server::start_signal_handler(Arc::clone(&shutdown))?;
    server::start_server_loop(listener, state, shutdown).await;

    Ok(())
}
