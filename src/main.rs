use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

mod config;
mod error;
mod handler;
mod http;
mod logger;
mod server;

use error::{Result, ServerError};

fn main() -> Result<()> {
    // Optional config path (without extension) as the first argument
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| config::DEFAULT_CONFIG_PATH.to_string());
    let cfg = config::Config::load_from(&config_path)?;
    logger::init(&cfg).map_err(ServerError::Logger)?;

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
        logger::log_config(&format!("Using {workers} worker threads"));
    } else {
        logger::log_config("Using default worker threads (CPU cores)");
    }

    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: config::Config) -> Result<()> {
    let addr = cfg.get_socket_addr()?;
    let listener = server::create_reusable_listener(addr)?;

    let state = Arc::new(config::AppState::new(&cfg));
    server::start_signal_handler(Arc::clone(&state))?;

    logger::log_server_start(&addr, &cfg);
    logger::log_config(&format!("Max body size: {} bytes", cfg.http.max_body_size));
    logger::log_config(&format!(
        "Timeouts: keep-alive {}s, read {}s, write {}s, shutdown {}s",
        cfg.performance.keep_alive_timeout,
        cfg.performance.read_timeout,
        cfg.performance.write_timeout,
        cfg.performance.shutdown_timeout,
    ));

    // Connection tasks use spawn_local
    let local = tokio::task::LocalSet::new();
    local
        .run_until(server::run_server(
            listener,
            state,
            Arc::new(AtomicUsize::new(0)),
        ))
        .await;

    Ok(())
}
