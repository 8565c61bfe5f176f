use std::sync::Arc;

use credit_score_api::{config, logger, server};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = config::Config::load()?;
    logger::init(&cfg)?;

    // Worker threads back the blocking CSV reads; connections run on a LocalSet
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

#[allow(clippy::future_not_send)]
async fn async_main(cfg: config::Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;
    let listener = server::create_reusable_listener(addr)?;

    let state = Arc::new(config::AppState::new(&cfg));

    logger::log_server_start(&addr, &cfg);
    if !state.csv_path.exists() {
        logger::log_warning(&format!(
            "{} does not exist yet; requests will get 404 until it does",
            state.csv_path.display()
        ));
    }

    server::start_signal_handler(Arc::clone(&state.shutdown));

    let local = tokio::task::LocalSet::new();
    local.run_until(server::start_server_loop(listener, state)).await;

    Ok(())
}
