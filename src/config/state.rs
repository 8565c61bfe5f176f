// Application state module
// Immutable after startup; shared across connections behind an Arc

use std::path::PathBuf;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use tokio::sync::Notify;

use super::types::Config;

/// Application state
pub struct AppState {
    pub config: Config,
    /// Resolved location of the credit score file
    pub csv_path: PathBuf,
    /// Currently served connections
    pub active_connections: Arc<AtomicUsize>,
    /// Fired once when the process should stop accepting connections
    pub shutdown: Arc<Notify>,
}

impl AppState {
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
            csv_path: PathBuf::from(&config.data.csv_path),
            active_connections: Arc::new(AtomicUsize::new(0)),
            shutdown: Arc::new(Notify::new()),
        }
    }
}
