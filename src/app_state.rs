// Application state management

use std::sync::{Arc, Mutex};

use tracing::info;

use crate::notifications::{LogSink, NotificationEvent, NotificationSink};
use crate::store::Store;

pub type SharedState = Arc<Mutex<AppState>>;

pub struct AppState {
    /// Storage handle; every operation takes the surrounding mutex for its
    /// whole transactional boundary.
    pub store: Store,
    /// External notification collaborator, fire-and-forget.
    pub sink: Arc<dyn NotificationSink>,
    state_file: String,
}

impl AppState {
    pub fn new() -> Self {
        let state_file =
            std::env::var("STATE_FILE").unwrap_or_else(|_| "data/state.json".to_string());

        let mut state = Self {
            store: Store::new(),
            sink: Arc::new(LogSink),
            state_file,
        };

        if state.load_from_disk().is_ok() {
            info!(file = %state.state_file, "Loaded persisted state from disk");
        } else {
            info!("No persisted state found, starting fresh");
        }

        state
    }

    pub fn with_sink(sink: Arc<dyn NotificationSink>) -> Self {
        let mut state = Self::new();
        state.sink = sink;
        state
    }

    /// Emit events from a committed operation. Delivery failure is the
    /// sink's problem, never the ledger's.
    pub fn emit(&self, events: impl IntoIterator<Item = NotificationEvent>) {
        for event in events {
            self.sink.notify(event);
        }
    }

    pub fn save_to_disk(&self) -> Result<(), String> {
        let json = serde_json::to_string_pretty(&self.store)
            .map_err(|e| format!("Failed to serialize state: {}", e))?;

        if let Some(parent) = std::path::Path::new(&self.state_file).parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create state directory: {}", e))?;
        }
        std::fs::write(&self.state_file, json)
            .map_err(|e| format!("Failed to write state file: {}", e))?;

        info!(file = %self.state_file, "State saved to disk");
        Ok(())
    }

    fn load_from_disk(&mut self) -> Result<(), String> {
        let json =
            std::fs::read_to_string(&self.state_file).map_err(|_| "No state file found")?;
        self.store = serde_json::from_str(&json)
            .map_err(|e| format!("Failed to deserialize state: {}", e))?;
        Ok(())
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
