pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod kb;
pub mod llm;
pub mod prompt;
pub mod scraper;
pub mod store;

use std::path::Path;
use std::sync::Arc;
use serde_json::Value;

use cache::{SnapshotCache, WebsiteFetcher, SNAPSHOT_TTL};
use config::Config;
use error::{AppError, Result};
use kb::KnowledgeBase;
use llm::GenerationClient;
use store::RecordStore;

/// Application state that will be shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Structured college facts fed into every generation prompt.
    pub college_info: Arc<Value>,
    pub kb: Arc<KnowledgeBase>,
    pub snapshot: Arc<SnapshotCache>,
    /// `None` when no API key is configured; the chat endpoint reports the
    /// capability as unavailable.
    pub generator: Option<Arc<GenerationClient>>,
    pub store: Arc<RecordStore>,
}

/// Builds the shared application state from the configuration: loads the
/// knowledge base and college facts, wires the snapshot cache to the
/// configured website and instantiates the generation client if a key is
/// present.
pub fn build_state(config: Config) -> Result<AppState> {
    let kb = KnowledgeBase::load(&config.kb_path())?;
    let college_info = load_json_file(&config.college_info_path())?;

    let generator = match &config.gemini_api_key {
        Some(key) => Some(Arc::new(GenerationClient::new(key.clone())?)),
        None => None,
    };

    let fetcher = WebsiteFetcher::new(config.website_url.clone());
    let snapshot = SnapshotCache::new(Box::new(fetcher), SNAPSHOT_TTL);
    let store = RecordStore::new(config.data_dir.clone());

    Ok(AppState {
        config: Arc::new(config),
        college_info: Arc::new(college_info),
        kb: Arc::new(kb),
        snapshot: Arc::new(snapshot),
        generator,
        store: Arc::new(store),
    })
}

// Missing files read as an empty object, matching an unconfigured install.
fn load_json_file(path: &Path) -> Result<Value> {
    if !path.exists() {
        return Ok(Value::Object(Default::default()));
    }
    let raw = std::fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;
    serde_json::from_str(&raw)
        .map_err(|e| AppError::Config(format!("malformed {}: {e}", path.display())))
}
