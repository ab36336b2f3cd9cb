use std::sync::Arc;

use crate::config::AppConfig;
use crate::media::ImageHost;
use crate::sessions::Sessions;
use crate::store::DocumentStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn DocumentStore>,
    pub sessions: Arc<Sessions>,
    pub images: Arc<dyn ImageHost>,
}
