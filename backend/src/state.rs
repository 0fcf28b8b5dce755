use std::sync::Arc;

use crate::config::Credentials;
use crate::store::Store;

/// Shared by every request handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub credentials: Arc<Credentials>,
}

impl AppState {
    pub fn new(store: Store, credentials: Credentials) -> Self {
        Self {
            store,
            credentials: Arc::new(credentials),
        }
    }
}
