pub mod action;
pub mod authors;
pub mod breadcrumb;
pub mod client;
pub mod config_file;
pub mod editor;
pub mod gateway;
pub mod model;
pub mod reducer;
pub mod render;
pub mod store;
pub mod sync;
pub mod views;

// Re-export for convenience
pub use action::Action;
pub use client::{BlogClient, SubmitError};
pub use config_file::{ConfigError, ConfigFile};
pub use editor::{PaperForm, ValidationErrors};
pub use gateway::rest::HttpGateway;
pub use gateway::{BlogBackend, GatewayError};
pub use model::{Author, AuthorDraft, AuthorId, Paper, PaperDraft, PaperId, PaperType};
pub use reducer::reduce;
pub use render::{MarkdownSanitizer, SafeHtml};
pub use store::{DbCache, Store, StoreHandle};
pub use sync::{SyncReport, populate_store};

/// Environment variable holding the backend base URI.
pub const BACKEND_URI_ENV: &str = "BLOGMAP_BACKEND_URI";

/// Resolved client settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// Backend base URI; empty when none was configured.
    pub backend_uri: String,
}

impl Config {
    /// Resolve settings from lowest to highest precedence: config file,
    /// environment, command line. Blank values are skipped.
    pub fn from_sources(file: &ConfigFile, env: Option<&str>, cli: Option<&str>) -> Self {
        let backend_uri = [cli, env, file.backend_uri()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|uri| !uri.is_empty())
            .unwrap_or_default()
            .to_string();
        Self { backend_uri }
    }

    /// Empty, unsynced store pointed at the configured backend.
    pub fn initial_store(&self) -> Store {
        Store::with_backend(self.backend_uri.clone())
    }
}
