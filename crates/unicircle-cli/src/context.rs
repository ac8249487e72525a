use unicircle_collections::{CollectionBackend, LocalCollectionStore};
use unicircle_core::config::{BackendKind, UniCircleConfig, ENV_API_KEY};
use unicircle_core::models::ids::UserId;
use unicircle_db::SqliteStore;
use unicircle_http::HttpCollectionStore;
use unicircle_storage::{resolve_api_key, KeyringStore};

/// Resolved configuration plus the acting user for one CLI invocation.
pub struct Context {
    pub config: UniCircleConfig,
    user: Option<String>,
}

impl Context {
    pub fn load(user: Option<String>) -> anyhow::Result<Self> {
        Ok(Self {
            config: UniCircleConfig::load()?,
            user,
        })
    }

    /// `--user` wins over `UNICIRCLE_USER`, which wins over the config file.
    pub fn user(&self) -> anyhow::Result<UserId> {
        self.user
            .clone()
            .or_else(|| self.config.default_user.clone())
            .filter(|u| !u.trim().is_empty())
            .map(UserId::from)
            .ok_or_else(|| {
                anyhow::anyhow!("No user given. Pass --user or set default_user in the config")
            })
    }

    pub fn backend(&self) -> anyhow::Result<Box<dyn CollectionBackend>> {
        match self.config.backend {
            BackendKind::Local => {
                let db_path = UniCircleConfig::db_path()?;
                let store = SqliteStore::open(&db_path)?;
                Ok(Box::new(LocalCollectionStore::new(store)))
            }
            BackendKind::Http => {
                let api_key =
                    match resolve_api_key(&KeyringStore::new(), std::env::var(ENV_API_KEY).ok()) {
                        Ok(key) => key,
                        Err(e) => {
                            tracing::warn!("could not read API key from keychain: {e}");
                            None
                        }
                    };
                let store = HttpCollectionStore::from_config(&self.config, api_key.as_deref())?;
                tracing::debug!(url = %self.config.collection_api_url, "using collection service");
                Ok(Box::new(store))
            }
        }
    }
}
