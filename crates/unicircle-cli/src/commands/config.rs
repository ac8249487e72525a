use clap::Subcommand;
use unicircle_core::config::UniCircleConfig;
use unicircle_db::SqliteStore;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Create ~/.unicircle/ with a default config.toml and an empty local database
    Init,
    /// Print the effective configuration, environment overrides included
    Show,
    /// Change one setting in config.toml
    Set {
        /// backend, collection_api_url, request_timeout_secs or default_user
        key: String,
        value: String,
    },
}

pub fn run(action: ConfigAction) -> anyhow::Result<()> {
    match action {
        ConfigAction::Init => {
            let home = UniCircleConfig::init()?;
            let db_path = UniCircleConfig::db_path()?;
            SqliteStore::open(&db_path)?;

            println!("UniCircle home: {}", home.display());
            println!("  config:   {}", UniCircleConfig::config_path()?.display());
            println!("  database: {}", db_path.display());
        }
        ConfigAction::Show => {
            let config = UniCircleConfig::load()?;
            print!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Set { key, value } => {
            let path = UniCircleConfig::config_path()?;
            // Edit the file itself; `load` would bake environment overrides in.
            let mut config = if path.exists() {
                UniCircleConfig::load_from(&path)?
            } else {
                UniCircleConfig::default()
            };
            config.set_field(&key, &value)?;
            config.save_to(&path)?;
            tracing::info!(%key, "updated config");
            println!("Set {key} in {}", path.display());
        }
    }
    Ok(())
}
