pub mod collection;
pub mod config;
pub mod item;
pub mod key;

use clap::Subcommand;

use crate::context::Context;

#[derive(Subcommand)]
pub enum Command {
    /// Initialize and inspect UniCircle configuration
    Config {
        #[command(subcommand)]
        action: config::ConfigAction,
    },
    /// Manage the Collection Service API key
    Key {
        #[command(subcommand)]
        action: key::KeyAction,
    },
    /// Create, browse and share collections
    Collection {
        #[command(subcommand)]
        action: collection::CollectionAction,
    },
    /// Manage the items inside a collection
    Item {
        #[command(subcommand)]
        action: item::ItemAction,
    },
}

pub async fn run(cmd: Command, user: Option<String>) -> anyhow::Result<()> {
    match cmd {
        Command::Config { action } => config::run(action),
        Command::Key { action } => key::run(action),
        Command::Collection { action } => collection::run(action, &Context::load(user)?).await,
        Command::Item { action } => item::run(action, &Context::load(user)?).await,
    }
}
