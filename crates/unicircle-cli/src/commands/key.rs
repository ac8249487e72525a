use clap::Subcommand;
use unicircle_storage::{KeyValueStore, KeyringStore, API_KEY_ENTRY};

#[derive(Subcommand)]
pub enum KeyAction {
    /// Store the Collection Service API key in the OS keychain
    Set {
        /// API key (will prompt if not provided)
        #[arg(long)]
        key: Option<String>,
    },
    /// Remove the stored API key
    Clear,
}

pub fn run(action: KeyAction) -> anyhow::Result<()> {
    let store = KeyringStore::new();
    match action {
        KeyAction::Set { key } => {
            let key = match key {
                Some(k) => k,
                None => {
                    eprint!("Enter API key for the collection service: ");
                    let mut input = String::new();
                    std::io::stdin().read_line(&mut input)?;
                    input.trim().to_string()
                }
            };

            if key.is_empty() {
                anyhow::bail!("API key cannot be empty");
            }

            store.set(API_KEY_ENTRY, &key)?;
            println!("API key stored in OS keychain as '{API_KEY_ENTRY}'");
            Ok(())
        }
        KeyAction::Clear => {
            store.remove(API_KEY_ENTRY)?;
            println!("API key removed");
            Ok(())
        }
    }
}
