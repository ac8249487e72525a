mod commands;
mod context;
mod render;

use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "unicircle", version, about = "Manage UniCircle study collections")]
struct Cli {
    /// User id to act as (defaults to `default_user` in the config)
    #[arg(long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: commands::Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    commands::run(cli.command, cli.user).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_user_flag_after_subcommand() {
        let cli = Cli::try_parse_from([
            "unicircle",
            "collection",
            "create",
            "Midterm",
            "--tag",
            "Java",
            "--user",
            "u1",
        ])
        .unwrap();
        assert_eq!(cli.user.as_deref(), Some("u1"));
    }

    #[test]
    fn test_item_add_parses_kind() {
        let cli = Cli::try_parse_from([
            "unicircle", "item", "add", "c1", "--type", "external", "--url", "https://x.test",
        ]);
        assert!(cli.is_ok());

        let bad = Cli::try_parse_from(["unicircle", "item", "add", "c1", "--type", "video"]);
        assert!(bad.is_err());
    }
}
