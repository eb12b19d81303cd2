use clap::{Parser, Subcommand};
use std::process::ExitCode;

mod commands;

use commands::{OutputFormat, run_card, run_send, run_skill};

#[derive(Parser, Debug)]
#[command(name = "parley", version)]
#[command(about = "Parley CLI - Discover and call A2A agents")]
struct Cli {
    /// Emit logs and results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch and print an agent's card
    Card {
        /// Base URL of the agent
        url: String,
    },
    /// Send one message to an agent
    Send {
        /// Base URL of the agent
        url: String,
        /// Instruction text
        text: String,
        /// JSON payload sent after the text
        #[arg(long)]
        data: Option<String>,
    },
    /// Register peers and call whichever one advertises a skill
    Skill {
        /// Skill identifier to resolve
        skill: String,
        /// Instruction text
        text: String,
        /// Peer base URL (repeatable)
        #[arg(long = "peer", required = true)]
        peers: Vec<String>,
    },
}

fn init_logging(json: bool) {
    let env_filter = tracing_subscriber::EnvFilter::from_default_env();
    let env_filter = match "info".parse() {
        Ok(directive) => env_filter.add_directive(directive),
        Err(_) => env_filter,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.json);

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    let result = match cli.command {
        Commands::Card { url } => run_card(&url, format).await,
        Commands::Send { url, text, data } => run_send(&url, &text, data.as_deref(), format).await,
        Commands::Skill { skill, text, peers } => run_skill(&skill, &text, &peers, format).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, code = e.code(), "Command failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_send_with_data() {
        let cli = Cli::try_parse_from([
            "parley",
            "send",
            "https://a.example.com",
            "hello",
            "--data",
            r#"{"n":1}"#,
        ])
        .unwrap();

        match cli.command {
            Commands::Send { url, text, data } => {
                assert_eq!(url, "https://a.example.com");
                assert_eq!(text, "hello");
                assert_eq!(data.as_deref(), Some(r#"{"n":1}"#));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_skill_with_repeated_peers() {
        let cli = Cli::try_parse_from([
            "parley",
            "--json",
            "skill",
            "legal",
            "review",
            "--peer",
            "https://a.example.com",
            "--peer",
            "https://b.example.com",
        ])
        .unwrap();

        assert!(cli.json);
        match cli.command {
            Commands::Skill { skill, peers, .. } => {
                assert_eq!(skill, "legal");
                assert_eq!(peers.len(), 2);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_skill_requires_a_peer() {
        assert!(Cli::try_parse_from(["parley", "skill", "legal", "review"]).is_err());
    }
}
