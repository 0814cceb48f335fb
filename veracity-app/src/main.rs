use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use url::Url;
use veracity_actors::format::render_text;
use veracity_common::observability::init_logging;
use veracity_config::{VeracityConfig, VeracityConfigLoader};

mod wiring;

#[derive(Debug, Parser)]
#[command(name = "veracity", version, about = "Fact-check claims and web pages against live search evidence")]
struct Cli {
    /// YAML config file; may be absent when everything comes from VERACITY__* variables.
    #[arg(long, short, global = true, env = "VERACITY_CONFIG", default_value = "veracity.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP API.
    Serve {
        #[arg(long)]
        bind: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Fact-check a single message and print the reply.
    Check { message: String },
    /// Fact-check every statement on a page and print the report as JSON.
    CheckUrl { url: Url },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config: VeracityConfig = VeracityConfigLoader::new()
        .with_optional_file(&cli.config)
        .load()?;
    init_logging(config.logging.to_log_config("veracity"))?;

    match cli.command {
        Command::Serve { bind, port } => {
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            serve(config).await
        }
        Command::Check { message } => {
            let checker = wiring::build_checker(&config).await?;
            let outcome = checker.converse(&message, &[]).await;
            println!("{}", render_text(&outcome.reply));
            Ok(())
        }
        Command::CheckUrl { url } => {
            let checker = wiring::build_checker(&config).await?;
            let report = checker.check_url(&url).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
    }
}

async fn serve(config: VeracityConfig) -> Result<()> {
    let addr = wiring::listen_addr(&config)?;
    let shutdown = CancellationToken::new();
    wiring::cancel_on_ctrl_c(shutdown.clone());

    let checker = wiring::build_checker(&config).await?;
    let state = wiring::app_state(checker, &config, &shutdown);
    veracity_server::bind_and_serve(state, addr, shutdown).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_serve_overrides() {
        let cli = Cli::try_parse_from([
            "veracity", "serve", "--config", "prod.yaml", "--bind", "0.0.0.0", "--port", "8080",
        ])
        .unwrap();
        assert_eq!(cli.config, PathBuf::from("prod.yaml"));
        match cli.command {
            Command::Serve { bind, port } => {
                assert_eq!(bind.as_deref(), Some("0.0.0.0"));
                assert_eq!(port, Some(8080));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn check_url_rejects_garbage() {
        assert!(Cli::try_parse_from(["veracity", "check-url", "not a url"]).is_err());
        let cli =
            Cli::try_parse_from(["veracity", "check-url", "https://news.example/a"]).unwrap();
        assert!(matches!(cli.command, Command::CheckUrl { url } if url.host_str() == Some("news.example")));
    }

    #[test]
    fn check_takes_the_message_verbatim() {
        let cli = Cli::try_parse_from(["veracity", "check", "Does drinking lemon water cure cancer?"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Command::Check { message } if message == "Does drinking lemon water cure cancer?"
        ));
    }
}
