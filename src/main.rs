use anyhow::{Context, Result};
use clap::Parser;
use livesurf::{ApiResponse, ClientConfig, LiveSurfClient, Method};
use log::info;
use serde_json::Value;
use std::time::Duration;

/// livesurf - LiveSurf API client
///
/// Sends rate-limited, retrying requests to the LiveSurf API and prints the
/// response. JSON responses are pretty-printed; anything else is printed as-is.
///
/// Examples:
///   livesurf user
///   livesurf get group/all/
///   livesurf patch group/12/ --data '{"name": "renamed"}'
///   livesurf stats page=12 date_from=2024-01-01
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// API key sent in the Authorization header (also via LIVESURF_API_KEY)
    #[arg(
        long = "api-key",
        env = "LIVESURF_API_KEY",
        hide_env_values = true,
        global = true
    )]
    api_key: Option<String>,

    /// API base URL
    #[arg(
        long = "base-url",
        env = "LIVESURF_BASE_URL",
        value_name = "URL",
        default_value = livesurf::config::DEFAULT_BASE_URL,
        global = true
    )]
    base_url: String,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS", default_value_t = livesurf::config::DEFAULT_TIMEOUT_SECS, global = true)]
    timeout: u64,

    /// Maximum requests per second
    #[arg(long = "rate-limit", value_name = "N", default_value_t = livesurf::config::DEFAULT_RATE_LIMIT_PER_SEC, global = true)]
    rate_limit: u32,

    /// Retries after the first attempt for 429/5xx and network errors
    #[arg(long = "max-retries", value_name = "N", default_value_t = livesurf::http::MAX_RETRIES, global = true)]
    max_retries: u32,

    /// Delay before the first retry, doubled on each further retry
    #[arg(long = "initial-backoff-ms", value_name = "MS", default_value_t = livesurf::http::INITIAL_BACKOFF_MS, global = true)]
    initial_backoff_ms: u64,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// GET an endpoint
    Get(PathArgs),

    /// POST to an endpoint
    Post(BodyArgs),

    /// PATCH an endpoint
    Patch(PatchArgs),

    /// DELETE an endpoint
    Delete(PathArgs),

    /// Show the current user
    User,

    /// List categories
    Categories,

    /// List all groups
    Groups,

    /// Show compiled page statistics
    Stats(StatsArgs),
}

#[derive(clap::Args, Debug)]
struct PathArgs {
    /// Endpoint path relative to the base URL, e.g. "group/all/"
    #[arg(value_name = "PATH")]
    path: String,
}

#[derive(clap::Args, Debug)]
struct BodyArgs {
    /// Endpoint path relative to the base URL
    #[arg(value_name = "PATH")]
    path: String,

    /// JSON request body
    #[arg(long, short = 'd', value_name = "JSON")]
    data: Option<String>,
}

#[derive(clap::Args, Debug)]
struct PatchArgs {
    /// Endpoint path relative to the base URL
    #[arg(value_name = "PATH")]
    path: String,

    /// JSON request body
    #[arg(long, short = 'd', value_name = "JSON")]
    data: String,
}

#[derive(clap::Args, Debug)]
struct StatsArgs {
    /// Query parameters as KEY=VALUE
    #[arg(value_name = "KEY=VALUE", value_parser = parse_key_value)]
    params: Vec<(String, String)>,
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got {:?}", s))?;
    if key.is_empty() {
        return Err(format!("empty key in {:?}", s));
    }
    Ok((key.to_string(), value.to_string()))
}

fn parse_body(data: Option<&str>) -> Result<Option<Value>> {
    data.map(|raw| serde_json::from_str(raw).context("--data is not valid JSON"))
        .transpose()
}

impl Cli {
    fn client_config(&self) -> Result<ClientConfig> {
        let api_key = self
            .api_key
            .clone()
            .context("API key required: pass --api-key or set LIVESURF_API_KEY")?;
        Ok(ClientConfig::new(api_key)
            .with_base_url(self.base_url.clone())
            .with_timeout(Duration::from_secs(self.timeout))
            .with_rate_limit(self.rate_limit)
            .with_max_retries(self.max_retries)
            .with_initial_backoff(Duration::from_millis(self.initial_backoff_ms)))
    }
}

fn render(response: &ApiResponse) -> Result<String> {
    match response {
        ApiResponse::Json(value) => {
            serde_json::to_string_pretty(value).context("Failed to format JSON response")
        }
        ApiResponse::Text(text) => Ok(text.clone()),
    }
}

async fn run(cli: Cli) -> Result<()> {
    let client = LiveSurfClient::new(cli.client_config()?).context("Failed to build client")?;

    let response = match &cli.command {
        Commands::Get(args) => client.request(Method::Get, &args.path, None).await,
        Commands::Delete(args) => client.request(Method::Delete, &args.path, None).await,
        Commands::Post(args) => {
            let body = parse_body(args.data.as_deref())?;
            client.request(Method::Post, &args.path, body).await
        }
        Commands::Patch(args) => {
            let body = parse_body(Some(&args.data))?;
            client.request(Method::Patch, &args.path, body).await
        }
        Commands::User => client.user().await,
        Commands::Categories => client.categories().await,
        Commands::Groups => client.groups().await,
        Commands::Stats(args) => client.stats(&args.params).await,
    };

    let response = response.inspect_err(|e| info!("Request failed: {}", e))?;
    println!("{}", render(&response)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    run(cli).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_get_parsing() {
        let cli = Cli::try_parse_from(["livesurf", "--api-key", "k", "get", "group/all/"]).unwrap();
        match cli.command {
            Commands::Get(args) => assert_eq!(args.path, "group/all/"),
            _ => panic!("Expected Get command"),
        }
        assert_eq!(cli.api_key.as_deref(), Some("k"));
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["livesurf", "user"]).unwrap();
        assert_eq!(cli.timeout, 15);
        assert_eq!(cli.rate_limit, 10);
        assert_eq!(cli.max_retries, 3);
        assert_eq!(cli.initial_backoff_ms, 500);
    }

    #[test]
    fn test_cli_global_options_after_subcommand() {
        let cli = Cli::try_parse_from([
            "livesurf",
            "post",
            "group/create/",
            "--data",
            r#"{"name":"g"}"#,
            "--rate-limit",
            "2",
        ])
        .unwrap();
        assert_eq!(cli.rate_limit, 2);
        match cli.command {
            Commands::Post(args) => {
                assert_eq!(args.path, "group/create/");
                assert_eq!(args.data.as_deref(), Some(r#"{"name":"g"}"#));
            }
            _ => panic!("Expected Post command"),
        }
    }

    #[test]
    fn test_cli_patch_requires_data() {
        assert!(Cli::try_parse_from(["livesurf", "patch", "group/1/"]).is_err());

        let cli = Cli::try_parse_from(["livesurf", "patch", "group/1/", "-d", r#"{"name":"x"}"#])
            .unwrap();
        match cli.command {
            Commands::Patch(args) => {
                assert_eq!(args.path, "group/1/");
                assert_eq!(args.data, r#"{"name":"x"}"#);
            }
            _ => panic!("Expected Patch command"),
        }
    }

    #[test]
    fn test_cli_stats_params() {
        let cli = Cli::try_parse_from(["livesurf", "stats", "page=1", "date=2024-01-01"]).unwrap();
        match cli.command {
            Commands::Stats(args) => assert_eq!(
                args.params,
                vec![
                    ("page".to_string(), "1".to_string()),
                    ("date".to_string(), "2024-01-01".to_string())
                ]
            ),
            _ => panic!("Expected Stats command"),
        }
    }

    #[test]
    fn test_cli_stats_rejects_bad_param() {
        assert!(Cli::try_parse_from(["livesurf", "stats", "novalue"]).is_err());
        assert!(Cli::try_parse_from(["livesurf", "stats", "=x"]).is_err());
    }

    #[test]
    fn test_cli_no_subcommand_fails() {
        assert!(Cli::try_parse_from(["livesurf"]).is_err());
    }

    #[test]
    fn test_parse_body() {
        assert_eq!(parse_body(None).unwrap(), None);
        assert_eq!(
            parse_body(Some(r#"{"a":1}"#)).unwrap(),
            Some(serde_json::json!({"a": 1}))
        );
        assert!(parse_body(Some("{oops")).is_err());
    }

    #[test]
    fn test_render() {
        assert_eq!(
            render(&ApiResponse::Text("plain".to_string())).unwrap(),
            "plain"
        );
        assert_eq!(
            render(&ApiResponse::Json(serde_json::json!({"a": 1}))).unwrap(),
            "{\n  \"a\": 1\n}"
        );
    }
}
