//! Zentinel Morph CLI entry point.
//!
//! Runs a JSON body through the interceptors built from a configuration file.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde_json::Value as JsonValue;
use std::io::Read;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use zentinel_morph::{apply, InterceptorChain, MorphConfig, RequestConfig, Response};

#[derive(Parser, Debug)]
#[command(name = "zentinel-morph")]
#[command(
    author,
    version,
    about = "Reshape request and response bodies with declarative mappings"
)]
struct Args {
    /// Configuration file path (YAML or JSON)
    #[arg(short, long, env = "MORPH_CONFIG")]
    config: Option<PathBuf>,

    /// Request URL the body belongs to
    #[arg(long, default_value = "/")]
    url: String,

    /// Request method
    #[arg(long, default_value = "GET")]
    method: String,

    /// Which interceptor chain to run
    #[arg(long, value_enum, default_value_t = Phase::Response)]
    phase: Phase,

    /// JSON body file. Reads stdin if not specified.
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Print example configuration and exit.
    #[arg(long)]
    example_config: bool,

    /// Validate configuration and exit.
    #[arg(long)]
    validate: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Phase {
    Request,
    Response,
}

fn print_example_config() {
    let example = r#"# Zentinel Morph Configuration Example
version: "1"

# When set, configurations below use URLs relative to it and are combined.
# Combined configurations only keep response entries.
# base_url: "https://swapi.co/api"

configurations:
  - url: "https://swapi.co/api"
    interceptors:
      responses:
        # Path template, resolved against the configuration url
        - matcher: "/people/:id"
          schema:
            name: name
            height: height
            homeworld: homeworld

        # Only reshape the "results" field of a list page
        - matcher: "/people"
          data_selector: results
          schema:
            name: name
            url: url

        # Regex over the full request URL
        - matcher:
            pattern: "starships/?$"
            type: regex
          data_selector: results
          schema:
            name: name
            crew: crew

      requests:
        - matcher: "/people"
          schema:
            name: full_name
            profile:
              height: stats.height
"#;
    println!("{}", example);
}

fn read_body(input: Option<&PathBuf>) -> Result<JsonValue> {
    let content = match input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read input file: {}", path.display()))?,
        None => {
            let mut content = String::new();
            std::io::stdin()
                .read_to_string(&mut content)
                .context("Failed to read stdin")?;
            content
        }
    };

    serde_json::from_str(&content).context("Input is not valid JSON")
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    if args.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    if args.example_config {
        print_example_config();
        return Ok(());
    }

    let config = match &args.config {
        Some(path) => MorphConfig::from_file(path)
            .with_context(|| format!("Failed to load config file: {}", path.display()))?,
        None => MorphConfig::default(),
    };

    let configurations = config.build().context("Invalid configuration")?;

    if args.validate {
        info!(
            configurations = configurations.len(),
            "Configuration is valid"
        );
        return Ok(());
    }

    let chain = InterceptorChain::new();
    let subscription = apply(&chain, &configurations);

    let body = read_body(args.input.as_ref())?;
    let request = RequestConfig::new(&args.method, &args.url);

    info!(
        config = ?args.config,
        url = %args.url,
        phase = ?args.phase,
        interceptors = subscription.len(),
        "Running interceptors"
    );

    let result = match args.phase {
        Phase::Request => chain.run_request(request.with_data(body)).map(|r| r.data),
        Phase::Response => chain
            .run_response(Response::new(request, 200, body))
            .map(|r| r.data),
    };

    let data = match result {
        Ok(data) => data,
        Err(e) => {
            warn!(error = %e, url = %args.url, "Transform failed");
            return Err(e).context("Failed to transform body");
        }
    };

    println!("{}", serde_json::to_string_pretty(&data)?);

    subscription.unsubscribe();
    Ok(())
}
