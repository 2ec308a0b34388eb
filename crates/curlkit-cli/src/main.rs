//! Curlkit CLI - Command line interface for curl parsing and HTTP execution
//!
//! Usage:
//!   curlkit -c 'curl https://example.com'   # Execute a curl command
//!   curlkit parse 'curl -X POST ...'         # Print the parsed request
//!   curlkit serve --port 3000                # Run the HTTP façade
//!   curlkit mcp                              # Run as MCP server
//!
//! Logs go to stderr; `RUST_LOG` overrides the default level.

mod mcp;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Curlkit - curl commands and HTTP requests as agent tools
#[derive(Parser, Debug)]
#[command(name = "curlkit")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Execute the given curl command and print the response as JSON
    #[arg(short = 'c')]
    command: Option<String>,

    #[command(subcommand)]
    subcommand: Option<SubCmd>,
}

#[derive(Subcommand, Debug)]
enum SubCmd {
    /// Run as MCP (Model Context Protocol) server
    Mcp,
    /// Serve the HTTP façade
    Serve {
        /// Address to bind
        #[arg(long, env = "CURLKIT_HOST", default_value = "127.0.0.1")]
        host: String,
        /// Port to listen on
        #[arg(long, env = "PORT", default_value_t = 3000)]
        port: u16,
    },
    /// Parse a curl command and print the request descriptor
    Parse {
        /// The curl command, quoted as one argument
        command: String,
    },
}

fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn executor() -> Result<Arc<curlkit::HttpExecutor>> {
    let executor = curlkit::HttpExecutor::new().context("Failed to create HTTP executor")?;
    Ok(Arc::new(executor))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Handle subcommands first
    match args.subcommand {
        Some(SubCmd::Mcp) => {
            init_tracing("info");
            return mcp::run(executor()?).await;
        }
        Some(SubCmd::Serve { host, port }) => {
            init_tracing("info");
            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .with_context(|| format!("Failed to bind {addr}"))?;
            return curlkit::api::serve(listener, executor()?)
                .await
                .context("HTTP server failed");
        }
        Some(SubCmd::Parse { command }) => {
            init_tracing("warn");
            let descriptor =
                curlkit::parse_curl_command(&command).context("Failed to parse command")?;
            println!("{}", serde_json::to_string_pretty(&descriptor)?);
            return Ok(());
        }
        None => {}
    }

    // Execute command string if provided
    if let Some(cmd) = args.command {
        init_tracing("warn");
        let descriptor = curlkit::parse_curl_command(&cmd).context("Failed to parse command")?;
        let response = executor()?.execute(&descriptor).await;
        println!("{}", serde_json::to_string_pretty(&response)?);
        std::process::exit(if response.success { 0 } else { 1 });
    }

    eprintln!("Usage: curlkit -c 'curl <url>' or curlkit parse|serve|mcp");
    std::process::exit(1);
}
