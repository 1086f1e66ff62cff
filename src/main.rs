// Copyright 2026 BadCompany
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Main entry point for the mcp-warden firewall proxy.

use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::info;

use mcp_warden::config::{Config, LogLevel};
use mcp_warden::engine_core::constants::proxy;
use mcp_warden::mcp::proxy::ProxyServer;

/// Deterministic security proxy for MCP tool calls.
///
/// Usage: mcp-warden [options] -- <command> [args...]
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Log level override (debug|info|warn|error)
    #[arg(long)]
    log_level: Option<String>,

    /// Server name used by outbound `server` globs and audit records;
    /// defaults to the wrapped command's file stem
    #[arg(long)]
    server_name: Option<String>,

    /// MCP server command and arguments (after --)
    #[arg(last = true, required = true)]
    command: Vec<String>,
}

#[tokio::main]
async fn main() {
    let code = run().await.unwrap_or_else(|e| {
        eprintln!("{} Error: {}", proxy::LOG_PREFIX, e);
        1
    });
    std::process::exit(code);
}

async fn run() -> anyhow::Result<i32> {
    let cli = Cli::parse();

    install_panic_hook();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(ref level) = cli.log_level {
        config.settings.log_level = LogLevel::parse_safe(level);
    }

    init_tracing(&config);

    let (command, args) = cli
        .command
        .split_first()
        .ok_or_else(|| anyhow::anyhow!("no command provided after --"))?;

    let server_name = cli.server_name.clone().or_else(|| {
        Path::new(command)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
    });

    // Configuration validation and engine construction are fatal on error,
    // before any traffic is touched.
    let mut proxy = ProxyServer::new(&config, server_name)?;

    info!("wrapping '{}' {:?}", command, args);
    let code = proxy.run(command, args).await?;
    Ok(code)
}

fn install_panic_hook() {
    std::panic::set_hook(Box::new(|panic_info| {
        let location = panic_info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
            .unwrap_or_else(|| "unknown".to_string());

        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("PANIC: {} at {}", message, location);
    }));
}

fn init_tracing(config: &Config) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    // Diagnostics go to stderr only; stdout carries the protocol stream.
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.settings.log_level.as_str()))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr);

    let json_format = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json_format {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}
