// Copyright 2025 Toolbridge Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use toolbridge::config::ServerConfig;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// HTTP listen address (overrides config file)
    #[arg(long, env = "TOOLBRIDGE_HTTP_ADDR")]
    http_addr: Option<String>,

    /// Enable authentication
    #[arg(long, env = "TOOLBRIDGE_AUTH_ENABLED")]
    auth_enabled: bool,

    /// Serve MCP over stdio instead of HTTP
    #[arg(long)]
    stdio: bool,

    /// Validate the configuration and report credential status, then exit
    #[arg(long)]
    check_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    toolbridge::init_tracing(args.stdio);

    let mut config = ServerConfig::load(args.config)?;

    if let Some(addr) = args.http_addr {
        config.server.listen_addr = addr;
    }
    if args.auth_enabled {
        config.auth.enabled = true;
    }

    if args.check_config {
        config.validate()?;
        println!("configuration ok");
        println!("listen address: {}", config.server.listen_addr);
        println!(
            "redis: {}",
            config.cache.redis_url.as_deref().unwrap_or("not configured")
        );
        println!("jina key: {}", present(config.credentials.jina_api_key.is_some()));
        println!("gemini key: {}", present(config.credentials.gemini_api_key.is_some()));
        println!("deepl key: {}", present(config.credentials.deepl_api_key.is_some()));
        return Ok(());
    }

    if args.stdio {
        toolbridge::run_stdio(config).await
    } else {
        toolbridge::run_server(config).await
    }
}

fn present(configured: bool) -> &'static str {
    if configured {
        "configured"
    } else {
        "missing"
    }
}
