use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

const DEFAULT_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_DATA_DIR: &str = "data";

#[derive(Parser, Debug, Default)]
#[command(name = "workspace-hub")]
#[command(about = "Per-project workspace trees over HTTP")]
pub struct Cli {
    /// Listen address (overrides WORKSPACE_HUB_ADDR)
    #[arg(short, long)]
    pub addr: Option<String>,

    /// Directory holding project and workspace documents (overrides WORKSPACE_HUB_DATA_DIR)
    #[arg(short, long)]
    pub data_dir: Option<PathBuf>,

    /// Keep projects and workspaces in memory only
    #[arg(long)]
    pub in_memory: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub addr: SocketAddr,
    pub data_dir: PathBuf,
    pub in_memory: bool,
}

impl Config {
    /// Defaults from the process environment, overridden by CLI flags.
    pub fn load(cli: Cli) -> Result<Self> {
        Self::resolve(cli, |key| std::env::var(key).ok())
    }

    pub fn resolve(cli: Cli, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let addr = cli
            .addr
            .or_else(|| env("WORKSPACE_HUB_ADDR"))
            .unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let data_dir = cli
            .data_dir
            .or_else(|| env("WORKSPACE_HUB_DATA_DIR").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
        Ok(Self {
            addr: addr
                .parse()
                .with_context(|| format!("invalid listen address '{}'", addr))?,
            data_dir,
            in_memory: cli.in_memory,
        })
    }

    pub fn workspaces_dir(&self) -> PathBuf {
        self.data_dir.join("workspaces")
    }
}
