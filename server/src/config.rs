//! Server configuration.
//!
//! Everything is a CLI flag; the engine path additionally falls back to the
//! CHESSPAD_ENGINE environment variable so deployments can point at a
//! non-standard Stockfish build without editing the service file.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use analysis::{AnalysisProvider, StockfishProvider, StubProvider};
use clap::{Parser, ValueEnum};

#[derive(Debug, Parser)]
#[command(name = "chesspad-server", about = "Game server for the chesspad keypad controller")]
pub struct Config {
    /// Address to bind the HTTP listener to.
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, default_value_t = 8000)]
    pub port: u16,

    /// Analysis backend. The stub serves fixed suggestions and needs no
    /// external binary.
    #[arg(long, value_enum, default_value_t = ProviderKind::Stockfish)]
    pub provider: ProviderKind,

    /// Path to the UCI engine binary.
    #[arg(long, env = "CHESSPAD_ENGINE", default_value = "stockfish")]
    pub engine_path: PathBuf,

    /// Wall-clock budget per analysis search, in milliseconds.
    #[arg(long, default_value_t = 200)]
    pub movetime_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProviderKind {
    Stub,
    Stockfish,
}

impl Config {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn build_provider(&self) -> Arc<dyn AnalysisProvider> {
        match self.provider {
            ProviderKind::Stub => Arc::new(StubProvider),
            ProviderKind::Stockfish => Arc::new(StockfishProvider::new(
                self.engine_path.clone(),
                Duration::from_millis(self.movetime_ms),
            )),
        }
    }
}
