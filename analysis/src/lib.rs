//! Position analysis: provider trait, the deterministic stub, the
//! Stockfish-backed provider, and the single-slot result cache.

pub mod cache;
pub mod stockfish;
pub mod uci;

pub use cache::AnalysisCache;
pub use stockfish::StockfishProvider;

use async_trait::async_trait;
use cozy_chess::Board;
use serde::{Deserialize, Serialize};

/// One suggested line: the first move of a principal variation and its
/// evaluation from White's perspective. Mate scores are capped at ±100.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisLine {
    #[serde(rename = "move")]
    pub mv: String,
    pub eval: f64,
}

/// Ranked best-line suggestions for a position, at most three lines, in
/// engine preference order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub depth: u32,
    pub lines: Vec<AnalysisLine>,
}

impl AnalysisReport {
    /// Degraded response when no provider output is available.
    pub fn empty() -> Self {
        Self {
            depth: 0,
            lines: Vec::new(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("engine unavailable: {0}")]
    EngineUnavailable(String),
}

/// A source of best-line suggestions. Implementations are selected at
/// construction time and held behind `Arc<dyn AnalysisProvider>`.
#[async_trait]
pub trait AnalysisProvider: Send + Sync {
    async fn analyse(&self, board: &Board) -> Result<AnalysisReport, AnalysisError>;

    /// Release any external resources. Safe to call when nothing was started.
    async fn shutdown(&self) {}
}

/// Deterministic stub provider: fixed three-line output at depth 1. Used in
/// tests and as the no-engine deployment fallback.
#[derive(Debug, Default)]
pub struct StubProvider;

#[async_trait]
impl AnalysisProvider for StubProvider {
    async fn analyse(&self, _board: &Board) -> Result<AnalysisReport, AnalysisError> {
        Ok(AnalysisReport {
            depth: 1,
            lines: vec![
                AnalysisLine {
                    mv: "e2e4".to_string(),
                    eval: 0.20,
                },
                AnalysisLine {
                    mv: "d2d4".to_string(),
                    eval: 0.15,
                },
                AnalysisLine {
                    mv: "g1f3".to_string(),
                    eval: 0.10,
                },
            ],
        })
    }
}
