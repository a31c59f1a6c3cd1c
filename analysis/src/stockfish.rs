//! Stockfish-backed analysis provider.
//!
//! Owns a long-lived UCI subprocess, spawned lazily on the first analyse call
//! and kept around between requests. Every search is time-bounded: the engine
//! gets a fixed movetime budget and the whole exchange is wrapped in
//! budget-plus-grace timeout. A hung or crashed process is killed and the
//! slot reset, so the next call starts fresh.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use cozy_chess::{Board, Color};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout};
use tokio::sync::Mutex;
use tokio::time::timeout;

use crate::uci::{assemble_report, parse_line, InfoLine, UciMessage};
use crate::{AnalysisError, AnalysisProvider, AnalysisReport};

/// Principal variations requested per search.
const MULTI_PV: usize = 3;

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);
const SEARCH_GRACE: Duration = Duration::from_secs(2);
const QUIT_TIMEOUT: Duration = Duration::from_secs(1);

impl From<std::io::Error> for AnalysisError {
    fn from(err: std::io::Error) -> Self {
        Self::EngineUnavailable(err.to_string())
    }
}

pub struct StockfishProvider {
    path: PathBuf,
    movetime: Duration,
    engine: Mutex<Option<EngineProcess>>,
}

impl StockfishProvider {
    pub fn new(path: impl Into<PathBuf>, movetime: Duration) -> Self {
        Self {
            path: path.into(),
            movetime,
            engine: Mutex::new(None),
        }
    }
}

#[async_trait]
impl AnalysisProvider for StockfishProvider {
    async fn analyse(&self, board: &Board) -> Result<AnalysisReport, AnalysisError> {
        let fen = board.to_string();
        let white_to_move = board.side_to_move() == Color::White;

        let mut guard = self.engine.lock().await;
        if guard.is_none() {
            tracing::info!(path = %self.path.display(), "spawning analysis engine");
            *guard = Some(EngineProcess::spawn(&self.path).await?);
        }
        let Some(engine) = guard.as_mut() else {
            return Err(AnalysisError::EngineUnavailable(
                "engine not running".to_string(),
            ));
        };

        let budget = self.movetime + SEARCH_GRACE;
        match timeout(budget, engine.search(&fen, self.movetime, white_to_move)).await {
            Ok(Ok(report)) => Ok(report),
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "engine I/O failed, dropping process");
                if let Some(engine) = guard.take() {
                    engine.kill().await;
                }
                Err(AnalysisError::EngineUnavailable(err.to_string()))
            }
            Err(_) => {
                tracing::warn!(
                    budget_ms = budget.as_millis() as u64,
                    "engine exceeded search budget, dropping process"
                );
                if let Some(engine) = guard.take() {
                    engine.kill().await;
                }
                Err(AnalysisError::EngineUnavailable(
                    "search timed out".to_string(),
                ))
            }
        }
    }

    async fn shutdown(&self) {
        if let Some(engine) = self.engine.lock().await.take() {
            tracing::info!("shutting down analysis engine");
            engine.quit().await;
        }
    }
}

struct EngineProcess {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl EngineProcess {
    async fn spawn(path: &Path) -> Result<Self, AnalysisError> {
        let mut child = tokio::process::Command::new(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;

        let stdin = child.stdin.take().ok_or_else(|| {
            AnalysisError::EngineUnavailable("failed to open engine stdin".to_string())
        })?;
        let stdout = child.stdout.take().ok_or_else(|| {
            AnalysisError::EngineUnavailable("failed to open engine stdout".to_string())
        })?;

        let mut engine = Self {
            child,
            stdin,
            stdout: BufReader::new(stdout),
        };

        engine.send("uci").await?;
        engine.wait_for(&UciMessage::UciOk).await?;

        engine
            .send(&format!("setoption name MultiPV value {MULTI_PV}"))
            .await?;
        engine.send("isready").await?;
        engine.wait_for(&UciMessage::ReadyOk).await?;

        tracing::debug!("engine handshake complete");
        Ok(engine)
    }

    async fn send(&mut self, line: &str) -> std::io::Result<()> {
        tracing::trace!("UCI >> {line}");
        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.write_all(b"\n").await?;
        self.stdin.flush().await
    }

    async fn read_message(&mut self) -> std::io::Result<UciMessage> {
        let mut line = String::new();
        let n = self.stdout.read_line(&mut line).await?;
        if n == 0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "engine closed its stdout",
            ));
        }
        tracing::trace!("UCI << {}", line.trim_end());
        Ok(parse_line(&line))
    }

    async fn wait_for(&mut self, expected: &UciMessage) -> Result<(), AnalysisError> {
        let waited = timeout(HANDSHAKE_TIMEOUT, async {
            loop {
                if self.read_message().await? == *expected {
                    return Ok::<_, std::io::Error>(());
                }
            }
        })
        .await;
        match waited {
            Ok(result) => Ok(result?),
            Err(_) => Err(AnalysisError::EngineUnavailable(
                "timed out waiting for engine handshake".to_string(),
            )),
        }
    }

    /// Run one time-bounded search and fold the info stream into a report.
    async fn search(
        &mut self,
        fen: &str,
        movetime: Duration,
        white_to_move: bool,
    ) -> std::io::Result<AnalysisReport> {
        self.send(&format!("position fen {fen}")).await?;
        self.send(&format!("go movetime {}", movetime.as_millis()))
            .await?;

        let mut infos: BTreeMap<u32, InfoLine> = BTreeMap::new();
        loop {
            match self.read_message().await? {
                UciMessage::Info(info) if info.pv_first.is_some() => {
                    // Later lines for the same index are deeper; keep the latest.
                    infos.insert(info.multipv.unwrap_or(1), info);
                }
                UciMessage::BestMove(_) => break,
                _ => {}
            }
        }

        Ok(assemble_report(&infos, white_to_move, MULTI_PV))
    }

    async fn quit(mut self) {
        let _ = self.send("quit").await;
        let _ = timeout(QUIT_TIMEOUT, self.child.wait()).await;
        let _ = self.child.kill().await;
    }

    async fn kill(mut self) {
        let _ = self.child.kill().await;
    }
}
