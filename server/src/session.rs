//! The session service: one authoritative game plus the analysis cache,
//! orchestrated behind the five verbs the transport exposes.
//!
//! Concurrency model: the game mutex serializes every read and mutation of
//! the position (one shared game, so coarse locking is enough); the cache
//! carries its own lock. Mutations invalidate the cache before replying, so
//! a later read always recomputes against the new fingerprint.

use std::sync::Arc;

use analysis::{AnalysisCache, AnalysisProvider, AnalysisReport};
use chess::{Game, PieceColor, PieceKind};
use tokio::sync::Mutex;

pub struct SessionService {
    game: Mutex<Game>,
    cache: AnalysisCache,
    provider: Arc<dyn AnalysisProvider>,
}

/// Read-only projection of the game for `/state`. Recomputed per request.
#[derive(Debug, Clone)]
pub struct SessionStatus {
    pub turn: PieceColor,
    pub move_number: u32,
    pub last_move: Option<String>,
    pub game_over: bool,
    pub checkmate: bool,
    pub stalemate: bool,
    pub winner: Option<PieceColor>,
    pub analysis: AnalysisReport,
}

/// One entry of the piece-browse list.
#[derive(Debug, Clone)]
pub struct PieceEntry {
    pub square: String,
    pub piece: PieceKind,
}

/// Soft result of a play or undo attempt. Rejection is a normal outcome
/// reported in-band, not a transport error.
#[derive(Debug, Clone, Copy)]
pub struct PlayOutcome {
    pub ok: bool,
    pub reason: Option<&'static str>,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("invalid square: {0}")]
    InvalidSquare(String),
}

impl SessionService {
    pub fn new(game: Game, provider: Arc<dyn AnalysisProvider>) -> Self {
        Self {
            game: Mutex::new(game),
            cache: AnalysisCache::new(),
            provider,
        }
    }

    /// Current status plus analysis. Provider failure degrades to an empty
    /// report rather than failing the request; the degraded report is not
    /// cached, so a recovered engine is retried on the next poll.
    pub async fn status(&self) -> SessionStatus {
        let game = self.game.lock().await;
        let term = game.termination();
        let fingerprint = game.fingerprint();

        let analysis = match self
            .cache
            .fetch(&fingerprint, game.board(), self.provider.as_ref())
            .await
        {
            Ok(report) => report,
            Err(err) => {
                tracing::warn!(error = %err, "analysis unavailable, serving degraded state");
                AnalysisReport::empty()
            }
        };

        SessionStatus {
            turn: game.turn(),
            move_number: game.move_number(),
            last_move: game.last_move().map(str::to_string),
            game_over: term.game_over,
            checkmate: term.checkmate,
            stalemate: term.stalemate,
            winner: term.winner,
            analysis,
        }
    }

    /// Origin squares with at least one legal move, sorted by square name.
    pub async fn piece_list(&self) -> Vec<PieceEntry> {
        let game = self.game.lock().await;
        game.movable_squares()
            .into_iter()
            .map(|(sq, piece)| PieceEntry {
                square: chess::format_square(sq),
                piece,
            })
            .collect()
    }

    /// Legal destination squares from `from`. An unparseable square is a
    /// request-shape error; a quiet square is an empty list.
    pub async fn move_list(&self, from: &str) -> Result<Vec<String>, SessionError> {
        let square = chess::parse_square(from)
            .ok_or_else(|| SessionError::InvalidSquare(from.to_string()))?;
        let game = self.game.lock().await;
        Ok(game
            .destinations(square)
            .into_iter()
            .map(chess::format_square)
            .collect())
    }

    /// Attempt to apply a UCI move. Oracle rejection (and malformed move
    /// text) is the soft `illegal_move` outcome. Acceptance invalidates the
    /// analysis cache before the reply.
    pub async fn play_move(&self, mv: &str) -> PlayOutcome {
        let mut game = self.game.lock().await;
        match game.play_uci(mv) {
            Ok(()) => {
                self.cache.invalidate().await;
                tracing::info!(mv, fen = %game.fen(), "move played");
                PlayOutcome {
                    ok: true,
                    reason: None,
                }
            }
            Err(err) => {
                tracing::debug!(mv, error = %err, "move rejected");
                PlayOutcome {
                    ok: false,
                    reason: Some("illegal_move"),
                }
            }
        }
    }

    /// Undo one ply. False on empty history; acceptance invalidates the
    /// analysis cache.
    pub async fn undo(&self) -> PlayOutcome {
        let mut game = self.game.lock().await;
        let ok = game.undo();
        if ok {
            self.cache.invalidate().await;
            tracing::info!(fen = %game.fen(), "move undone");
        }
        PlayOutcome { ok, reason: None }
    }
}
