//! The authoritative game session: one position, its move history, and the
//! derived projections the browse protocol is built from.

use cozy_chess::{Board, Move, Piece, Rank, Square};

use crate::types::{PieceColor, PieceKind};
use crate::{fen, uci};

/// Owns the single authoritative position. All mutation goes through
/// [`Game::play_uci`] and [`Game::undo`]; everything else is a pure read.
#[derive(Debug, Clone)]
pub struct Game {
    position: Board,
    history: Vec<HistoryEntry>,
}

/// One applied ply: the move in standard UCI text plus the exact position it
/// was played from, so undo is a bit-for-bit restore rather than a replay.
#[derive(Debug, Clone)]
struct HistoryEntry {
    uci: String,
    prior: Board,
}

/// Derived game-end flags. Never stored; recomputed from the position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Termination {
    pub game_over: bool,
    pub checkmate: bool,
    pub stalemate: bool,
    pub winner: Option<PieceColor>,
}

impl Game {
    /// Standard initial position, empty history.
    pub fn new() -> Self {
        Self {
            position: Board::default(),
            history: Vec::new(),
        }
    }

    pub fn from_fen(fen_text: &str) -> Result<Self, GameError> {
        Ok(Self {
            position: fen::parse_fen(fen_text)?,
            history: Vec::new(),
        })
    }

    pub fn board(&self) -> &Board {
        &self.position
    }

    pub fn fen(&self) -> String {
        fen::format_fen(&self.position)
    }

    /// Cache key for the current position.
    pub fn fingerprint(&self) -> String {
        fen::fingerprint(&self.position)
    }

    pub fn turn(&self) -> PieceColor {
        self.position.side_to_move().into()
    }

    /// FEN fullmove number: still 1 after White's first move.
    pub fn move_number(&self) -> u32 {
        u32::from(self.position.fullmove_number())
    }

    /// Number of applied plies still on the history stack.
    pub fn ply_count(&self) -> usize {
        self.history.len()
    }

    /// UCI text of the most recent applied move, if any.
    pub fn last_move(&self) -> Option<&str> {
        self.history.last().map(|entry| entry.uci.as_str())
    }

    /// All legal moves in the oracle's own encoding (castling as
    /// king-takes-rook).
    fn legal_moves_raw(&self) -> Vec<Move> {
        let mut moves = Vec::new();
        self.position.generate_moves(|mvs| {
            moves.extend(mvs);
            false
        });
        moves
    }

    /// Origin squares with at least one legal move, each paired with the
    /// occupying piece kind. Deduplicated, sorted ascending by square name.
    pub fn movable_squares(&self) -> Vec<(Square, PieceKind)> {
        let mut squares: Vec<(Square, PieceKind)> = Vec::new();
        self.position.generate_moves(|mvs| {
            squares.push((mvs.from, mvs.piece.into()));
            false
        });
        squares.sort_by_key(|(sq, _)| (sq.file() as usize, sq.rank() as usize));
        squares.dedup_by_key(|(sq, _)| *sq);
        squares
    }

    /// Legal destination squares from `from`, in standard UCI terms (castling
    /// shows the king's two-square destination). Empty when the square has no
    /// moves; square validity itself is the caller's concern.
    pub fn destinations(&self, from: Square) -> Vec<Square> {
        let mut targets: Vec<Square> = self
            .legal_moves_raw()
            .into_iter()
            .filter(|mv| mv.from == from)
            .map(|mv| uci::normalize_oracle_move(&self.position, mv).to)
            .collect();
        targets.sort_by_key(|sq| (sq.file() as usize, sq.rank() as usize));
        targets.dedup();
        targets
    }

    /// Apply a move given as UCI text.
    ///
    /// A promotion-eligible pawn push without a suffix is auto-queened; an
    /// explicit suffix is honored as given. Rejection leaves the position and
    /// history untouched.
    pub fn play_uci(&mut self, text: &str) -> Result<(), GameError> {
        let mut mv = uci::parse_uci_move(text)
            .ok_or_else(|| GameError::MalformedMove(text.to_string()))?;

        if mv.promotion.is_none()
            && self.position.piece_on(mv.from) == Some(Piece::Pawn)
            && matches!(mv.to.rank(), Rank::First | Rank::Eighth)
        {
            mv.promotion = Some(Piece::Queen);
        }

        let legal = self.legal_moves_raw();
        let oracle_mv = uci::resolve_castling_for_oracle(&self.position, mv, &legal);
        if !legal.contains(&oracle_mv) {
            return Err(GameError::IllegalMove);
        }

        let prior = self.position.clone();
        self.position.play_unchecked(oracle_mv);
        self.history.push(HistoryEntry {
            uci: uci::format_uci_move(mv),
            prior,
        });
        Ok(())
    }

    /// Pop one ply and restore the prior position exactly. Returns false on
    /// empty history (safe no-op). Legal after game over; the termination
    /// flags are derived, so play resumes automatically.
    pub fn undo(&mut self) -> bool {
        match self.history.pop() {
            Some(entry) => {
                self.position = entry.prior;
                true
            }
            None => false,
        }
    }

    /// Game-end flags for the current position.
    pub fn termination(&self) -> Termination {
        let mut any_moves = false;
        self.position.generate_moves(|_| {
            any_moves = true;
            true
        });

        if !any_moves {
            return if self.position.checkers().is_empty() {
                Termination {
                    game_over: true,
                    stalemate: true,
                    ..Termination::default()
                }
            } else {
                Termination {
                    game_over: true,
                    checkmate: true,
                    winner: Some(self.turn().opponent()),
                    ..Termination::default()
                }
            };
        }

        // Fifty-move rule: over, but neither mate nor stalemate.
        if self.position.halfmove_clock() >= 100 {
            return Termination {
                game_over: true,
                ..Termination::default()
            };
        }

        Termination::default()
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("Illegal move")]
    IllegalMove,
    #[error("Malformed move text: {0}")]
    MalformedMove(String),
    #[error(transparent)]
    Fen(#[from] fen::FenError),
}
