pub mod fen;
pub mod game;
pub mod types;
pub mod uci;

pub use fen::{fingerprint, format_fen, parse_fen, FenError};
pub use game::{Game, GameError, Termination};
pub use types::{PieceColor, PieceKind};
pub use uci::{
    format_square, format_uci_move, normalize_oracle_move, parse_square, parse_uci_move,
    resolve_castling_for_oracle,
};
