//! FEN helpers and the analysis-cache position fingerprint.

use cozy_chess::Board;

/// Parse a FEN string into a Board.
pub fn parse_fen(fen: &str) -> Result<Board, FenError> {
    fen.parse().map_err(|_| FenError::InvalidFormat)
}

/// Format a Board as a FEN string.
pub fn format_fen(board: &Board) -> String {
    board.to_string()
}

/// Canonical cache key for a position.
///
/// The full FEN covers piece placement, side to move, castling rights and the
/// en-passant target, so equal fingerprints are interchangeable for analysis.
/// The move counters are included as well; that can only cost a recomputation
/// after an undo/replay cycle, never produce a false hit.
pub fn fingerprint(board: &Board) -> String {
    format_fen(board)
}

#[derive(Debug, thiserror::Error)]
pub enum FenError {
    #[error("Invalid FEN format")]
    InvalidFormat,
}

#[cfg(test)]
mod tests {
    use super::*;

    const STARTPOS: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    #[test]
    fn test_fen_round_trip() {
        let board = parse_fen(STARTPOS).unwrap();
        assert_eq!(format_fen(&board), STARTPOS);
    }

    #[test]
    fn test_parse_fen_rejects_garbage() {
        assert!(parse_fen("not a fen").is_err());
        assert!(parse_fen("").is_err());
    }

    #[test]
    fn test_fingerprint_distinguishes_side_to_move() {
        let white = parse_fen("7k/5Q2/6K1/8/8/8/8/8 w - - 0 1").unwrap();
        let black = parse_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        assert_ne!(fingerprint(&white), fingerprint(&black));
    }

    #[test]
    fn test_fingerprint_stable_for_equal_positions() {
        let a = Board::default();
        let b = parse_fen(STARTPOS).unwrap();
        assert_eq!(fingerprint(&a), fingerprint(&b));
    }
}
