//! UCI coordinate-move utilities.
//!
//! The wire protocol and the engine both speak standard UCI notation, where
//! castling is a two-square king move (e1g1, e1c1). cozy_chess generates
//! castling as king-takes-rook (e1h1, e1a1), so moves are translated at the
//! oracle boundary in both directions.

use cozy_chess::{Board, File, Move, Piece, Rank, Square};

use crate::types::PieceKind;

pub fn parse_file(c: char) -> Option<File> {
    match c {
        'a' => Some(File::A),
        'b' => Some(File::B),
        'c' => Some(File::C),
        'd' => Some(File::D),
        'e' => Some(File::E),
        'f' => Some(File::F),
        'g' => Some(File::G),
        'h' => Some(File::H),
        _ => None,
    }
}

pub fn parse_rank(c: char) -> Option<Rank> {
    match c {
        '1' => Some(Rank::First),
        '2' => Some(Rank::Second),
        '3' => Some(Rank::Third),
        '4' => Some(Rank::Fourth),
        '5' => Some(Rank::Fifth),
        '6' => Some(Rank::Sixth),
        '7' => Some(Rank::Seventh),
        '8' => Some(Rank::Eighth),
        _ => None,
    }
}

/// Parse a square name like "e2". Returns None for anything else.
pub fn parse_square(s: &str) -> Option<Square> {
    let mut chars = s.chars();
    let file = parse_file(chars.next()?)?;
    let rank = parse_rank(chars.next()?)?;
    if chars.next().is_some() {
        return None;
    }
    Some(Square::new(file, rank))
}

pub fn file_to_char(file: File) -> char {
    match file {
        File::A => 'a',
        File::B => 'b',
        File::C => 'c',
        File::D => 'd',
        File::E => 'e',
        File::F => 'f',
        File::G => 'g',
        File::H => 'h',
    }
}

pub fn rank_to_char(rank: Rank) -> char {
    match rank {
        Rank::First => '1',
        Rank::Second => '2',
        Rank::Third => '3',
        Rank::Fourth => '4',
        Rank::Fifth => '5',
        Rank::Sixth => '6',
        Rank::Seventh => '7',
        Rank::Eighth => '8',
    }
}

pub fn format_square(sq: Square) -> String {
    let mut s = String::with_capacity(2);
    s.push(file_to_char(sq.file()));
    s.push(rank_to_char(sq.rank()));
    s
}

fn parse_promotion(c: char) -> Option<Piece> {
    let kind = PieceKind::from_char(c)?;
    match kind {
        PieceKind::Queen | PieceKind::Rook | PieceKind::Bishop | PieceKind::Knight => {
            Some(kind.into())
        }
        _ => None,
    }
}

/// Parse a UCI coordinate move: four characters plus an optional promotion
/// letter ("e2e4", "a7a8q").
pub fn parse_uci_move(s: &str) -> Option<Move> {
    if s.len() != 4 && s.len() != 5 {
        return None;
    }
    let from = parse_square(s.get(0..2)?)?;
    let to = parse_square(s.get(2..4)?)?;
    let promotion = match s.get(4..5) {
        Some(p) => Some(parse_promotion(p.chars().next()?)?),
        None => None,
    };
    Some(Move {
        from,
        to,
        promotion,
    })
}

/// Format a move in UCI notation (e.g., "e2e4", "e7e8q").
pub fn format_uci_move(mv: Move) -> String {
    let mut s = format!("{}{}", format_square(mv.from), format_square(mv.to));
    if let Some(promo) = mv.promotion {
        s.push(PieceKind::from(promo).to_char_lower());
    }
    s
}

/// Translate an oracle-generated move into standard UCI notation.
///
/// cozy_chess emits castling as the king capturing its own rook. In standard
/// chess that pattern can only be castling, so a king landing on a friendly
/// rook maps to the conventional two-square king destination (h-file rook →
/// g-file, a-file rook → c-file). Every other move passes through untouched.
pub fn normalize_oracle_move(board: &Board, mv: Move) -> Move {
    let is_king = board.piece_on(mv.from) == Some(Piece::King);
    let targets_own_rook = board.piece_on(mv.to) == Some(Piece::Rook)
        && board.color_on(mv.to) == board.color_on(mv.from);

    if is_king && targets_own_rook {
        let to_file = match mv.to.file() {
            File::H => File::G,
            File::A => File::C,
            other => other,
        };
        return Move {
            from: mv.from,
            to: Square::new(to_file, mv.to.rank()),
            promotion: None,
        };
    }
    mv
}

/// Translate standard UCI castling notation into the oracle's king-takes-rook
/// form, when that form is actually legal in the position.
///
/// Only a king stepping from the e-file to the g- or c-file on its back rank
/// is a castling candidate; a rook or queen sliding e1g1 is an ordinary move
/// and must pass through untouched. The converted form is checked against
/// the legal-move list; if it is not legal the original move is returned
/// unchanged and will be rejected downstream like any other illegal move.
pub fn resolve_castling_for_oracle(board: &Board, mv: Move, legal_moves: &[Move]) -> Move {
    let is_king = board.piece_on(mv.from) == Some(Piece::King);
    let is_back_rank = matches!(mv.from.rank(), Rank::First | Rank::Eighth);
    let from_e_file = mv.from.file() == File::E;
    let to_g_or_c = matches!(mv.to.file(), File::G | File::C);

    if is_king && is_back_rank && from_e_file && to_g_or_c && mv.promotion.is_none() {
        let rook_file = match mv.to.file() {
            File::G => File::H,
            _ => File::A,
        };
        let converted = Move {
            from: mv.from,
            to: Square::new(rook_file, mv.from.rank()),
            promotion: None,
        };
        if legal_moves.contains(&converted) {
            return converted;
        }
    }
    mv
}
