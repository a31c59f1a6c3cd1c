//! Minimal UCI output parsing for the engine-backed provider.
//!
//! Only the messages the provider consumes are modeled; everything else is
//! reported as `Other` and skipped. Moves stay as UCI text since the engine
//! already speaks the wire's coordinate notation.

use std::collections::BTreeMap;

use crate::{AnalysisLine, AnalysisReport};

/// Incoming message from the engine, reduced to what the search loop needs.
#[derive(Debug, Clone, PartialEq)]
pub enum UciMessage {
    UciOk,
    ReadyOk,
    BestMove(String),
    Info(InfoLine),
    Other,
}

/// One parsed `info` line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InfoLine {
    pub depth: Option<u32>,
    pub multipv: Option<u32>,
    pub score: Option<Score>,
    /// First move of the principal variation, if one was reported.
    pub pv_first: Option<String>,
}

/// Engine evaluation, from the side to move's perspective.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Score {
    Centipawns(i32),
    Mate(i32),
}

impl Score {
    /// Convert to a White-perspective pawn score. Mate collapses to ±100.0
    /// so the wire never carries infinities.
    pub fn to_eval(self, white_to_move: bool) -> f64 {
        let side_to_move = match self {
            Self::Centipawns(cp) => f64::from(cp) / 100.0,
            Self::Mate(m) => {
                if m > 0 {
                    100.0
                } else {
                    -100.0
                }
            }
        };
        if white_to_move {
            side_to_move
        } else {
            -side_to_move
        }
    }
}

/// Parse one line of engine output.
pub fn parse_line(line: &str) -> UciMessage {
    let tokens: Vec<&str> = line.split_whitespace().collect();

    match tokens.first() {
        Some(&"uciok") => UciMessage::UciOk,
        Some(&"readyok") => UciMessage::ReadyOk,
        Some(&"bestmove") => match tokens.get(1) {
            Some(mv) => UciMessage::BestMove((*mv).to_string()),
            None => UciMessage::Other,
        },
        Some(&"info") => UciMessage::Info(parse_info(&tokens[1..])),
        _ => UciMessage::Other,
    }
}

fn parse_info(tokens: &[&str]) -> InfoLine {
    let mut info = InfoLine::default();
    let mut i = 0;

    while i < tokens.len() {
        match tokens[i] {
            "depth" => {
                i += 1;
                info.depth = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "multipv" => {
                i += 1;
                info.multipv = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "score" => {
                i += 1;
                if let Some(&score_type) = tokens.get(i) {
                    i += 1;
                    if let Some(value) = tokens.get(i) {
                        info.score = match score_type {
                            "cp" => value.parse().ok().map(Score::Centipawns),
                            "mate" => value.parse().ok().map(Score::Mate),
                            _ => None,
                        };
                    }
                }
            }
            "pv" => {
                i += 1;
                info.pv_first = tokens.get(i).map(|s| (*s).to_string());
                // The pv runs to the end of the line; nothing after it matters.
                break;
            }
            _ => {}
        }
        i += 1;
    }

    info
}

/// Fold the best info line per multipv index into a wire report.
///
/// Lines without a principal variation or score are dropped rather than
/// defaulted. Depth is the top line's reported depth, 0 when absent.
pub fn assemble_report(
    infos: &BTreeMap<u32, InfoLine>,
    white_to_move: bool,
    max_lines: usize,
) -> AnalysisReport {
    let mut lines = Vec::new();
    for info in infos.values().take(max_lines) {
        let (Some(mv), Some(score)) = (info.pv_first.as_ref(), info.score) else {
            continue;
        };
        lines.push(AnalysisLine {
            mv: mv.clone(),
            eval: score.to_eval(white_to_move),
        });
    }

    let depth = infos
        .values()
        .next()
        .and_then(|info| info.depth)
        .unwrap_or(0);

    AnalysisReport { depth, lines }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_handshake_lines() {
        assert_eq!(parse_line("uciok"), UciMessage::UciOk);
        assert_eq!(parse_line("readyok"), UciMessage::ReadyOk);
        assert_eq!(
            parse_line("id name Stockfish 16"),
            UciMessage::Other
        );
    }

    #[test]
    fn test_parse_bestmove() {
        assert_eq!(
            parse_line("bestmove e2e4 ponder e7e5"),
            UciMessage::BestMove("e2e4".to_string())
        );
    }

    #[test]
    fn test_parse_info_line() {
        let msg = parse_line(
            "info depth 18 seldepth 24 multipv 1 score cp 32 nodes 500000 nps 1000000 pv e2e4 e7e5 g1f3",
        );
        let UciMessage::Info(info) = msg else {
            panic!("expected info line");
        };
        assert_eq!(info.depth, Some(18));
        assert_eq!(info.multipv, Some(1));
        assert_eq!(info.score, Some(Score::Centipawns(32)));
        assert_eq!(info.pv_first.as_deref(), Some("e2e4"));
    }

    #[test]
    fn test_parse_info_mate_score() {
        let msg = parse_line("info depth 12 multipv 2 score mate -3 pv h7h8");
        let UciMessage::Info(info) = msg else {
            panic!("expected info line");
        };
        assert_eq!(info.score, Some(Score::Mate(-3)));
    }

    #[test]
    fn test_score_perspective_flip() {
        assert_eq!(Score::Centipawns(50).to_eval(true), 0.5);
        assert_eq!(Score::Centipawns(50).to_eval(false), -0.5);
        assert_eq!(Score::Mate(2).to_eval(true), 100.0);
        assert_eq!(Score::Mate(2).to_eval(false), -100.0);
        assert_eq!(Score::Mate(-1).to_eval(true), -100.0);
    }

    #[test]
    fn test_assemble_report_orders_and_truncates() {
        let mut infos = BTreeMap::new();
        for (idx, cp, mv) in [(1u32, 30, "e2e4"), (2, 20, "d2d4"), (3, 10, "g1f3"), (4, 5, "c2c4")]
        {
            infos.insert(
                idx,
                InfoLine {
                    depth: Some(15),
                    multipv: Some(idx),
                    score: Some(Score::Centipawns(cp)),
                    pv_first: Some(mv.to_string()),
                },
            );
        }
        let report = assemble_report(&infos, true, 3);
        assert_eq!(report.depth, 15);
        assert_eq!(report.lines.len(), 3);
        assert_eq!(report.lines[0].mv, "e2e4");
        assert_eq!(report.lines[2].mv, "g1f3");
    }

    #[test]
    fn test_assemble_report_drops_incomplete_lines() {
        let mut infos = BTreeMap::new();
        infos.insert(
            1,
            InfoLine {
                depth: Some(10),
                multipv: Some(1),
                score: None,
                pv_first: Some("e2e4".to_string()),
            },
        );
        infos.insert(
            2,
            InfoLine {
                depth: Some(10),
                multipv: Some(2),
                score: Some(Score::Centipawns(12)),
                pv_first: None,
            },
        );
        let report = assemble_report(&infos, true, 3);
        assert!(report.lines.is_empty());
        assert_eq!(report.depth, 10);
    }

    #[test]
    fn test_assemble_report_empty_input() {
        let report = assemble_report(&BTreeMap::new(), true, 3);
        assert_eq!(report, AnalysisReport::empty());
    }
}
