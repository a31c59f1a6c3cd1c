//! HTTP/1.1 + JSON binding for the session service.
//!
//! Request bodies are extracted as raw text and parsed explicitly so that
//! malformed JSON and missing fields both map to 400, matching the wire
//! contract the keypad client relies on. Move illegality is never an HTTP
//! error: it comes back as `ok:false` in a 200 response.

use std::sync::Arc;

use analysis::AnalysisReport;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::session::{PlayOutcome, SessionService};

pub fn router(service: Arc<SessionService>) -> Router {
    Router::new()
        .route("/state", get(state))
        .route("/piece_list", get(piece_list))
        .route("/move_list", post(move_list))
        .route("/play_move", post(play_move))
        .route("/undo", post(undo))
        .fallback(not_found)
        .with_state(service)
}

#[derive(Serialize)]
struct StateBody {
    #[serde(rename = "type")]
    kind: &'static str,
    turn: &'static str,
    move_number: u32,
    last_move: Option<String>,
    game_over: bool,
    checkmate: bool,
    stalemate: bool,
    winner: Option<&'static str>,
    analysis: AnalysisReport,
}

#[derive(Serialize)]
struct PieceBody {
    square: String,
    piece: &'static str,
}

#[derive(Serialize)]
struct PieceListBody {
    #[serde(rename = "type")]
    kind: &'static str,
    pieces: Vec<PieceBody>,
}

#[derive(Serialize)]
struct MoveListBody {
    #[serde(rename = "type")]
    kind: &'static str,
    from: String,
    moves: Vec<String>,
}

#[derive(Serialize)]
struct MoveResultBody {
    #[serde(rename = "type")]
    kind: &'static str,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'static str>,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Deserialize)]
struct MoveListRequest {
    from: String,
}

#[derive(Deserialize)]
struct PlayMoveRequest {
    #[serde(rename = "move")]
    mv: String,
}

impl From<PlayOutcome> for MoveResultBody {
    fn from(outcome: PlayOutcome) -> Self {
        Self {
            kind: "move_result",
            ok: outcome.ok,
            reason: outcome.reason,
        }
    }
}

fn bad_request(message: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
        .into_response()
}

async fn state(State(service): State<Arc<SessionService>>) -> Json<StateBody> {
    let status = service.status().await;
    Json(StateBody {
        kind: "state",
        turn: status.turn.as_str(),
        move_number: status.move_number,
        last_move: status.last_move,
        game_over: status.game_over,
        checkmate: status.checkmate,
        stalemate: status.stalemate,
        winner: status.winner.map(|color| color.as_str()),
        analysis: status.analysis,
    })
}

async fn piece_list(State(service): State<Arc<SessionService>>) -> Json<PieceListBody> {
    let pieces = service
        .piece_list()
        .await
        .into_iter()
        .map(|entry| PieceBody {
            square: entry.square,
            piece: entry.piece.as_str(),
        })
        .collect();
    Json(PieceListBody {
        kind: "piece_list",
        pieces,
    })
}

async fn move_list(State(service): State<Arc<SessionService>>, body: String) -> Response {
    let request: MoveListRequest = match serde_json::from_str(&body) {
        Ok(request) => request,
        Err(_) => return bad_request("expected JSON body with a 'from' square"),
    };

    match service.move_list(&request.from).await {
        Ok(moves) => Json(MoveListBody {
            kind: "move_list",
            from: request.from,
            moves,
        })
        .into_response(),
        Err(err) => bad_request(err.to_string()),
    }
}

async fn play_move(State(service): State<Arc<SessionService>>, body: String) -> Response {
    let request: PlayMoveRequest = match serde_json::from_str(&body) {
        Ok(request) => request,
        Err(_) => return bad_request("expected JSON body with a 'move' string"),
    };

    let outcome = service.play_move(&request.mv).await;
    Json(MoveResultBody::from(outcome)).into_response()
}

async fn undo(State(service): State<Arc<SessionService>>) -> Json<MoveResultBody> {
    let outcome = service.undo().await;
    Json(MoveResultBody::from(outcome))
}

async fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            error: "unknown path".to_string(),
        }),
    )
        .into_response()
}
