//! Black-box tests of the HTTP wire contract, driving the router directly.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use analysis::{AnalysisError, AnalysisProvider, AnalysisReport, StubProvider};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use chess::Game;
use chesspad_server::{http, SessionService};
use cozy_chess::Board;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

#[derive(Default)]
struct CountingProvider {
    calls: AtomicUsize,
}

#[async_trait]
impl AnalysisProvider for CountingProvider {
    async fn analyse(&self, board: &Board) -> Result<AnalysisReport, AnalysisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        StubProvider.analyse(board).await
    }
}

struct FailingProvider;

#[async_trait]
impl AnalysisProvider for FailingProvider {
    async fn analyse(&self, _board: &Board) -> Result<AnalysisReport, AnalysisError> {
        Err(AnalysisError::EngineUnavailable(
            "engine is down".to_string(),
        ))
    }
}

fn app(game: Game, provider: Arc<dyn AnalysisProvider>) -> Router {
    http::router(Arc::new(SessionService::new(game, provider)))
}

fn stub_app() -> Router {
    app(Game::new(), Arc::new(StubProvider))
}

async fn read_json(response: Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn get(app: &Router, path: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(path).body(Body::empty()).unwrap();
    read_json(app.clone().oneshot(request).await.unwrap()).await
}

async fn post(app: &Router, path: &str, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(path)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    read_json(app.clone().oneshot(request).await.unwrap()).await
}

async fn play(app: &Router, mv: &str) -> (StatusCode, Value) {
    post(app, "/play_move", &json!({ "move": mv }).to_string()).await
}

#[tokio::test]
async fn test_state_initial() {
    let app = stub_app();
    let (status, data) = get(&app, "/state").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(data["type"], "state");
    assert_eq!(data["turn"], "white");
    assert_eq!(data["move_number"], 1);
    assert_eq!(data["last_move"], Value::Null);
    assert_eq!(data["game_over"], false);
    assert_eq!(data["checkmate"], false);
    assert_eq!(data["stalemate"], false);
    assert_eq!(data["winner"], Value::Null);
    assert_eq!(data["analysis"]["depth"], 1);
    assert_eq!(data["analysis"]["lines"].as_array().unwrap().len(), 3);
    assert_eq!(data["analysis"]["lines"][0]["move"], "e2e4");
}

#[tokio::test]
async fn test_state_after_move() {
    let app = stub_app();
    let (status, result) = play(&app, "e2e4").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["ok"], true);

    let (_, data) = get(&app, "/state").await;
    assert_eq!(data["turn"], "black");
    assert_eq!(data["move_number"], 1);
    assert_eq!(data["last_move"], "e2e4");
}

#[tokio::test]
async fn test_piece_list_initial() {
    let app = stub_app();
    let (status, data) = get(&app, "/piece_list").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(data["type"], "piece_list");
    let squares: Vec<&str> = data["pieces"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["square"].as_str().unwrap())
        .collect();
    assert_eq!(
        squares,
        ["a2", "b1", "b2", "c2", "d2", "e2", "f2", "g1", "g2", "h2"]
    );
    assert_eq!(data["pieces"][0]["piece"], "pawn");
    assert_eq!(data["pieces"][1]["piece"], "knight");
}

#[tokio::test]
async fn test_move_list_initial_e2() {
    let app = stub_app();
    let (status, data) = post(&app, "/move_list", r#"{"from": "e2"}"#).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(data["type"], "move_list");
    assert_eq!(data["from"], "e2");
    assert_eq!(data["moves"], json!(["e3", "e4"]));
}

#[tokio::test]
async fn test_move_list_quiet_square_is_empty() {
    let app = stub_app();
    let (status, data) = post(&app, "/move_list", r#"{"from": "e5"}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(data["moves"], json!([]));
}

#[tokio::test]
async fn test_move_list_missing_from_returns_400() {
    let app = stub_app();
    let (status, _) = post(&app, "/move_list", r#"{"nope": "e2"}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_move_list_invalid_square_returns_400() {
    let app = stub_app();
    let (status, _) = post(&app, "/move_list", r#"{"from": "z9"}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_move_list_bad_json_returns_400() {
    let app = stub_app();
    let (status, _) = post(&app, "/move_list", r#"{"from":"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_play_move_valid() {
    let app = stub_app();
    let (status, data) = play(&app, "e2e4").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(data["type"], "move_result");
    assert_eq!(data["ok"], true);
    assert!(data.get("reason").is_none());
}

#[tokio::test]
async fn test_play_move_illegal() {
    let app = stub_app();
    let (status, data) = play(&app, "e2e5").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(data["ok"], false);
    assert_eq!(data["reason"], "illegal_move");

    // Position untouched.
    let (_, state) = get(&app, "/state").await;
    assert_eq!(state["turn"], "white");
    assert_eq!(state["last_move"], Value::Null);
}

#[tokio::test]
async fn test_play_move_missing_field_returns_400() {
    let app = stub_app();
    let (status, _) = post(&app, "/play_move", "{}").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_play_move_empty_body_returns_400() {
    let app = stub_app();
    let (status, _) = post(&app, "/play_move", "").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_play_move_bad_json_returns_400() {
    let app = stub_app();
    let (status, _) = post(&app, "/play_move", r#"{"move":"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_undo_empty_game() {
    let app = stub_app();
    let (status, data) = post(&app, "/undo", "").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(data["type"], "move_result");
    assert_eq!(data["ok"], false);

    let (_, state) = get(&app, "/state").await;
    assert_eq!(state["turn"], "white");
    assert_eq!(state["move_number"], 1);
}

#[tokio::test]
async fn test_undo_after_single_move() {
    let app = stub_app();
    play(&app, "e2e4").await;

    let (_, data) = post(&app, "/undo", "").await;
    assert_eq!(data["ok"], true);

    let (_, state) = get(&app, "/state").await;
    assert_eq!(state["turn"], "white");
    assert_eq!(state["last_move"], Value::Null);
}

#[tokio::test]
async fn test_undo_twice_is_safe() {
    let app = stub_app();
    play(&app, "e2e4").await;

    let (_, first) = post(&app, "/undo", "").await;
    assert_eq!(first["ok"], true);
    let (_, second) = post(&app, "/undo", "").await;
    assert_eq!(second["ok"], false);

    let (_, state) = get(&app, "/state").await;
    assert_eq!(state["turn"], "white");
}

#[tokio::test]
async fn test_state_uses_cached_analysis_when_position_unchanged() {
    let provider = Arc::new(CountingProvider::default());
    let app = app(Game::new(), provider.clone());

    for _ in 0..3 {
        get(&app, "/state").await;
    }
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_cache_invalidates_after_play_move() {
    let provider = Arc::new(CountingProvider::default());
    let app = app(Game::new(), provider.clone());

    get(&app, "/state").await;
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

    play(&app, "e2e4").await;
    get(&app, "/state").await;
    assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_cache_invalidates_after_undo() {
    let provider = Arc::new(CountingProvider::default());
    let app = app(Game::new(), provider.clone());

    get(&app, "/state").await;
    play(&app, "e2e4").await;
    get(&app, "/state").await;
    assert_eq!(provider.calls.load(Ordering::SeqCst), 2);

    post(&app, "/undo", "").await;
    get(&app, "/state").await;
    assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_rejected_move_keeps_cache_warm() {
    let provider = Arc::new(CountingProvider::default());
    let app = app(Game::new(), provider.clone());

    get(&app, "/state").await;
    play(&app, "e2e5").await;
    get(&app, "/state").await;
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_checkmate_fools_mate() {
    let app = stub_app();
    for mv in ["f2f3", "e7e5", "g2g4", "d8h4"] {
        let (_, data) = play(&app, mv).await;
        assert_eq!(data["ok"], true);
    }

    let (_, state) = get(&app, "/state").await;
    assert_eq!(state["game_over"], true);
    assert_eq!(state["checkmate"], true);
    assert_eq!(state["stalemate"], false);
    assert_eq!(state["winner"], "black");
}

#[tokio::test]
async fn test_undo_after_checkmate_resumes_play() {
    let app = stub_app();
    for mv in ["f2f3", "e7e5", "g2g4", "d8h4"] {
        play(&app, mv).await;
    }

    let (_, data) = post(&app, "/undo", "").await;
    assert_eq!(data["ok"], true);

    let (_, state) = get(&app, "/state").await;
    assert_eq!(state["game_over"], false);
    assert_eq!(state["checkmate"], false);
    assert_eq!(state["winner"], Value::Null);
}

#[tokio::test]
async fn test_stalemate_state() {
    let game = Game::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
    let app = app(game, Arc::new(StubProvider));

    let (_, state) = get(&app, "/state").await;
    assert_eq!(state["game_over"], true);
    assert_eq!(state["stalemate"], true);
    assert_eq!(state["checkmate"], false);
    assert_eq!(state["winner"], Value::Null);
}

#[tokio::test]
async fn test_move_list_includes_castling_squares() {
    let game = Game::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
    let app = app(game, Arc::new(StubProvider));

    let (status, data) = post(&app, "/move_list", r#"{"from": "e1"}"#).await;
    assert_eq!(status, StatusCode::OK);
    let moves = data["moves"].as_array().unwrap();
    assert!(moves.contains(&json!("g1")));
    assert!(moves.contains(&json!("c1")));
}

#[tokio::test]
async fn test_play_move_accepts_promotion_uci() {
    let game = Game::from_fen("8/P7/8/8/8/8/8/k6K w - - 0 1").unwrap();
    let app = app(game, Arc::new(StubProvider));

    let (_, data) = play(&app, "a7a8q").await;
    assert_eq!(data["ok"], true);

    let (_, state) = get(&app, "/state").await;
    assert_eq!(state["last_move"], "a7a8q");
}

#[tokio::test]
async fn test_unknown_path_returns_404() {
    let app = stub_app();
    let (status, _) = get(&app, "/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_provider_failure_degrades_state() {
    let app = app(Game::new(), Arc::new(FailingProvider));

    let (status, state) = get(&app, "/state").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(state["analysis"]["depth"], 0);
    assert_eq!(state["analysis"]["lines"], json!([]));
    // Everything else is still served.
    assert_eq!(state["turn"], "white");
}
