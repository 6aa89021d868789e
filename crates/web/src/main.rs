mod app;
mod config;

use anyhow::{anyhow, Context};
use app::{ApiResponse, AppState, JoinRequest, MoveRequest, SeatRequest, SessionToken};
use config::ServerConfig;
use crosscards_data::load_assets;
use serde::de::DeserializeOwned;
use std::io::Read;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tiny_http::{Header, Method, Response, Server, StatusCode};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const POLL_INTERVAL: Duration = Duration::from_secs(1);

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = ServerConfig::from_env()?;
    let (catalog, mut rules) = load_assets(&config.assets_dir)
        .with_context(|| format!("load assets from {}", config.assets_dir.display()))?;
    if config.seed.is_some() {
        rules.seed = config.seed;
    }
    info!(
        cards = catalog.len(),
        hand_size = rules.hand_size,
        min_players = rules.min_players,
        "catalog loaded"
    );

    let address = config.bind_address();
    let server = Server::http(&address).map_err(|err| anyhow!("bind {address}: {err}"))?;
    info!(%address, "crosscards server listening");
    let state = Arc::new(Mutex::new(AppState::new(
        rules,
        Arc::new(catalog),
        config.idle_timeout,
    )));

    loop {
        let request = server.recv_timeout(POLL_INTERVAL).context("receive request")?;
        if let Some(request) = request {
            if let Err(err) = handle_request(request, state.clone()) {
                warn!(error = %err, "request error");
            }
        }
        let mut guard = lock(&state)?;
        guard.reap_idle(Instant::now());
    }
}

fn lock(state: &Mutex<AppState>) -> anyhow::Result<std::sync::MutexGuard<'_, AppState>> {
    state.lock().map_err(|_| anyhow!("app state lock poisoned"))
}

fn handle_request(mut request: tiny_http::Request, state: Arc<Mutex<AppState>>) -> anyhow::Result<()> {
    let url = request.url().to_string();
    let (path, query) = url.split_once('?').unwrap_or((url.as_str(), ""));
    let method = request.method().clone();
    let now = Instant::now();
    let response = match (&method, path) {
        (&Method::Get, "/api/state") => {
            let token = query_param(query, "token").map(SessionToken::new);
            lock(&state)?.state(token.as_ref(), now)
        }
        (&Method::Get, "/api/events") => match query_param(query, "token") {
            Some(token) => lock(&state)?.events(&SessionToken::new(token), now),
            None => ApiResponse::failure("missing token parameter"),
        },
        (&Method::Post, "/api/join") => {
            let join = read_body(&mut request).and_then(|body| {
                if body.trim().is_empty() {
                    Ok(JoinRequest::default())
                } else {
                    parse_json(&body)
                }
            });
            match join {
                Ok(join) => lock(&state)?.join(join, now),
                Err(response) => response,
            }
        }
        (&Method::Post, "/api/start") => {
            match read_body(&mut request).and_then(|body| parse_json::<SeatRequest>(&body)) {
                Ok(start) => lock(&state)?.start(start, now),
                Err(response) => response,
            }
        }
        (&Method::Post, "/api/move") => {
            match read_body(&mut request).and_then(|body| parse_json::<MoveRequest>(&body)) {
                Ok(play) => lock(&state)?.play(play, now),
                Err(response) => response,
            }
        }
        (&Method::Post, "/api/leave") => {
            match read_body(&mut request).and_then(|body| parse_json::<SeatRequest>(&body)) {
                Ok(leave) => lock(&state)?.leave(leave, now),
                Err(response) => response,
            }
        }
        _ => {
            request.respond(Response::empty(StatusCode(404)))?;
            return Ok(());
        }
    };
    respond_json(request, response)
}

fn read_body(request: &mut tiny_http::Request) -> Result<String, ApiResponse> {
    let mut body = Vec::new();
    request
        .as_reader()
        .read_to_end(&mut body)
        .map_err(|err| ApiResponse::failure(format!("malformed request: {err}")))?;
    decode_body(body)
}

fn decode_body(body: Vec<u8>) -> Result<String, ApiResponse> {
    String::from_utf8(body)
        .map_err(|_| ApiResponse::failure("malformed request: body is not valid UTF-8"))
}

fn parse_json<T: DeserializeOwned>(body: &str) -> Result<T, ApiResponse> {
    serde_json::from_str(body).map_err(|err| ApiResponse::failure(format!("malformed request: {err}")))
}

fn query_param<'a>(query: &'a str, key: &str) -> Option<&'a str> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(name, _)| *name == key)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}

fn respond_json(request: tiny_http::Request, response: ApiResponse) -> anyhow::Result<()> {
    let status = if response.ok { 200 } else { 400 };
    let body = serde_json::to_vec(&response)?;
    let header = Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
        .map_err(|_| anyhow!("invalid content-type header"))?;
    request.respond(
        Response::from_data(body)
            .with_header(header)
            .with_status_code(StatusCode(status)),
    )?;
    Ok(())
}
