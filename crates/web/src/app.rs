use crosscards_core::{
    CardCatalog, CardId, GameConfig, Outbox, Placement, PlayerId, ServerMessage, SessionError,
    SessionManager,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Oldest messages beyond this are dropped from a mailbox nobody collects.
pub const MAILBOX_LIMIT: usize = 64;

/// Secret handed out at join. Requests present it to act for their seat; the
/// public player id only names the seat in the roster.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn generate() -> Self {
        Self(format!("{:032x}", rand::random::<u128>()))
    }

    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse {
    pub ok: bool,
    pub error: Option<String>,
    #[serde(rename = "playerId", skip_serializing_if = "Option::is_none")]
    pub player_id: Option<PlayerId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<SessionToken>,
    pub messages: Vec<ServerMessage>,
}

impl ApiResponse {
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: Some(error.into()),
            player_id: None,
            token: None,
            messages: Vec::new(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct JoinRequest {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SeatRequest {
    pub token: SessionToken,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRequest {
    pub token: SessionToken,
    pub card_id: CardId,
    pub place_at: String,
    #[serde(default)]
    pub insertion_mode: bool,
}

/// Everything the server holds: the game table plus one mailbox per seated
/// player. Clients collect their mailbox with every request they make.
pub struct AppState {
    manager: SessionManager,
    seats: HashMap<SessionToken, PlayerId>,
    mailboxes: HashMap<PlayerId, Vec<ServerMessage>>,
    last_seen: HashMap<PlayerId, Instant>,
    next_player: u64,
    idle_timeout: Duration,
}

impl AppState {
    pub fn new(config: GameConfig, catalog: Arc<CardCatalog>, idle_timeout: Duration) -> Self {
        Self {
            manager: SessionManager::new(config, catalog),
            seats: HashMap::new(),
            mailboxes: HashMap::new(),
            last_seen: HashMap::new(),
            next_player: 1,
            idle_timeout,
        }
    }

    #[cfg(test)]
    pub fn manager(&self) -> &SessionManager {
        &self.manager
    }

    pub fn join(&mut self, request: JoinRequest, now: Instant) -> ApiResponse {
        let id = PlayerId::new(format!("p{}", self.next_player));
        self.next_player += 1;
        let mut token = SessionToken::generate();
        while self.seats.contains_key(&token) {
            token = SessionToken::generate();
        }
        self.mailboxes.insert(id.clone(), Vec::new());
        self.last_seen.insert(id.clone(), now);
        let mut outbox = Outbox::default();
        let result = self.manager.add_player(id.clone(), request.name, &mut outbox);
        self.deliver(&mut outbox);
        match result {
            Ok(()) => {
                self.seats.insert(token.clone(), id.clone());
                let mut response = self.reply(&id, Ok(()));
                response.player_id = Some(id);
                response.token = Some(token);
                response
            }
            Err(err) => {
                self.forget(&id);
                ApiResponse::failure(err.to_string())
            }
        }
    }

    pub fn start(&mut self, request: SeatRequest, now: Instant) -> ApiResponse {
        let id = match self.authenticate(&request.token, now) {
            Ok(id) => id,
            Err(response) => return response,
        };
        let mut outbox = Outbox::default();
        let result = self.manager.start_game(&id, &mut outbox);
        self.deliver(&mut outbox);
        self.reply(&id, result)
    }

    pub fn play(&mut self, request: MoveRequest, now: Instant) -> ApiResponse {
        let id = match self.authenticate(&request.token, now) {
            Ok(id) => id,
            Err(response) => return response,
        };
        let mut outbox = Outbox::default();
        let result = Placement::parse(&request.place_at, request.insertion_mode)
            .map_err(SessionError::from)
            .and_then(|placement| {
                self.manager
                    .attempt_move(&id, &request.card_id, placement, &mut outbox)
            })
            .map(drop);
        self.deliver(&mut outbox);
        self.reply(&id, result)
    }

    pub fn leave(&mut self, request: SeatRequest, now: Instant) -> ApiResponse {
        let id = match self.authenticate(&request.token, now) {
            Ok(id) => id,
            Err(response) => return response,
        };
        let response = self.reply(&id, Ok(()));
        self.disconnect(&id);
        response
    }

    /// Drains the seat's mailbox.
    pub fn events(&mut self, token: &SessionToken, now: Instant) -> ApiResponse {
        let id = match self.authenticate(token, now) {
            Ok(id) => id,
            Err(response) => return response,
        };
        self.reply(&id, Ok(()))
    }

    /// Fresh view for the seat behind `token`. Without a valid token the
    /// caller gets a spectator view without a hand.
    pub fn state(&mut self, token: Option<&SessionToken>, now: Instant) -> ApiResponse {
        let seat = token.and_then(|token| self.seats.get(token)).cloned();
        if let Some(id) = &seat {
            self.last_seen.insert(id.clone(), now);
        }
        let viewer = seat.clone().unwrap_or_else(|| PlayerId::new(""));
        ApiResponse {
            ok: true,
            error: None,
            player_id: seat,
            token: None,
            messages: vec![ServerMessage::GameState(self.manager.snapshot_for(&viewer))],
        }
    }

    /// Disconnects every player not heard from within the idle timeout.
    pub fn reap_idle(&mut self, now: Instant) -> Vec<PlayerId> {
        if self.idle_timeout.is_zero() {
            return Vec::new();
        }
        let mut idle: Vec<PlayerId> = self
            .last_seen
            .iter()
            .filter(|(_, seen)| now.saturating_duration_since(**seen) > self.idle_timeout)
            .map(|(id, _)| id.clone())
            .collect();
        idle.sort();
        for id in &idle {
            info!(player = %id, "idle player disconnected");
            self.disconnect(id);
        }
        idle
    }

    #[cfg(test)]
    pub fn pending(&self, player: &PlayerId) -> &[ServerMessage] {
        self.mailboxes
            .get(player)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn disconnect(&mut self, id: &PlayerId) {
        let mut outbox = Outbox::default();
        if let Err(err) = self.manager.remove_player(id, &mut outbox) {
            warn!(player = %id, error = %err, "disconnect of unseated player");
        }
        self.forget(id);
        self.deliver(&mut outbox);
    }

    fn forget(&mut self, id: &PlayerId) {
        self.seats.retain(|_, seat| seat != id);
        self.mailboxes.remove(id);
        self.last_seen.remove(id);
    }

    /// Resolves the seat a token speaks for and marks it alive. Unknown
    /// tokens are rejected before the game is touched.
    fn authenticate(&mut self, token: &SessionToken, now: Instant) -> Result<PlayerId, ApiResponse> {
        let Some(id) = self.seats.get(token).cloned() else {
            warn!("request with unknown session token");
            return Err(ApiResponse::failure("unknown session token"));
        };
        self.last_seen.insert(id.clone(), now);
        Ok(id)
    }

    fn deliver(&mut self, outbox: &mut Outbox) {
        for envelope in outbox.drain() {
            for (id, mailbox) in self.mailboxes.iter_mut() {
                if envelope.recipient.includes(id) {
                    enqueue(mailbox, envelope.message.clone());
                }
            }
        }
    }

    /// Answers the requester: rejections go to them alone, as an `error`
    /// message in their mailbox and in the response.
    fn reply(&mut self, id: &PlayerId, result: Result<(), SessionError>) -> ApiResponse {
        let error = result.err().map(|err| {
            warn!(player = %id, error = %err, "request rejected");
            err.to_string()
        });
        let mailbox = self.mailboxes.entry(id.clone()).or_default();
        if let Some(message) = &error {
            enqueue(
                mailbox,
                ServerMessage::Error {
                    message: message.clone(),
                },
            );
        }
        ApiResponse {
            ok: error.is_none(),
            error,
            player_id: None,
            token: None,
            messages: std::mem::take(mailbox),
        }
    }
}

/// A newer state supersedes any undelivered one; the mailbox never grows past
/// `MAILBOX_LIMIT`.
fn enqueue(mailbox: &mut Vec<ServerMessage>, message: ServerMessage) {
    if matches!(message, ServerMessage::GameState(_)) {
        mailbox.retain(|queued| !matches!(queued, ServerMessage::GameState(_)));
    }
    mailbox.push(message);
    if mailbox.len() > MAILBOX_LIMIT {
        let excess = mailbox.len() - MAILBOX_LIMIT;
        mailbox.drain(..excess);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crosscards_core::{CardDefinition, Dimensions, GameStatus};

    fn app(idle_secs: u64) -> AppState {
        let cards = (1..=20)
            .map(|idx| {
                CardDefinition::new(
                    format!("c{idx}"),
                    format!("Card {idx}"),
                    Dimensions::Both {
                        height: idx as f64,
                        width: idx as f64,
                    },
                )
            })
            .collect();
        let catalog = Arc::new(CardCatalog::new(cards).expect("catalog"));
        let config = GameConfig {
            seed: Some(5),
            ..GameConfig::default()
        };
        AppState::new(config, catalog, Duration::from_secs(idle_secs))
    }

    fn join(app: &mut AppState, name: &str, now: Instant) -> (PlayerId, SessionToken) {
        let response = app.join(
            JoinRequest {
                name: Some(name.to_string()),
            },
            now,
        );
        assert!(response.ok, "{:?}", response.error);
        (
            response.player_id.expect("player id"),
            response.token.expect("token"),
        )
    }

    fn seat(token: &SessionToken) -> SeatRequest {
        SeatRequest {
            token: token.clone(),
        }
    }

    fn first_card(app: &AppState, player: &PlayerId) -> CardId {
        app.manager().session().hand(player)[0].id.clone()
    }

    fn origin_move(token: &SessionToken, card_id: CardId) -> MoveRequest {
        MoveRequest {
            token: token.clone(),
            card_id,
            place_at: "0,0".to_string(),
            insertion_mode: false,
        }
    }

    #[test]
    fn join_assigns_ids_tokens_and_notifies_others() {
        let mut app = app(30);
        let now = Instant::now();
        let (alice, alice_token) = join(&mut app, "Alice", now);
        let (bob, bob_token) = join(&mut app, "Bob", now);
        assert_eq!(alice, PlayerId::new("p1"));
        assert_eq!(bob, PlayerId::new("p2"));
        assert_ne!(alice_token, bob_token);
        assert_eq!(alice_token.as_str().len(), 32);
        assert_ne!(alice_token.as_str(), alice.as_str());
        assert!(matches!(
            app.pending(&alice),
            [ServerMessage::PlayerJoined(joined)] if joined.player_name == "Bob"
        ));
        assert!(app.pending(&bob).is_empty());
    }

    #[test]
    fn move_flow_updates_mailboxes() {
        let mut app = app(30);
        let now = Instant::now();
        let (alice, alice_token) = join(&mut app, "Alice", now);
        let (bob, bob_token) = join(&mut app, "Bob", now);
        let started = app.start(seat(&bob_token), now);
        assert!(started.ok);
        assert!(matches!(
            started.messages.last(),
            Some(ServerMessage::GameState(view)) if view.game_status == GameStatus::Running
        ));

        let card = first_card(&app, &alice);
        let played = app.play(origin_move(&alice_token, card), now);
        assert!(played.ok, "{:?}", played.error);
        let events = app.events(&bob_token, now);
        let ServerMessage::GameState(view) = events.messages.last().expect("state") else {
            panic!("expected game state");
        };
        assert_eq!(view.board.len(), 1);
        assert_eq!(view.current_player, Some(bob.clone()));
        assert!(app.pending(&bob).is_empty());
    }

    #[test]
    fn rejections_reach_only_the_requester() {
        let mut app = app(30);
        let now = Instant::now();
        let (alice, alice_token) = join(&mut app, "Alice", now);
        let (bob, bob_token) = join(&mut app, "Bob", now);
        app.start(seat(&alice_token), now);
        app.events(&bob_token, now);

        let card = first_card(&app, &bob);
        let response = app.play(origin_move(&bob_token, card), now);
        assert!(!response.ok);
        assert_eq!(response.error.as_deref(), Some("not your turn"));
        assert_eq!(
            response.messages,
            vec![ServerMessage::Error {
                message: "not your turn".to_string()
            }]
        );
        assert!(app
            .pending(&alice)
            .iter()
            .all(|m| !matches!(m, ServerMessage::Error { .. })));

        let mut malformed = origin_move(&alice_token, first_card(&app, &alice));
        malformed.place_at = "zero,zero".to_string();
        let malformed = app.play(malformed, now);
        assert!(!malformed.ok);
        assert!(malformed
            .error
            .as_deref()
            .is_some_and(|e| e.contains("malformed")));

        let mut far = origin_move(&alice_token, first_card(&app, &alice));
        far.place_at = "2147483647,0".to_string();
        let far = app.play(far, now);
        assert!(far.error.as_deref().is_some_and(|e| e.contains("malformed")));
        assert_eq!(app.manager().status(), GameStatus::Running);
    }

    #[test]
    fn player_ids_do_not_grant_access_to_a_seat() {
        let mut app = app(30);
        let now = Instant::now();
        let (alice, alice_token) = join(&mut app, "Alice", now);
        let (bob, _) = join(&mut app, "Bob", now);
        app.start(seat(&alice_token), now);
        let pending_before = app.pending(&bob).len();

        let guessed = SessionToken::new(bob.as_str());
        let view = app.state(Some(&guessed), now);
        assert_eq!(view.player_id, None);
        let ServerMessage::GameState(view) = &view.messages[0] else {
            panic!("expected state");
        };
        assert!(view.player_hand.is_empty());

        assert!(!app.events(&guessed, now).ok);
        assert_eq!(app.pending(&bob).len(), pending_before);
        assert!(!app.start(seat(&guessed), now).ok);
        let card = first_card(&app, &alice);
        assert!(!app.play(origin_move(&SessionToken::new(alice.as_str()), card), now).ok);
        assert!(!app.leave(seat(&guessed), now).ok);
        assert_eq!(app.manager().session().player_count(), 2);
        assert!(app.manager().session().board.is_empty());
    }

    #[test]
    fn leaving_stops_the_round_and_informs_the_rest() {
        let mut app = app(30);
        let now = Instant::now();
        let (alice, alice_token) = join(&mut app, "Alice", now);
        let (bob, bob_token) = join(&mut app, "Bob", now);
        app.start(seat(&alice_token), now);
        app.events(&alice_token, now);

        let response = app.leave(seat(&bob_token), now);
        assert!(response.ok);
        assert_eq!(app.manager().status(), GameStatus::Waiting);
        assert!(app
            .pending(&alice)
            .iter()
            .any(|m| matches!(m, ServerMessage::Notice { .. })));
        assert!(app
            .pending(&alice)
            .iter()
            .any(|m| matches!(m, ServerMessage::PlayerLeft(left) if left.player_count == 1)));
        assert!(app.pending(&bob).is_empty());
        assert!(!app.events(&bob_token, now).ok);
    }

    #[test]
    fn idle_players_are_reaped() {
        let mut app = app(10);
        let start = Instant::now();
        let (alice, alice_token) = join(&mut app, "Alice", start);
        let (bob, bob_token) = join(&mut app, "Bob", start);
        let later = start + Duration::from_secs(8);
        app.events(&alice_token, later);

        let reaped = app.reap_idle(start + Duration::from_secs(12));
        assert_eq!(reaped, vec![bob]);
        assert_eq!(app.manager().session().player_count(), 1);
        assert!(!app.events(&bob_token, later).ok);
        assert!(app.reap_idle(start + Duration::from_secs(17)).is_empty());
        assert_eq!(app.reap_idle(start + Duration::from_secs(19)), vec![alice]);
    }

    #[test]
    fn zero_timeout_never_reaps() {
        let mut app = app(0);
        let start = Instant::now();
        join(&mut app, "Alice", start);
        assert!(app.reap_idle(start + Duration::from_secs(3600)).is_empty());
    }

    #[test]
    fn uncollected_mailbox_stays_bounded() {
        let mut app = app(0);
        let now = Instant::now();
        let (idle, _) = join(&mut app, "Idle", now);
        for round in 0..200 {
            let (_, token) = join(&mut app, &format!("Guest {round}"), now);
            assert!(app.leave(seat(&token), now).ok);
        }
        let pending = app.pending(&idle);
        assert!(pending.len() <= MAILBOX_LIMIT);
        let states = pending
            .iter()
            .filter(|m| matches!(m, ServerMessage::GameState(_)))
            .count();
        assert_eq!(states, 1);
        assert!(matches!(pending.last(), Some(ServerMessage::GameState(_))));
    }

    #[test]
    fn spectator_state_has_no_hand() {
        let mut app = app(30);
        let now = Instant::now();
        let (_, alice_token) = join(&mut app, "Alice", now);
        let (bob, bob_token) = join(&mut app, "Bob", now);
        app.start(seat(&alice_token), now);
        let response = app.state(None, now);
        let ServerMessage::GameState(view) = &response.messages[0] else {
            panic!("expected state");
        };
        assert!(view.player_hand.is_empty());
        assert_eq!(view.players.len(), 2);
        let own = app.state(Some(&bob_token), now);
        assert_eq!(own.player_id, Some(bob));
        let ServerMessage::GameState(view) = &own.messages[0] else {
            panic!("expected state");
        };
        assert_eq!(view.player_hand.len(), 5);
    }
}
