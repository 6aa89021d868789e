use crate::{
    Board, CardCatalog, CardDefinition, CardId, Deck, GameConfig, GameStatus, GameView, Outbox,
    Placement, Player, PlayerId, PlayerJoined, PlayerLeft, Position, RequestError, RngState,
    RoundEndReport, ServerMessage, TurnOrder,
};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

pub type Hand = Vec<CardDefinition>;

/// Rejections that leave the game untouched and are reported to the
/// requesting player only.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error("game is not running")]
    NotRunning,
    #[error("not your turn")]
    NotYourTurn,
    #[error("card not in hand")]
    CardNotInHand,
    #[error("game already running")]
    AlreadyRunning,
    #[error("not enough players ({have} of {need})")]
    NotEnoughPlayers { have: usize, need: usize },
    #[error("unknown player {0}")]
    UnknownPlayer(PlayerId),
    #[error("player {0} already joined")]
    AlreadyJoined(PlayerId),
    #[error("malformed request: {0}")]
    Malformed(#[from] RequestError),
}

impl SessionError {
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MoveOutcome {
    Placed {
        position: Position,
        next_player: Option<PlayerId>,
    },
    /// The move broke a board rule: the mover lost the round.
    RoundEnded(RoundEndReport),
}

/// Shared state of one game table.
#[derive(Debug, Clone)]
pub struct GameSession {
    pub players: Vec<Player>,
    pub hands: HashMap<PlayerId, Hand>,
    pub board: Board,
    pub deck: Deck,
    pub turns: TurnOrder,
    pub status: GameStatus,
    pub last_round: Option<RoundEndReport>,
}

impl GameSession {
    pub fn new() -> Self {
        Self {
            players: Vec::new(),
            hands: HashMap::new(),
            board: Board::new(),
            deck: Deck::default(),
            turns: TurnOrder::default(),
            status: GameStatus::Waiting,
            last_round: None,
        }
    }

    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|player| &player.id == id)
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn hand(&self, id: &PlayerId) -> &[CardDefinition] {
        self.hands.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whose move it is; nobody holds the turn outside a running round.
    pub fn current_player(&self) -> Option<&PlayerId> {
        if self.status == GameStatus::Running {
            self.turns.current()
        } else {
            None
        }
    }
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Gatekeeper between the transport and the board: checks identity, turn and
/// status, runs the move, and queues what every player should be told.
#[derive(Debug)]
pub struct SessionManager {
    config: GameConfig,
    catalog: Arc<CardCatalog>,
    rng: RngState,
    session: GameSession,
}

impl SessionManager {
    pub fn new(config: GameConfig, catalog: Arc<CardCatalog>) -> Self {
        Self::with_session(config, catalog, GameSession::new())
    }

    pub fn with_session(config: GameConfig, catalog: Arc<CardCatalog>, session: GameSession) -> Self {
        let rng = RngState::from_optional_seed(config.seed);
        Self {
            config,
            catalog,
            rng,
            session,
        }
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn catalog(&self) -> &CardCatalog {
        &self.catalog
    }

    pub fn status(&self) -> GameStatus {
        self.session.status
    }

    pub fn seed(&self) -> u64 {
        self.rng.seed()
    }

    /// Name given to a player who joins without one.
    pub fn default_name(&self) -> String {
        format!("Player {}", self.session.player_count() + 1)
    }

    /// Seats a player. Joining a running round only grants visibility; the
    /// newcomer gets a hand and a turn at the next start.
    pub fn add_player(
        &mut self,
        id: PlayerId,
        display_name: Option<String>,
        outbox: &mut Outbox,
    ) -> Result<(), SessionError> {
        if self.session.player(&id).is_some() {
            return Err(SessionError::AlreadyJoined(id));
        }
        let name = display_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| self.default_name());
        self.session.players.push(Player {
            id: id.clone(),
            name: name.clone(),
        });
        info!(player = %id, name = %name, count = self.session.player_count(), "player joined");
        outbox.send_to(&id, ServerMessage::GameState(self.snapshot_for(&id)));
        outbox.broadcast_except(
            &id,
            ServerMessage::PlayerJoined(PlayerJoined {
                player_id: id.clone(),
                player_name: name,
                player_count: self.session.player_count(),
            }),
        );
        Ok(())
    }

    pub fn remove_player(&mut self, id: &PlayerId, outbox: &mut Outbox) -> Result<(), SessionError> {
        let Some(pos) = self.session.players.iter().position(|p| &p.id == id) else {
            return Err(SessionError::UnknownPlayer(id.clone()));
        };
        self.session.players.remove(pos);
        self.session.hands.remove(id);
        self.session.turns.remove(id);
        info!(player = %id, count = self.session.player_count(), "player left");

        let min = self.config.min_players;
        if self.session.status == GameStatus::Running
            && (self.session.player_count() < min || self.session.turns.len() < min)
        {
            self.session.status = GameStatus::Waiting;
            info!("game stopped, not enough players");
            outbox.broadcast_except(
                id,
                ServerMessage::Notice {
                    message: "game stopped - not enough players".to_string(),
                },
            );
        }
        outbox.broadcast_except(
            id,
            ServerMessage::PlayerLeft(PlayerLeft {
                player_id: id.clone(),
                player_count: self.session.player_count(),
            }),
        );
        self.broadcast_state(outbox);
        Ok(())
    }

    /// Resets deck, board, hands and turn order, then starts a round.
    pub fn start_game(&mut self, requester: &PlayerId, outbox: &mut Outbox) -> Result<(), SessionError> {
        if self.session.player(requester).is_none() {
            return Err(SessionError::UnknownPlayer(requester.clone()));
        }
        if self.session.status == GameStatus::Running {
            return Err(SessionError::AlreadyRunning);
        }
        let have = self.session.player_count();
        let need = self.config.min_players;
        if have < need {
            return Err(SessionError::NotEnoughPlayers { have, need });
        }

        self.session.deck = Deck::shuffled(self.catalog.cards(), &mut self.rng);
        self.session.board.clear();
        self.session.hands.clear();
        self.session.last_round = None;
        let order: Vec<PlayerId> = self.session.players.iter().map(|p| p.id.clone()).collect();
        for id in &order {
            let hand = self.session.deck.draw_cards(self.config.hand_size);
            self.session.hands.insert(id.clone(), hand);
        }
        self.session.turns = TurnOrder::new(order);
        self.session.status = GameStatus::Running;
        info!(
            requester = %requester,
            players = have,
            deck = self.session.deck.len(),
            "game started"
        );
        self.broadcast_state(outbox);
        Ok(())
    }

    /// Plays a card from the requester's hand. A legal move advances the game;
    /// a move that breaks a board rule ends the round with the mover as loser.
    pub fn attempt_move(
        &mut self,
        requester: &PlayerId,
        card_id: &CardId,
        placement: Placement,
        outbox: &mut Outbox,
    ) -> Result<MoveOutcome, SessionError> {
        if self.session.status != GameStatus::Running {
            return Err(SessionError::NotRunning);
        }
        if self.session.current_player() != Some(requester) {
            return Err(SessionError::NotYourTurn);
        }
        if !self.catalog.contains(card_id) {
            return Err(RequestError::UnknownCard(card_id.clone()).into());
        }
        let Some(card) = self
            .session
            .hand(requester)
            .iter()
            .find(|card| &card.id == card_id)
            .cloned()
        else {
            return Err(SessionError::CardNotInHand);
        };

        match self.session.board.place(card.clone(), placement) {
            Ok(position) => {
                if let Some(hand) = self.session.hands.get_mut(requester) {
                    if let Some(idx) = hand.iter().position(|held| &held.id == card_id) {
                        hand.remove(idx);
                    }
                    if let Some(drawn) = self.session.deck.draw() {
                        hand.push(drawn);
                    }
                }
                let next_player = self.session.turns.advance().cloned();
                debug!(
                    player = %requester,
                    card = %card_id,
                    %position,
                    insertion = matches!(placement, Placement::Insert { .. }),
                    "card placed"
                );
                self.broadcast_state(outbox);
                Ok(MoveOutcome::Placed {
                    position,
                    next_player,
                })
            }
            Err(rejection) => {
                let loser_name = self
                    .session
                    .player(requester)
                    .map(|p| p.name.clone())
                    .unwrap_or_default();
                let report = RoundEndReport {
                    loser: requester.clone(),
                    loser_name,
                    reason: rejection.to_string(),
                    card_played: card,
                    board_state: self.session.board.clone(),
                };
                self.session.status = GameStatus::Ended;
                self.session.last_round = Some(report.clone());
                info!(loser = %requester, reason = %report.reason, "round ended");
                outbox.broadcast(ServerMessage::RoundEnd(report.clone()));
                self.broadcast_state(outbox);
                Ok(MoveOutcome::RoundEnded(report))
            }
        }
    }

    pub fn snapshot_for(&self, player: &PlayerId) -> GameView {
        GameView {
            players: self.session.players.clone(),
            board: self.session.board.clone(),
            current_player: self.session.current_player().cloned(),
            game_status: self.session.status,
            player_hand: self.session.hand(player).to_vec(),
            deck_count: self.session.deck.len(),
            last_round: self.session.last_round.clone(),
        }
    }

    fn broadcast_state(&self, outbox: &mut Outbox) {
        for player in &self.session.players {
            outbox.send_to(&player.id, ServerMessage::GameState(self.snapshot_for(&player.id)));
        }
    }
}
