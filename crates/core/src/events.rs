use crate::{Board, CardDefinition, Player, PlayerId};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Waiting,
    Running,
    Ended,
}

/// What one player is allowed to see: everyone's board, only their own hand.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GameView {
    pub players: Vec<Player>,
    pub board: Board,
    pub current_player: Option<PlayerId>,
    pub game_status: GameStatus,
    pub player_hand: Vec<CardDefinition>,
    pub deck_count: usize,
    pub last_round: Option<RoundEndReport>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoundEndReport {
    pub loser: PlayerId,
    pub loser_name: String,
    pub reason: String,
    pub card_played: CardDefinition,
    pub board_state: Board,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlayerJoined {
    pub player_id: PlayerId,
    pub player_name: String,
    pub player_count: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlayerLeft {
    pub player_id: PlayerId,
    pub player_count: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerMessage {
    GameState(GameView),
    PlayerJoined(PlayerJoined),
    PlayerLeft(PlayerLeft),
    RoundEnd(RoundEndReport),
    Notice { message: String },
    Error { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    All,
    Player(PlayerId),
    AllExcept(PlayerId),
}

impl Recipient {
    pub fn includes(&self, player: &PlayerId) -> bool {
        match self {
            Self::All => true,
            Self::Player(id) => id == player,
            Self::AllExcept(id) => id != player,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub recipient: Recipient,
    pub message: ServerMessage,
}

/// Outbound messages queued by the session until the transport delivers them.
#[derive(Debug, Default)]
pub struct Outbox {
    queue: Vec<Envelope>,
}

impl Outbox {
    pub fn push(&mut self, recipient: Recipient, message: ServerMessage) {
        self.queue.push(Envelope { recipient, message });
    }

    pub fn send_to(&mut self, player: &PlayerId, message: ServerMessage) {
        self.push(Recipient::Player(player.clone()), message);
    }

    pub fn broadcast(&mut self, message: ServerMessage) {
        self.push(Recipient::All, message);
    }

    pub fn broadcast_except(&mut self, player: &PlayerId, message: ServerMessage) {
        self.push(Recipient::AllExcept(player.clone()), message);
    }

    pub fn drain(&mut self) -> impl Iterator<Item = Envelope> + '_ {
        self.queue.drain(..)
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Messages queued so far that `player` would receive.
    pub fn messages_for<'a>(
        &'a self,
        player: &'a PlayerId,
    ) -> impl Iterator<Item = &'a ServerMessage> + 'a {
        self.queue
            .iter()
            .filter(move |envelope| envelope.recipient.includes(player))
            .map(|envelope| &envelope.message)
    }
}
