//! Core game logic. Keep this crate free of IO and platform concerns.

pub mod board;
pub mod cards;
pub mod catalog;
pub mod config;
pub mod deck;
pub mod events;
pub mod player;
pub mod rng;
pub mod session;
pub mod turn;

pub use board::*;
pub use cards::*;
pub use catalog::*;
pub use config::*;
pub use deck::*;
pub use events::*;
pub use player::*;
pub use rng::*;
pub use session::*;
pub use turn::*;
