//! 游戏核心逻辑模块（牌组、判定规则、棋盘与会话状态机）。

pub mod board;
pub mod card;
pub mod config;
pub mod deck;
pub mod rules;
pub mod session;
pub mod view;

pub use board::{Board, Replacement, DEFAULT_BOARD_SIZE};
pub use card::{Card, Color, Number, Shading, Shape, DECK_SIZE};
pub use config::{ConfigError, SessionConfig};
pub use deck::{generate_deck, Deck, DeckError, DeckIndex};
pub use rules::{completing_card, find_match, has_any_match, is_match};
pub use session::{
    Feedback, FeedbackKind, Selection, Session, SessionError, SessionEvent, SessionPhase,
};
pub use view::{format_clock, SessionView, SlotView};
