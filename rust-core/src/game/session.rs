use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::board::{Board, Replacement};
use super::config::{ConfigError, SessionConfig};
use super::deck::{Deck, DeckIndex};
use super::rules::{has_any_match, is_match};
use crate::storage::ScoreStore;
use crate::utils::{log, warn};

/// 一局游戏所处的阶段。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    #[default]
    Idle,
    Running,
    Ended,
}

/// 玩家当前选中的牌（最多三张），按牌组下标记录。
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Selection {
    picks: Vec<DeckIndex>,
}

impl Selection {
    pub const MAX: usize = 3;

    pub fn contains(&self, index: DeckIndex) -> bool {
        self.picks.contains(&index)
    }

    pub fn len(&self) -> usize {
        self.picks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.picks.is_empty()
    }

    /// 已选中则取消；未满三张则加入；否则忽略。返回切换后的选中状态，忽略时为 `None`。
    pub fn toggle(&mut self, index: DeckIndex) -> Option<bool> {
        if let Some(pos) = self.picks.iter().position(|&pick| pick == index) {
            self.picks.remove(pos);
            return Some(false);
        }
        if self.picks.len() < Self::MAX {
            self.picks.push(index);
            return Some(true);
        }
        None
    }

    pub fn triple(&self) -> Option<[DeckIndex; 3]> {
        match *self.picks.as_slice() {
            [a, b, c] => Some([a, b, c]),
            _ => None,
        }
    }

    pub fn clear(&mut self) {
        self.picks.clear();
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackKind {
    ValidMatch,
    InvalidMatch,
    NoMatchConfirmed,
    NoMatchRefuted,
}

impl FeedbackKind {
    pub fn message(self) -> &'static str {
        match self {
            FeedbackKind::ValidMatch => "Valid set!",
            FeedbackKind::InvalidMatch => "Not a set.",
            FeedbackKind::NoMatchConfirmed => "Correct, no set!",
            FeedbackKind::NoMatchRefuted => "Incorrect, there is a set.",
        }
    }
}

/// 判定结果的短暂提示，由宿主在延时后按 `token` 清除。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Feedback {
    pub token: u64,
    pub kind: FeedbackKind,
    pub message: String,
}

/// 会话事件流。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum SessionEvent {
    SessionStarted {
        epoch: u64,
        duration_secs: u32,
        board: Vec<DeckIndex>,
    },
    SelectionChanged {
        slot: usize,
        deck_index: DeckIndex,
        selected: bool,
    },
    MatchAccepted {
        cards: [DeckIndex; 3],
        replacement: Replacement,
        score: i32,
    },
    MatchRejected {
        cards: [DeckIndex; 3],
        score: i32,
    },
    NoMatchConfirmed {
        score: i32,
    },
    NoMatchRefuted {
        score: i32,
    },
    FeedbackShown {
        feedback: Feedback,
    },
    FeedbackCleared {
        token: u64,
    },
    Ticked {
        remaining_secs: u32,
    },
    SessionEnded {
        score: i32,
        persisted: bool,
    },
    SessionAbandoned {
        score: i32,
    },
    Acknowledged,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[serde(tag = "type")]
pub enum SessionError {
    #[error("expected phase {expected:?}, session is {actual:?}")]
    InvalidPhase {
        expected: SessionPhase,
        actual: SessionPhase,
    },
    #[error("slot {slot} is outside the board of {board_len}")]
    SlotOutOfRange { slot: usize, board_len: usize },
    #[error("invalid config: {error}")]
    InvalidConfig { error: ConfigError },
}

/// 进行中的一局：牌组、棋盘与选择只在这一局内存在。
#[derive(Debug, Clone)]
struct Round {
    deck: Deck,
    board: Board,
    selection: Selection,
}

#[derive(Debug, Clone)]
enum Stage {
    Idle,
    Running(Round),
    Ended,
}

/// 会话状态机：Idle → Running → Ended → Idle …
///
/// 历史得分在创建时从存储读取一次，之后只在内存中追加，并在每次倒计时结束时整体写回。
/// 所有动作都通过 `&mut self` 串行执行。倒计时以 `epoch` 标识：每次开始、重置或结束都会
/// 递增 `epoch`，旧的计时器带着过期的 `epoch` 调用 [`Session::tick`] 时不会产生任何效果。
pub struct Session {
    config: SessionConfig,
    stage: Stage,
    score: i32,
    remaining_secs: u32,
    history: Vec<i32>,
    epoch: u64,
    feedback: Option<Feedback>,
    feedback_seq: u64,
    rng: SmallRng,
    store: Box<dyn ScoreStore>,
}

impl Session {
    pub fn new(config: SessionConfig, store: Box<dyn ScoreStore>) -> Result<Self, SessionError> {
        Self::with_rng(config, store, SmallRng::from_entropy())
    }

    pub fn with_seed(
        config: SessionConfig,
        store: Box<dyn ScoreStore>,
        seed: u64,
    ) -> Result<Self, SessionError> {
        Self::with_rng(config, store, SmallRng::seed_from_u64(seed))
    }

    fn with_rng(
        config: SessionConfig,
        store: Box<dyn ScoreStore>,
        rng: SmallRng,
    ) -> Result<Self, SessionError> {
        config
            .validate()
            .map_err(|error| SessionError::InvalidConfig { error })?;
        let history = store.load().unwrap_or_else(|err| {
            warn(&format!("score history unreadable, starting empty: {err}"));
            Vec::new()
        });
        Ok(Self {
            remaining_secs: config.duration_secs,
            config,
            stage: Stage::Idle,
            score: 0,
            history,
            epoch: 0,
            feedback: None,
            feedback_seq: 0,
            rng,
            store,
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn phase(&self) -> SessionPhase {
        match self.stage {
            Stage::Idle => SessionPhase::Idle,
            Stage::Running(_) => SessionPhase::Running,
            Stage::Ended => SessionPhase::Ended,
        }
    }

    pub fn score(&self) -> i32 {
        self.score
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn history(&self) -> &[i32] {
        &self.history
    }

    /// 当前倒计时的标识，计时器在启动时记录它并随每次 tick 传回。
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn feedback(&self) -> Option<&Feedback> {
        self.feedback.as_ref()
    }

    pub fn deck(&self) -> Option<&Deck> {
        self.round().map(|round| &round.deck)
    }

    pub fn board(&self) -> Option<&Board> {
        self.round().map(|round| &round.board)
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.round().map(|round| &round.selection)
    }

    fn round(&self) -> Option<&Round> {
        match &self.stage {
            Stage::Running(round) => Some(round),
            _ => None,
        }
    }

    fn ensure_phase(&self, expected: SessionPhase) -> Result<(), SessionError> {
        let actual = self.phase();
        if actual != expected {
            return Err(SessionError::InvalidPhase { expected, actual });
        }
        Ok(())
    }

    fn running_round_mut(&mut self) -> Result<&mut Round, SessionError> {
        let actual = self.phase();
        match &mut self.stage {
            Stage::Running(round) => Ok(round),
            _ => Err(SessionError::InvalidPhase {
                expected: SessionPhase::Running,
                actual,
            }),
        }
    }

    fn show_feedback(&mut self, kind: FeedbackKind) -> SessionEvent {
        self.feedback_seq += 1;
        let feedback = Feedback {
            token: self.feedback_seq,
            kind,
            message: kind.message().to_string(),
        };
        log(&feedback.message);
        self.feedback = Some(feedback.clone());
        SessionEvent::FeedbackShown { feedback }
    }

    /// 用新洗好的牌开始一局。
    pub fn start(&mut self) -> Result<Vec<SessionEvent>, SessionError> {
        self.ensure_phase(SessionPhase::Idle)?;
        let deck = Deck::shuffled(&mut self.rng);
        self.start_with_deck(deck)
    }

    /// 用调用方提供的牌组开始一局。
    pub fn start_with_deck(&mut self, deck: Deck) -> Result<Vec<SessionEvent>, SessionError> {
        self.ensure_phase(SessionPhase::Idle)?;

        let board = Board::initial(&deck, self.config.board_size);
        let slots = board.slots().to_vec();
        self.stage = Stage::Running(Round {
            deck,
            board,
            selection: Selection::default(),
        });
        self.score = 0;
        self.remaining_secs = self.config.duration_secs;
        self.feedback = None;
        self.epoch += 1;
        log(&format!("session {} started", self.epoch));

        Ok(vec![SessionEvent::SessionStarted {
            epoch: self.epoch,
            duration_secs: self.remaining_secs,
            board: slots,
        }])
    }

    /// 倒计时走一秒；归零时自动结算。过期或不在进行中的 tick 被忽略。
    pub fn tick(&mut self, epoch: u64) -> Vec<SessionEvent> {
        if epoch != self.epoch || self.phase() != SessionPhase::Running || self.remaining_secs == 0 {
            return Vec::new();
        }
        self.remaining_secs -= 1;
        let mut events = vec![SessionEvent::Ticked {
            remaining_secs: self.remaining_secs,
        }];
        if self.remaining_secs == 0 {
            events.push(self.finish());
        }
        events
    }

    fn finish(&mut self) -> SessionEvent {
        self.history.push(self.score);
        let persisted = match self.store.save(&self.history) {
            Ok(()) => true,
            Err(err) => {
                warn(&format!("score history not saved: {err}"));
                false
            }
        };
        self.stage = Stage::Ended;
        self.feedback = None;
        self.epoch += 1;
        log(&format!("session ended with score {}", self.score));
        SessionEvent::SessionEnded {
            score: self.score,
            persisted,
        }
    }

    /// 点击棋盘上的某个槽位。
    pub fn toggle_slot(&mut self, slot: usize) -> Result<Vec<SessionEvent>, SessionError> {
        let round = self.running_round_mut()?;
        let deck_index = round
            .board
            .deck_index(slot)
            .ok_or(SessionError::SlotOutOfRange {
                slot,
                board_len: round.board.len(),
            })?;
        Ok(round
            .selection
            .toggle(deck_index)
            .map(|selected| SessionEvent::SelectionChanged {
                slot,
                deck_index,
                selected,
            })
            .into_iter()
            .collect())
    }

    /// 玩家声明选中的三张牌是一组。不足三张时什么也不做；无论成败都会清空选择。
    pub fn claim_match(&mut self) -> Result<Vec<SessionEvent>, SessionError> {
        let round = self.running_round_mut()?;
        let Some(picked) = round.selection.triple() else {
            return Ok(Vec::new());
        };
        round.selection.clear();
        let [a, b, c] = picked.map(|index| round.deck.cards()[index]);

        if is_match(&a, &b, &c) {
            let deck_len = round.deck.len();
            let replacement = round.board.replace(picked, deck_len);
            self.score = self.score.saturating_add(self.config.match_reward);
            Ok(vec![
                SessionEvent::MatchAccepted {
                    cards: picked,
                    replacement,
                    score: self.score,
                },
                self.show_feedback(FeedbackKind::ValidMatch),
            ])
        } else {
            Ok(vec![
                SessionEvent::MatchRejected {
                    cards: picked,
                    score: self.score,
                },
                self.show_feedback(FeedbackKind::InvalidMatch),
            ])
        }
    }

    /// 玩家声明棋盘上不存在任何一组。选择和棋盘都不受影响。
    pub fn claim_no_match(&mut self) -> Result<Vec<SessionEvent>, SessionError> {
        let round = self.running_round_mut()?;
        let cards = round.board.cards(&round.deck);

        if has_any_match(&cards) {
            self.score = self.score.saturating_sub(self.config.no_match_penalty);
            Ok(vec![
                SessionEvent::NoMatchRefuted { score: self.score },
                self.show_feedback(FeedbackKind::NoMatchRefuted),
            ])
        } else {
            self.score = self.score.saturating_add(self.config.no_match_reward);
            Ok(vec![
                SessionEvent::NoMatchConfirmed { score: self.score },
                self.show_feedback(FeedbackKind::NoMatchConfirmed),
            ])
        }
    }

    /// 仅当 `token` 仍是当前提示时清除它。
    pub fn clear_feedback(&mut self, token: u64) -> Vec<SessionEvent> {
        match &self.feedback {
            Some(feedback) if feedback.token == token => {
                self.feedback = None;
                vec![SessionEvent::FeedbackCleared { token }]
            }
            _ => Vec::new(),
        }
    }

    /// 结算界面确认后回到空闲状态。
    pub fn acknowledge(&mut self) -> Result<Vec<SessionEvent>, SessionError> {
        self.ensure_phase(SessionPhase::Ended)?;
        self.stage = Stage::Idle;
        Ok(vec![SessionEvent::Acknowledged])
    }

    /// 中途放弃当前一局，不计入历史得分。
    pub fn reset(&mut self) -> Result<Vec<SessionEvent>, SessionError> {
        self.ensure_phase(SessionPhase::Running)?;
        self.stage = Stage::Idle;
        self.feedback = None;
        self.epoch += 1;
        log(&format!("session abandoned at score {}", self.score));
        Ok(vec![SessionEvent::SessionAbandoned { score: self.score }])
    }

    /// 放弃当前一局并立即开始新的一局。
    pub fn restart(&mut self) -> Result<Vec<SessionEvent>, SessionError> {
        let mut events = self.reset()?;
        events.extend(self.start()?);
        Ok(events)
    }
}
