use serde::Serialize;

use super::card::Card;
use super::deck::DeckIndex;
use super::session::{Feedback, Session, SessionPhase};

/// 棋盘上一个槽位的展示数据。
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SlotView {
    pub slot: usize,
    pub deck_index: DeckIndex,
    pub card: Card,
    pub color_hex: &'static str,
    pub count: u8,
    pub selected: bool,
}

/// 渲染层只读取这一份快照。
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SessionView {
    pub phase: SessionPhase,
    pub score: i32,
    pub remaining_secs: u32,
    pub clock: String,
    pub slots: Vec<SlotView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<Feedback>,
    pub history: Vec<i32>,
}

/// 把秒数格式化为 `m:ss`。
pub fn format_clock(secs: u32) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

impl Session {
    pub fn view(&self) -> SessionView {
        let slots = match (self.deck(), self.board(), self.selection()) {
            (Some(deck), Some(board), Some(selection)) => board
                .slots()
                .iter()
                .enumerate()
                .filter_map(|(slot, &deck_index)| {
                    let card = *deck.get(deck_index)?;
                    Some(SlotView {
                        slot,
                        deck_index,
                        card,
                        color_hex: card.color.hex(),
                        count: card.number.count(),
                        selected: selection.contains(deck_index),
                    })
                })
                .collect(),
            _ => Vec::new(),
        };

        SessionView {
            phase: self.phase(),
            score: self.score(),
            remaining_secs: self.remaining_secs(),
            clock: format_clock(self.remaining_secs()),
            slots,
            feedback: self.feedback().cloned(),
            history: self.history().to_vec(),
        }
    }
}
