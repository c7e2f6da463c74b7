use serde::{Deserialize, Serialize};

use super::card::Card;
use super::deck::{Deck, DeckIndex};

/// 标准棋盘大小。
pub const DEFAULT_BOARD_SIZE: usize = 12;

/// 一次补牌的结果。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Replacement {
    /// 新发到棋盘上的牌组下标，按槽位顺序排列。
    pub dealt: Vec<DeckIndex>,
    /// 因牌组耗尽而被移除的槽位数量。
    pub removed: usize,
}

/// 当前展示的牌组下标，以及下一张未发出的牌的位置。只能由 [`Board::initial`] 创建。
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Board {
    slots: Vec<DeckIndex>,
    next_undealt: DeckIndex,
}

impl Board {
    /// 按牌组顺序取前 `size` 张牌。
    pub fn initial(deck: &Deck, size: usize) -> Self {
        let size = size.min(deck.len());
        Self {
            slots: (0..size).collect(),
            next_undealt: size,
        }
    }

    pub fn slots(&self) -> &[DeckIndex] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn deck_index(&self, slot: usize) -> Option<DeckIndex> {
        self.slots.get(slot).copied()
    }

    pub fn contains(&self, index: DeckIndex) -> bool {
        self.slots.contains(&index)
    }

    pub fn next_undealt(&self) -> DeckIndex {
        self.next_undealt
    }

    pub fn remaining_undealt(&self, deck_len: usize) -> usize {
        deck_len.saturating_sub(self.next_undealt)
    }

    pub fn cards(&self, deck: &Deck) -> Vec<Card> {
        deck.cards_at(&self.slots)
    }

    /// 用后续未发的牌替换刚刚配对成功的三张牌。
    ///
    /// 按槽位顺序逐个补牌；牌组耗尽后剩余的槽位直接移除，其余槽位的相对顺序不变。
    ///
    /// # Panics
    ///
    /// `matched` 中的下标不在棋盘上或彼此重复时 panic：这只可能是调用方的时序错误。
    pub fn replace(&mut self, matched: [DeckIndex; 3], deck_len: usize) -> Replacement {
        for (i, index) in matched.iter().enumerate() {
            assert!(
                self.contains(*index),
                "deck index {index} is not on the board"
            );
            assert!(
                !matched[..i].contains(index),
                "deck index {index} matched twice"
            );
        }

        let mut dealt = Vec::with_capacity(matched.len());
        let mut removed = 0;
        let mut next = Vec::with_capacity(self.slots.len());
        for &index in &self.slots {
            if !matched.contains(&index) {
                next.push(index);
            } else if self.next_undealt < deck_len {
                next.push(self.next_undealt);
                dealt.push(self.next_undealt);
                self.next_undealt += 1;
            } else {
                removed += 1;
            }
        }
        self.slots = next;

        Replacement { dealt, removed }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::game::card::DECK_SIZE;

    fn board_with(slots: Vec<DeckIndex>, next_undealt: DeckIndex) -> Board {
        Board {
            slots,
            next_undealt,
        }
    }

    #[test]
    fn initial_board_takes_first_twelve() {
        let deck = Deck::ordered();
        let board = Board::initial(&deck, DEFAULT_BOARD_SIZE);
        assert_eq!(board.slots(), &(0..12).collect::<Vec<_>>()[..]);
        assert_eq!(board.next_undealt(), 12);
        assert_eq!(board.remaining_undealt(deck.len()), 69);
        assert_eq!(board.cards(&deck)[3], deck.cards()[3]);
    }

    #[test]
    fn replace_keeps_size_and_slot_order() {
        let deck = Deck::ordered();
        let mut board = Board::initial(&deck, DEFAULT_BOARD_SIZE);
        let outcome = board.replace([7, 2, 10], deck.len());

        assert_eq!(outcome.dealt, vec![12, 13, 14]);
        assert_eq!(outcome.removed, 0);
        assert_eq!(
            board.slots(),
            &[0, 1, 12, 3, 4, 5, 6, 13, 8, 9, 14, 11]
        );
        let unique: HashSet<_> = board.slots().iter().collect();
        assert_eq!(unique.len(), DEFAULT_BOARD_SIZE);
    }

    #[test]
    fn cursor_keeps_advancing_across_replacements() {
        let deck = Deck::ordered();
        let mut board = Board::initial(&deck, DEFAULT_BOARD_SIZE);
        board.replace([0, 1, 2], deck.len());
        let outcome = board.replace([12, 4, 13], deck.len());
        assert_eq!(outcome.dealt, vec![15, 16, 17]);
        assert_eq!(board.next_undealt(), 18);
        assert_eq!(board.len(), DEFAULT_BOARD_SIZE);
    }

    #[test]
    fn exhausted_deck_shrinks_board() {
        let mut board = board_with((69..81).collect(), DECK_SIZE);
        let outcome = board.replace([70, 75, 80], DECK_SIZE);
        assert!(outcome.dealt.is_empty());
        assert_eq!(outcome.removed, 3);
        assert_eq!(
            board.slots(),
            &[69, 71, 72, 73, 74, 76, 77, 78, 79]
        );
    }

    #[test]
    fn partially_exhausted_deck_fills_then_shrinks() {
        let mut board = board_with((0..12).collect(), 80);
        let outcome = board.replace([9, 1, 5], DECK_SIZE);
        assert_eq!(outcome.dealt, vec![80]);
        assert_eq!(outcome.removed, 2);
        assert_eq!(board.slots(), &[0, 80, 2, 3, 4, 6, 7, 8, 10, 11]);
        assert_eq!(board.remaining_undealt(DECK_SIZE), 0);
    }

    #[test]
    #[should_panic(expected = "is not on the board")]
    fn replacing_absent_index_panics() {
        let deck = Deck::ordered();
        let mut board = Board::initial(&deck, DEFAULT_BOARD_SIZE);
        board.replace([0, 1, 40], deck.len());
    }

    #[test]
    #[should_panic(expected = "matched twice")]
    fn replacing_repeated_index_panics() {
        let deck = Deck::ordered();
        let mut board = Board::initial(&deck, DEFAULT_BOARD_SIZE);
        board.replace([0, 1, 1], deck.len());
    }
}
