use std::collections::HashSet;

use once_cell::sync::Lazy;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::card::{Card, Color, Number, Shading, Shape, DECK_SIZE};

/// 牌组内的位置标识（0..81）。
pub type DeckIndex = usize;

/// 按枚举顺序排列的完整牌组，洗牌前的起点。
static ORDERED_CARDS: Lazy<Vec<Card>> = Lazy::new(|| {
    let mut cards = Vec::with_capacity(DECK_SIZE);
    for shape in Shape::ALL {
        for color in Color::ALL {
            for number in Number::ALL {
                for shading in Shading::ALL {
                    cards.push(Card::new(shape, color, number, shading));
                }
            }
        }
    }
    cards
});

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[serde(tag = "type")]
pub enum DeckError {
    #[error("deck must hold {expected} cards, got {actual}")]
    WrongSize { expected: usize, actual: usize },
    #[error("card {card} appears more than once")]
    DuplicateCard { card: Card },
}

/// 一局游戏使用的牌组：生成后不可变，棋盘只保存其中的下标。
///
/// 序列化为卡牌数组；反序列化经过 [`Deck::from_cards`] 校验。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "Vec<Card>", into = "Vec<Card>")]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    /// 未洗牌的完整牌组。
    pub fn ordered() -> Self {
        Self {
            cards: ORDERED_CARDS.clone(),
        }
    }

    /// 生成完整牌组后做一次 Fisher–Yates 洗牌。
    pub fn shuffled<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut deck = Self::ordered();
        deck.cards.shuffle(rng);
        deck
    }

    /// 使用调用方给定的顺序，必须恰好是 81 张牌的一个排列。
    pub fn from_cards(cards: Vec<Card>) -> Result<Self, DeckError> {
        if cards.len() != DECK_SIZE {
            return Err(DeckError::WrongSize {
                expected: DECK_SIZE,
                actual: cards.len(),
            });
        }
        let mut seen = HashSet::with_capacity(DECK_SIZE);
        for card in &cards {
            if !seen.insert(*card) {
                return Err(DeckError::DuplicateCard { card: *card });
            }
        }
        Ok(Self { cards })
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn get(&self, index: DeckIndex) -> Option<&Card> {
        self.cards.get(index)
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// 取出一组下标对应的卡牌；越界下标被跳过。
    pub fn cards_at(&self, indices: &[DeckIndex]) -> Vec<Card> {
        indices
            .iter()
            .filter_map(|&index| self.cards.get(index).copied())
            .collect()
    }
}

impl TryFrom<Vec<Card>> for Deck {
    type Error = DeckError;

    fn try_from(cards: Vec<Card>) -> Result<Self, Self::Error> {
        Self::from_cards(cards)
    }
}

impl From<Deck> for Vec<Card> {
    fn from(deck: Deck) -> Self {
        deck.cards
    }
}

/// 使用系统熵源生成一副新洗好的牌。
pub fn generate_deck() -> Deck {
    let mut rng = SmallRng::from_entropy();
    Deck::shuffled(&mut rng)
}
