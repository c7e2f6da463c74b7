use std::fmt;

use serde::{Deserialize, Serialize};

/// 牌组中的总牌数（3^4）。
pub const DECK_SIZE: usize = 81;

/// 卡牌的形状。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    Diamond,
    Oval,
    Squiggle,
}

/// 卡牌的颜色。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Green,
    Purple,
}

/// 图形的数量。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Number {
    One,
    Two,
    Three,
}

/// 填充方式。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Shading {
    Solid,
    Open,
    Striped,
}

impl Shape {
    pub const ALL: [Shape; 3] = [Shape::Diamond, Shape::Oval, Shape::Squiggle];
}

impl Color {
    pub const ALL: [Color; 3] = [Color::Red, Color::Green, Color::Purple];

    /// 前端绘制时使用的颜色值。
    pub fn hex(self) -> &'static str {
        match self {
            Color::Red => "#FF0000",
            Color::Green => "#00FF00",
            Color::Purple => "#800080",
        }
    }
}

impl Number {
    pub const ALL: [Number; 3] = [Number::One, Number::Two, Number::Three];

    pub fn count(self) -> u8 {
        match self {
            Number::One => 1,
            Number::Two => 2,
            Number::Three => 3,
        }
    }
}

impl Shading {
    pub const ALL: [Shading; 3] = [Shading::Solid, Shading::Open, Shading::Striped];
}

/// 一张卡牌：四个互相独立的属性。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Card {
    pub shape: Shape,
    pub color: Color,
    pub number: Number,
    pub shading: Shading,
}

impl Card {
    pub const fn new(shape: Shape, color: Color, number: Number, shading: Shading) -> Self {
        Self {
            shape,
            color,
            number,
            shading,
        }
    }

    /// 按枚举顺序（形状在最外层，填充在最内层）把 0..81 映射为卡牌。
    pub fn from_ordinal(ordinal: u8) -> Option<Self> {
        let ordinal = ordinal as usize;
        if ordinal >= DECK_SIZE {
            return None;
        }
        Some(Self::new(
            Shape::ALL[ordinal / 27],
            Color::ALL[(ordinal / 9) % 3],
            Number::ALL[(ordinal / 3) % 3],
            Shading::ALL[ordinal % 3],
        ))
    }

    pub fn ordinal(&self) -> u8 {
        self.shape as u8 * 27 + self.color as u8 * 9 + self.number as u8 * 3 + self.shading as u8
    }

    /// 四个属性在各自取值域中的下标。
    pub fn traits(&self) -> [u8; 4] {
        [
            self.shape as u8,
            self.color as u8,
            self.number as u8,
            self.shading as u8,
        ]
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?}/{:?}/{:?}/{:?}",
            self.shape, self.color, self.number, self.shading
        )
    }
}
