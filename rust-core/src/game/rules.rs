use super::card::{Card, Color, Number, Shading, Shape};

fn distinct_values(a: u8, b: u8, c: u8) -> usize {
    1 + usize::from(b != a) + usize::from(c != a && c != b)
}

/// 三张牌在每个属性上都必须“全部相同”或“两两不同”。
pub fn is_match(a: &Card, b: &Card, c: &Card) -> bool {
    let (a, b, c) = (a.traits(), b.traits(), c.traits());
    (0..4).all(|attr| matches!(distinct_values(a[attr], b[attr], c[attr]), 1 | 3))
}

/// 按 i<j<k 的顺序枚举所有三元组，返回第一个合法组合的下标。
pub fn find_match(cards: &[Card]) -> Option<[usize; 3]> {
    let n = cards.len();
    for i in 0..n.saturating_sub(2) {
        for j in (i + 1)..n.saturating_sub(1) {
            for k in (j + 1)..n {
                if is_match(&cards[i], &cards[j], &cards[k]) {
                    return Some([i, j, k]);
                }
            }
        }
    }
    None
}

/// 判断一组牌里是否存在任意一个合法组合。
pub fn has_any_match(cards: &[Card]) -> bool {
    find_match(cards).is_some()
}

/// 与 `a`、`b` 组成合法组合的唯一第三张牌。
pub fn completing_card(a: &Card, b: &Card) -> Card {
    // 取值下标之和必须是 3 的倍数
    let third = |x: u8, y: u8| ((6 - x - y) % 3) as usize;
    let (ta, tb) = (a.traits(), b.traits());
    Card::new(
        Shape::ALL[third(ta[0], tb[0])],
        Color::ALL[third(ta[1], tb[1])],
        Number::ALL[third(ta[2], tb[2])],
        Shading::ALL[third(ta[3], tb[3])],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(ordinals: [u8; 4]) -> Card {
        Card::new(
            Shape::ALL[ordinals[0] as usize],
            Color::ALL[ordinals[1] as usize],
            Number::ALL[ordinals[2] as usize],
            Shading::ALL[ordinals[3] as usize],
        )
    }

    fn known_match() -> [Card; 3] {
        [
            Card::new(Shape::Diamond, Color::Red, Number::One, Shading::Solid),
            Card::new(Shape::Oval, Color::Green, Number::Two, Shading::Open),
            Card::new(Shape::Squiggle, Color::Purple, Number::Three, Shading::Striped),
        ]
    }

    /// 每个属性只取前两个值的 16 张牌里不存在任何合法组合。
    fn cap_cards() -> Vec<Card> {
        let mut cards = Vec::new();
        for bits in 0u8..16 {
            cards.push(card([
                bits & 1,
                (bits >> 1) & 1,
                (bits >> 2) & 1,
                (bits >> 3) & 1,
            ]));
        }
        cards
    }

    #[test]
    fn all_different_triple_is_a_match() {
        let [a, b, c] = known_match();
        assert!(is_match(&a, &b, &c));
    }

    #[test]
    fn two_same_one_different_is_not_a_match() {
        let a = Card::new(Shape::Diamond, Color::Red, Number::One, Shading::Solid);
        let b = Card::new(Shape::Diamond, Color::Red, Number::Two, Shading::Solid);
        let c = Card::new(Shape::Diamond, Color::Red, Number::One, Shading::Open);
        assert!(!is_match(&a, &b, &c));
    }

    #[test]
    fn mixed_same_and_different_attributes_match() {
        let a = card([0, 0, 0, 1]);
        let b = card([0, 1, 1, 1]);
        let c = card([0, 2, 2, 1]);
        assert!(is_match(&a, &b, &c));
    }

    #[test]
    fn match_ignores_argument_order() {
        let [a, b, c] = known_match();
        let orders = [
            (a, b, c),
            (a, c, b),
            (b, a, c),
            (b, c, a),
            (c, a, b),
            (c, b, a),
        ];
        for (x, y, z) in orders {
            assert!(is_match(&x, &y, &z));
        }
    }

    #[test]
    fn cap_board_has_no_match() {
        let board: Vec<Card> = cap_cards().into_iter().take(12).collect();
        assert!(!has_any_match(&board));
        assert_eq!(find_match(&board), None);
    }

    #[test]
    fn board_with_known_match_is_detected() {
        let [a, b, c] = known_match();
        let mut board: Vec<Card> = cap_cards()
            .into_iter()
            .filter(|card| *card != a && *card != b && *card != c)
            .take(9)
            .collect();
        board.insert(2, a);
        board.insert(7, b);
        board.push(c);
        assert_eq!(board.len(), 12);
        assert!(has_any_match(&board));
        let [i, j, k] = find_match(&board).expect("a match is on the board");
        assert!(i < j && j < k);
        assert!(is_match(&board[i], &board[j], &board[k]));
    }

    #[test]
    fn fewer_than_three_cards_never_match() {
        let [a, b, _] = known_match();
        assert!(!has_any_match(&[]));
        assert!(!has_any_match(&[a]));
        assert!(!has_any_match(&[a, b]));
    }

    #[test]
    fn completing_card_closes_the_triple() {
        let a = card([0, 1, 2, 0]);
        let b = card([0, 2, 2, 1]);
        let c = completing_card(&a, &b);
        assert_eq!(c, card([0, 0, 2, 2]));
        assert!(is_match(&a, &b, &c));
    }
}
