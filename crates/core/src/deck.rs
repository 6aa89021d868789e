use crate::{CardDefinition, RngState};

#[derive(Debug, Default, Clone)]
pub struct Deck {
    cards: Vec<CardDefinition>,
}

impl Deck {
    pub fn new(cards: Vec<CardDefinition>) -> Self {
        Self { cards }
    }

    pub fn shuffled(cards: &[CardDefinition], rng: &mut RngState) -> Self {
        let mut deck = Self::new(cards.to_vec());
        deck.shuffle(rng);
        deck
    }

    pub fn shuffle(&mut self, rng: &mut RngState) {
        rng.shuffle(&mut self.cards);
    }

    /// Takes the top card; an exhausted deck yields nothing.
    pub fn draw(&mut self) -> Option<CardDefinition> {
        self.cards.pop()
    }

    pub fn draw_cards(&mut self, count: usize) -> Vec<CardDefinition> {
        let mut cards = Vec::with_capacity(count.min(self.cards.len()));
        for _ in 0..count {
            if let Some(card) = self.draw() {
                cards.push(card);
            } else {
                break;
            }
        }
        cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn cards(&self) -> &[CardDefinition] {
        &self.cards
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Dimensions;

    fn numbered(count: usize) -> Vec<CardDefinition> {
        (0..count)
            .map(|idx| {
                CardDefinition::new(
                    format!("c{idx}"),
                    format!("Card {idx}"),
                    Dimensions::Width(idx as f64),
                )
            })
            .collect()
    }

    #[test]
    fn same_seed_same_order() {
        let cards = numbered(20);
        let first = Deck::shuffled(&cards, &mut RngState::from_seed(42));
        let second = Deck::shuffled(&cards, &mut RngState::from_seed(42));
        assert_eq!(first.cards(), second.cards());
    }

    #[test]
    fn shuffle_is_a_permutation() {
        let cards = numbered(30);
        let deck = Deck::shuffled(&cards, &mut RngState::from_seed(9));
        let mut ids: Vec<_> = deck.cards().iter().map(|c| c.id.clone()).collect();
        let mut expected: Vec<_> = cards.iter().map(|c| c.id.clone()).collect();
        ids.sort();
        expected.sort();
        assert_eq!(ids, expected);
    }

    #[test]
    fn draws_from_the_end_until_empty() {
        let mut deck = Deck::new(numbered(3));
        assert_eq!(deck.draw().map(|c| c.id.to_string()), Some("c2".to_string()));
        let rest = deck.draw_cards(5);
        assert_eq!(rest.len(), 2);
        assert!(deck.is_empty());
        assert!(deck.draw().is_none());
        assert!(deck.draw_cards(2).is_empty());
    }
}
