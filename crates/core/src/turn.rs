use crate::PlayerId;

/// Fixed rotation of the players seated when the round started.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnOrder {
    order: Vec<PlayerId>,
    index: usize,
}

impl TurnOrder {
    pub fn new(order: Vec<PlayerId>) -> Self {
        Self { order, index: 0 }
    }

    pub fn current(&self) -> Option<&PlayerId> {
        self.order.get(self.index)
    }

    pub fn advance(&mut self) -> Option<&PlayerId> {
        if self.order.is_empty() {
            return None;
        }
        self.index = (self.index + 1) % self.order.len();
        self.current()
    }

    /// Drops a departed player without reordering the rest. If they held the
    /// turn, it passes to whoever followed them.
    pub fn remove(&mut self, player: &PlayerId) -> bool {
        let Some(pos) = self.order.iter().position(|id| id == player) else {
            return false;
        };
        self.order.remove(pos);
        if pos < self.index {
            self.index -= 1;
        }
        if self.index >= self.order.len() {
            self.index = 0;
        }
        true
    }

    pub fn contains(&self, player: &PlayerId) -> bool {
        self.order.contains(player)
    }

    pub fn order(&self) -> &[PlayerId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(ids: &[&str]) -> TurnOrder {
        TurnOrder::new(ids.iter().map(|id| PlayerId::new(*id)).collect())
    }

    fn current(turns: &TurnOrder) -> Option<&str> {
        turns.current().map(|id| id.as_str())
    }

    #[test]
    fn advance_wraps_around() {
        let mut turns = order(&["a", "b", "c"]);
        assert_eq!(current(&turns), Some("a"));
        turns.advance();
        turns.advance();
        assert_eq!(current(&turns), Some("c"));
        turns.advance();
        assert_eq!(current(&turns), Some("a"));
    }

    #[test]
    fn empty_order_has_no_holder() {
        let mut turns = TurnOrder::default();
        assert!(turns.current().is_none());
        assert!(turns.advance().is_none());
    }

    #[test]
    fn removing_an_earlier_player_keeps_the_holder() {
        let mut turns = order(&["a", "b", "c"]);
        turns.advance();
        turns.advance();
        assert!(turns.remove(&PlayerId::new("a")));
        assert_eq!(current(&turns), Some("c"));
        turns.advance();
        assert_eq!(current(&turns), Some("b"));
    }

    #[test]
    fn removing_the_holder_passes_the_turn_on() {
        let mut turns = order(&["a", "b", "c"]);
        turns.advance();
        assert!(turns.remove(&PlayerId::new("b")));
        assert_eq!(current(&turns), Some("c"));

        let mut turns = order(&["a", "b", "c"]);
        turns.advance();
        turns.advance();
        assert!(turns.remove(&PlayerId::new("c")));
        assert_eq!(current(&turns), Some("a"));
        assert!(!turns.remove(&PlayerId::new("zed")));
    }
}
