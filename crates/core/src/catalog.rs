use crate::{CardDefinition, CardId};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum CatalogError {
    #[error("duplicate card id {0}")]
    DuplicateId(CardId),
    #[error("card {id} declares no allowed axis it has a dimension for")]
    Unplayable { id: CardId },
    #[error("catalog is empty")]
    Empty,
}

/// Immutable lookup of every card definition in play.
#[derive(Debug, Clone)]
pub struct CardCatalog {
    cards: Vec<CardDefinition>,
    index: HashMap<CardId, usize>,
}

impl CardCatalog {
    pub fn new(cards: Vec<CardDefinition>) -> Result<Self, CatalogError> {
        if cards.is_empty() {
            return Err(CatalogError::Empty);
        }
        let mut index = HashMap::with_capacity(cards.len());
        for (idx, card) in cards.iter().enumerate() {
            if card.playable_axes().is_empty() {
                return Err(CatalogError::Unplayable {
                    id: card.id.clone(),
                });
            }
            if index.insert(card.id.clone(), idx).is_some() {
                return Err(CatalogError::DuplicateId(card.id.clone()));
            }
        }
        Ok(Self { cards, index })
    }

    pub fn get(&self, id: &CardId) -> Option<&CardDefinition> {
        self.index.get(id).map(|idx| &self.cards[*idx])
    }

    pub fn contains(&self, id: &CardId) -> bool {
        self.index.contains_key(id)
    }

    pub fn cards(&self) -> &[CardDefinition] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}
