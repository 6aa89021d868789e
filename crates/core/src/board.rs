//! Cross-shaped board: occupancy, placement legality and shift-insertion.
//!
//! The origin card sits at (0,0). Every other card lies on exactly one axis:
//! `y == 0` is the horizontal axis (compared by width), `x == 0` the vertical
//! axis (compared by height). Along each arm the compared value strictly grows
//! with the distance from the origin.

use crate::{Axis, CardDefinition, CardId};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const ORIGIN: Position = Position { x: 0, y: 0 };
    /// Largest coordinate accepted from the wire, leaving room for a neighbour.
    pub const MAX_COORDINATE: i32 = i32::MAX - 1;

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The cell `coord` steps away from the origin along `axis`.
    pub const fn along(axis: Axis, coord: i32) -> Self {
        match axis {
            Axis::Horizontal => Self { x: coord, y: 0 },
            Axis::Vertical => Self { x: 0, y: coord },
        }
    }

    pub fn is_origin(&self) -> bool {
        *self == Self::ORIGIN
    }

    /// Axis of a non-origin on-axis cell; `None` for the origin and for cells
    /// off both axes.
    pub fn axis(&self) -> Option<Axis> {
        match (self.x, self.y) {
            (0, 0) => None,
            (_, 0) => Some(Axis::Horizontal),
            (0, _) => Some(Axis::Vertical),
            _ => None,
        }
    }

    pub fn coordinate(&self, axis: Axis) -> i32 {
        match axis {
            Axis::Horizontal => self.x,
            Axis::Vertical => self.y,
        }
    }

    pub fn step(&self, axis: Axis, delta: i32) -> Self {
        match axis {
            Axis::Horizontal => Self::new(self.x.saturating_add(delta), self.y),
            Axis::Vertical => Self::new(self.x, self.y.saturating_add(delta)),
        }
    }

    pub fn neighbors(&self) -> [Position; 4] {
        [
            self.step(Axis::Horizontal, 1),
            self.step(Axis::Horizontal, -1),
            self.step(Axis::Vertical, 1),
            self.step(Axis::Vertical, -1),
        ]
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

impl FromStr for Position {
    type Err = RequestError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (x, y) = parse_pair(value)?;
        match (integral(x), integral(y)) {
            (Some(x), Some(y)) => Ok(Self::new(x, y)),
            _ => Err(RequestError::BadPosition(value.to_string())),
        }
    }
}

impl Serialize for Position {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

fn parse_pair(value: &str) -> Result<(f64, f64), RequestError> {
    let bad = || RequestError::BadPosition(value.to_string());
    let (x, y) = value.split_once(',').ok_or_else(bad)?;
    let x: f64 = x.trim().parse().map_err(|_| bad())?;
    let y: f64 = y.trim().parse().map_err(|_| bad())?;
    if !x.is_finite() || !y.is_finite() {
        return Err(bad());
    }
    Ok((x, y))
}

fn integral(value: f64) -> Option<i32> {
    let limit = Position::MAX_COORDINATE as f64;
    if value.fract() != 0.0 || value.abs() > limit {
        return None;
    }
    Some(value as i32)
}

// A virtual coordinate between two cells opens the slot on its outer side:
// 0.5 -> 1, -0.5 -> -1, 1.5 -> 2.
fn round_outward(value: f64) -> Option<i32> {
    let rounded = if value > 0.0 {
        value.ceil()
    } else {
        value.floor()
    };
    integral(rounded)
}

/// Where a move wants its card to go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    At(Position),
    /// Open `slot` on `axis` by shifting the run that starts there one step
    /// outward, then place into the freed slot.
    Insert { axis: Axis, slot: i32 },
}

impl Placement {
    /// Parses the wire form `"x,y"`. With `insertion` set, exactly one
    /// coordinate may be fractional (the other must be 0) and names the gap
    /// between two cards; integral coordinates are a plain placement.
    pub fn parse(place_at: &str, insertion: bool) -> Result<Self, RequestError> {
        let bad = || RequestError::BadPosition(place_at.to_string());
        let (x, y) = parse_pair(place_at)?;
        match (integral(x), integral(y)) {
            (Some(x), Some(y)) => Ok(Self::At(Position::new(x, y))),
            _ if !insertion => Err(bad()),
            (None, Some(0)) => Ok(Self::Insert {
                axis: Axis::Horizontal,
                slot: round_outward(x).ok_or_else(bad)?,
            }),
            (Some(0), None) => Ok(Self::Insert {
                axis: Axis::Vertical,
                slot: round_outward(y).ok_or_else(bad)?,
            }),
            _ => Err(bad()),
        }
    }

    /// The integral cell the card is meant to occupy.
    pub fn target(&self) -> Position {
        match *self {
            Self::At(position) => position,
            Self::Insert { axis, slot } => Position::along(axis, slot),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("unparseable position {0:?}")]
    BadPosition(String),
    #[error("unknown card {0}")]
    UnknownCard(CardId),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlacementRejection {
    #[error("position {0} is already occupied")]
    Occupied(Position),
    #[error("origin position is already occupied")]
    OriginOccupied,
    #[error("position {0} lies off both axes; cards must lie on an axis")]
    OffAxis(Position),
    #[error("{card} cannot be placed on the {axis} axis")]
    AxisNotAllowed { card: String, axis: Axis },
    #[error("{card} has no valid {} for the {axis} axis", .axis.metric_name())]
    MissingDimension { card: String, axis: Axis },
    #[error("card at {0} must be adjacent to an existing card")]
    NotAdjacent(Position),
    #[error("{axis} cards cannot be placed next to cards of the other axis")]
    OrientationConflict { axis: Axis },
    #[error("{card} ({value}) should be less than {neighbor} ({neighbor_value})")]
    ShouldBeLess {
        card: String,
        value: f64,
        neighbor: String,
        neighbor_value: f64,
    },
    #[error("{card} ({value}) should be greater than {neighbor} ({neighbor_value})")]
    ShouldBeGreater {
        card: String,
        value: f64,
        neighbor: String,
        neighbor_value: f64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Origin,
    Horizontal,
    Vertical,
}

impl Orientation {
    /// Orientation follows the cell, never the card. Off-axis cells only occur
    /// when a caller skips validation and are treated as vertical.
    pub fn for_position(position: Position) -> Self {
        if position.is_origin() {
            Self::Origin
        } else if position.y == 0 {
            Self::Horizontal
        } else {
            Self::Vertical
        }
    }

    pub fn axis(self) -> Option<Axis> {
        match self {
            Self::Origin => None,
            Self::Horizontal => Some(Axis::Horizontal),
            Self::Vertical => Some(Axis::Vertical),
        }
    }
}

impl From<Axis> for Orientation {
    fn from(axis: Axis) -> Self {
        match axis {
            Axis::Horizontal => Self::Horizontal,
            Axis::Vertical => Self::Vertical,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    Number(f64),
    Label(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedCard {
    #[serde(flatten)]
    pub card: CardDefinition,
    pub orientation: Orientation,
    pub metric_name: &'static str,
    pub metric_value: MetricValue,
}

impl PlacedCard {
    pub fn new(card: CardDefinition, position: Position) -> Self {
        let orientation = Orientation::for_position(position);
        let (metric_name, metric_value) = match orientation.axis() {
            None => (
                "size",
                MetricValue::Label(card.dimensions.composite_label()),
            ),
            Some(axis) => (
                axis.metric_name(),
                card.metric(axis)
                    .map(MetricValue::Number)
                    .unwrap_or_else(|| MetricValue::Label("N/A".to_string())),
            ),
        };
        Self {
            card,
            orientation,
            metric_name,
            metric_value,
        }
    }

    /// Whether this card takes part in comparisons along `axis`.
    pub fn governs(&self, axis: Axis) -> bool {
        self.orientation == Orientation::Origin || self.orientation == Orientation::from(axis)
    }

    /// Value compared along `axis`; the origin contributes its raw dimension.
    pub fn value_on(&self, axis: Axis) -> Option<f64> {
        self.card.metric(axis)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Board {
    cells: BTreeMap<Position, PlacedCard>,
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn get(&self, position: Position) -> Option<&PlacedCard> {
        self.cells.get(&position)
    }

    pub fn is_occupied(&self, position: Position) -> bool {
        self.cells.contains_key(&position)
    }

    pub fn origin(&self) -> Option<&PlacedCard> {
        self.get(Position::ORIGIN)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Position, &PlacedCard)> + '_ {
        self.cells.iter().map(|(position, card)| (*position, card))
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    /// Cards of one arm, walking outward from the origin in `direction`
    /// (+1 right/up, -1 left/down) until the first empty cell.
    pub fn arm(&self, axis: Axis, direction: i32) -> Vec<(Position, &PlacedCard)> {
        let step = direction.signum();
        let mut out = Vec::new();
        if step == 0 {
            return out;
        }
        let mut coord = step;
        while let Some(card) = self.get(Position::along(axis, coord)) {
            out.push((Position::along(axis, coord), card));
            match coord.checked_add(step) {
                Some(next) => coord = next,
                None => break,
            }
        }
        out
    }

    /// Checks a candidate against the board; the first failing rule wins.
    pub fn validate_placement(
        &self,
        card: &CardDefinition,
        position: Position,
    ) -> Result<(), PlacementRejection> {
        if self.is_occupied(position) {
            return Err(PlacementRejection::Occupied(position));
        }
        if self.is_empty() {
            return Ok(());
        }
        if position.is_origin() {
            return Err(PlacementRejection::OriginOccupied);
        }
        let Some(axis) = position.axis() else {
            return Err(PlacementRejection::OffAxis(position));
        };
        if !card.permits(axis) {
            return Err(PlacementRejection::AxisNotAllowed {
                card: card.name.clone(),
                axis,
            });
        }
        let Some(value) = card.metric(axis) else {
            return Err(PlacementRejection::MissingDimension {
                card: card.name.clone(),
                axis,
            });
        };
        if !position.neighbors().iter().any(|n| self.is_occupied(*n)) {
            return Err(PlacementRejection::NotAdjacent(position));
        }
        let cross = axis.other();
        for delta in [1, -1] {
            if let Some(neighbor) = self.get(position.step(cross, delta)) {
                if neighbor.orientation != Orientation::Origin {
                    return Err(PlacementRejection::OrientationConflict { axis });
                }
            }
        }
        let distance = position.coordinate(axis).abs();
        for delta in [1, -1] {
            let neighbor_pos = position.step(axis, delta);
            let Some(neighbor) = self.get(neighbor_pos) else {
                continue;
            };
            if !neighbor.governs(axis) {
                continue;
            }
            // An origin without this dimension gives nothing to compare.
            let Some(neighbor_value) = neighbor.value_on(axis) else {
                continue;
            };
            let outer = neighbor_pos.coordinate(axis).abs() > distance;
            if outer && value >= neighbor_value {
                return Err(PlacementRejection::ShouldBeLess {
                    card: card.name.clone(),
                    value,
                    neighbor: neighbor.card.name.clone(),
                    neighbor_value,
                });
            }
            if !outer && value <= neighbor_value {
                return Err(PlacementRejection::ShouldBeGreater {
                    card: card.name.clone(),
                    value,
                    neighbor: neighbor.card.name.clone(),
                    neighbor_value,
                });
            }
        }
        Ok(())
    }

    /// Stores a card without validating it. The first card on an empty board
    /// becomes the origin wherever it was aimed; returns where it landed.
    pub fn apply_placement(&mut self, card: CardDefinition, position: Position) -> Position {
        let landed = if self.is_empty() {
            Position::ORIGIN
        } else {
            position
        };
        self.cells.insert(landed, PlacedCard::new(card, landed));
        landed
    }

    /// Moves the contiguous run of `axis` cards starting at `slot` one step
    /// further from the origin, freeing `slot`. Returns how many cards moved.
    pub fn shift_for_insertion(&mut self, axis: Axis, slot: i32) -> usize {
        let step = slot.signum();
        if step == 0 {
            return 0;
        }
        let orientation = Orientation::from(axis);
        let mut run = Vec::new();
        let mut coord = slot;
        while let Some(card) = self.get(Position::along(axis, coord)) {
            if card.orientation != orientation {
                break;
            }
            run.push(coord);
            match coord.checked_add(step) {
                Some(next) => coord = next,
                None => break,
            }
        }
        // A run already touching the coordinate limit has nowhere to go.
        if run
            .last()
            .map_or(false, |last| last.checked_add(step).is_none())
        {
            return 0;
        }
        // Far end first so no card lands on one that has not moved yet.
        for coord in run.iter().rev() {
            if let Some(card) = self.cells.remove(&Position::along(axis, *coord)) {
                self.cells.insert(Position::along(axis, coord + step), card);
            }
        }
        run.len()
    }

    /// Validates and executes a move. Insertions shift a staged copy first so
    /// the check sees the post-shift neighbours; the board only changes when
    /// the card is legal.
    pub fn place(
        &mut self,
        card: CardDefinition,
        placement: Placement,
    ) -> Result<Position, PlacementRejection> {
        match placement {
            Placement::At(position) => {
                self.validate_placement(&card, position)?;
                Ok(self.apply_placement(card, position))
            }
            Placement::Insert { axis, slot } => {
                let target = Position::along(axis, slot);
                let mut staged = self.clone();
                staged.shift_for_insertion(axis, slot);
                staged.validate_placement(&card, target)?;
                let landed = staged.apply_placement(card, target);
                *self = staged;
                Ok(landed)
            }
        }
    }
}

impl Serialize for Board {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (position, card) in &self.cells {
            map.serialize_entry(&position.to_string(), card)?;
        }
        map.end()
    }
}
