use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "RawCardId", into = "String")]
pub struct CardId(String);

impl CardId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<CardId> for String {
    fn from(value: CardId) -> Self {
        value.0
    }
}

impl From<&str> for CardId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

// Catalogs and clients send ids either as strings or as plain numbers.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawCardId {
    Text(String),
    Number(i64),
}

impl From<RawCardId> for CardId {
    fn from(value: RawCardId) -> Self {
        match value {
            RawCardId::Text(text) => Self(text),
            RawCardId::Number(number) => Self(number.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl Axis {
    pub const ALL: [Axis; 2] = [Axis::Horizontal, Axis::Vertical];

    pub fn id(self) -> &'static str {
        match self {
            Self::Horizontal => "horizontal",
            Self::Vertical => "vertical",
        }
    }

    pub fn from_id(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "horizontal" => Some(Self::Horizontal),
            "vertical" => Some(Self::Vertical),
            _ => None,
        }
    }

    /// Name of the dimension compared on this axis.
    pub fn metric_name(self) -> &'static str {
        match self {
            Self::Horizontal => "width",
            Self::Vertical => "height",
        }
    }

    pub fn other(self) -> Self {
        match self {
            Self::Horizontal => Self::Vertical,
            Self::Vertical => Self::Horizontal,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// The measurable sides of a card. A card always has at least one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Dimensions {
    Height(f64),
    Width(f64),
    Both { height: f64, width: f64 },
}

impl Dimensions {
    /// Builds dimensions from optional parts; `None` when neither side is known
    /// or a side is not a finite number.
    pub fn from_parts(height: Option<f64>, width: Option<f64>) -> Option<Self> {
        let height = height.filter(|value| value.is_finite());
        let width = width.filter(|value| value.is_finite());
        match (height, width) {
            (Some(height), Some(width)) => Some(Self::Both { height, width }),
            (Some(height), None) => Some(Self::Height(height)),
            (None, Some(width)) => Some(Self::Width(width)),
            (None, None) => None,
        }
    }

    pub fn height(&self) -> Option<f64> {
        match *self {
            Self::Height(height) | Self::Both { height, .. } => Some(height),
            Self::Width(_) => None,
        }
    }

    pub fn width(&self) -> Option<f64> {
        match *self {
            Self::Width(width) | Self::Both { width, .. } => Some(width),
            Self::Height(_) => None,
        }
    }

    pub fn metric(&self, axis: Axis) -> Option<f64> {
        match axis {
            Axis::Horizontal => self.width(),
            Axis::Vertical => self.height(),
        }
    }

    /// Text shown for the origin card, which displays every side it has.
    pub fn composite_label(&self) -> String {
        match *self {
            Self::Both { height, width } => format!("H:{height} / W:{width}"),
            Self::Height(height) => format!("H:{height}"),
            Self::Width(width) => format!("W:{width}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CardShape", into = "CardShape")]
pub struct CardDefinition {
    pub id: CardId,
    pub name: String,
    pub dimensions: Dimensions,
    pub allowed_axes: Option<Vec<Axis>>,
}

impl CardDefinition {
    pub fn new(id: impl Into<String>, name: impl Into<String>, dimensions: Dimensions) -> Self {
        Self {
            id: CardId::new(id),
            name: name.into(),
            dimensions,
            allowed_axes: None,
        }
    }

    pub fn with_allowed_axes(mut self, axes: Vec<Axis>) -> Self {
        self.allowed_axes = Some(axes);
        self
    }

    pub fn height(&self) -> Option<f64> {
        self.dimensions.height()
    }

    pub fn width(&self) -> Option<f64> {
        self.dimensions.width()
    }

    pub fn metric(&self, axis: Axis) -> Option<f64> {
        self.dimensions.metric(axis)
    }

    /// Declared axes restrict placement; without a declaration every axis passes
    /// this check and the dimension check decides.
    pub fn permits(&self, axis: Axis) -> bool {
        self.allowed_axes
            .as_ref()
            .map_or(true, |axes| axes.contains(&axis))
    }

    /// Axes this card can actually be placed on.
    pub fn playable_axes(&self) -> Vec<Axis> {
        Axis::ALL
            .into_iter()
            .filter(|axis| self.permits(*axis) && self.metric(*axis).is_some())
            .collect()
    }
}

/// Flat wire shape of a card: `{id, name, height, width, allowedAxes}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardShape {
    pub id: CardId,
    pub name: String,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_axes: Option<Vec<Axis>>,
}

impl TryFrom<CardShape> for CardDefinition {
    type Error = String;

    fn try_from(shape: CardShape) -> Result<Self, Self::Error> {
        let dimensions = Dimensions::from_parts(shape.height, shape.width)
            .ok_or_else(|| format!("card {} has neither height nor width", shape.id))?;
        Ok(Self {
            id: shape.id,
            name: shape.name,
            dimensions,
            allowed_axes: shape.allowed_axes,
        })
    }
}

impl From<CardDefinition> for CardShape {
    fn from(card: CardDefinition) -> Self {
        Self {
            height: card.height(),
            width: card.width(),
            id: card.id,
            name: card.name,
            allowed_axes: card.allowed_axes,
        }
    }
}
