use anyhow::{bail, Context};
use crosscards_core::{Axis, CardDefinition, CardId, Dimensions};
use serde::Deserialize;

/// One entry of `cards.json` as written on disk.
///
/// Current records give `height`/`width` directly. Older catalogs describe a
/// card by `orientation` plus a single `metric_value`; those are folded onto
/// the matching dimension and locked to that axis.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardRecord {
    pub id: CardId,
    pub name: String,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default, alias = "allowed_axes")]
    pub allowed_axes: Option<Vec<Axis>>,
    #[serde(default)]
    pub orientation: Option<String>,
    #[serde(default, alias = "metric_value")]
    pub metric_value: Option<f64>,
}

/// Maps the legacy orientation words onto the axis a card is played along.
pub fn legacy_axis(orientation: &str) -> Option<Axis> {
    match orientation.trim().to_ascii_lowercase().as_str() {
        "hochformat" | "portrait" | "vertical" => Some(Axis::Vertical),
        "querformat" | "landscape" | "horizontal" => Some(Axis::Horizontal),
        _ => None,
    }
}

impl CardRecord {
    pub fn into_definition(self) -> anyhow::Result<CardDefinition> {
        let mut height = self.height;
        let mut width = self.width;
        let mut allowed_axes = self.allowed_axes;

        if let Some(orientation) = self.orientation.as_deref() {
            let axis = legacy_axis(orientation).with_context(|| {
                format!("card {}: unknown orientation {orientation:?}", self.id)
            })?;
            let value = self
                .metric_value
                .with_context(|| format!("card {}: orientation without metric_value", self.id))?;
            match axis {
                Axis::Horizontal => width = width.or(Some(value)),
                Axis::Vertical => height = height.or(Some(value)),
            }
            allowed_axes.get_or_insert_with(|| vec![axis]);
        }

        if let Some(axes) = &allowed_axes {
            if axes.is_empty() {
                bail!("card {}: allowedAxes is empty", self.id);
            }
        }

        let dimensions = Dimensions::from_parts(height, width)
            .with_context(|| format!("card {} has neither height nor width", self.id))?;
        Ok(CardDefinition {
            id: self.id,
            name: self.name,
            dimensions,
            allowed_axes,
        })
    }
}
