use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::BridgeError;

/// Where a view sits relative to the label's or field's detected geometry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Anchor {
    TopLeft,
    TopCenter,
    TopRight,
    CenterLeft,
    Center,
    CenterRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

impl Default for Anchor {
    fn default() -> Self {
        Anchor::Center
    }
}

impl Anchor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Anchor::TopLeft => "topLeft",
            Anchor::TopCenter => "topCenter",
            Anchor::TopRight => "topRight",
            Anchor::CenterLeft => "centerLeft",
            Anchor::Center => "center",
            Anchor::CenterRight => "centerRight",
            Anchor::BottomLeft => "bottomLeft",
            Anchor::BottomCenter => "bottomCenter",
            Anchor::BottomRight => "bottomRight",
        }
    }
}

impl FromStr for Anchor {
    type Err = BridgeError;

    /// Accepts `topLeft` as well as the JSON-quoted `"topLeft"` some hosts send.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim().trim_matches('"');
        match trimmed {
            "topLeft" => Ok(Anchor::TopLeft),
            "topCenter" => Ok(Anchor::TopCenter),
            "topRight" => Ok(Anchor::TopRight),
            "centerLeft" => Ok(Anchor::CenterLeft),
            "center" => Ok(Anchor::Center),
            "centerRight" => Ok(Anchor::CenterRight),
            "bottomLeft" => Ok(Anchor::BottomLeft),
            "bottomCenter" => Ok(Anchor::BottomCenter),
            "bottomRight" => Ok(Anchor::BottomRight),
            other => Err(BridgeError::invalid("anchor", format!("unknown anchor '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MeasureUnit {
    Pixel,
    Dip,
    Fraction,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct FloatWithUnit {
    pub value: f32,
    pub unit: MeasureUnit,
}

impl FloatWithUnit {
    pub fn pixels(value: f32) -> Self {
        Self {
            value,
            unit: MeasureUnit::Pixel,
        }
    }
}

// A bare number is shorthand for pixels.
impl<'de> Deserialize<'de> for FloatWithUnit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Bare(f32),
            Full { value: f32, unit: MeasureUnit },
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Bare(value) => FloatWithUnit::pixels(value),
            Repr::Full { value, unit } => FloatWithUnit { value, unit },
        })
    }
}

/// Offset applied to an anchored view.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PointWithUnit {
    pub x: FloatWithUnit,
    pub y: FloatWithUnit,
}

impl Default for PointWithUnit {
    fn default() -> Self {
        Self::zero()
    }
}

impl PointWithUnit {
    pub fn zero() -> Self {
        Self {
            x: FloatWithUnit::pixels(0.0),
            y: FloatWithUnit::pixels(0.0),
        }
    }

    pub fn from_json(text: &str, arg_name: &str) -> Result<Self, BridgeError> {
        let point: PointWithUnit =
            serde_json::from_str(text).map_err(|err| BridgeError::invalid(arg_name, err))?;
        if !point.x.value.is_finite() || !point.y.value.is_finite() {
            return Err(BridgeError::invalid(arg_name, "offset components must be finite"));
        }
        Ok(point)
    }
}

/// Fill and stroke used by the basic overlay for a label or field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Brush {
    pub fill_color: String,
    pub stroke_color: String,
    #[serde(default)]
    pub stroke_width: f32,
}

impl Brush {
    pub fn from_json(text: &str) -> Result<Self, BridgeError> {
        serde_json::from_str(text).map_err(|err| BridgeError::invalid("brushJson", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_and_quoted_anchors() {
        assert_eq!("topLeft".parse::<Anchor>().unwrap(), Anchor::TopLeft);
        assert_eq!("\"bottomRight\"".parse::<Anchor>().unwrap(), Anchor::BottomRight);
        assert!("middle".parse::<Anchor>().is_err());
    }

    #[test]
    fn anchor_string_form_round_trips() {
        for anchor in [Anchor::TopCenter, Anchor::CenterLeft, Anchor::Center] {
            assert_eq!(anchor.as_str().parse::<Anchor>().unwrap(), anchor);
        }
    }

    #[test]
    fn offset_accepts_bare_numbers_as_pixels() {
        let offset = PointWithUnit::from_json(r#"{"x":5,"y":10}"#, "offset").unwrap();
        assert_eq!(offset.x, FloatWithUnit::pixels(5.0));
        assert_eq!(offset.y, FloatWithUnit::pixels(10.0));
    }

    #[test]
    fn offset_accepts_units() {
        let offset = PointWithUnit::from_json(
            r#"{"x":{"value":0.5,"unit":"fraction"},"y":{"value":-2,"unit":"dip"}}"#,
            "offsetJson",
        )
        .unwrap();
        assert_eq!(offset.x.unit, MeasureUnit::Fraction);
        assert_eq!(offset.y.value, -2.0);
    }

    #[test]
    fn offset_rejects_garbage() {
        let err = PointWithUnit::from_json("{\"x\":1}", "offset").unwrap_err();
        assert_eq!(err.code(), "InvalidArgument");
    }

    #[test]
    fn brush_parses_camel_case() {
        let json = r##"{"fillColor":"#FF000080","strokeColor":"#FF0000FF","strokeWidth":2}"##;
        let brush = Brush::from_json(json).unwrap();
        assert_eq!(brush.stroke_width, 2.0);
        assert_eq!(brush.fill_color, "#FF000080");
    }
}
