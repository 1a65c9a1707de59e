//! Composite identifiers for tracked labels and their fields.
//!
//! The host refers to a whole label by its tracking id (`"42"`) and to a field of a
//! label by `"<trackingId>:<fieldName>"`. Everything past the command boundary works
//! with the typed [`LabelKey`] instead of the string form.

use std::fmt;

use serde::Serialize;

use crate::error::BridgeError;

pub type TrackingId = u32;
pub type ModeId = i32;
pub type DataCaptureViewId = i32;

/// Reserved between the tracking id and the field name. Never valid in a field name.
pub const SEPARATOR: char = ':';

/// Encode `(tracking_id, field_name?)` into its external string form.
pub fn encode(tracking_id: TrackingId, field_name: Option<&str>) -> Result<String, BridgeError> {
    match field_name {
        None => Ok(tracking_id.to_string()),
        Some(name) => {
            validate_field_name(name).map_err(|reason| {
                BridgeError::malformed(&format!("{tracking_id}{SEPARATOR}{name}"), reason)
            })?;
            Ok(format!("{tracking_id}{SEPARATOR}{name}"))
        }
    }
}

/// Decode an identifier, splitting on the first separator.
///
/// With `expect_field` the identifier must name a field.
pub fn decode(
    identifier: &str,
    expect_field: bool,
) -> Result<(TrackingId, Option<String>), BridgeError> {
    let (head, field) = match identifier.split_once(SEPARATOR) {
        Some((head, field)) => (head, Some(field)),
        None => (identifier, None),
    };

    let tracking_id = parse_tracking_id(head).ok_or_else(|| {
        BridgeError::malformed(identifier, "tracking id is not a non-negative integer")
    })?;

    match field {
        None if expect_field => Err(BridgeError::malformed(
            identifier,
            format!("expected '<trackingId>{SEPARATOR}<fieldName>'"),
        )),
        None => Ok((tracking_id, None)),
        Some("") => Err(BridgeError::malformed(identifier, "field name is empty")),
        Some(name) => Ok((tracking_id, Some(name.to_string()))),
    }
}

fn parse_tracking_id(text: &str) -> Option<TrackingId> {
    // `str::parse` would also take a leading '+'.
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

fn validate_field_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("field name is empty".into());
    }
    if name.contains(SEPARATOR) {
        return Err(format!("field name contains reserved '{SEPARATOR}'"));
    }
    Ok(())
}

/// A tracked label, optionally narrowed to one of its fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LabelKey {
    pub tracking_id: TrackingId,
    pub field_name: Option<String>,
}

impl LabelKey {
    pub fn label(tracking_id: TrackingId) -> Self {
        Self {
            tracking_id,
            field_name: None,
        }
    }

    pub fn field(
        tracking_id: TrackingId,
        field_name: impl Into<String>,
    ) -> Result<Self, BridgeError> {
        let field_name = field_name.into();
        validate_field_name(&field_name).map_err(|reason| {
            BridgeError::malformed(&format!("{tracking_id}{SEPARATOR}{field_name}"), reason)
        })?;
        Ok(Self {
            tracking_id,
            field_name: Some(field_name),
        })
    }

    pub fn decode(identifier: &str, expect_field: bool) -> Result<Self, BridgeError> {
        let (tracking_id, field_name) = decode(identifier, expect_field)?;
        Ok(Self {
            tracking_id,
            field_name,
        })
    }

    pub fn encode(&self) -> String {
        match &self.field_name {
            Some(name) => format!("{}{SEPARATOR}{name}", self.tracking_id),
            None => self.tracking_id.to_string(),
        }
    }

    pub fn is_field(&self) -> bool {
        self.field_name.is_some()
    }
}

impl fmt::Display for LabelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl Serialize for LabelKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encode())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_malformed(result: Result<(TrackingId, Option<String>), BridgeError>) {
        match result {
            Err(BridgeError::MalformedIdentifier { .. }) => {}
            other => panic!("expected MalformedIdentifier, got {other:?}"),
        }
    }

    #[test]
    fn round_trips_field_identifiers() {
        for (id, field) in [(0, "sku"), (42, "Expiry Date"), (u32::MAX, "price/unit")] {
            let encoded = encode(id, Some(field)).unwrap();
            assert_eq!(decode(&encoded, true).unwrap(), (id, Some(field.to_string())));
        }
    }

    #[test]
    fn round_trips_label_identifiers() {
        assert_eq!(encode(7, None).unwrap(), "7");
        assert_eq!(decode("7", false).unwrap(), (7, None));
    }

    #[test]
    fn field_expected_but_no_separator() {
        assert_malformed(decode("42", true));
    }

    #[test]
    fn rejects_non_numeric_and_signed_tracking_ids() {
        assert_malformed(decode("abc:sku", true));
        assert_malformed(decode("-1:sku", true));
        assert_malformed(decode("+1:sku", true));
        assert_malformed(decode(":sku", true));
        assert_malformed(decode("99999999999", false));
    }

    #[test]
    fn rejects_empty_field_segment() {
        assert_malformed(decode("42:", true));
        assert_malformed(decode("42:", false));
    }

    #[test]
    fn splits_on_first_separator_only() {
        assert_eq!(decode("3:a:b", true).unwrap(), (3, Some("a:b".to_string())));
    }

    #[test]
    fn encode_rejects_reserved_character_in_field() {
        assert!(encode(1, Some("a:b")).is_err());
        assert!(encode(1, Some("")).is_err());
        assert!(LabelKey::field(1, "").is_err());
    }

    #[test]
    fn label_key_display_matches_encoding() {
        let key = LabelKey::field(42, "sku").unwrap();
        assert_eq!(key.to_string(), "42:sku");
        assert_eq!(LabelKey::decode("42:sku", true).unwrap(), key);
        assert!(!LabelKey::label(42).is_field());
    }
}
