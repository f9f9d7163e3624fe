use serde::{Deserialize, Deserializer};

/// `deserialize_with` helper for PATCH bodies.
///
/// Paired with `#[serde(default)]` on an `Option<Option<T>>` field: an absent
/// field stays `None`, an explicit `null` becomes `Some(None)`.
///
/// # Errors
///
/// Returns the deserializer's error if the value is not a `T` or `null`.
pub fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "super::present")]
        emoji: Option<Option<String>>,
    }

    fn parse(raw: &str) -> Option<Option<String>> {
        serde_json::from_str::<Patch>(raw).map_or(Some(Some("invalid".to_string())), |p| p.emoji)
    }

    #[test]
    fn test_absent_null_and_value_differ() {
        assert_eq!(parse("{}"), None);
        assert_eq!(parse(r#"{"emoji": null}"#), Some(None));
        assert_eq!(parse(r#"{"emoji": "🏃"}"#), Some(Some("🏃".to_string())));
    }
}
