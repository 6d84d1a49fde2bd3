//! Presence-tracking wrapper for sparse changes.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A field that is either proposed with a value or not proposed at all.
///
/// `Absent` never means "clear the field": an empty string or zero is a
/// `Present` value. Use with `#[serde(default)]` so a missing JSON key
/// deserializes to `Absent`; an explicit `null` is rejected unless `T`
/// itself accepts it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch<T> {
    Absent,
    Present(T),
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Patch::Absent
    }
}

impl<T> Patch<T> {
    pub fn is_present(&self) -> bool {
        matches!(self, Patch::Present(_))
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Patch::Absent)
    }

    pub fn as_ref(&self) -> Patch<&T> {
        match self {
            Patch::Absent => Patch::Absent,
            Patch::Present(value) => Patch::Present(value),
        }
    }

    /// Returns the proposed value, if any.
    pub fn value(&self) -> Option<&T> {
        match self {
            Patch::Absent => None,
            Patch::Present(value) => Some(value),
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Patch::Absent => None,
            Patch::Present(value) => Some(value),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Patch<U> {
        match self {
            Patch::Absent => Patch::Absent,
            Patch::Present(value) => Patch::Present(f(value)),
        }
    }
}

/// Converts a nullable column: `NULL` means the field was not proposed.
impl<T> From<Option<T>> for Patch<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Patch::Absent, Patch::Present)
    }
}

impl<T: Serialize> Serialize for Patch<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Patch::Absent => serializer.serialize_none(),
            Patch::Present(value) => value.serialize(serializer),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        T::deserialize(deserializer).map(Patch::Present)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    struct Changes {
        #[serde(default, skip_serializing_if = "Patch::is_absent")]
        title: Patch<String>,
        #[serde(default, skip_serializing_if = "Patch::is_absent")]
        pages: Patch<i32>,
    }

    #[test]
    fn missing_key_is_absent_and_empty_string_is_present() {
        let changes: Changes = serde_json::from_str(r#"{"title": ""}"#).unwrap();
        assert_eq!(changes.title, Patch::Present(String::new()));
        assert_eq!(changes.pages, Patch::Absent);
    }

    #[test]
    fn zero_is_present() {
        let changes: Changes = serde_json::from_str(r#"{"pages": 0}"#).unwrap();
        assert_eq!(changes.pages, Patch::Present(0));
    }

    #[test]
    fn explicit_null_is_rejected() {
        assert!(serde_json::from_str::<Changes>(r#"{"title": null}"#).is_err());
    }

    #[test]
    fn null_on_nullable_field_is_present_none() {
        #[derive(Deserialize)]
        struct Nullable {
            #[serde(default)]
            description: Patch<Option<String>>,
        }

        let cleared: Nullable = serde_json::from_str(r#"{"description": null}"#).unwrap();
        let untouched: Nullable = serde_json::from_str("{}").unwrap();

        assert_eq!(cleared.description, Patch::Present(None));
        assert_eq!(untouched.description, Patch::Absent);
    }

    #[test]
    fn absent_fields_are_not_serialized() {
        let changes = Changes {
            title: Patch::Present("Dune".to_string()),
            pages: Patch::Absent,
        };
        assert_eq!(
            serde_json::to_value(&changes).unwrap(),
            serde_json::json!({"title": "Dune"})
        );
    }

    #[test]
    fn nullable_column_converts_to_patch() {
        assert_eq!(Patch::from(None::<String>), Patch::Absent);
        assert_eq!(Patch::from(Some(3)), Patch::Present(3));
    }
}
