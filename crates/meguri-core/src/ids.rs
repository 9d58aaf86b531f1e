//! Integer identifiers for workflows, states and actions.

use serde::de::{self, Deserializer, Unexpected, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Accepts integers and integer strings; JSON object keys arrive as the latter.
struct IdVisitor;

impl<'de> Visitor<'de> for IdVisitor {
    type Value = i64;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an integer id")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<i64, E> {
        Ok(v)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<i64, E> {
        i64::try_from(v).map_err(|_| E::invalid_value(Unexpected::Unsigned(v), &self))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<i64, E> {
        v.trim()
            .parse()
            .map_err(|_| E::invalid_value(Unexpected::Str(v), &self))
    }
}

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                deserializer.deserialize_any(IdVisitor).map(Self)
            }
        }

        impl $name {
            /// Wraps a raw integer id.
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// Returns the raw integer id.
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(i64::from(id))
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(
    /// Identifies a workflow; unique across a store.
    ///
    /// ```
    /// use meguri_core::WorkflowId;
    ///
    /// let id: WorkflowId = 7.into();
    /// assert_eq!(id.get(), 7);
    /// assert_eq!(id.to_string(), "7");
    /// ```
    WorkflowId
);

define_id!(
    /// Identifies a state; unique within its workflow.
    StateId
);

define_id!(
    /// Identifies an action; unique within its workflow.
    ActionId
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_ids_serialize_as_plain_integers() {
        let json = serde_json::to_string(&StateId::new(3)).expect("serialize");
        assert_eq!(json, "3");

        let id: ActionId = serde_json::from_str("11").expect("deserialize");
        assert_eq!(id, ActionId::new(11));
    }

    #[test]
    fn test_ids_accept_numeric_strings() {
        let id: StateId = serde_json::from_str(r#""12""#).expect("deserialize");
        assert_eq!(id, StateId::new(12));
        assert!(serde_json::from_str::<StateId>(r#""twelve""#).is_err());
        assert!(serde_json::from_str::<StateId>("1.5").is_err());
    }

    #[test]
    fn test_ids_as_map_keys() {
        let mut map = BTreeMap::new();
        map.insert(WorkflowId::new(2), "two");
        let json = serde_json::to_string(&map).expect("serialize");
        assert_eq!(json, r#"{"2":"two"}"#);

        let back: BTreeMap<WorkflowId, String> = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back.get(&WorkflowId::new(2)).map(String::as_str), Some("two"));
    }
}
