//! Strongly-typed identifiers for domain entities
//!
//! Entity ids are opaque integers assigned by the persistence side. Sessions
//! are process-local and use UUIDs.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            pub fn new(raw: i64) -> Self {
                Self(raw)
            }

            pub fn get(&self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(raw: i64) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> i64 {
                id.0
            }
        }
    };
}

define_id!(ClientId);
define_id!(ServiceAreaId);
define_id!(IndustryId);
define_id!(JourneyCircleId);
define_id!(ProblemId);
define_id!(SolutionId);
define_id!(OfferId);
define_id!(BrainContentId);
define_id!(AssetDraftId);

/// Identifier of an in-process editing session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic allocator for child entity ids within one circle
///
/// Hydrated from the highest id already present so that ids never repeat
/// after a load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdSequence {
    last: i64,
}

impl IdSequence {
    pub fn next(&mut self) -> i64 {
        self.last += 1;
        self.last
    }

    pub fn observe(&mut self, raw: i64) {
        if raw > self.last {
            self.last = raw;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_sequence_skips_observed_ids() {
        let mut seq = IdSequence::default();
        assert_eq!(seq.next(), 1);
        seq.observe(10);
        assert_eq!(seq.next(), 11);
        seq.observe(3);
        assert_eq!(seq.next(), 12);
    }

    #[test]
    fn test_ids_serialize_as_plain_integers() {
        let id = ProblemId::new(42);
        assert_eq!(serde_json::to_string(&id).unwrap(), "42");
        let back: ProblemId = serde_json::from_str("42").unwrap();
        assert_eq!(back, id);
    }
}
