//! Identifier types for parkwatch.
//!
//! Slots are numbered from 1, matching the numbering the parking service uses
//! for its `parking_slots` table.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A 1-based parking slot identifier.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct SlotId(u32);

impl SlotId {
    /// Create a `SlotId`, rejecting zero.
    ///
    /// # Errors
    ///
    /// Returns `IdError::ZeroSlot` if `value` is 0.
    pub const fn new(value: u32) -> Result<Self, IdError> {
        if value == 0 {
            return Err(IdError::ZeroSlot);
        }
        Ok(Self(value))
    }

    /// Build the slot id for a zero-based array index.
    #[must_use]
    pub fn from_index(index: usize) -> Self {
        Self(u32::try_from(index).unwrap_or(u32::MAX - 1).saturating_add(1))
    }

    /// Return the numeric value.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Return the zero-based index of this slot.
    #[must_use]
    pub const fn index(self) -> usize {
        (self.0 - 1) as usize
    }
}

impl fmt::Debug for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SlotId({})", self.0)
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SlotId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: u32 = s
            .trim()
            .parse()
            .map_err(|_| IdError::NotANumber(s.to_string()))?;
        Self::new(value)
    }
}

impl TryFrom<u32> for SlotId {
    type Error = IdError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SlotId> for u32 {
    fn from(id: SlotId) -> Self {
        id.0
    }
}

/// Errors that can occur when parsing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// Slot numbering starts at 1.
    #[error("slot id must be at least 1")]
    ZeroSlot,

    /// The input is not a decimal number.
    #[error("invalid slot id: '{0}'")]
    NotANumber(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_id_rejects_zero() {
        assert_eq!(SlotId::new(0), Err(IdError::ZeroSlot));
        assert_eq!(SlotId::new(3).unwrap().get(), 3);
    }

    #[test]
    fn slot_id_index_roundtrip() {
        let id = SlotId::from_index(0);
        assert_eq!(id.get(), 1);
        assert_eq!(id.index(), 0);
        assert_eq!(SlotId::from_index(3).get(), 4);
    }

    #[test]
    fn slot_id_parse() {
        let id: SlotId = " 2 ".parse().unwrap();
        assert_eq!(id.get(), 2);
        assert!(matches!("abc".parse::<SlotId>(), Err(IdError::NotANumber(_))));
        assert!(matches!("0".parse::<SlotId>(), Err(IdError::ZeroSlot)));
    }

    #[test]
    fn slot_id_serde() {
        let id = SlotId::new(4).unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "4");
        let parsed: SlotId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
        assert!(serde_json::from_str::<SlotId>("0").is_err());
    }
}
