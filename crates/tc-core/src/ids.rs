//! Typed identifier for catalog assets.
//!
//! Catalog tracks are keyed by a non-negative integer. Wrapping it keeps
//! asset ids from being confused with segment ordinals or byte offsets, and
//! centralises the parsing rules for ids arriving in URL paths.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unique identifier for a catalog asset (a track).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(i64);

impl AssetId {
    /// Wrap a raw id. Negative ids are rejected.
    pub fn new(raw: i64) -> crate::Result<Self> {
        if raw < 0 {
            return Err(crate::Error::Validation(format!(
                "asset id must be non-negative, got {raw}"
            )));
        }
        Ok(Self(raw))
    }

    /// Return the inner integer value.
    #[must_use]
    pub fn get(&self) -> i64 {
        self.0
    }

    /// Sharded relative directory for this id.
    ///
    /// The id is zero-padded to seven digits and split into
    /// `[..len-4]/[len-4..len-2]/[len-2..]`, so `1234567` becomes
    /// `123/45/67` and `42` becomes `000/00/42`.
    pub fn shard_path(&self) -> std::path::PathBuf {
        let padded = format!("{:07}", self.0);
        let n = padded.len();
        let mut path = std::path::PathBuf::from(&padded[..n - 4]);
        path.push(&padded[n - 4..n - 2]);
        path.push(&padded[n - 2..]);
        path
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AssetId {
    type Err = crate::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let raw: i64 = s
            .parse()
            .map_err(|_| crate::Error::Validation(format!("invalid asset id: {s:?}")))?;
        Self::new(raw)
    }
}

impl TryFrom<i64> for AssetId {
    type Error = crate::Error;

    fn try_from(raw: i64) -> std::result::Result<Self, Self::Error> {
        Self::new(raw)
    }
}

impl From<AssetId> for i64 {
    fn from(id: AssetId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn parse_and_display() {
        let id: AssetId = "1234".parse().unwrap();
        assert_eq!(id.get(), 1234);
        assert_eq!(id.to_string(), "1234");
    }

    #[test]
    fn rejects_negative_and_garbage() {
        assert!("-3".parse::<AssetId>().is_err());
        assert!("abc".parse::<AssetId>().is_err());
        assert!("../1".parse::<AssetId>().is_err());
        assert!(AssetId::new(-1).is_err());
    }

    #[test]
    fn shard_path_splits_padded_id() {
        let id = AssetId::new(1234567).unwrap();
        assert_eq!(id.shard_path(), PathBuf::from("123").join("45").join("67"));

        let small = AssetId::new(42).unwrap();
        assert_eq!(small.shard_path(), PathBuf::from("000").join("00").join("42"));
    }

    #[test]
    fn shard_path_grows_leading_part_for_large_ids() {
        let id = AssetId::new(123456789).unwrap();
        assert_eq!(id.shard_path(), PathBuf::from("12345").join("67").join("89"));
    }

    #[test]
    fn serde_transparent() {
        let id = AssetId::new(7).unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "7");
        let back: AssetId = serde_json::from_str("7").unwrap();
        assert_eq!(back, id);
    }
}
