//! Native status codes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Signed status code returned by a vendor entry point.
///
/// Which value means success is a property of the library, not of the code
/// itself: most libraries use zero, the Andor SDK uses 20002.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusCode(pub i32);

impl StatusCode {
    pub const ZERO: Self = Self(0);

    #[inline]
    pub const fn new(code: i32) -> Self {
        Self(code)
    }

    #[inline]
    pub const fn get(self) -> i32 {
        self.0
    }

    /// True if this code is contained in `set`.
    #[inline]
    pub fn is_in(self, set: &[StatusCode]) -> bool {
        set.contains(&self)
    }
}

impl From<i32> for StatusCode {
    fn from(code: i32) -> Self {
        Self(code)
    }
}

impl From<StatusCode> for i32 {
    fn from(code: StatusCode) -> Self {
        code.0
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membership() {
        let ignore = [StatusCode(20035), StatusCode(20036)];
        assert!(StatusCode(20036).is_in(&ignore));
        assert!(!StatusCode(20037).is_in(&ignore));
        assert!(!StatusCode::ZERO.is_in(&[]));
    }

    #[test]
    fn test_serializes_as_plain_integer() {
        let json = serde_json::to_string(&StatusCode(-1001)).unwrap();
        assert_eq!(json, "-1001");
        let back: StatusCode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, StatusCode::new(-1001));
    }
}
