//! OS version ordering.

use serde::Serialize;

/// A calculator OS version, comparable across the whole model line.
///
/// Ordering is by model rank first, then by the numeric version. The
/// [`OsVersion::INITIAL`] sentinel sorts below every shipped OS and is the
/// default minimum requirement for entry types that place no constraint of
/// their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct OsVersion {
    /// Rank of the model line the OS shipped on.
    pub rank: u16,
    /// Major version component.
    pub major: u8,
    /// Minor version component.
    pub minor: u8,
}

impl OsVersion {
    /// Sorts below every real OS version.
    pub const INITIAL: OsVersion = OsVersion {
        rank: 0,
        major: 0,
        minor: 0,
    };

    /// The newest OS for a model of the given rank.
    #[must_use]
    pub const fn latest(rank: u16) -> OsVersion {
        OsVersion {
            rank,
            major: u8::MAX,
            minor: u8::MAX,
        }
    }

    #[must_use]
    pub const fn new(rank: u16, major: u8, minor: u8) -> OsVersion {
        OsVersion { rank, major, minor }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_sorts_below_everything() {
        assert!(OsVersion::INITIAL < OsVersion::new(0, 0, 1));
        assert!(OsVersion::INITIAL < OsVersion::latest(0));
    }

    #[test]
    fn rank_dominates_version() {
        assert!(OsVersion::new(1, 9, 9) < OsVersion::new(2, 0, 1));
        assert!(OsVersion::latest(3) < OsVersion::new(4, 0, 0));
    }
}
