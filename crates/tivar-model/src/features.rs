//! Feature flags advertised by each calculator model.

use serde::Serialize;

/// Bitset of hardware/firmware capabilities.
///
/// Flags accumulate down the model line: every model carries the flags of
/// its predecessors plus its own additions (the TI-82AEP drops `APPS`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Features(pub u16);

impl Features {
    pub const DEFAULT: Features = Features(1 << 0);
    pub const COMPLEX: Features = Features(1 << 1);
    pub const FLASH: Features = Features(1 << 2);
    pub const APPS: Features = Features(1 << 3);
    pub const CLOCK: Features = Features(1 << 4);
    pub const COLOR: Features = Features(1 << 5);
    pub const EZ80: Features = Features(1 << 6);
    pub const EXACT_MATH: Features = Features(1 << 7);
    pub const PYTHON: Features = Features(1 << 8);

    /// Whether every flag in `other` is present in this set.
    #[must_use]
    pub const fn contains(self, other: Features) -> bool {
        self.0 & other.0 == other.0
    }

    /// Union of two flag sets.
    #[must_use]
    pub const fn with(self, other: Features) -> Features {
        Features(self.0 | other.0)
    }

    /// This set with every flag in `other` removed.
    #[must_use]
    pub const fn without(self, other: Features) -> Features {
        Features(self.0 & !other.0)
    }

    /// Whether the model has a flash chip (and thus supports archiving).
    #[must_use]
    pub const fn has_flash(self) -> bool {
        self.contains(Features::FLASH)
    }
}

impl std::ops::BitOr for Features {
    type Output = Features;

    fn bitor(self, rhs: Features) -> Features {
        self.with(rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_accumulate() {
        let f = Features::DEFAULT | Features::COMPLEX | Features::FLASH;
        assert!(f.contains(Features::FLASH));
        assert!(f.has_flash());
        assert!(!f.contains(Features::COLOR));
    }

    #[test]
    fn without_removes_only_named_flags() {
        let f = (Features::DEFAULT | Features::APPS).without(Features::APPS);
        assert!(f.contains(Features::DEFAULT));
        assert!(!f.contains(Features::APPS));
    }
}
