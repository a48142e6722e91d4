use serde::{Deserialize, Serialize};

const KIB: f64 = 1024.0;

/// Memory size in bytes, combined from byte/KiB/MiB/GiB components
///
/// Fractional components are truncated to whole bytes one component at a
/// time. Negative components contribute nothing, so the total is never
/// below zero.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ByteSize(u64);

impl ByteSize {
    pub const ZERO: Self = Self(0);

    /// Combine components; any omitted component contributes 0
    pub fn new(b: Option<u64>, kb: Option<f64>, mb: Option<f64>, gb: Option<f64>) -> Self {
        let total = b
            .unwrap_or(0)
            .saturating_add(scaled(kb, 1))
            .saturating_add(scaled(mb, 2))
            .saturating_add(scaled(gb, 3));
        Self(total)
    }

    pub const fn b(bytes: u64) -> Self {
        Self(bytes)
    }

    pub fn kb(kb: f64) -> Self {
        Self::new(None, Some(kb), None, None)
    }

    pub fn mb(mb: f64) -> Self {
        Self::new(None, None, Some(mb), None)
    }

    pub fn gb(gb: f64) -> Self {
        Self::new(None, None, None, Some(gb))
    }

    /// Absolute byte count
    pub const fn bytes(&self) -> u64 {
        self.0
    }
}

// `as` saturates: negatives and NaN become 0, overflow becomes u64::MAX.
fn scaled(component: Option<f64>, power: i32) -> u64 {
    component.map_or(0, |value| (value * KIB.powi(power)) as u64)
}

impl std::ops::Add for ByteSize {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl From<u64> for ByteSize {
    fn from(bytes: u64) -> Self {
        Self(bytes)
    }
}

impl std::fmt::Display for ByteSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} bytes", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn omitted_components_contribute_nothing() {
        assert_eq!(ByteSize::new(None, None, None, None), ByteSize::ZERO);
        assert_eq!(ByteSize::default(), ByteSize::ZERO);
        assert_eq!(ByteSize::new(Some(7), None, None, None).bytes(), 7);
    }

    #[test]
    fn units_are_binary() {
        assert_eq!(ByteSize::kb(1.0).bytes(), 1024);
        assert_eq!(ByteSize::mb(1.0).bytes(), 1024 * 1024);
        assert_eq!(ByteSize::gb(1.0).bytes(), 1024 * 1024 * 1024);
    }

    #[test]
    fn fractional_components_truncate_per_component() {
        // 0.001 KiB = 1.024 bytes, truncated to 1 before summing
        let size = ByteSize::new(Some(1), Some(0.001), Some(0.5), None);
        assert_eq!(size.bytes(), 1 + 1 + 512 * 1024);
    }

    #[test]
    fn negative_components_clamp_to_zero() {
        assert_eq!(ByteSize::new(Some(10), Some(-4.0), None, None).bytes(), 10);
        assert_eq!(ByteSize::mb(-1.0), ByteSize::ZERO);
    }

    #[test]
    fn add_sums_bytes() {
        assert_eq!((ByteSize::mb(1.0) + ByteSize::b(1)).bytes(), 1024 * 1024 + 1);
    }

    proptest! {
        #[test]
        fn total_is_sum_of_components(
            b in proptest::option::of(0u64..1 << 20),
            kb in proptest::option::of(0u32..1 << 20),
            mb in proptest::option::of(0u32..1 << 12),
            gb in proptest::option::of(0u32..16),
        ) {
            let size = ByteSize::new(
                b,
                kb.map(f64::from),
                mb.map(f64::from),
                gb.map(f64::from),
            );
            let expected = b.unwrap_or(0)
                + u64::from(kb.unwrap_or(0)) * 1024
                + u64::from(mb.unwrap_or(0)) * 1024 * 1024
                + u64::from(gb.unwrap_or(0)) * 1024 * 1024 * 1024;
            prop_assert_eq!(size.bytes(), expected);
        }
    }
}
