//! Deterministic display colors for clusters.
//!
//! Colors are drawn from `#111111..=#ffffff` by stepping a fixed stride
//! through the range. The stride is coprime to the range length, so the first
//! `0xEEEEEF` ranks map to distinct colors.

use std::fmt;

const BASE: u64 = 0x11_1111;
const SPAN: u64 = 0xEE_EEEF;
const STRIDE: u64 = 0x9E_3779;

/// A 24-bit RGB color rendered as `#rrggbb`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Color(u32);

impl Color {
    /// Raw `0xRRGGBB` value.
    #[must_use]
    pub const fn rgb(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06x}", self.0)
    }
}

/// Maps cluster ranks to colors.
///
/// # Examples
/// ```
/// use editbench_core::reconstruct::Palette;
///
/// let palette = Palette::default();
/// assert_eq!(palette.color(0).to_string(), "#111111");
/// assert_ne!(palette.color(0), palette.color(1));
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Palette {
    seed: u64,
}

impl Palette {
    /// Creates a palette whose first color is offset by `seed`.
    #[must_use]
    pub fn with_seed(seed: u32) -> Self {
        Self {
            seed: u64::from(seed) % SPAN,
        }
    }

    /// Color for the cluster at `rank`.
    #[must_use]
    pub fn color(self, rank: usize) -> Color {
        let rank = u64::try_from(rank).unwrap_or(u64::MAX) % SPAN;
        let offset = (self.seed + rank * STRIDE) % SPAN;
        // BASE + offset <= 0xFFFFFF, so the value always fits.
        Color(u32::try_from(BASE + offset).unwrap_or(u32::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashSet;

    use proptest::prelude::*;

    #[test]
    fn first_colors_are_distinct() {
        let palette = Palette::default();
        let colors: HashSet<Color> = (0..10_000).map(|rank| palette.color(rank)).collect();
        assert_eq!(colors.len(), 10_000);
    }

    #[test]
    fn colors_render_as_hex_triplets() {
        let rendered = Palette::with_seed(7).color(3).to_string();
        assert_eq!(rendered.len(), 7);
        assert!(rendered.starts_with('#'));
        assert!(rendered[1..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    proptest! {
        #[test]
        fn colors_stay_in_range(seed in any::<u32>(), rank in 0usize..1_000_000) {
            let color = Palette::with_seed(seed).color(rank).rgb();
            prop_assert!((0x11_1111..=0xFF_FFFF).contains(&color));
        }

        #[test]
        fn distinct_ranks_get_distinct_colors(
            seed in any::<u32>(),
            left in 0usize..0xEE_EEEF,
            right in 0usize..0xEE_EEEF,
        ) {
            prop_assume!(left != right);
            let palette = Palette::with_seed(seed);
            prop_assert_ne!(palette.color(left), palette.color(right));
        }
    }
}
