/// Scanline offset generator for the card flip.
///
/// The card is drawn on one background layer whose vertical scroll is
/// rewritten on every scanline. Feeding each line its own offset squeezes
/// the card toward its horizontal midline, which reads as a card rotating
/// away from the viewer. The table has three regions for fold position `f`:
///
/// ```text
///   rows [0, f)          -i            the near edge curls away
///   rows [f, 160 - f)    curve         running sum of a linearly changing step
///   rows [160 - f, 160)  flat          band end, computed from the initial step
/// ```
///
/// The band curve starts at `-f`, one below the last ramp row, so the fold
/// edge never jumps. The bottom region is a flat extension rather than a
/// mirrored ramp; the visible window hides it, and the asymmetry is kept.
///
/// All math is 16.16 fixed point with wrapping and truncation at every row,
/// so the table is bit-identical to the register routine it reproduces.

use super::fixed::Fixed16;

/// Number of visible scanlines.
pub const SCANLINES: usize = 160;

/// Largest meaningful fold position (the card folded flat to its midline).
pub const MAX_FOLD: u8 = (SCANLINES / 2) as u8;

pub type ScanlineTable = [i16; SCANLINES];

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FoldDirection {
    /// Card rotating away (fold position growing).
    Closing,
    /// Card rotating back (fold position shrinking).
    Opening,
}

/// Fill `out` with the per-scanline offsets for `fold`.
///
/// Panics if `fold` exceeds [`MAX_FOLD`]; fold positions come from the flip
/// state machine, so an out-of-range value is a bug upstream.
pub fn compute_offsets(fold: u8, direction: FoldDirection, out: &mut ScanlineTable) {
    assert!(fold <= MAX_FOLD, "fold position {fold} out of range");

    let f = fold as usize;
    let band_end = SCANLINES - f;
    let band = (band_end - f) as u32;

    let mut pos = Fixed16::from_int(-(fold as i32));

    // Base step: 160 / band - 1. A zero-width band has no step at all.
    let (base, accel) = if band == 0 {
        (Fixed16::ZERO, Fixed16::ZERO)
    } else {
        let base = Fixed16::from_int(SCANLINES as i32) / band - Fixed16::ONE;
        (base, base / band)
    };
    let edge = pos + base * band;

    let mut step = match direction {
        FoldDirection::Closing => base * 2,
        FoldDirection::Opening => base / 2,
    };

    for (i, slot) in out[..f].iter_mut().enumerate() {
        *slot = -(i as i16);
    }

    for slot in &mut out[f..band_end] {
        *slot = pos.trunc();
        pos += step;
        match direction {
            FoldDirection::Closing => step -= accel,
            FoldDirection::Opening => step += accel,
        }
    }

    out[band_end..].fill(edge.trunc());
}

/// Convenience wrapper returning a fresh table.
pub fn offsets(fold: u8, direction: FoldDirection) -> ScanlineTable {
    let mut table = [0; SCANLINES];
    compute_offsets(fold, direction, &mut table);
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn direction() -> impl Strategy<Value = FoldDirection> {
        prop_oneof![Just(FoldDirection::Closing), Just(FoldDirection::Opening)]
    }

    #[test]
    fn flat_card_has_no_offsets() {
        assert!(offsets(0, FoldDirection::Closing).iter().all(|&v| v == 0));
        assert!(offsets(0, FoldDirection::Opening).iter().all(|&v| v == 0));
    }

    #[test]
    fn overwrites_stale_contents() {
        let mut table = [123; SCANLINES];
        compute_offsets(0, FoldDirection::Opening, &mut table);
        assert_eq!(table, [0; SCANLINES]);
    }

    #[test]
    fn first_fold_step_closing() {
        let t = offsets(7, FoldDirection::Closing);
        assert_eq!(&t[..7], &[0, -1, -2, -3, -4, -5, -6]);
        assert_eq!(&t[7..15], &[-7, -7, -7, -7, -7, -7, -6, -6]);
        // band tail, then the flat extension
        assert_eq!(&t[149..154], &[13, 13, 13, 13, 6]);
        assert!(t[153..].iter().all(|&v| v == 6));
    }

    #[test]
    fn first_fold_step_opening() {
        let t = offsets(7, FoldDirection::Opening);
        assert_eq!(&t[7..15], &[-7; 8]);
        assert_eq!(&t[149..154], &[6; 5]);
        assert_eq!(t[159], 6);
    }

    #[test]
    fn deepest_fold_closing() {
        let t = offsets(77, FoldDirection::Closing);
        assert_eq!(t[76], -76);
        assert_eq!(&t[77..83], &[-77, -26, 21, 64, 102, 136]);
        assert!(t[83..].iter().all(|&v| v == 76));
    }

    #[test]
    fn deepest_fold_opening() {
        let t = offsets(77, FoldDirection::Opening);
        assert_eq!(&t[77..83], &[-77, -65, -48, -26, -1, 29]);
        assert!(t[83..].iter().all(|&v| v == 76));
    }

    #[test]
    fn mid_fold_closing() {
        let t = offsets(35, FoldDirection::Closing);
        assert_eq!(&t[35..43], &[-35, -34, -32, -31, -29, -28, -26, -25]);
        assert_eq!(&t[121..126], &[67, 68, 68, 69, 34]);
    }

    #[test]
    fn zero_width_band_is_handled() {
        let t = offsets(MAX_FOLD, FoldDirection::Closing);
        assert_eq!(t[79], -79);
        assert!(t[80..].iter().all(|&v| v == -80));
    }

    #[test]
    #[should_panic]
    fn fold_past_midline_panics() {
        offsets(MAX_FOLD + 1, FoldDirection::Closing);
    }

    proptest! {
        #[test]
        fn top_rows_follow_linear_ramp(fold in 1u8..=MAX_FOLD, dir in direction()) {
            let t = offsets(fold, dir);
            for i in 0..fold as usize {
                prop_assert_eq!(t[i], -(i as i16));
            }
        }

        #[test]
        fn band_starts_one_below_the_ramp(fold in 1u8..MAX_FOLD, dir in direction()) {
            let t = offsets(fold, dir);
            let f = fold as usize;
            prop_assert_eq!(t[f], -(fold as i16));
            prop_assert_eq!(t[f] - t[f - 1], -1);
        }

        #[test]
        fn band_never_moves_backwards(fold in 1u8..MAX_FOLD, dir in direction()) {
            let t = offsets(fold, dir);
            let band = &t[fold as usize..SCANLINES - fold as usize];
            prop_assert!(band.windows(2).all(|w| w[1] >= w[0]));
        }

        #[test]
        fn bottom_rows_are_flat(fold in 1u8..=MAX_FOLD, dir in direction()) {
            let t = offsets(fold, dir);
            let tail = &t[SCANLINES - fold as usize..];
            prop_assert!(tail.iter().all(|&v| v == tail[0]));
        }

        #[test]
        fn same_input_same_table(fold in 0u8..=MAX_FOLD, dir in direction()) {
            prop_assert_eq!(offsets(fold, dir), offsets(fold, dir));
        }
    }
}
