/// Darken blend and card window derived from the fold position.
///
/// Both values are pure functions of the card top and are pushed to the
/// display once per fold tick, alongside the offset table.

use super::warp::SCANLINES;

/// Coefficients at or below this are treated as no darkening.
const BLEND_FLOOR: i32 = 4;

/// Darken coefficient for a card whose top edge sits at `card_top`.
///
/// `(card_top + 40) / 10`, truncating, with anything `<= 4` snapped to 0.
pub fn blend_coefficient_for(card_top: i32) -> i32 {
    let coefficient = (card_top + 40) / 10;
    if coefficient <= BLEND_FLOOR { 0 } else { coefficient }
}

/// Vertical range `[top, bottom)` of the window the folding card shows through.
pub fn card_window(card_top: u8) -> (u8, u8) {
    (card_top, (SCANLINES as u8).saturating_sub(card_top))
}

/// Per-tick display parameters for a fold position.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct FlipRegs {
    pub blend: i32,
    pub window_top: u8,
    pub window_bottom: u8,
}

impl FlipRegs {
    pub fn for_card_top(card_top: u8) -> Self {
        let (window_top, window_bottom) = card_window(card_top);
        FlipRegs {
            blend: blend_coefficient_for(card_top as i32),
            window_top,
            window_bottom,
        }
    }

    /// Registers for a flat card: no darkening, full-height window.
    pub fn flat() -> Self {
        Self::for_card_top(0)
    }
}
