/// Display-side state the flip writes into.
///
/// ## Offset table handoff
///
/// The offset table is double-buffered:
///   - `back` : written by the offset generator during a tick
///   - `front`: read by the backend once per scanline
///
/// At vertical blank `back` is copied to `front`, but only while
/// `allow_copy` is set. The flip clears the flag before it rewrites `back`
/// and sets it again once the table is complete, so a half-written table
/// is never latched.
///
/// Blend and window registers are latched the same way the hardware does
/// it: immediately, since they are only read at vertical blank.

use crate::domain::blend::FlipRegs;
use crate::domain::warp::{ScanlineTable, SCANLINES};

#[derive(Clone, Debug)]
pub struct DisplayState {
    back: ScanlineTable,
    front: ScanlineTable,
    allow_copy: bool,
    scanline_hooked: bool,
    regs: FlipRegs,
}

impl DisplayState {
    pub fn new() -> Self {
        DisplayState {
            back: [0; SCANLINES],
            front: [0; SCANLINES],
            allow_copy: false,
            scanline_hooked: false,
            regs: FlipRegs::flat(),
        }
    }

    pub fn back_mut(&mut self) -> &mut ScanlineTable {
        &mut self.back
    }

    /// The table the backend is currently reading.
    pub fn front(&self) -> &ScanlineTable {
        &self.front
    }

    pub fn set_allow_copy(&mut self, allow: bool) {
        self.allow_copy = allow;
    }

    pub fn allow_copy(&self) -> bool {
        self.allow_copy
    }

    pub fn clear_tables(&mut self) {
        self.back = [0; SCANLINES];
        self.front = [0; SCANLINES];
    }

    /// Attach the per-scanline read hook.
    pub fn hook_scanlines(&mut self) {
        self.scanline_hooked = true;
    }

    /// Detach the per-scanline read hook. Lines read as unshifted afterwards.
    pub fn unhook_scanlines(&mut self) {
        self.scanline_hooked = false;
    }

    pub fn scanlines_hooked(&self) -> bool {
        self.scanline_hooked
    }

    pub fn set_regs(&mut self, regs: FlipRegs) {
        self.regs = regs;
    }

    pub fn regs(&self) -> FlipRegs {
        self.regs
    }

    /// Vertical blank: latch the back table if the writer allows it.
    pub fn vblank(&mut self) {
        if self.allow_copy {
            self.front = self.back;
        }
    }

    /// Offset for scanline `line`, as read during horizontal blank.
    pub fn scanline_offset(&self, line: usize) -> i16 {
        if !self.scanline_hooked {
            return 0;
        }
        self.front.get(line).copied().unwrap_or(0)
    }

    /// Is scanline `line` inside the card window?
    pub fn in_window(&self, line: usize) -> bool {
        line >= self.regs.window_top as usize && line < self.regs.window_bottom as usize
    }
}

impl Default for DisplayState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_is_gated_by_flag() {
        let mut d = DisplayState::new();
        d.back_mut()[3] = -3;
        d.vblank();
        assert_eq!(d.front()[3], 0);

        d.set_allow_copy(true);
        d.vblank();
        assert_eq!(d.front()[3], -3);
    }

    #[test]
    fn unhooked_lines_read_zero() {
        let mut d = DisplayState::new();
        d.back_mut()[10] = 5;
        d.set_allow_copy(true);
        d.vblank();
        assert_eq!(d.scanline_offset(10), 0);
        d.hook_scanlines();
        assert_eq!(d.scanline_offset(10), 5);
        assert_eq!(d.scanline_offset(SCANLINES + 4), 0);
    }

    #[test]
    fn cleared_back_table_copies_as_zero() {
        let mut d = DisplayState::new();
        d.back_mut()[7] = -7;
        d.set_allow_copy(true);
        d.vblank();
        d.back_mut()[7] = -9;
        d.clear_tables();
        assert_eq!(d.front()[7], 0);
        d.vblank();
        assert_eq!(d.front()[7], 0);
    }

    #[test]
    fn window_follows_regs() {
        let mut d = DisplayState::new();
        assert!(d.in_window(0) && d.in_window(159));
        d.set_regs(FlipRegs::for_card_top(70));
        assert!(!d.in_window(69));
        assert!(d.in_window(70));
        assert!(d.in_window(89));
        assert!(!d.in_window(90));
    }
}
