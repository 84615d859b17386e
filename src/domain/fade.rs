/// Whole-screen palette fade toward black.
///
/// Level 0 is full color, [`FADE_MAX`] is black. The level moves one unit per
/// tick toward its target.

pub const FADE_MAX: u8 = 16;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct PaletteFade {
    level: u8,
    target: u8,
}

impl PaletteFade {
    /// Starts fully black, the state the card screen opens in.
    pub fn new() -> Self {
        PaletteFade { level: FADE_MAX, target: FADE_MAX }
    }

    pub fn begin(&mut self, from: u8, to: u8) {
        self.level = from.min(FADE_MAX);
        self.target = to.min(FADE_MAX);
    }

    pub fn fade_in(&mut self) {
        self.begin(FADE_MAX, 0);
    }

    pub fn fade_out(&mut self) {
        self.begin(0, FADE_MAX);
    }

    /// Advance one step. Returns true while the fade is still running.
    pub fn tick(&mut self) -> bool {
        if self.level < self.target {
            self.level += 1;
        } else if self.level > self.target {
            self.level -= 1;
        }
        self.active()
    }

    pub fn active(&self) -> bool {
        self.level != self.target
    }

    pub fn level(&self) -> u8 {
        self.level
    }
}

impl Default for PaletteFade {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fade_in_reaches_full_color() {
        let mut f = PaletteFade::new();
        f.fade_in();
        assert!(f.active());
        let mut ticks = 0;
        while f.tick() {
            ticks += 1;
        }
        // 16 steps; the last one returns false
        assert_eq!(ticks, 15);
        assert_eq!(f.level(), 0);
        assert!(!f.active());
    }

    #[test]
    fn fade_out_reaches_black() {
        let mut f = PaletteFade::new();
        f.begin(0, 0);
        assert!(!f.active());
        f.fade_out();
        for _ in 0..FADE_MAX {
            f.tick();
        }
        assert_eq!(f.level(), FADE_MAX);
    }

    #[test]
    fn begin_clamps_levels() {
        let mut f = PaletteFade::new();
        f.begin(40, 0);
        assert_eq!(f.level(), FADE_MAX);
    }
}
