/// Events emitted while the card screen runs.
/// The presentation layer consumes these for sound cues.

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CardEvent {
    /// A flip session began folding the card.
    FlipStarted,
    /// The opposite face is in place; the card starts unfolding.
    FlipMidpoint,
    /// The flip session reached its end.
    FlipFinished,
    /// The card finished opening or settled after a flip.
    CardOpened,
    /// The screen finished fading out.
    CardClosed,
}
