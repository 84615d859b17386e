/// Card flip session: six phases, advanced once per tick.
///
/// ```text
///   Begin ─▶ FoldDown ─▶ DrawOppositeFace ─▶ MarkFlipped ─▶ FoldUp ─▶ End
///   (chain)  (+7/tick)   (one step/tick      (chain)        (-5/tick)
///                         while linked)
/// ```
///
/// Each phase handler returns [`Step::Continue`] to run the next phase in the
/// same tick or [`Step::Yield`] to wait for the next one. Begin and
/// MarkFlipped continue; every other phase yields.
///
/// The session owns the fold position and the face being shown. Everything
/// it draws goes through [`CardFaceRenderer`]; the offset table, blend and
/// window go to [`DisplayState`].

use tracing::{debug, trace};

use crate::domain::blend::FlipRegs;
use crate::domain::card::{CardFace, CardField};
use crate::domain::warp::{compute_offsets, FoldDirection, MAX_FOLD};
use super::display::DisplayState;
use super::event::CardEvent;
use super::link::LinkStatus;

/// Fold advance per tick while closing.
pub const FOLD_DOWN_STEP: u8 = 7;
/// Fold position at which the card counts as edge-on.
pub const FOLD_DOWN_LIMIT: u8 = 77;
/// Fold retreat per tick while opening.
pub const FOLD_UP_STEP: u8 = 5;

/// Drawing operations the flip needs from the card backend.
pub trait CardFaceRenderer {
    /// Show or hide the layers carrying card text, portrait and badges.
    fn set_card_layers_visible(&mut self, visible: bool);
    /// Clear the text window and the badge layer.
    fn clear_card_surfaces(&mut self);
    /// Print one field into the text window (or badge layer).
    fn print_field(&mut self, field: CardField);
    /// Swap in the tilemap for `face` on the card layer.
    fn draw_face_tilemap(&mut self, face: CardFace);
    /// Push the text window to the screen.
    fn commit_text_window(&mut self);
    /// Redraw the front: portrait window, screen background, front tilemap.
    fn redraw_front_in_full(&mut self);
    fn recreate_portrait(&mut self);
}

/// Restartable "print all fields" cursor.
///
/// Each call prints at most one field. The call that finds nothing left
/// resets the cursor and reports completion, so a face with `n` fields
/// completes on call `n + 1`.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct PrintCursor {
    next: usize,
}

impl PrintCursor {
    pub fn step(&mut self, face: CardFace, renderer: &mut dyn CardFaceRenderer) -> bool {
        match face.fields().get(self.next) {
            Some(&field) => {
                renderer.print_field(field);
                self.next += 1;
                false
            }
            None => {
                self.next = 0;
                true
            }
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FlipPhase {
    Begin,
    FoldDown,
    DrawOppositeFace,
    MarkFlipped,
    FoldUp,
    End,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Step {
    Continue,
    Yield,
}

/// Borrowed collaborators for one tick.
pub struct FlipContext<'a> {
    pub renderer: &'a mut dyn CardFaceRenderer,
    pub display: &'a mut DisplayState,
    pub link: &'a dyn LinkStatus,
    pub events: &'a mut Vec<CardEvent>,
}

#[derive(Clone, Debug)]
pub struct FlipSession {
    phase: FlipPhase,
    fold: u8,
    draw_step: u8,
    print: PrintCursor,
    face: CardFace,
    finished: bool,
}

impl FlipSession {
    /// New session for a card currently showing `face`.
    pub fn new(face: CardFace) -> Self {
        FlipSession {
            phase: FlipPhase::Begin,
            fold: 0,
            draw_step: 0,
            print: PrintCursor::default(),
            face,
            finished: false,
        }
    }

    pub fn phase(&self) -> FlipPhase {
        self.phase
    }

    pub fn fold_position(&self) -> u8 {
        self.fold
    }

    /// Face currently shown. Changes once, at the midpoint.
    pub fn face(&self) -> CardFace {
        self.face
    }

    /// True once the End phase has run. Further ticks do nothing.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Run one tick: advance phases until one yields.
    pub fn tick(&mut self, cx: &mut FlipContext<'_>) {
        if self.finished {
            return;
        }
        while self.advance(cx) == Step::Continue {}
        debug_assert!(self.fold <= MAX_FOLD);
    }

    /// Run the current phase once.
    pub fn advance(&mut self, cx: &mut FlipContext<'_>) -> Step {
        match self.phase {
            FlipPhase::Begin => self.begin(cx),
            FlipPhase::FoldDown => self.fold_down(cx),
            FlipPhase::DrawOppositeFace => self.draw_opposite_face(cx),
            FlipPhase::MarkFlipped => self.mark_flipped(cx),
            FlipPhase::FoldUp => self.fold_up(cx),
            FlipPhase::End => self.end(cx),
        }
    }

    fn enter(&mut self, phase: FlipPhase) {
        debug!(from = ?self.phase, to = ?phase, fold = self.fold, "flip phase");
        self.phase = phase;
    }

    fn begin(&mut self, cx: &mut FlipContext<'_>) -> Step {
        cx.renderer.set_card_layers_visible(false);
        cx.display.unhook_scanlines();
        cx.display.clear_tables();
        cx.display.hook_scanlines();
        cx.events.push(CardEvent::FlipStarted);
        self.enter(FlipPhase::FoldDown);
        Step::Continue
    }

    fn fold_down(&mut self, cx: &mut FlipContext<'_>) -> Step {
        self.fold = (self.fold + FOLD_DOWN_STEP).min(FOLD_DOWN_LIMIT);
        self.apply_fold(cx.display, FoldDirection::Closing);
        if self.fold >= FOLD_DOWN_LIMIT {
            self.enter(FlipPhase::DrawOppositeFace);
        }
        Step::Yield
    }

    fn draw_opposite_face(&mut self, cx: &mut FlipContext<'_>) -> Step {
        cx.display.set_allow_copy(false);
        if cx.link.recv_queue_backed_up() {
            trace!("link queue backed up, holding flip midpoint");
            return Step::Yield;
        }

        let target = self.face.opposite();
        loop {
            match self.draw_step {
                0 => cx.renderer.clear_card_surfaces(),
                1 => {
                    if !self.print.step(target, cx.renderer) {
                        return Step::Yield;
                    }
                }
                2 => match target {
                    CardFace::Back => cx.renderer.draw_face_tilemap(CardFace::Back),
                    CardFace::Front => cx.renderer.commit_text_window(),
                },
                3 => {
                    if target == CardFace::Front {
                        cx.renderer.recreate_portrait();
                    }
                }
                _ => {
                    self.draw_step = 0;
                    cx.display.set_allow_copy(true);
                    self.enter(FlipPhase::MarkFlipped);
                    return Step::Yield;
                }
            }
            self.draw_step += 1;
            if cx.link.is_linked() {
                return Step::Yield;
            }
        }
    }

    fn mark_flipped(&mut self, cx: &mut FlipContext<'_>) -> Step {
        cx.display.set_allow_copy(false);
        if self.face == CardFace::Back {
            cx.renderer.redraw_front_in_full();
        }
        cx.renderer.commit_text_window();
        self.face = self.face.opposite();
        cx.display.set_allow_copy(true);
        cx.events.push(CardEvent::FlipMidpoint);
        self.enter(FlipPhase::FoldUp);
        Step::Continue
    }

    fn fold_up(&mut self, cx: &mut FlipContext<'_>) -> Step {
        self.fold = self.fold.saturating_sub(FOLD_UP_STEP);
        self.apply_fold(cx.display, FoldDirection::Opening);
        if self.fold == 0 {
            self.enter(FlipPhase::End);
        }
        Step::Yield
    }

    fn end(&mut self, cx: &mut FlipContext<'_>) -> Step {
        cx.renderer.set_card_layers_visible(true);
        cx.display.unhook_scanlines();
        cx.events.push(CardEvent::FlipFinished);
        self.finished = true;
        debug!(face = ?self.face, "flip finished");
        Step::Yield
    }

    /// Push the current fold to the display. The table is written with the
    /// copy gate closed.
    fn apply_fold(&self, display: &mut DisplayState, direction: FoldDirection) {
        display.set_allow_copy(false);
        display.set_regs(FlipRegs::for_card_top(self.fold));
        compute_offsets(self.fold, direction, display.back_mut());
        display.set_allow_copy(true);
        trace!(fold = self.fold, ?direction, "fold table");
    }
}
