/// The trainer card screen: opening draw, input handling, flips, closing.
///
/// ## States
///
/// ```text
///   ClearText → PrintFront (one field/tick) → CommitText → Portrait
///     → Background → FrontTilemap → Stars → FadeIn → WaitFadeIn
///     → HandleInputFront ⇄ WaitFlipToBack → HandleInputBack ⇄ WaitFlipToFront
///     → Close → Closed
/// ```
///
/// The active [`FlipSession`], if any, is ticked after the state handler,
/// except on the tick that creates it: that tick already ran the session's
/// first step.
///
/// ## Vertical blank
///
/// `vblank()` drives the play-time colon blink and then latches the scanline
/// table. It only runs once the screen has hooked it (fade-in onward).

use tracing::{debug, info};

use crate::domain::card::{CardFace, CardField};
use crate::domain::fade::PaletteFade;
use super::display::DisplayState;
use super::event::CardEvent;
use super::flip::{CardFaceRenderer, FlipContext, FlipSession, PrintCursor};
use super::link::LinkStatus;

/// Vertical blanks between colon blink toggles (exclusive).
const COLON_BLINK_BLANKS: u8 = 60;

/// Extra drawing the screen needs beyond what a flip uses.
pub trait CardScreenRenderer: CardFaceRenderer {
    fn clear_text_window(&mut self);
    fn commit_portrait_window(&mut self);
    fn draw_screen_background(&mut self);
    fn draw_stars(&mut self);
    fn set_colon_visible(&mut self, visible: bool);
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ScreenState {
    ClearText,
    PrintFront,
    CommitText,
    Portrait,
    Background,
    FrontTilemap,
    Stars,
    FadeIn,
    WaitFadeIn,
    HandleInputFront,
    HandleInputBack,
    WaitFlipToBack,
    WaitFlipToFront,
    Close,
    Closed,
}

/// Edge-triggered input for one tick.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct ScreenInput {
    pub flip: bool,
    pub close: bool,
}

#[derive(Clone, Debug)]
pub struct TrainerCardScreen {
    state: ScreenState,
    face: CardFace,
    session: Option<FlipSession>,
    print: PrintCursor,
    fade: PaletteFade,
    vblank_hooked: bool,
    blink_timer: u8,
    colon_invisible: bool,
    colon_needs_draw: bool,
}

impl TrainerCardScreen {
    pub fn new() -> Self {
        TrainerCardScreen {
            state: ScreenState::ClearText,
            face: CardFace::Front,
            session: None,
            print: PrintCursor::default(),
            fade: PaletteFade::new(),
            vblank_hooked: false,
            blink_timer: 0,
            colon_invisible: false,
            colon_needs_draw: false,
        }
    }

    pub fn state(&self) -> ScreenState {
        self.state
    }

    /// Face settled on screen (the face a running flip started from).
    pub fn face(&self) -> CardFace {
        self.face
    }

    pub fn session(&self) -> Option<&FlipSession> {
        self.session.as_ref()
    }

    pub fn fade_level(&self) -> u8 {
        self.fade.level()
    }

    pub fn closed(&self) -> bool {
        self.state == ScreenState::Closed
    }

    /// Advance one frame.
    pub fn tick<R: CardScreenRenderer>(
        &mut self,
        input: ScreenInput,
        renderer: &mut R,
        display: &mut DisplayState,
        link: &dyn LinkStatus,
    ) -> Vec<CardEvent> {
        let mut events = Vec::new();
        let started = self.handle_state(input, renderer, display, link, &mut events);

        if !started {
            if let Some(session) = self.session.as_mut() {
                let mut cx = FlipContext {
                    renderer: &mut *renderer,
                    display: &mut *display,
                    link,
                    events: &mut events,
                };
                session.tick(&mut cx);
            }
        }

        if let Some(session) = self.session.as_ref() {
            if session.is_finished() {
                self.face = session.face();
                self.session = None;
            }
        }

        events
    }

    /// Vertical blank: colon blink, then scanline table latch.
    pub fn vblank(&mut self, display: &mut DisplayState) {
        if !self.vblank_hooked {
            return;
        }
        self.blink_timer += 1;
        if self.blink_timer > COLON_BLINK_BLANKS {
            self.blink_timer = 0;
            self.colon_invisible = !self.colon_invisible;
            self.colon_needs_draw = true;
        }
        display.vblank();
    }

    fn set_state(&mut self, state: ScreenState) {
        debug!(from = ?self.state, to = ?state, "card screen");
        self.state = state;
    }

    /// Run the current state's handler. Returns true if it started a flip.
    fn handle_state<R: CardScreenRenderer>(
        &mut self,
        input: ScreenInput,
        renderer: &mut R,
        display: &mut DisplayState,
        link: &dyn LinkStatus,
        events: &mut Vec<CardEvent>,
    ) -> bool {
        match self.state {
            ScreenState::ClearText => {
                renderer.clear_text_window();
                self.set_state(ScreenState::PrintFront);
            }
            ScreenState::PrintFront => {
                if self.print.step(CardFace::Front, &mut *renderer) {
                    self.set_state(ScreenState::CommitText);
                }
            }
            ScreenState::CommitText => {
                renderer.commit_text_window();
                self.set_state(ScreenState::Portrait);
            }
            ScreenState::Portrait => {
                renderer.recreate_portrait();
                renderer.commit_portrait_window();
                self.set_state(ScreenState::Background);
            }
            ScreenState::Background => {
                renderer.draw_screen_background();
                self.set_state(ScreenState::FrontTilemap);
            }
            ScreenState::FrontTilemap => {
                renderer.draw_face_tilemap(CardFace::Front);
                self.set_state(ScreenState::Stars);
            }
            ScreenState::Stars => {
                renderer.draw_stars();
                self.set_state(ScreenState::FadeIn);
            }
            ScreenState::FadeIn => {
                self.fade.fade_in();
                self.vblank_hooked = true;
                self.set_state(ScreenState::WaitFadeIn);
            }
            ScreenState::WaitFadeIn => {
                if !self.fade.tick() {
                    info!("trainer card open");
                    events.push(CardEvent::CardOpened);
                    self.set_state(ScreenState::HandleInputFront);
                }
            }
            ScreenState::HandleInputFront => {
                if !link.is_linked() && self.colon_needs_draw {
                    renderer.set_colon_visible(!self.colon_invisible);
                    renderer.print_field(CardField::PlayTime);
                    renderer.commit_text_window();
                    self.colon_needs_draw = false;
                }
                if input.flip {
                    self.start_flip(renderer, display, link, events);
                    self.set_state(ScreenState::WaitFlipToBack);
                    return true;
                } else if input.close {
                    self.begin_close();
                }
            }
            ScreenState::HandleInputBack => {
                if input.flip {
                    self.start_flip(renderer, display, link, events);
                    self.set_state(ScreenState::WaitFlipToFront);
                    return true;
                } else if input.close {
                    self.begin_close();
                }
            }
            ScreenState::WaitFlipToBack | ScreenState::WaitFlipToFront => {
                if self.session.is_none() && !link.recv_queue_backed_up() {
                    events.push(CardEvent::CardOpened);
                    let next = if self.state == ScreenState::WaitFlipToBack {
                        ScreenState::HandleInputBack
                    } else {
                        ScreenState::HandleInputFront
                    };
                    self.set_state(next);
                }
            }
            ScreenState::Close => {
                if !self.fade.tick() {
                    info!("trainer card closed");
                    events.push(CardEvent::CardClosed);
                    self.set_state(ScreenState::Closed);
                }
            }
            ScreenState::Closed => {}
        }
        false
    }

    fn start_flip<R: CardScreenRenderer>(
        &mut self,
        renderer: &mut R,
        display: &mut DisplayState,
        link: &dyn LinkStatus,
        events: &mut Vec<CardEvent>,
    ) {
        debug_assert!(self.session.is_none(), "flip already in progress");
        let mut session = FlipSession::new(self.face);
        let mut cx = FlipContext {
            renderer,
            display,
            link,
            events,
        };
        session.tick(&mut cx);
        self.session = Some(session);
    }

    fn begin_close(&mut self) {
        self.fade.fade_out();
        self.set_state(ScreenState::Close);
    }
}

impl Default for TrainerCardScreen {
    fn default() -> Self {
        Self::new()
    }
}
