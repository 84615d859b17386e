/// Gamepad input tracker using gilrs.
///
/// Button mapping is loaded from config.toml (`[gamepad] flip`, `close`).
/// Default mapping:
///   A  →  Flip
///   B  →  Close
///
/// Without the "gamepad" feature the tracker exists but never reports a press.

#[cfg(feature = "gamepad")]
use gilrs::{Button, EventType, Gilrs};
use tracing::warn;

use crate::config::GamepadConfig;

const NUM_BUTTONS: usize = 10;

/// Logical button identifiers (one per physical button).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A,       // South
    B,       // East
    X,       // West
    Y,       // North
    L1,      // LeftTrigger
    R1,      // RightTrigger
    L2,      // LeftTrigger2
    R2,      // RightTrigger2
    Start,
    Select,
}

impl Btn {
    fn from_name(s: &str) -> Option<Btn> {
        match s.to_uppercase().as_str() {
            "A" | "SOUTH"  => Some(Btn::A),
            "B" | "EAST"   => Some(Btn::B),
            "X" | "WEST"   => Some(Btn::X),
            "Y" | "NORTH"  => Some(Btn::Y),
            "L1" | "LB" | "LEFTTRIGGER"  => Some(Btn::L1),
            "R1" | "RB" | "RIGHTTRIGGER" => Some(Btn::R1),
            "L2" | "LT" | "LEFTTRIGGER2"  => Some(Btn::L2),
            "R2" | "RT" | "RIGHTTRIGGER2" => Some(Btn::R2),
            "START" => Some(Btn::Start),
            "SELECT" | "BACK" => Some(Btn::Select),
            _ => None,
        }
    }

    #[cfg(feature = "gamepad")]
    fn from_gilrs(btn: Button) -> Option<Btn> {
        match btn {
            Button::South     => Some(Btn::A),
            Button::East      => Some(Btn::B),
            Button::West      => Some(Btn::X),
            Button::North     => Some(Btn::Y),
            Button::LeftTrigger  => Some(Btn::L1),
            Button::RightTrigger => Some(Btn::R1),
            Button::LeftTrigger2  => Some(Btn::L2),
            Button::RightTrigger2 => Some(Btn::R2),
            Button::Start     => Some(Btn::Start),
            Button::Select    => Some(Btn::Select),
            _ => None,
        }
    }
}

/// Per-button state: held (continuous) and just_pressed (edge).
#[derive(Clone, Copy, Debug, Default)]
struct BtnState {
    held: bool,
    just_pressed: bool,
}

/// Action-to-button mapping (loaded from config).
#[derive(Debug, PartialEq, Eq)]
struct ActionMap {
    flip: Vec<Btn>,
    close: Vec<Btn>,
}

impl Default for ActionMap {
    fn default() -> Self {
        ActionMap {
            flip: vec![Btn::A],
            close: vec![Btn::B],
        }
    }
}

impl ActionMap {
    /// Lists with no recognizable button names keep the default.
    fn from_config(cfg: &GamepadConfig) -> Self {
        fn parse_list(names: &[String]) -> Vec<Btn> {
            names
                .iter()
                .filter_map(|s| {
                    let btn = Btn::from_name(s);
                    if btn.is_none() {
                        warn!(name = %s, "unknown gamepad button");
                    }
                    btn
                })
                .collect()
        }
        let mut map = ActionMap::default();
        let flip = parse_list(&cfg.flip);
        if !flip.is_empty() { map.flip = flip; }
        let close = parse_list(&cfg.close);
        if !close.is_empty() { map.close = close; }
        map
    }
}

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    buttons: [BtnState; NUM_BUTTONS],
    action_map: ActionMap,

    pub connected: bool,
}

fn btn_index(btn: Btn) -> usize {
    btn as usize
}

impl GamepadState {
    pub fn new() -> Self {
        #[cfg(feature = "gamepad")]
        let (gilrs_opt, connected) = match Gilrs::new() {
            Ok(g) => {
                let has_pad = g.gamepads().next().is_some();
                (Some(g), has_pad)
            }
            Err(e) => {
                warn!("gamepad support unavailable: {e}");
                (None, false)
            }
        };
        #[cfg(not(feature = "gamepad"))]
        let connected = false;

        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs: gilrs_opt,
            buttons: [BtnState::default(); NUM_BUTTONS],
            action_map: ActionMap::default(),
            connected,
        }
    }

    /// Load button mapping from config.
    pub fn load_button_config(&mut self, cfg: &GamepadConfig) {
        self.action_map = ActionMap::from_config(cfg);
    }

    pub fn update(&mut self) {
        for b in &mut self.buttons {
            b.just_pressed = false;
        }

        #[cfg(feature = "gamepad")]
        self.poll_gilrs();
    }

    #[cfg(feature = "gamepad")]
    fn poll_gilrs(&mut self) {
        let gilrs = match &mut self.gilrs {
            Some(g) => g,
            None => return,
        };

        let events: Vec<_> = std::iter::from_fn(|| gilrs.next_event()).collect();

        for event in events {
            match event.event {
                EventType::ButtonPressed(btn, _) => {
                    self.connected = true;
                    if let Some(b) = Btn::from_gilrs(btn) {
                        self.press(b);
                    }
                }
                EventType::ButtonReleased(btn, _) => {
                    if let Some(b) = Btn::from_gilrs(btn) {
                        self.buttons[btn_index(b)].held = false;
                    }
                }
                EventType::Connected => { self.connected = true; }
                EventType::Disconnected => {
                    self.connected = false;
                    self.buttons = [BtnState::default(); NUM_BUTTONS];
                }
                _ => {}
            }
        }
    }

    fn press(&mut self, btn: Btn) {
        let state = &mut self.buttons[btn_index(btn)];
        if !state.held {
            state.just_pressed = true;
        }
        state.held = true;
    }

    // ── Action queries (config-driven) ──

    fn any_just_pressed(&self, btns: &[Btn]) -> bool {
        btns.iter().any(|&b| self.buttons[btn_index(b)].just_pressed)
    }

    pub fn flip_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.flip)
    }

    pub fn close_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.close)
    }
}

impl Default for GamepadState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(flip: &[&str], close: &[&str]) -> GamepadConfig {
        GamepadConfig {
            flip: flip.iter().map(|s| s.to_string()).collect(),
            close: close.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn names_are_case_insensitive() {
        assert_eq!(Btn::from_name("south"), Some(Btn::A));
        assert_eq!(Btn::from_name("Rb"), Some(Btn::R1));
        assert_eq!(Btn::from_name("back"), Some(Btn::Select));
        assert_eq!(Btn::from_name("turbo"), None);
    }

    #[test]
    fn config_overrides_and_falls_back() {
        let map = ActionMap::from_config(&cfg(&["X", "start"], &["nope"]));
        assert_eq!(map.flip, vec![Btn::X, Btn::Start]);
        assert_eq!(map.close, vec![Btn::B]);
    }

    #[test]
    fn press_is_edge_triggered() {
        let mut pad = GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs: None,
            buttons: [BtnState::default(); NUM_BUTTONS],
            action_map: ActionMap::default(),
            connected: true,
        };
        pad.press(Btn::A);
        assert!(pad.flip_pressed());
        assert!(!pad.close_pressed());

        pad.update();
        pad.press(Btn::A); // still held
        assert!(!pad.flip_pressed());
    }
}
