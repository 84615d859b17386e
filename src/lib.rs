/// Trainer card screen with the scanline-warp flip animation.
///
/// Layers:
///   - `domain`: pure math and card data (fixed point, offset tables, blend)
///   - `sim`   : the flip session and card screen state machines
///   - `ui`    : terminal backend: renderer, input, gamepad, sound
///   - `config`: `config.toml` loading

pub mod config;
pub mod domain;
pub mod sim;
pub mod ui;
