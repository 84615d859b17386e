/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Paint the card's layers into an off-screen `image` (card pixels,
///      one tile = 2 terminal columns × 1 row)
///   2. Build the next frame into `front`: each terminal row samples the
///      scanline at its center, shifts it by the display's offset table, and
///      keeps it only if it falls inside the card window
///   3. Darken by the flip blend and the screen fade
///   4. Compare with `back` (previous frame), emit only changed cells,
///      batched with `queue!` and flushed once
///   5. Swap front/back
///
/// The scanline offset is a vertical source shift: displayed line `s` shows
/// card line `s + offset[s]`.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::card::{CardFace, Gender, CARD_COLS, CARD_ROWS};
use crate::domain::fade::FADE_MAX;
use crate::domain::warp::SCANLINES;
use crate::sim::canvas::CardCanvas;
use crate::sim::display::DisplayState;

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for all "empty" terminal cells, also used
    /// for `Clear`, so inter-row gaps match the cells.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel cell used to invalidate the back buffer.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        Cell { ch, fg, bg }
    }

    /// Scale both colors by `keep / 16`.
    fn darken(self, keep: u8) -> Self {
        Cell { ch: self.ch, fg: scale(self.fg, keep), bg: scale(self.bg, keep) }
    }
}

fn scale(c: Color, keep: u8) -> Color {
    let keep = keep.min(16) as u16;
    match c {
        Color::Rgb { r, g, b } => Color::Rgb {
            r: (r as u16 * keep / 16) as u8,
            g: (g as u16 * keep / 16) as u8,
            b: (b as u16 * keep / 16) as u8,
        },
        other => other,
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer {
            width: w,
            height: h,
            cells: vec![Cell::BLANK; w * h],
        }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn fill(&mut self, cell: Cell) {
        self.cells.fill(cell);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Write a string at (x, y), keeping the background already there.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color) {
        for (i, ch) in s.chars().enumerate() {
            let bg = self.get(x + i, y).bg;
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }
}

// ── Layout & palette ──

/// Terminal columns per card tile.
const CELL_W: usize = 2;
const IMAGE_W: usize = CARD_COLS as usize * CELL_W;
const IMAGE_H: usize = CARD_ROWS as usize;
/// Scanlines per terminal row.
const LINES_PER_ROW: usize = SCANLINES / IMAGE_H;

const HELP_TEXT: &str = "Enter/Space: flip   Esc: close   Ctrl+C: quit";

const TEXT_FG: Color = Color::Rgb { r: 32, g: 32, b: 40 };
const SCREEN_BG_A: Color = Color::Rgb { r: 40, g: 56, b: 96 };
const SCREEN_BG_B: Color = Color::Rgb { r: 48, g: 64, b: 112 };
const BADGE_ON: Color = Color::Rgb { r: 232, g: 184, b: 48 };
const BADGE_OFF: Color = Color::Rgb { r: 120, g: 120, b: 128 };
const STAR_FG: Color = Color::Rgb { r: 248, g: 216, b: 64 };

/// Card body and border colors by star count.
const CARD_COLORS: [(Color, Color); 5] = [
    (Color::Rgb { r: 168, g: 200, b: 240 }, Color::Rgb { r: 64, g: 96, b: 176 }),   // blue
    (Color::Rgb { r: 168, g: 224, b: 176 }, Color::Rgb { r: 56, g: 136, b: 80 }),   // green
    (Color::Rgb { r: 232, g: 192, b: 152 }, Color::Rgb { r: 160, g: 96, b: 48 }),   // bronze
    (Color::Rgb { r: 216, g: 216, b: 224 }, Color::Rgb { r: 120, g: 120, b: 136 }), // silver
    (Color::Rgb { r: 248, g: 224, b: 136 }, Color::Rgb { r: 184, g: 144, b: 32 }),  // gold
];

/// Portrait box, in tiles: (col, row, width, height).
const PORTRAIT: (usize, usize, usize, usize) = (21, 4, 6, 7);
const BADGE_ROW: usize = 15;
const STAR_ROW: usize = 17;

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    image: FrameBuffer,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    /// Keyboard enhancement was pushed, so Release events arrive.
    key_release: bool,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            image: FrameBuffer::new(IMAGE_W, IMAGE_H),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            key_release: false,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        if terminal::supports_keyboard_enhancement().unwrap_or(false) {
            self.key_release = execute!(
                self.writer,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )
            .is_ok();
        }

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint on first frame.
        self.back.fill(Cell::INVALID);

        Ok(())
    }

    /// Whether the terminal reports key Release events.
    pub fn reports_key_release(&self) -> bool {
        self.key_release
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        if self.key_release {
            execute!(self.writer, PopKeyboardEnhancementFlags)?;
            self.key_release = false;
        }
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, canvas: &CardCanvas, display: &DisplayState, fade_level: u8) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        paint_card(&mut self.image, canvas);

        self.front.fill(Cell::BLANK);
        let ox = self.term_w.saturating_sub(IMAGE_W) / 2;
        let oy = self.term_h.saturating_sub(IMAGE_H + 2) / 2;
        compose_screen(&mut self.front, ox, oy, &self.image, canvas, display, fade_level);

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Explicit base colors, not ResetColor: the terminal default may
        // differ from BASE_BG.
        queue!(self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        let mut utf8 = [0u8; 4];
        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }

                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }

                queue!(self.writer, Print(&*cell.ch.encode_utf8(&mut utf8)))?;
                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

// ── Compose: card image ──

/// Paint every card layer that is loaded into `image`. A card with no
/// tilemap yet paints as screen background.
fn paint_card(image: &mut FrameBuffer, canvas: &CardCanvas) {
    let Some(face) = canvas.face_tilemap() else {
        paint_screen_background(image, canvas.background_drawn());
        return;
    };

    let card = canvas.card();
    let stars = card.star_count() as usize;
    let (body, border) = CARD_COLORS[stars.min(CARD_COLORS.len() - 1)];

    for y in 0..IMAGE_H {
        for x in 0..IMAGE_W {
            let edge_x = x == 0 || x == IMAGE_W - 1;
            let edge_y = y == 0 || y == IMAGE_H - 1;
            let cell = match (edge_x, edge_y) {
                (true, true) => Cell::new('+', body, border),
                (true, false) => Cell::new('|', body, border),
                (false, true) => Cell::new('=', body, border),
                (false, false) => Cell::new(' ', TEXT_FG, body),
            };
            image.set(x, y, cell);
        }
    }
    let title = match face {
        CardFace::Front => "TRAINER CARD",
        CardFace::Back => "",
    };
    image.put_str(4, 1, title, border);

    if !canvas.layers_visible() {
        return;
    }

    for run in canvas.committed_text() {
        image.put_str(run.col as usize * CELL_W, run.row as usize, &run.text, TEXT_FG);
    }

    if canvas.portrait_shown() {
        let (col, row, w, h) = PORTRAIT;
        for ty in row..row + h {
            for tx in col * CELL_W..(col + w) * CELL_W {
                image.set(tx, ty, Cell::new(' ', TEXT_FG, border));
            }
        }
        let glyph = match card.gender {
            Gender::Male => "♂",
            Gender::Female => "♀",
        };
        image.put_str((col + w / 2) * CELL_W, row + h / 2, glyph, body);
    }

    // Badge and star tiles live on their own layer; clear_card_surfaces
    // empties it, so only what was drawn since shows here.
    let badges = canvas.badges();
    if badges.iter().any(|&b| b) {
        for (i, &earned) in badges.iter().enumerate() {
            let (ch, fg) = if earned { ('●', BADGE_ON) } else { ('·', BADGE_OFF) };
            let bg = image.get((3 + i * 3) * CELL_W, BADGE_ROW).bg;
            image.set((3 + i * 3) * CELL_W, BADGE_ROW, Cell::new(ch, fg, bg));
        }
    }
    for i in 0..canvas.stars() as usize {
        let bg = image.get((20 + i * 2) * CELL_W, STAR_ROW).bg;
        image.set((20 + i * 2) * CELL_W, STAR_ROW, Cell::new('★', STAR_FG, bg));
    }
}

fn paint_screen_background(buf: &mut FrameBuffer, drawn: bool) {
    for y in 0..buf.height {
        for x in 0..buf.width {
            buf.set(x, y, screen_background(x, y, drawn));
        }
    }
}

fn screen_background(x: usize, y: usize, drawn: bool) -> Cell {
    if !drawn {
        return Cell::BLANK;
    }
    let bg = if (x / (CELL_W * 2) + y / 2) % 2 == 0 { SCREEN_BG_A } else { SCREEN_BG_B };
    Cell::new(' ', Color::White, bg)
}

// ── Compose: screen ──

/// Warp `image` into `front` at (ox, oy) and add the help line.
fn compose_screen(
    front: &mut FrameBuffer,
    ox: usize,
    oy: usize,
    image: &FrameBuffer,
    canvas: &CardCanvas,
    display: &DisplayState,
    fade_level: u8,
) {
    let blend = display.regs().blend.clamp(0, 16) as u8;
    let card_keep = 16 - blend;
    let fade_keep = (FADE_MAX.saturating_sub(fade_level) as u16 * 16 / FADE_MAX as u16) as u8;

    for row in 0..IMAGE_H {
        let line = row * LINES_PER_ROW + LINES_PER_ROW / 2;
        let src_line = line as i32 + display.scanline_offset(line) as i32;
        let src_row = if display.in_window(line) && (0..SCANLINES as i32).contains(&src_line) {
            Some(src_line as usize / LINES_PER_ROW)
        } else {
            None
        };

        for x in 0..IMAGE_W {
            let cell = match src_row {
                Some(r) => image.get(x, r).darken(card_keep),
                None => screen_background(x, row, canvas.background_drawn()),
            };
            front.set(ox + x, oy + row, cell.darken(fade_keep));
        }
    }

    let help_x = ox + IMAGE_W.saturating_sub(HELP_TEXT.len()) / 2;
    front.put_str(help_x, oy + IMAGE_H + 1, HELP_TEXT, scale(Color::Rgb { r: 160, g: 160, b: 176 }, fade_keep));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::blend::FlipRegs;
    use crate::domain::card::{CardField, TrainerCard};
    use crate::domain::warp::{compute_offsets, FoldDirection};
    use crate::sim::flip::CardFaceRenderer;
    use crate::sim::screen::CardScreenRenderer;

    fn open_canvas() -> CardCanvas {
        let mut canvas = CardCanvas::new(TrainerCard { name: "RED".into(), ..TrainerCard::default() });
        canvas.draw_screen_background();
        canvas.print_field(CardField::Name);
        canvas.commit_text_window();
        canvas.draw_face_tilemap(CardFace::Front);
        canvas
    }

    fn frame(canvas: &CardCanvas, display: &DisplayState, fade: u8) -> FrameBuffer {
        let mut image = FrameBuffer::new(IMAGE_W, IMAGE_H);
        paint_card(&mut image, canvas);
        let mut front = FrameBuffer::new(IMAGE_W, IMAGE_H + 2);
        compose_screen(&mut front, 0, 0, &image, canvas, display, fade);
        front
    }

    fn row_text(buf: &FrameBuffer, y: usize) -> String {
        (0..buf.width).map(|x| buf.get(x, y).ch).collect()
    }

    #[test]
    fn flat_card_shows_text_in_place() {
        let canvas = open_canvas();
        let f = frame(&canvas, &DisplayState::new(), 0);
        assert!(row_text(&f, 3).contains("NAME: RED"));
        assert_eq!(f.get(0, 0).ch, '+');
        assert!(row_text(&f, IMAGE_H + 1).contains("Esc: close"));
    }

    #[test]
    fn hidden_layers_hide_text() {
        let mut canvas = open_canvas();
        canvas.set_card_layers_visible(false);
        let f = frame(&canvas, &DisplayState::new(), 0);
        assert!(!row_text(&f, 3).contains("NAME"));
        assert_eq!(f.get(0, 0).ch, '+');
    }

    #[test]
    fn edge_on_card_disappears() {
        let canvas = open_canvas();
        let mut display = DisplayState::new();
        display.hook_scanlines();
        display.set_regs(FlipRegs::for_card_top(77));
        compute_offsets(77, FoldDirection::Closing, display.back_mut());
        display.set_allow_copy(true);
        display.vblank();

        let f = frame(&canvas, &display, 0);
        for y in 0..IMAGE_H {
            assert_ne!(f.get(0, y).ch, '|', "row {y} still shows card border");
        }
    }

    #[test]
    fn folded_card_keeps_its_edges() {
        let canvas = open_canvas();
        let mut display = DisplayState::new();
        display.hook_scanlines();
        display.set_regs(FlipRegs::for_card_top(35));
        compute_offsets(35, FoldDirection::Closing, display.back_mut());
        display.set_allow_copy(true);
        display.vblank();

        let f = frame(&canvas, &display, 0);
        // rows above the window show screen background; row 4 samples the top border
        assert_eq!(f.get(0, 2).ch, ' ');
        assert_eq!(f.get(0, 4).ch, '+');
        assert_eq!(f.get(0, 8).ch, '|');
        assert_ne!(f.get(2, 8).bg, screen_background(2, 8, true).bg);
    }

    #[test]
    fn blend_and_fade_darken() {
        let canvas = open_canvas();
        let flat = frame(&canvas, &DisplayState::new(), 0);

        let mut display = DisplayState::new();
        display.set_regs(FlipRegs { blend: 8, window_top: 0, window_bottom: 160 });
        let dim = frame(&canvas, &display, 0);
        assert_eq!(dim.get(4, 5).bg, scale(flat.get(4, 5).bg, 8));

        let black = frame(&canvas, &DisplayState::new(), FADE_MAX);
        assert_eq!(black.get(4, 5).bg, Color::Rgb { r: 0, g: 0, b: 0 });
    }

    #[test]
    fn earned_badges_light_their_slots() {
        let mut card = TrainerCard { name: "RED".into(), ..TrainerCard::default() };
        card.badges[1] = true;
        card.badges[6] = true;
        let mut canvas = CardCanvas::new(card);
        canvas.draw_screen_background();
        canvas.print_field(CardField::Badges);
        canvas.draw_face_tilemap(CardFace::Front);

        let mut image = FrameBuffer::new(IMAGE_W, IMAGE_H);
        paint_card(&mut image, &canvas);
        let slots: String = (0..8).map(|i| image.get((3 + i * 3) * CELL_W, BADGE_ROW).ch).collect();
        assert_eq!(slots, "·●····●·");
    }
}
