/// Off-screen card surfaces.
///
/// Holds what each background layer would contain, without knowing how it
/// gets on screen:
///   - text window: pending runs (being printed) and committed runs (shown)
///   - card layer: which face tilemap is loaded
///   - badge layer: badge and star tiles
///   - portrait window and screen background flags
///
/// The terminal renderer reads these; the flip and the screen write them
/// through [`CardFaceRenderer`] / [`CardScreenRenderer`].

use crate::domain::card::{CardFace, CardField, FieldText, TrainerCard, NUM_BADGES};
use super::flip::CardFaceRenderer;
use super::screen::CardScreenRenderer;

#[derive(Clone, Debug)]
pub struct CardCanvas {
    card: TrainerCard,
    pending: Vec<(CardField, FieldText)>,
    committed: Vec<FieldText>,
    face_tilemap: Option<CardFace>,
    badges: [bool; NUM_BADGES],
    stars: u8,
    portrait: bool,
    portrait_shown: bool,
    background: bool,
    layers_visible: bool,
    colon_visible: bool,
}

impl CardCanvas {
    pub fn new(card: TrainerCard) -> Self {
        CardCanvas {
            card,
            pending: Vec::new(),
            committed: Vec::new(),
            face_tilemap: None,
            badges: [false; NUM_BADGES],
            stars: 0,
            portrait: false,
            portrait_shown: false,
            background: false,
            layers_visible: true,
            colon_visible: true,
        }
    }

    pub fn card(&self) -> &TrainerCard {
        &self.card
    }

    /// Text currently on screen.
    pub fn committed_text(&self) -> &[FieldText] {
        &self.committed
    }

    pub fn face_tilemap(&self) -> Option<CardFace> {
        self.face_tilemap
    }

    pub fn badges(&self) -> &[bool; NUM_BADGES] {
        &self.badges
    }

    pub fn stars(&self) -> u8 {
        self.stars
    }

    pub fn portrait_shown(&self) -> bool {
        self.portrait && self.portrait_shown
    }

    pub fn background_drawn(&self) -> bool {
        self.background
    }

    pub fn layers_visible(&self) -> bool {
        self.layers_visible
    }
}

impl CardFaceRenderer for CardCanvas {
    fn set_card_layers_visible(&mut self, visible: bool) {
        self.layers_visible = visible;
    }

    fn clear_card_surfaces(&mut self) {
        self.pending.clear();
        self.badges = [false; NUM_BADGES];
        self.stars = 0;
    }

    fn print_field(&mut self, field: CardField) {
        // Reprinting a field replaces its old runs.
        self.pending.retain(|(f, _)| *f != field);
        if field == CardField::Badges {
            self.badges = self.card.badges;
            return;
        }
        let runs = self.card.field_text(field, self.colon_visible);
        self.pending.extend(runs.into_iter().map(|run| (field, run)));
    }

    fn draw_face_tilemap(&mut self, face: CardFace) {
        self.face_tilemap = Some(face);
        if face == CardFace::Back {
            self.portrait_shown = false;
        }
    }

    fn commit_text_window(&mut self) {
        self.committed = self.pending.iter().map(|(_, run)| run.clone()).collect();
    }

    fn redraw_front_in_full(&mut self) {
        self.commit_portrait_window();
        self.draw_screen_background();
        self.draw_face_tilemap(CardFace::Front);
        self.draw_stars();
    }

    fn recreate_portrait(&mut self) {
        self.portrait = true;
    }
}

impl CardScreenRenderer for CardCanvas {
    fn clear_text_window(&mut self) {
        self.pending.clear();
    }

    fn commit_portrait_window(&mut self) {
        self.portrait_shown = true;
    }

    fn draw_screen_background(&mut self) {
        self.background = true;
    }

    fn draw_stars(&mut self) {
        self.stars = self.card.star_count();
    }

    fn set_colon_visible(&mut self, visible: bool) {
        self.colon_visible = visible;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas() -> CardCanvas {
        let mut card = TrainerCard {
            name: "BLUE".into(),
            has_pokedex: true,
            caught_all: true,
            ..TrainerCard::default()
        };
        card.badges[2] = true;
        CardCanvas::new(card)
    }

    #[test]
    fn printed_text_shows_only_after_commit() {
        let mut c = canvas();
        c.print_field(CardField::Name);
        assert!(c.committed_text().is_empty());
        c.commit_text_window();
        assert_eq!(c.committed_text()[0].text, "NAME: BLUE");
    }

    #[test]
    fn reprint_replaces_field() {
        let mut c = canvas();
        c.print_field(CardField::PlayTime);
        c.set_colon_visible(false);
        c.print_field(CardField::PlayTime);
        c.commit_text_window();
        assert_eq!(c.committed_text().len(), 4);
        assert!(c.committed_text().iter().all(|t| t.text != ":"));
    }

    #[test]
    fn badges_go_to_badge_layer() {
        let mut c = canvas();
        c.print_field(CardField::Badges);
        assert!(c.badges()[2]);
        c.clear_card_surfaces();
        assert!(!c.badges()[2]);
    }

    #[test]
    fn back_tilemap_hides_portrait_until_front_redraw() {
        let mut c = canvas();
        c.recreate_portrait();
        c.commit_portrait_window();
        assert!(c.portrait_shown());
        c.draw_face_tilemap(CardFace::Back);
        assert!(!c.portrait_shown());
        c.redraw_front_in_full();
        assert!(c.portrait_shown());
        assert_eq!(c.face_tilemap(), Some(CardFace::Front));
        assert_eq!(c.stars(), 1);
        assert!(c.background_drawn());
    }
}
