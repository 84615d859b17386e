/// Trainer card data, faces and printable fields.
///
/// The card is laid out on a 30×20 tile grid (one tile = 8×8 pixels, so the
/// 20 rows cover the 160 visible scanlines). Field positions below are in
/// tile units. Text is produced here; drawing it is the renderer's job.

/// Card width in tiles.
pub const CARD_COLS: u16 = 30;
/// Card height in tiles.
pub const CARD_ROWS: u16 = 20;
pub const NUM_BADGES: usize = 8;

const MAX_LINK_RECORD: u32 = 9999;
const MAX_TRADES: u32 = 0xFFFF;
const MAX_HOURS: u16 = 999;
const MAX_MINUTES: u8 = 59;
const TOWER_STAR_WINS: u16 = 49;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CardFace {
    /// Statistics side.
    Front,
    /// Profile and badges side.
    Back,
}

impl CardFace {
    pub fn opposite(self) -> CardFace {
        match self {
            CardFace::Front => CardFace::Back,
            CardFace::Back => CardFace::Front,
        }
    }

    /// Fields printed on this face, in print order.
    pub fn fields(self) -> &'static [CardField] {
        match self {
            CardFace::Front => &[
                CardField::Name,
                CardField::Id,
                CardField::Money,
                CardField::Pokedex,
                CardField::PlayTime,
            ],
            CardFace::Back => &[CardField::BackName, CardField::Badges],
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CardField {
    Name,
    Id,
    Money,
    Pokedex,
    PlayTime,
    BackName,
    /// Badge tiles, not text.
    Badges,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Gender {
    #[default]
    Male,
    Female,
}

/// Hall of fame debut time.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct HofTime {
    pub hours: u16,
    pub minutes: u8,
    pub seconds: u8,
}

impl HofTime {
    pub fn is_set(self) -> bool {
        self.hours != 0 || self.minutes != 0 || self.seconds != 0
    }

    /// Past 999 hours the whole time pins to 999:59:59.
    pub fn clamped(self) -> HofTime {
        if self.hours > MAX_HOURS {
            HofTime { hours: MAX_HOURS, minutes: MAX_MINUTES, seconds: MAX_MINUTES }
        } else {
            self
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct TrainerCard {
    pub name: String,
    pub gender: Gender,
    pub trainer_id: u16,
    pub money: u32,
    pub has_pokedex: bool,
    pub caught_count: u16,
    pub play_hours: u16,
    pub play_minutes: u8,
    pub hof_debut: HofTime,
    pub link_wins: u32,
    pub link_losses: u32,
    pub trades: u32,
    pub badges: [bool; NUM_BADGES],
    pub tower_straight_wins: u16,
    pub caught_all: bool,
    pub all_paintings: bool,
}

/// One positioned run of text on the card.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct FieldText {
    pub col: u16,
    pub row: u16,
    pub text: String,
}

impl FieldText {
    fn at(col: u16, row: u16, text: impl Into<String>) -> Self {
        FieldText { col, row, text: text.into() }
    }

    /// Right-align `text` so its last character sits just before `end_col`.
    fn right_aligned(end_col: u16, row: u16, text: String) -> Self {
        let col = end_col.saturating_sub(text.chars().count() as u16);
        FieldText { col, row, text }
    }
}

impl TrainerCard {
    /// Apply the display caps to raw stats.
    pub fn normalized(mut self) -> Self {
        self.link_wins = self.link_wins.min(MAX_LINK_RECORD);
        self.link_losses = self.link_losses.min(MAX_LINK_RECORD);
        self.trades = self.trades.min(MAX_TRADES);
        self.hof_debut = self.hof_debut.clamped();
        self
    }

    /// One star each for: hall of fame, caught all, tower streak, paintings.
    pub fn star_count(&self) -> u8 {
        [
            self.hof_debut.is_set(),
            self.caught_all,
            self.tower_straight_wins > TOWER_STAR_WINS,
            self.all_paintings,
        ]
        .iter()
        .filter(|&&earned| earned)
        .count() as u8
    }

    pub fn has_link_results(&self) -> bool {
        self.link_wins != 0 || self.link_losses != 0
    }

    pub fn badge_count(&self) -> usize {
        self.badges.iter().filter(|&&b| b).count()
    }

    /// Text runs for `field`. `colon_visible` is the play-time blink phase.
    /// Fields that print nothing (badges, a missing pokedex) return an empty list.
    pub fn field_text(&self, field: CardField, colon_visible: bool) -> Vec<FieldText> {
        match field {
            CardField::Name => vec![FieldText::at(2, 3, format!("NAME: {}", self.name))],
            CardField::Id => vec![FieldText::at(18, 1, format!("IDNo.{:05}", self.trainer_id))],
            CardField::Money => vec![
                FieldText::at(2, 7, "MONEY"),
                FieldText::right_aligned(17, 7, format!("${}", self.money.min(999_999))),
            ],
            CardField::Pokedex => {
                if !self.has_pokedex {
                    return vec![];
                }
                vec![
                    FieldText::at(2, 9, "POKeDEX"),
                    FieldText::right_aligned(17, 9, format!("{}", self.caught_count.min(9999))),
                ]
            }
            CardField::PlayTime => {
                let hours = self.play_hours.min(MAX_HOURS);
                let minutes = self.play_minutes.min(MAX_MINUTES);
                let colon = if colon_visible { ":" } else { " " };
                vec![
                    FieldText::at(2, 11, "TIME"),
                    FieldText::at(11, 11, format!("{hours:>3}")),
                    FieldText::at(14, 11, colon),
                    FieldText::at(15, 11, format!("{minutes:02}")),
                ]
            }
            CardField::BackName => vec![FieldText::at(8, 1, self.name.clone())],
            CardField::Badges => vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card() -> TrainerCard {
        TrainerCard {
            name: "RED".into(),
            trainer_id: 421,
            money: 3000,
            has_pokedex: true,
            caught_count: 151,
            play_hours: 12,
            play_minutes: 5,
            ..TrainerCard::default()
        }
    }

    #[test]
    fn faces_alternate() {
        assert_eq!(CardFace::Front.opposite(), CardFace::Back);
        assert_eq!(CardFace::Back.opposite().opposite(), CardFace::Back);
    }

    #[test]
    fn face_field_order() {
        assert_eq!(CardFace::Front.fields().len(), 5);
        assert_eq!(CardFace::Front.fields()[0], CardField::Name);
        assert_eq!(CardFace::Back.fields(), &[CardField::BackName, CardField::Badges]);
    }

    #[test]
    fn stars_count_each_achievement() {
        let mut c = card();
        assert_eq!(c.star_count(), 0);
        c.hof_debut = HofTime { hours: 0, minutes: 0, seconds: 1 };
        c.caught_all = true;
        assert_eq!(c.star_count(), 2);
        c.tower_straight_wins = 49;
        assert_eq!(c.star_count(), 2);
        c.tower_straight_wins = 50;
        c.all_paintings = true;
        assert_eq!(c.star_count(), 4);
    }

    #[test]
    fn normalized_caps_stats() {
        let c = TrainerCard {
            link_wins: 12_000,
            link_losses: 3,
            trades: 100_000,
            hof_debut: HofTime { hours: 1000, minutes: 1, seconds: 2 },
            ..card()
        }
        .normalized();
        assert_eq!(c.link_wins, 9999);
        assert_eq!(c.link_losses, 3);
        assert_eq!(c.trades, 0xFFFF);
        assert_eq!(c.hof_debut, HofTime { hours: 999, minutes: 59, seconds: 59 });
        assert!(c.has_link_results());
    }

    #[test]
    fn id_is_zero_padded() {
        let text = card().field_text(CardField::Id, true);
        assert_eq!(text[0].text, "IDNo.00421");
    }

    #[test]
    fn money_is_right_aligned() {
        let text = card().field_text(CardField::Money, true);
        assert_eq!(text[1].text, "$3000");
        assert_eq!(text[1].col, 12);
    }

    #[test]
    fn pokedex_hidden_without_pokedex() {
        let c = TrainerCard { has_pokedex: false, ..card() };
        assert!(c.field_text(CardField::Pokedex, true).is_empty());
        assert_eq!(card().field_text(CardField::Pokedex, true)[1].text, "151");
    }

    #[test]
    fn play_time_blinks_and_clamps() {
        let c = TrainerCard { play_hours: 1234, play_minutes: 75, ..card() };
        let on = c.field_text(CardField::PlayTime, true);
        let off = c.field_text(CardField::PlayTime, false);
        assert_eq!(on[1].text, "999");
        assert_eq!(on[2].text, ":");
        assert_eq!(off[2].text, " ");
        assert_eq!(on[3].text, "59");
        assert_eq!(card().field_text(CardField::PlayTime, true)[1].text, " 12");
    }

    #[test]
    fn badges_print_no_text() {
        let mut c = card();
        c.badges[0] = true;
        c.badges[7] = true;
        assert!(c.field_text(CardField::Badges, true).is_empty());
        assert_eq!(c.badge_count(), 2);
    }
}
