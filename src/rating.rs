use crate::geometry::round_to_tenth;
use crate::models::{BookContent, SubRatings};

pub const MAX_RATING: f64 = 5.0;

/// Mean of the five sub-ratings rounded to one decimal. Non-finite values
/// count as 0.
pub fn overall(ratings: &SubRatings) -> f64 {
    let values = ratings.values();
    let sum: f64 = values
        .iter()
        .map(|value| if value.is_finite() { *value } else { 0.0 })
        .sum();
    round_to_tenth(sum / values.len() as f64)
}

/// Recomputes `rating` from the sub-ratings and writes it only when it
/// differs. Returns whether anything was written.
pub fn sync_overall(content: &mut BookContent) -> bool {
    let next = overall(&content.ratings);
    if content.rating == next {
        return false;
    }
    content.rating = next;
    true
}

/// Clamps to [0, 5] and snaps to the nearest half star.
pub fn normalize_sub_rating(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    (value.clamp(0.0, MAX_RATING) * 2.0).round() / 2.0
}

pub fn parse_rating(text: &str) -> Option<f64> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

pub fn format_rating(value: f64) -> String {
    format!("{}", value)
}

/// Text-entry draft for one sub-rating. The raw text is kept while the user
/// types; the committed value only moves when the text parses.
#[derive(Debug, Clone, PartialEq)]
pub struct RatingInput {
    raw: String,
    committed: f64,
}

impl RatingInput {
    pub fn new(value: f64) -> Self {
        Self {
            raw: format_rating(value),
            committed: value,
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn committed(&self) -> f64 {
        self.committed
    }

    /// Returns the value to commit, if the text is a finite number.
    pub fn edit(&mut self, text: &str) -> Option<f64> {
        self.raw = text.to_string();
        let value = normalize_sub_rating(parse_rating(text)?);
        self.committed = value;
        Some(value)
    }

    /// Leaving the field commits whatever parses, or 0.
    pub fn blur(&mut self) -> f64 {
        let value = parse_rating(&self.raw)
            .map(normalize_sub_rating)
            .unwrap_or(0.0);
        self.committed = value;
        self.raw = format_rating(value);
        value
    }

    /// Replaces the draft with a value chosen elsewhere (the star picker).
    pub fn reset(&mut self, value: f64) {
        *self = Self::new(value);
    }
}

impl Default for RatingInput {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// Value picked by a pointer over star `index` (1-based) at horizontal
/// `fraction` of that star. The left half picks the half star.
pub fn star_value_at(index: u32, fraction: f64, half: bool) -> f64 {
    let whole = f64::from(index);
    if half && fraction < 0.5 {
        whole - 0.5
    } else {
        whole
    }
}

/// How much of star `index` (1-based) is filled for a displayed value, 0..=1.
pub fn star_fill(value: f64, index: u32) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    (value - (f64::from(index) - 1.0)).clamp(0.0, 1.0)
}
