use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub const DEFAULT_FIELD_COLOR: &str = "#ffffff";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Novels,
    Series,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookFormat {
    Hardcover,
    Paperback,
    Ebook,
    Audiobook,
}

impl BookFormat {
    pub const ALL: [BookFormat; 4] = [
        BookFormat::Hardcover,
        BookFormat::Paperback,
        BookFormat::Ebook,
        BookFormat::Audiobook,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookFormat::Hardcover => "hardcover",
            BookFormat::Paperback => "paperback",
            BookFormat::Ebook => "ebook",
            BookFormat::Audiobook => "audiobook",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let lowered = value.trim().to_ascii_lowercase();
        BookFormat::ALL
            .into_iter()
            .find(|format| format.as_str() == lowered)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveStatus {
    #[default]
    Idle,
    Saving,
    Saved,
}

/// Free-form text fields of a record. The camelCase key doubles as the
/// `inputColors` key for that field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TextField {
    Title,
    Author,
    Genre,
    PublishDate,
    Pages,
    EndDate,
    Summary,
    BookReview,
    DataAdditional,
}

impl TextField {
    pub fn key(&self) -> &'static str {
        match self {
            TextField::Title => "title",
            TextField::Author => "author",
            TextField::Genre => "genre",
            TextField::PublishDate => "publishDate",
            TextField::Pages => "pages",
            TextField::EndDate => "endDate",
            TextField::Summary => "summary",
            TextField::BookReview => "bookReview",
            TextField::DataAdditional => "dataAdditional",
        }
    }

    pub fn long_form(&self) -> Option<LongField> {
        match self {
            TextField::Summary => Some(LongField::Summary),
            TextField::BookReview => Some(LongField::BookReview),
            TextField::DataAdditional => Some(LongField::DataAdditional),
            _ => None,
        }
    }
}

/// The three text areas that carry a dedicated color and a remembered height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LongField {
    Summary,
    BookReview,
    DataAdditional,
}

impl LongField {
    pub fn text_field(&self) -> TextField {
        match self {
            LongField::Summary => TextField::Summary,
            LongField::BookReview => TextField::BookReview,
            LongField::DataAdditional => TextField::DataAdditional,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RatingKind {
    Content,
    WritingStyle,
    Readability,
    PlotDevelopment,
    Characters,
}

impl RatingKind {
    pub const ALL: [RatingKind; 5] = [
        RatingKind::Content,
        RatingKind::WritingStyle,
        RatingKind::Readability,
        RatingKind::PlotDevelopment,
        RatingKind::Characters,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            RatingKind::Content => "content",
            RatingKind::WritingStyle => "writingStyle",
            RatingKind::Readability => "readability",
            RatingKind::PlotDevelopment => "plotDevelopment",
            RatingKind::Characters => "characters",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubRatings {
    #[serde(deserialize_with = "lenient_number")]
    pub content: f64,
    #[serde(deserialize_with = "lenient_number")]
    pub writing_style: f64,
    #[serde(deserialize_with = "lenient_number")]
    pub readability: f64,
    #[serde(deserialize_with = "lenient_number")]
    pub plot_development: f64,
    #[serde(deserialize_with = "lenient_number")]
    pub characters: f64,
}

impl SubRatings {
    pub fn get(&self, kind: RatingKind) -> f64 {
        match kind {
            RatingKind::Content => self.content,
            RatingKind::WritingStyle => self.writing_style,
            RatingKind::Readability => self.readability,
            RatingKind::PlotDevelopment => self.plot_development,
            RatingKind::Characters => self.characters,
        }
    }

    pub fn set(&mut self, kind: RatingKind, value: f64) {
        let slot = match kind {
            RatingKind::Content => &mut self.content,
            RatingKind::WritingStyle => &mut self.writing_style,
            RatingKind::Readability => &mut self.readability,
            RatingKind::PlotDevelopment => &mut self.plot_development,
            RatingKind::Characters => &mut self.characters,
        };
        *slot = value;
    }

    pub fn values(&self) -> [f64; 5] {
        RatingKind::ALL.map(|kind| self.get(kind))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sticker {
    pub id: String,
    pub url: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default, deserialize_with = "lenient_angle")]
    pub angle: i32,
    #[serde(default)]
    pub z: u64,
}

/// Everything a record holds except its id. Autosave compares this by value,
/// so an id merged back from the store never looks like an edit.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BookContent {
    pub category: Category,
    pub title: String,
    pub author: String,
    pub genre: String,
    pub publish_date: String,
    pub pages: String,
    pub end_date: String,
    pub summary: String,
    pub summary_color: Option<String>,
    pub book_review: String,
    pub book_review_color: Option<String>,
    pub data_additional: String,
    pub data_additional_color: Option<String>,
    pub input_colors: BTreeMap<String, String>,
    #[serde(flatten)]
    pub ratings: SubRatings,
    #[serde(deserialize_with = "lenient_number")]
    pub rating: f64,
    pub cover_url: Option<String>,
    #[serde(with = "format_field")]
    pub format: Option<BookFormat>,
    pub stickers: Vec<Sticker>,
    pub summary_height: Option<f64>,
    pub book_review_height: Option<f64>,
    pub data_additional_height: Option<f64>,
}

impl BookContent {
    pub fn empty(category: Category) -> Self {
        Self {
            category,
            ..Self::default()
        }
    }

    /// True while none of the identifying fields has any text. Blank records
    /// are never persisted.
    pub fn is_blank(&self) -> bool {
        [&self.title, &self.author, &self.summary, &self.book_review]
            .iter()
            .all(|value| value.trim().is_empty())
    }

    pub fn text(&self, field: TextField) -> &str {
        match field {
            TextField::Title => &self.title,
            TextField::Author => &self.author,
            TextField::Genre => &self.genre,
            TextField::PublishDate => &self.publish_date,
            TextField::Pages => &self.pages,
            TextField::EndDate => &self.end_date,
            TextField::Summary => &self.summary,
            TextField::BookReview => &self.book_review,
            TextField::DataAdditional => &self.data_additional,
        }
    }

    pub fn text_mut(&mut self, field: TextField) -> &mut String {
        match field {
            TextField::Title => &mut self.title,
            TextField::Author => &mut self.author,
            TextField::Genre => &mut self.genre,
            TextField::PublishDate => &mut self.publish_date,
            TextField::Pages => &mut self.pages,
            TextField::EndDate => &mut self.end_date,
            TextField::Summary => &mut self.summary,
            TextField::BookReview => &mut self.book_review,
            TextField::DataAdditional => &mut self.data_additional,
        }
    }

    fn dedicated_color(&self, field: LongField) -> Option<&str> {
        match field {
            LongField::Summary => self.summary_color.as_deref(),
            LongField::BookReview => self.book_review_color.as_deref(),
            LongField::DataAdditional => self.data_additional_color.as_deref(),
        }
    }

    /// Display color for a field: `inputColors` first, then the dedicated
    /// long-form color, then white.
    pub fn color_for(&self, field: TextField) -> &str {
        self.input_colors
            .get(field.key())
            .map(String::as_str)
            .or_else(|| field.long_form().and_then(|long| self.dedicated_color(long)))
            .unwrap_or(DEFAULT_FIELD_COLOR)
    }

    /// Returns false when the color was already in place.
    pub fn set_color(&mut self, field: TextField, color: &str) -> bool {
        let mut changed = false;
        if self.input_colors.get(field.key()).map(String::as_str) != Some(color) {
            self.input_colors
                .insert(field.key().to_string(), color.to_string());
            changed = true;
        }
        if let Some(long) = field.long_form() {
            let slot = match long {
                LongField::Summary => &mut self.summary_color,
                LongField::BookReview => &mut self.book_review_color,
                LongField::DataAdditional => &mut self.data_additional_color,
            };
            if slot.as_deref() != Some(color) {
                *slot = Some(color.to_string());
                changed = true;
            }
        }
        changed
    }

    pub fn area_height(&self, field: LongField) -> Option<f64> {
        match field {
            LongField::Summary => self.summary_height,
            LongField::BookReview => self.book_review_height,
            LongField::DataAdditional => self.data_additional_height,
        }
    }

    pub fn area_height_mut(&mut self, field: LongField) -> &mut Option<f64> {
        match field {
            LongField::Summary => &mut self.summary_height,
            LongField::BookReview => &mut self.book_review_height,
            LongField::DataAdditional => &mut self.data_additional_height,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BookRecord {
    #[serde(
        default,
        deserialize_with = "blank_id_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(flatten)]
    pub content: BookContent,
}

impl BookRecord {
    pub fn new(category: Category) -> Self {
        Self {
            id: None,
            content: BookContent::empty(category),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.content.is_blank()
    }
}

/// `<unix millis>-<7 random chars>`, the id shape used for both records and
/// stickers.
pub fn generate_id() -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{}-{}", chrono::Utc::now().timestamp_millis(), &suffix[..7])
}

/// An empty or whitespace id is the same as no id.
fn blank_id_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let id = Option::<String>::deserialize(deserializer)?;
    Ok(id.filter(|id| !id.trim().is_empty()))
}

fn lenient_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let number = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(number)) => number.as_f64().unwrap_or(0.0),
        Some(Value::String(text)) => text.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    Ok(if number.is_finite() { number } else { 0.0 })
}

fn lenient_angle<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    let angle = lenient_number(deserializer)?.round();
    Ok(angle.clamp(i32::MIN as f64, i32::MAX as f64) as i32)
}

/// `format` travels as a plain string where `""` means "not chosen".
mod format_field {
    use super::BookFormat;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<BookFormat>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(value.map(|format| format.as_str()).unwrap_or(""))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<BookFormat>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().and_then(BookFormat::parse))
    }
}
