//! FITS side of the conversion: keyword cards, the output model and a
//! primary-HDU writer.

pub mod keywords;
pub mod output;
pub mod writer;

pub use keywords::map_metadata;
pub use output::{FitsOutput, PixelArray};
pub use writer::{render_cards, write_fits, write_fits_set};

/// Typed value of a header card.
#[derive(Clone, Debug, PartialEq)]
pub enum FitsValue {
    Logical(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

/// One header record. Commentary cards (`COMMENT`, `HISTORY`) carry their
/// text in `comment` and have no value.
#[derive(Clone, Debug, PartialEq)]
pub struct Card {
    pub keyword: String,
    pub value: Option<FitsValue>,
    pub comment: Option<String>,
}

impl Card {
    pub fn new(keyword: &str, value: FitsValue) -> Self {
        Self {
            keyword: keyword.to_uppercase(),
            value: Some(value),
            comment: None,
        }
    }

    pub fn with_comment(mut self, comment: &str) -> Self {
        self.comment = Some(comment.to_string());
        self
    }

    pub fn commentary(keyword: &str, text: &str) -> Self {
        Self {
            keyword: keyword.to_uppercase(),
            value: None,
            comment: Some(text.to_string()),
        }
    }

    pub fn is_commentary(&self) -> bool {
        self.value.is_none()
    }
}

/// Value of the first card named `keyword`.
pub fn find_value<'a>(cards: &'a [Card], keyword: &str) -> Option<&'a FitsValue> {
    cards
        .iter()
        .find(|c| c.keyword == keyword)
        .and_then(|c| c.value.as_ref())
}
