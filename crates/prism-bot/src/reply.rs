//! Transport-neutral command responses.

use chrono::{DateTime, Utc};

pub const GREEN: u32 = 0x00ff00;
pub const BLUE: u32 = 0x0000ff;
pub const WHITE: u32 = 0xffffff;

/// What a command sends back to the channel it was invoked in.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Text(String),
    Card(Card),
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Reply::Text(text.into())
    }

    /// Plain text content, `None` for cards.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Reply::Text(text) => Some(text),
            Reply::Card(_) => None,
        }
    }
}

impl From<Card> for Reply {
    fn from(card: Card) -> Self {
        Reply::Card(card)
    }
}

/// Rich response: a coloured box with optional author line, image and fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Card {
    pub colour: u32,
    pub title: Option<String>,
    pub description: Option<String>,
    pub author: Option<CardAuthor>,
    pub timestamp: Option<DateTime<Utc>>,
    pub image: Option<String>,
    pub fields: Vec<CardField>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CardAuthor {
    pub name: String,
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CardField {
    pub name: String,
    pub value: String,
}

impl Card {
    pub fn new(colour: u32) -> Self {
        Self {
            colour,
            ..Default::default()
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn author(mut self, name: impl Into<String>, icon_url: Option<String>) -> Self {
        self.author = Some(CardAuthor {
            name: name.into(),
            icon_url,
        });
        self
    }

    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn image(mut self, url: impl Into<String>) -> Self {
        self.image = Some(url.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push(CardField {
            name: name.into(),
            value: value.into(),
        });
        self
    }
}
