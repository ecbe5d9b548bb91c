use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Price exactly as the source reported it. Never parsed or validated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Price {
    Text(String),
    Number(serde_json::Number),
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Price::Text(text) => f.write_str(text),
            Price::Number(number) => write!(f, "{}", number),
        }
    }
}

impl From<&str> for Price {
    fn from(text: &str) -> Self {
        Price::Text(text.to_string())
    }
}

/// One scraped product.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Record {
    pub name: String,
    pub price: Price,
    pub thumbnail: String, // URL, kept verbatim

    // Any other keys the source supplied
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record {
    pub fn new(name: impl Into<String>, price: impl Into<Price>, thumbnail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            price: price.into(),
            thumbnail: thumbnail.into(),
            extra: Map::new(),
        }
    }
}

/// Ordered products plus whatever enclosing keys the source wrapped them in.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RecordSet {
    pub products: Vec<Record>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RecordSet {
    pub fn new(products: Vec<Record>) -> Self {
        Self {
            products,
            extra: Map::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.products.iter()
    }
}

impl<'a> IntoIterator for &'a RecordSet {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.products.iter()
    }
}
