use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::domains::hotels::error::DispatchError;

/// A JSON value that may arrive as a number or as text (form fields).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum NumberOrText {
    Number(serde_json::Number),
    Text(String),
}

impl NumberOrText {
    fn as_text(&self) -> String {
        match self {
            NumberOrText::Number(n) => n.to_string(),
            NumberOrText::Text(t) => t.trim().to_string(),
        }
    }
}

/// A hotel search as submitted by a caller.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SearchQuery {
    #[serde(default, alias = "city")]
    pub location: String,
    #[serde(default, alias = "price")]
    pub price_ceiling: Option<NumberOrText>,
    #[serde(default, alias = "rating")]
    pub min_rating: Option<NumberOrText>,
    #[serde(default, alias = "checkin")]
    pub check_in: Option<NaiveDate>,
    /// Pre-resolved location codes keyed by source name.
    #[serde(default)]
    pub location_codes: HashMap<String, String>,
}

/// A search that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedSearch {
    pub location: String,
    pub price_ceiling: Option<String>,
    pub min_rating: Option<u8>,
    pub check_in: NaiveDate,
    pub location_codes: HashMap<String, String>,
}

impl SearchQuery {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            ..Default::default()
        }
    }

    pub fn with_price_ceiling(mut self, price: impl Into<String>) -> Self {
        self.price_ceiling = Some(NumberOrText::Text(price.into()));
        self
    }

    pub fn with_min_rating(mut self, rating: u8) -> Self {
        self.min_rating = Some(NumberOrText::Number(rating.into()));
        self
    }

    pub fn with_check_in(mut self, check_in: NaiveDate) -> Self {
        self.check_in = Some(check_in);
        self
    }

    pub fn with_location_code(mut self, source: impl Into<String>, code: impl Into<String>) -> Self {
        self.location_codes.insert(source.into(), code.into());
        self
    }

    /// Check the query. Empty optional fields count as absent, and a missing
    /// check-in date becomes `today`.
    pub fn validate(self, today: NaiveDate) -> Result<ValidatedSearch, DispatchError> {
        let location = self.location.trim().to_string();
        if location.is_empty() {
            return Err(DispatchError::MissingLocation);
        }

        let price_ceiling = match self.price_ceiling.map(|p| p.as_text()) {
            Some(text) if text.is_empty() => None,
            Some(text) => match text.parse::<f64>() {
                Ok(value) if value.is_finite() && value > 0.0 => Some(text),
                _ => return Err(DispatchError::InvalidPriceCeiling(text)),
            },
            None => None,
        };

        let min_rating = match self.min_rating.map(|r| r.as_text()) {
            Some(text) if text.is_empty() => None,
            Some(text) => match text.parse::<u8>() {
                Ok(value) if (1..=5).contains(&value) => Some(value),
                _ => return Err(DispatchError::InvalidRating(text)),
            },
            None => None,
        };

        let location_codes = self
            .location_codes
            .into_iter()
            .map(|(source, code)| (source, code.trim().to_string()))
            .filter(|(_, code)| !code.is_empty())
            .collect();

        Ok(ValidatedSearch {
            location,
            price_ceiling,
            min_rating,
            check_in: self.check_in.unwrap_or(today),
            location_codes,
        })
    }
}
