//! Card Details
//!
//! Raw card input as captured by a card element, with the same local checks
//! the hosted widget runs before it asks the provider for a token.

use chrono::{Datelike, NaiveDate, Utc};

use crate::error::{PaymentError, Result};
use crate::provider::CardElement;

/// Card network inferred from the number prefix
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CardBrand {
    Visa,
    Mastercard,
    Amex,
    Discover,
    Unknown,
}

impl CardBrand {
    pub fn as_str(self) -> &'static str {
        match self {
            CardBrand::Visa => "visa",
            CardBrand::Mastercard => "mastercard",
            CardBrand::Amex => "amex",
            CardBrand::Discover => "discover",
            CardBrand::Unknown => "unknown",
        }
    }

    /// Expected CVC length for this network
    fn cvc_len(self) -> usize {
        if self == CardBrand::Amex { 4 } else { 3 }
    }
}

/// Card input. `Debug` only shows the last four digits.
#[derive(Clone, PartialEq, Eq)]
pub struct CardDetails {
    number: String,
    pub exp_month: u32,
    pub exp_year: i32,
    cvc: String,
    pub postal_code: Option<String>,
}

impl CardDetails {
    /// Spaces and dashes in `number` are ignored
    pub fn new(number: &str, exp_month: u32, exp_year: i32, cvc: &str) -> Self {
        Self {
            number: number.chars().filter(|c| !matches!(c, ' ' | '-')).collect(),
            exp_month,
            exp_year,
            cvc: cvc.trim().to_string(),
            postal_code: None,
        }
    }

    pub fn with_postal_code(mut self, postal_code: impl Into<String>) -> Self {
        self.postal_code = Some(postal_code.into());
        self
    }

    pub fn number(&self) -> &str {
        &self.number
    }

    pub fn cvc(&self) -> &str {
        &self.cvc
    }

    pub fn last4(&self) -> &str {
        let start = self.number.len().saturating_sub(4);
        self.number.get(start..).unwrap_or_default()
    }

    pub fn brand(&self) -> CardBrand {
        let prefix = |n: usize| self.number.get(..n).and_then(|p| p.parse::<u32>().ok());

        match (prefix(1), prefix(2), prefix(4)) {
            (Some(4), ..) => CardBrand::Visa,
            (_, Some(34 | 37), _) => CardBrand::Amex,
            (_, Some(51..=55), _) | (.., Some(2221..=2720)) => CardBrand::Mastercard,
            (_, Some(65), _) | (.., Some(6011)) => CardBrand::Discover,
            _ => CardBrand::Unknown,
        }
    }

    /// Validate against today's date
    pub fn validate(&self) -> Result<()> {
        self.validate_on(Utc::now().date_naive())
    }

    /// Number, expiry and CVC checks; error codes follow the provider's
    /// card-error codes.
    pub fn validate_on(&self, today: NaiveDate) -> Result<()> {
        let digits_only = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());

        if !digits_only(&self.number) || !(12..=19).contains(&self.number.len()) {
            return Err(PaymentError::card("invalid_number", "Your card number is invalid."));
        }
        if !luhn(&self.number) {
            return Err(PaymentError::card("incorrect_number", "Your card number is incorrect."));
        }
        if !(1..=12).contains(&self.exp_month) {
            return Err(PaymentError::card(
                "invalid_expiry_month",
                "Your card's expiration date is incomplete.",
            ));
        }
        if (self.exp_year, self.exp_month) < (today.year(), today.month()) {
            return Err(PaymentError::card(
                "invalid_expiry_year",
                "Your card's expiration year is in the past.",
            ));
        }
        if !digits_only(&self.cvc) || self.cvc.len() != self.brand().cvc_len() {
            return Err(PaymentError::card("invalid_cvc", "Your card's security code is invalid."));
        }
        Ok(())
    }
}

impl std::fmt::Debug for CardDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardDetails")
            .field("brand", &self.brand())
            .field("last4", &self.last4())
            .field("exp_month", &self.exp_month)
            .field("exp_year", &self.exp_year)
            .finish_non_exhaustive()
    }
}

/// A captured card is its own element
impl CardElement for CardDetails {
    fn card_details(&self) -> CardDetails {
        self.clone()
    }
}

/// Luhn mod-10 checksum
fn luhn(number: &str) -> bool {
    let sum: u32 = number
        .chars()
        .rev()
        .filter_map(|c| c.to_digit(10))
        .enumerate()
        .map(|(i, d)| match (i % 2, d * 2) {
            (1, doubled) if doubled > 9 => doubled - 9,
            (1, doubled) => doubled,
            _ => d,
        })
        .sum();
    sum % 10 == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
    }

    fn code(result: Result<()>) -> String {
        match result {
            Err(PaymentError::CardValidation { code, .. }) => code,
            other => panic!("expected card error, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_test_card() {
        let card = CardDetails::new("4242 4242 4242 4242", 12, 2030, "123");
        assert!(card.validate_on(today()).is_ok());
        assert_eq!(card.brand(), CardBrand::Visa);
        assert_eq!(card.last4(), "4242");
    }

    #[test]
    fn test_luhn_failure() {
        let card = CardDetails::new("4242 4242 4242 4241", 12, 2030, "123");
        assert_eq!(code(card.validate_on(today())), "incorrect_number");
    }

    #[test]
    fn test_non_digit_number() {
        let card = CardDetails::new("4242-abcd", 12, 2030, "123");
        assert_eq!(code(card.validate_on(today())), "invalid_number");
    }

    #[test]
    fn test_expired_card() {
        let card = CardDetails::new("4242424242424242", 5, 2025, "123");
        assert_eq!(code(card.validate_on(today())), "invalid_expiry_year");

        let this_month = CardDetails::new("4242424242424242", 6, 2025, "123");
        assert!(this_month.validate_on(today()).is_ok());
    }

    #[test]
    fn test_amex_needs_four_digit_cvc() {
        let card = CardDetails::new("378282246310005", 1, 2030, "123");
        assert_eq!(card.brand(), CardBrand::Amex);
        assert_eq!(code(card.validate_on(today())), "invalid_cvc");

        let card = CardDetails::new("378282246310005", 1, 2030, "1234");
        assert!(card.validate_on(today()).is_ok());
    }

    #[test]
    fn test_brands() {
        for number in ["5555555555554444", "2223003122003222"] {
            assert_eq!(CardDetails::new(number, 1, 2030, "1").brand(), CardBrand::Mastercard);
        }
        assert_eq!(CardDetails::new("6011111111111117", 1, 2030, "1").brand(), CardBrand::Discover);
    }

    #[test]
    fn test_debug_masks_number() {
        let card = CardDetails::new("4242424242424242", 12, 2030, "123");
        let debug = format!("{card:?}");
        assert!(debug.contains("4242"));
        assert!(!debug.contains("4242424242424242"));
        assert!(!debug.contains("123"));
    }
}
