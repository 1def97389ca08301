//! Card holder identity: display name, card number and the scan payload.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Name used when the holder never set one
pub const DEFAULT_HOLDER_NAME: &str = "Cliente";

const CARD_NUMBER_DIGITS: usize = 12;
const CARD_NUMBER_GROUP: usize = 4;

/// Who the card belongs to.
///
/// Both fields start unset. The card number is generated on first use and
/// never changes afterwards, except through a full reset.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardHolder {
    pub name: Option<String>,
    /// Twelve digits in groups of four, e.g. `"0123 4567 8901"`
    pub card_number: Option<String>,
}

impl CardHolder {
    /// Set the display name. Blank names are ignored and return `false`.
    pub fn set_name(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() {
            return false;
        }
        self.name = Some(name.to_string());
        true
    }

    /// Name to show, falling back to [`DEFAULT_HOLDER_NAME`].
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(DEFAULT_HOLDER_NAME)
    }

    /// Up to two uppercase initials of the holder name.
    pub fn initials(&self) -> Option<String> {
        let name = self.name.as_deref()?;
        let initials: String = name
            .split_whitespace()
            .filter_map(|word| word.chars().next())
            .flat_map(char::to_uppercase)
            .take(2)
            .collect();
        (!initials.is_empty()).then_some(initials)
    }

    pub fn card_number(&self) -> Option<&str> {
        self.card_number.as_deref()
    }

    /// Return the card number, generating it on first call.
    pub fn ensure_card_number(&mut self) -> &str {
        self.ensure_card_number_with(&mut rand::thread_rng())
    }

    pub fn ensure_card_number_with<R: Rng + ?Sized>(&mut self, rng: &mut R) -> &str {
        self.card_number
            .get_or_insert_with(|| generate_card_number(rng))
            .as_str()
    }
}

/// Random twelve-digit card number, grouped by four.
pub fn generate_card_number<R: Rng + ?Sized>(rng: &mut R) -> String {
    let digits: Vec<char> = (0..CARD_NUMBER_DIGITS)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect();
    digits
        .chunks(CARD_NUMBER_GROUP)
        .map(|group| group.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Data encoded in the card's QR code.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrPayload {
    /// Card number without the group separators
    pub card_number: String,
    pub user_name: String,
    /// Milliseconds since the Unix epoch; refreshing the code changes it
    pub timestamp: i64,
}

impl QrPayload {
    pub fn new(card_number: &str, user_name: &str, at: DateTime<Utc>) -> Self {
        Self {
            card_number: card_number.chars().filter(|c| !c.is_whitespace()).collect(),
            user_name: user_name.to_string(),
            timestamp: at.timestamp_millis(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
