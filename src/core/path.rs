//! Derivation path model and numeric component parsing.
//!
//! A path selects one key in the BIP44-shaped tree rooted at a seed:
//!
//! ```text
//! m / 44' / coin' / account' / change / key_index
//!            │
//!            └── 283 for KeyContext::Address, 0 for KeyContext::Identity
//! ```
//!
//! Paths are `Copy` values. Editing a component returns a new path.

use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Hardened index offset.
pub const HARDENED: u32 = 0x8000_0000;
/// BIP44 purpose.
pub const PURPOSE: u32 = 44;

pub fn harden(index: u32) -> u32 { HARDENED.wrapping_add(index) }

/// Errors produced while reading path components from text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("invalid number format: {0:?}")]
    InvalidNumberFormat(String),
    #[error("unknown key context: {0:?}")]
    UnknownContext(String),
    #[error("malformed derivation path: {0:?}")]
    Malformed(String),
}

/// Top-level purpose selector within the derivation tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyContext {
    #[default]
    Address,
    Identity,
}

impl KeyContext {
    pub const ALL: [KeyContext; 2] = [KeyContext::Address, KeyContext::Identity];

    /// SLIP-44 coin type used for the second path level.
    pub fn coin_type(&self) -> u32 {
        match self {
            KeyContext::Address => 283,
            KeyContext::Identity => 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            KeyContext::Address => "address",
            KeyContext::Identity => "identity",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "address" | "addr" => Some(KeyContext::Address),
            "identity" | "id" => Some(KeyContext::Identity),
            _ => None,
        }
    }

    fn from_coin_type(coin: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.coin_type() == coin)
    }
}

impl fmt::Display for KeyContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// The three free-form numeric components of a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathField {
    Account,
    Change,
    KeyIndex,
}

impl PathField {
    pub const ALL: [PathField; 3] = [PathField::Account, PathField::Change, PathField::KeyIndex];

    pub fn as_str(&self) -> &'static str {
        match self {
            PathField::Account => "account",
            PathField::Change => "change",
            PathField::KeyIndex => "index",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "account" => Some(PathField::Account),
            "change" => Some(PathField::Change),
            "index" | "key_index" | "keyindex" => Some(PathField::KeyIndex),
            _ => None,
        }
    }
}

/// Immutable selector for one key: `(context, account, change, key_index)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DerivationPath {
    pub context: KeyContext,
    pub account: u32,
    pub change: u32,
    pub key_index: u32,
}

impl DerivationPath {
    pub const fn new(context: KeyContext, account: u32, change: u32, key_index: u32) -> Self {
        Self { context, account, change, key_index }
    }

    pub fn with_context(self, context: KeyContext) -> Self { Self { context, ..self } }
    pub fn with_account(self, account: u32) -> Self { Self { account, ..self } }
    pub fn with_change(self, change: u32) -> Self { Self { change, ..self } }
    pub fn with_key_index(self, key_index: u32) -> Self { Self { key_index, ..self } }

    pub fn with_field(self, field: PathField, value: u32) -> Self {
        match field {
            PathField::Account => self.with_account(value),
            PathField::Change => self.with_change(value),
            PathField::KeyIndex => self.with_key_index(value),
        }
    }

    pub fn field(&self, field: PathField) -> u32 {
        match field {
            PathField::Account => self.account,
            PathField::Change => self.change,
            PathField::KeyIndex => self.key_index,
        }
    }

    /// Child indices from the root, purpose first.
    ///
    /// Purpose, coin and account are hardened by adding `2^31` modulo `2^32`,
    /// so every account is derivable. Accounts at or above `2^31` wrap into
    /// the non-hardened range.
    pub fn indices(&self) -> [u32; 5] {
        [
            harden(PURPOSE),
            harden(self.context.coin_type()),
            harden(self.account),
            self.change,
            self.key_index,
        ]
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "m/{}'/{}'/{}'/{}/{}",
            PURPOSE,
            self.context.coin_type(),
            self.account,
            self.change,
            self.key_index
        )
    }
}

fn path_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^m/44'/(\d+)'/(\d+)'/(\d+)/(\d+)$").expect("static derivation path regex")
    })
}

impl FromStr for DerivationPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = path_regex()
            .captures(s.trim())
            .ok_or_else(|| PathError::Malformed(s.to_string()))?;
        let num = |i: usize| -> Result<u32, PathError> {
            caps[i].parse::<u32>().map_err(|_| PathError::Malformed(s.to_string()))
        };
        let context = KeyContext::from_coin_type(num(1)?)
            .ok_or_else(|| PathError::UnknownContext(caps[1].to_string()))?;
        Ok(Self::new(context, num(2)?, num(3)?, num(4)?))
    }
}

/// Parse user-entered text into a path component.
///
/// Empty text is `0`. An optionally signed run of ASCII digits is read as a
/// base-10 integer and clamped into `[0, u32::MAX]` whatever its magnitude.
/// Anything else is `InvalidNumberFormat`.
pub fn parse_component(text: &str) -> Result<u32, PathError> {
    if text.is_empty() {
        return Ok(0);
    }
    let (negative, digits) = match text.as_bytes()[0] {
        b'-' => (true, &text[1..]),
        b'+' => (false, &text[1..]),
        _ => (false, text),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(PathError::InvalidNumberFormat(text.to_string()));
    }
    let magnitude = digits.trim_start_matches('0');
    if negative || magnitude.is_empty() {
        return Ok(0);
    }
    // Longer than u32::MAX's ten digits cannot fit.
    if magnitude.len() > 10 {
        return Ok(u32::MAX);
    }
    let value: u64 = magnitude
        .parse()
        .map_err(|_| PathError::InvalidNumberFormat(text.to_string()))?;
    Ok(value.min(u32::MAX as u64) as u32)
}

/// Render text back in canonical decimal form. Idempotent.
pub fn normalize_component(text: &str) -> Result<String, PathError> {
    parse_component(text).map(|v| v.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_component_basics() {
        assert_eq!(parse_component("").unwrap(), 0);
        assert_eq!(parse_component("0").unwrap(), 0);
        assert_eq!(parse_component("42").unwrap(), 42);
        assert_eq!(parse_component("007").unwrap(), 7);
        assert_eq!(parse_component("+9").unwrap(), 9);
    }

    #[test]
    fn test_parse_component_clamps() {
        assert_eq!(parse_component("-5").unwrap(), 0);
        assert_eq!(parse_component("4294967295").unwrap(), u32::MAX);
        assert_eq!(parse_component("4294967296").unwrap(), u32::MAX);
        assert_eq!(parse_component("99999999999999999999999999").unwrap(), u32::MAX);
        assert_eq!(parse_component("-99999999999999999999999999").unwrap(), 0);
    }

    #[test]
    fn test_parse_component_rejects_garbage() {
        for bad in ["abc", "1a", " 1", "-", "+", "1.5", "0x10", "１"] {
            assert_eq!(
                parse_component(bad),
                Err(PathError::InvalidNumberFormat(bad.to_string())),
                "{bad:?} should not parse"
            );
        }
    }

    #[test]
    fn test_normalize_idempotent() {
        for input in ["", "0", "00012", "-3", "4294967299", "+77", "123"] {
            let once = normalize_component(input).unwrap();
            let twice = normalize_component(&once).unwrap();
            assert_eq!(once, twice);
            assert_eq!(parse_component(&once).unwrap(), parse_component(input).unwrap());
        }
        assert_eq!(normalize_component("00012").unwrap(), "12");
        assert_eq!(normalize_component("").unwrap(), "0");
    }

    #[test]
    fn test_path_display_roundtrip() {
        let path = DerivationPath::new(KeyContext::Identity, 3, 1, 12);
        assert_eq!(path.to_string(), "m/44'/0'/3'/1/12");
        assert_eq!("m/44'/0'/3'/1/12".parse::<DerivationPath>().unwrap(), path);
        assert!("m/44'/999'/0'/0/0".parse::<DerivationPath>().is_err());
        assert!("m/44/283/0/0/0".parse::<DerivationPath>().is_err());
    }

    #[test]
    fn test_with_field_returns_new_value() {
        let base = DerivationPath::default();
        let edited = base.with_field(PathField::KeyIndex, 5);
        assert_eq!(base.key_index, 0);
        assert_eq!(edited.key_index, 5);
        assert_eq!(edited.field(PathField::KeyIndex), 5);
    }

    #[test]
    fn test_indices_harden_upper_levels() {
        let idx = DerivationPath::new(KeyContext::Address, 2, 0, 9).indices();
        assert_eq!(idx, [44 | HARDENED, 283 | HARDENED, 2 | HARDENED, 0, 9]);
    }

    #[test]
    fn test_large_accounts_wrap() {
        assert_eq!(DerivationPath::new(KeyContext::Address, HARDENED, 0, 0).indices()[2], 0);
        assert_eq!(DerivationPath::new(KeyContext::Address, u32::MAX, 0, 0).indices()[2], HARDENED - 1);
        assert_eq!(harden(HARDENED - 1), u32::MAX);
    }
}
