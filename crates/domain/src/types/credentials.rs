//! Principals and the credentials held on their behalf

use std::collections::BTreeMap;
use std::fmt;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// Opaque account/tenant identifier under which tokens and jobs are scoped.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(String);

impl PrincipalId {
    /// Wrap a raw identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PrincipalId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Independent API family a principal may hold a refresh token for.
///
/// Each slot is refreshed against its own token endpoint; one slot's outage
/// never blocks the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenSlot {
    /// Advertising reporting API.
    Reporting,
    /// Seller-data (catalog) API.
    Catalog,
}

impl TokenSlot {
    /// Every slot, in refresh order.
    pub const ALL: [TokenSlot; 2] = [TokenSlot::Reporting, TokenSlot::Catalog];

    /// Wire and log name of the slot.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reporting => "reporting",
            Self::Catalog => "catalog",
        }
    }
}

impl fmt::Display for TokenSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Long-lived refresh tokens a caller supplies, keyed by slot.
///
/// Empty tokens are dropped on insert, so "requested" always means
/// "present and non-empty".
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<TokenSlot, String>")]
pub struct RefreshTokens(BTreeMap<TokenSlot, String>);

impl From<BTreeMap<TokenSlot, String>> for RefreshTokens {
    fn from(tokens: BTreeMap<TokenSlot, String>) -> Self {
        tokens.into_iter().fold(Self::new(), |acc, (slot, token)| acc.with(slot, token))
    }
}

impl RefreshTokens {
    /// No tokens at all.
    pub fn new() -> Self {
        Self::default()
    }

    /// Tokens for the reporting slot only.
    pub fn reporting(token: impl Into<String>) -> Self {
        Self::new().with(TokenSlot::Reporting, token)
    }

    /// Add (or replace) the token for `slot`. Blank tokens are ignored.
    pub fn with(mut self, slot: TokenSlot, token: impl Into<String>) -> Self {
        let token = token.into();
        if token.trim().is_empty() {
            self.0.remove(&slot);
        } else {
            self.0.insert(slot, token);
        }
        self
    }

    /// Refresh token for `slot`, if supplied.
    pub fn get(&self, slot: TokenSlot) -> Option<&str> {
        self.0.get(&slot).map(String::as_str)
    }

    /// Slots with a usable refresh token, in stable order.
    pub fn slots(&self) -> impl Iterator<Item = TokenSlot> + '_ {
        self.0.keys().copied()
    }

    /// Slot and token pairs, in stable order.
    pub fn iter(&self) -> impl Iterator<Item = (TokenSlot, &str)> + '_ {
        self.0.iter().map(|(slot, token)| (*slot, token.as_str()))
    }

    /// True when no slot has a token.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for RefreshTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.keys()).finish()
    }
}

/// Access token minted for one slot.
#[derive(Clone, PartialEq, Eq)]
pub struct SlotCredential {
    /// Bearer token sent with API calls.
    pub access_token: String,
    /// Refresh token the access token was minted from.
    pub refresh_token: String,
    /// When the access token was minted, per the store clock.
    pub issued_at: SystemTime,
}

impl fmt::Debug for SlotCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotCredential")
            .field("access_token", &format_args!("<{} chars>", self.access_token.len()))
            .field("issued_at", &self.issued_at)
            .finish_non_exhaustive()
    }
}

/// Current access tokens for one principal, one entry per refreshed slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialSet {
    /// Owner of these credentials.
    pub principal_id: PrincipalId,
    /// One entry per slot refreshed so far.
    pub slots: BTreeMap<TokenSlot, SlotCredential>,
}

impl CredentialSet {
    /// Empty credential set for `principal_id`.
    pub fn new(principal_id: PrincipalId) -> Self {
        Self { principal_id, slots: BTreeMap::new() }
    }

    /// Credential for `slot`, if one has been minted.
    pub fn slot(&self, slot: TokenSlot) -> Option<&SlotCredential> {
        self.slots.get(&slot)
    }

    /// Bearer token for `slot`, if one has been minted.
    pub fn access_token(&self, slot: TokenSlot) -> Option<&str> {
        self.slots.get(&slot).map(|c| c.access_token.as_str())
    }

    /// Shorthand for the reporting slot's bearer token.
    pub fn reporting_token(&self) -> Option<&str> {
        self.access_token(TokenSlot::Reporting)
    }

    /// Issuance time of the most recently refreshed slot.
    pub fn issued_at(&self) -> Option<SystemTime> {
        self.slots.values().map(|c| c.issued_at).max()
    }
}

/// Result of exchanging a refresh token at the token endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct RefreshedToken {
    /// Freshly minted bearer token.
    pub access_token: String,
    /// Rotated refresh token, when the endpoint issues one.
    pub refresh_token: Option<String>,
    /// Lifetime reported by the endpoint, informational only.
    pub expires_in_secs: Option<u64>,
}

impl fmt::Debug for RefreshedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshedToken")
            .field("access_token", &format_args!("<{} chars>", self.access_token.len()))
            .field("rotated", &self.refresh_token.is_some())
            .field("expires_in_secs", &self.expires_in_secs)
            .finish()
    }
}
