use std::time::Duration;

use jsonwebtoken::Algorithm;
use serde::Deserialize;
use serde::Serialize;

/// Token lifetime: either plain seconds or a human-readable span ("5m", "1d").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Lifetime {
    Seconds(u64),
    Human(#[serde(with = "humantime_serde")] Duration),
}

impl Lifetime {
    pub fn as_secs(&self) -> i64 {
        let secs = match self {
            Lifetime::Seconds(secs) => *secs,
            Lifetime::Human(duration) => duration.as_secs(),
        };
        i64::try_from(secs).unwrap_or(i64::MAX)
    }
}

impl From<Duration> for Lifetime {
    fn from(duration: Duration) -> Self {
        Lifetime::Human(duration)
    }
}

/// A claim value that may be given as one string or a list of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    pub fn as_slice(&self) -> &[String] {
        match self {
            OneOrMany::One(value) => std::slice::from_ref(value),
            OneOrMany::Many(values) => values,
        }
    }

    pub fn first(&self) -> Option<&str> {
        self.as_slice().first().map(String::as_str)
    }

    pub fn contains(&self, value: &str) -> bool {
        self.as_slice().iter().any(|v| v == value)
    }

    pub(crate) fn joined(&self) -> String {
        self.as_slice().join(",")
    }
}

impl From<&str> for OneOrMany {
    fn from(value: &str) -> Self {
        OneOrMany::One(value.to_string())
    }
}

/// Signing and verification options.
///
/// Every field is optional so per-call options can be layered over the
/// configured defaults with [`TokenOptions::merged`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<Algorithm>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<Lifetime>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub not_before: Option<Lifetime>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub audience: Option<OneOrMany>,

    /// Issuer to stamp on signed tokens (first entry) and to accept on verify (any entry).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<OneOrMany>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    /// Fixed token id; a random UUID is used when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jwtid: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyid: Option<String>,

    /// Clock skew tolerance in seconds for `exp` and `nbf`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leeway: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_timestamp: Option<bool>,
}

impl TokenOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Layer `overrides` over `self`; fields set in `overrides` win.
    pub fn merged(&self, overrides: &TokenOptions) -> TokenOptions {
        TokenOptions {
            algorithm: overrides.algorithm.or(self.algorithm),
            expires_in: overrides.expires_in.or(self.expires_in),
            not_before: overrides.not_before.or(self.not_before),
            audience: overrides.audience.clone().or_else(|| self.audience.clone()),
            issuer: overrides.issuer.clone().or_else(|| self.issuer.clone()),
            subject: overrides.subject.clone().or_else(|| self.subject.clone()),
            jwtid: overrides.jwtid.clone().or_else(|| self.jwtid.clone()),
            keyid: overrides.keyid.clone().or_else(|| self.keyid.clone()),
            leeway: overrides.leeway.or(self.leeway),
            no_timestamp: overrides.no_timestamp.or(self.no_timestamp),
        }
    }

    pub fn algorithm_or_default(&self) -> Algorithm {
        self.algorithm.unwrap_or(Algorithm::HS256)
    }

    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = Some(algorithm);
        self
    }

    pub fn with_expires_in(mut self, expires_in: impl Into<Lifetime>) -> Self {
        self.expires_in = Some(expires_in.into());
        self
    }

    pub fn with_not_before(mut self, not_before: impl Into<Lifetime>) -> Self {
        self.not_before = Some(not_before.into());
        self
    }

    pub fn with_audience(mut self, audience: impl Into<OneOrMany>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    pub fn with_issuer(mut self, issuer: impl Into<OneOrMany>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    pub fn with_subject(mut self, subject: impl ToString) -> Self {
        self.subject = Some(subject.to_string());
        self
    }

    pub fn with_leeway(mut self, leeway: u64) -> Self {
        self.leeway = Some(leeway);
        self
    }
}
