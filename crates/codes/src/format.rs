//! Code format implementation.
//!
//! Each code type wraps the full canonical string (prefix included) so that a
//! constructed value can be handed straight to display, QR encoding, or store
//! lookups without re-rendering.

use crate::{CodeError, CodeResult};
use rand::Rng;
use std::{fmt, str::FromStr};
use uuid::Uuid;

/// The kind of record a code addresses, as encoded by its prefix.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CodeKind {
    /// A durably registered patient (`PAT-`).
    Patient,
    /// An ad-hoc emergency intake record (`EM-`).
    Emergency,
    /// A single hospital encounter (`VST-`).
    Visit,
}

impl CodeKind {
    /// Returns the prefix string for this kind, including the trailing hyphen.
    pub fn prefix(self) -> &'static str {
        match self {
            CodeKind::Patient => "PAT-",
            CodeKind::Emergency => "EM-",
            CodeKind::Visit => "VST-",
        }
    }

    /// Classifies raw input by recognised prefix.
    ///
    /// Returns `None` when no prefix matches. Callers treat that as ambiguous
    /// input rather than rejecting it: real-world entry may omit the prefix
    /// entirely, and resolution falls back to a fixed-order dual lookup.
    pub fn classify(raw: &str) -> Option<CodeKind> {
        let raw = raw.trim();
        if raw.starts_with(CodeKind::Patient.prefix()) {
            Some(CodeKind::Patient)
        } else if raw.starts_with(CodeKind::Emergency.prefix()) {
            Some(CodeKind::Emergency)
        } else if raw.starts_with(CodeKind::Visit.prefix()) {
            Some(CodeKind::Visit)
        } else {
            None
        }
    }
}

fn is_digits(s: &str, len: usize) -> bool {
    s.len() == len && s.bytes().all(|b| b.is_ascii_digit())
}

/// A patient code: `PAT-` followed by exactly five digits.
///
/// Patient codes are globally unique and immutable once assigned; they are never
/// reused, even after a record is retired. The five-digit space is small enough
/// to read over a phone, which is the point: uniqueness is enforced against the
/// store at allocation time, not by entropy.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PatientCode(String);

impl PatientCode {
    /// Digits in the numeric suffix.
    pub const SUFFIX_LEN: usize = 5;

    /// Validates and wraps an externally supplied patient code.
    ///
    /// # Errors
    ///
    /// Returns [`CodeError::InvalidInput`] unless the input is exactly
    /// `PAT-` followed by five ASCII digits.
    pub fn parse(input: &str) -> CodeResult<Self> {
        let input = input.trim();
        match input.strip_prefix(CodeKind::Patient.prefix()) {
            Some(suffix) if is_digits(suffix, Self::SUFFIX_LEN) => Ok(Self(input.to_owned())),
            _ => Err(CodeError::InvalidInput(format!(
                "patient code must be PAT- followed by {} digits, got: '{}'",
                Self::SUFFIX_LEN,
                input
            ))),
        }
    }

    /// Constructs a random candidate code.
    ///
    /// The candidate is drawn uniformly from the full zero-padded suffix space.
    /// It is NOT guaranteed unique; pair with a store uniqueness check and a
    /// bounded retry loop.
    pub fn random() -> Self {
        let n: u32 = rand::thread_rng().gen_range(0..100_000);
        Self(format!("{}{:05}", CodeKind::Patient.prefix(), n))
    }

    /// Returns the full code string, prefix included.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PatientCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PatientCode {
    type Err = CodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PatientCode::parse(s)
    }
}

/// An emergency code: `EM-` followed by a hyphenated lowercase UUID.
///
/// Emergency records are created without authentication, so their codes must be
/// unguessable as well as unique; a v4 UUID suffix gives both without needing a
/// store round-trip at allocation time.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EmergencyCode(String);

impl EmergencyCode {
    /// Generates a fresh emergency code from a new v4 UUID.
    pub fn generate() -> Self {
        Self(format!("{}{}", CodeKind::Emergency.prefix(), Uuid::new_v4()))
    }

    /// Validates and wraps an externally supplied emergency code.
    ///
    /// The suffix must already be in the canonical hyphenated lowercase form;
    /// other UUID renderings are rejected rather than normalised.
    ///
    /// # Errors
    ///
    /// Returns [`CodeError::InvalidInput`] if the prefix or UUID suffix is
    /// malformed.
    pub fn parse(input: &str) -> CodeResult<Self> {
        let input = input.trim();
        let suffix = input
            .strip_prefix(CodeKind::Emergency.prefix())
            .ok_or_else(|| {
                CodeError::InvalidInput(format!("emergency code must start with EM-, got: '{input}'"))
            })?;
        let parsed = Uuid::parse_str(suffix).map_err(|e| {
            CodeError::InvalidInput(format!("emergency code suffix is not a UUID: {e}"))
        })?;
        if parsed.hyphenated().to_string() != suffix {
            return Err(CodeError::InvalidInput(
                "emergency code UUID must be lowercase and hyphenated".into(),
            ));
        }
        Ok(Self(input.to_owned()))
    }

    /// Returns the full code string, prefix included.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmergencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EmergencyCode {
    type Err = CodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EmergencyCode::parse(s)
    }
}

/// A visit code: `VST-` followed by exactly six digits.
///
/// Visit codes are single-use handles for one encounter; once consumed by a
/// completed visit they are never reissued for a different one.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct VisitCode(String);

impl VisitCode {
    /// Digits in the numeric suffix.
    pub const SUFFIX_LEN: usize = 6;

    /// Validates and wraps an externally supplied visit code.
    ///
    /// # Errors
    ///
    /// Returns [`CodeError::InvalidInput`] unless the input is exactly
    /// `VST-` followed by six ASCII digits.
    pub fn parse(input: &str) -> CodeResult<Self> {
        let input = input.trim();
        match input.strip_prefix(CodeKind::Visit.prefix()) {
            Some(suffix) if is_digits(suffix, Self::SUFFIX_LEN) => Ok(Self(input.to_owned())),
            _ => Err(CodeError::InvalidInput(format!(
                "visit code must be VST- followed by {} digits, got: '{}'",
                Self::SUFFIX_LEN,
                input
            ))),
        }
    }

    /// Constructs a random candidate code; not guaranteed unique.
    pub fn random() -> Self {
        let n: u32 = rand::thread_rng().gen_range(0..1_000_000);
        Self(format!("{}{:06}", CodeKind::Visit.prefix(), n))
    }

    /// Returns the full code string, prefix included.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VisitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for VisitCode {
    type Err = CodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VisitCode::parse(s)
    }
}

#[cfg(feature = "serde")]
mod serde_impls {
    use super::{EmergencyCode, PatientCode, VisitCode};

    macro_rules! string_serde {
        ($ty:ident) => {
            impl serde::Serialize for $ty {
                fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
                where
                    S: serde::Serializer,
                {
                    serializer.serialize_str(self.as_str())
                }
            }

            impl<'de> serde::Deserialize<'de> for $ty {
                fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
                where
                    D: serde::Deserializer<'de>,
                {
                    let s = String::deserialize(deserializer)?;
                    $ty::parse(&s).map_err(serde::de::Error::custom)
                }
            }
        };
    }

    string_serde!(PatientCode);
    string_serde!(EmergencyCode);
    string_serde!(VisitCode);
}
