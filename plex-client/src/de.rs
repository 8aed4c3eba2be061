//! Lenient field decoders
//!
//! Plex serialises numeric attributes inconsistently between endpoints and
//! server versions: the same field may arrive as `32500`, `"32500"` or be
//! missing entirely.

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Unsigned(u64),
    Float(f64),
    Text(String),
    Flag(bool),
}

impl Scalar {
    fn as_u64(&self) -> Option<u64> {
        match self {
            Scalar::Unsigned(n) => Some(*n),
            Scalar::Float(f) if *f >= 0.0 => Some(*f as u64),
            Scalar::Float(_) => None,
            Scalar::Text(s) => s.trim().parse().ok(),
            Scalar::Flag(_) => None,
        }
    }

    fn into_string(self) -> String {
        match self {
            Scalar::Unsigned(n) => n.to_string(),
            Scalar::Float(f) => f.to_string(),
            Scalar::Text(s) => s,
            Scalar::Flag(b) => b.to_string(),
        }
    }
}

pub(crate) fn opt_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Scalar>::deserialize(deserializer)?.and_then(|s| s.as_u64()))
}

pub(crate) fn opt_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(opt_u64(deserializer)?.and_then(|n| u32::try_from(n).ok()))
}

pub(crate) fn port<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(opt_u64(deserializer)?
        .and_then(|n| u16::try_from(n).ok())
        .unwrap_or(0))
}

pub(crate) fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Scalar>::deserialize(deserializer)?
        .map(Scalar::into_string)
        .unwrap_or_default())
}
