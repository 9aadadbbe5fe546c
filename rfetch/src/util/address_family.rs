//! CLI helper - Address family
// (c) 2026 The rfetch developers

use serde::{Deserialize, de};
use strum::VariantNames as _;

/// Representation of an IP address family
///
/// This is a local type with special parsing semantics and aliasing to take part in the config/CLI system.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    clap::ValueEnum,
    serde::Serialize,
    strum::Display,
    strum::EnumString,
    strum::VariantNames,
)]
#[serde(rename_all = "kebab-case")] // to match clap::ValueEnum
#[strum(serialize_all = "lowercase")]
pub enum AddressFamily {
    /// IPv4
    /// (aliases: `4`, `inet4`)
    #[value(alias("4"), alias("inet4"))]
    #[strum(to_string = "inet", serialize = "4", serialize = "inet4")]
    Inet,
    /// IPv6
    /// (aliases: `6`)
    #[value(alias("6"))]
    #[strum(to_string = "inet6", serialize = "6")]
    Inet6,
    /// Unspecified. rfetch will use whatever the name lookup returns first.
    #[default]
    Any,
}

impl AddressFamily {
    /// Does the given address belong to this family?
    #[must_use]
    pub fn matches(self, addr: &std::net::IpAddr) -> bool {
        match self {
            AddressFamily::Any => true,
            AddressFamily::Inet => addr.is_ipv4(),
            AddressFamily::Inet6 => addr.is_ipv6(),
        }
    }
}

impl<'de> Deserialize<'de> for AddressFamily {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_any(FamilyVisitor)
    }
}

/// Accepts a family name, or the bare numbers 4 and 6 (which environment variables and TOML deliver as integers)
struct FamilyVisitor;

impl de::Visitor<'_> for FamilyVisitor {
    type Value = AddressFamily;

    fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "one of {:?}", AddressFamily::VARIANTS)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        std::str::FromStr::from_str(&v.to_ascii_lowercase())
            .map_err(|_| de::Error::unknown_variant(v, AddressFamily::VARIANTS))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        match v {
            4 => Ok(AddressFamily::Inet),
            6 => Ok(AddressFamily::Inet6),
            _ => Err(de::Error::invalid_value(de::Unexpected::Unsigned(v), &self)),
        }
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        u64::try_from(v)
            .map_err(|_| de::Error::invalid_value(de::Unexpected::Signed(v), &self))
            .and_then(|u| self.visit_u64(u))
    }
}
