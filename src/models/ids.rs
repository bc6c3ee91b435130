//! Record identifiers
//!
//! Each document kind gets its own UUID newtype. Ids display as a short
//! prefixed form (`est-1a2b3c4d`) and parse from either that prefix plus a
//! full UUID or the bare UUID.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! define_id {
    ($name:ident, $display_prefix:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Check whether a displayed short id (`est-1a2b3c4d`) or a bare
            /// UUID prefix refers to this ID
            pub fn matches_short(&self, s: &str) -> bool {
                let s = s.strip_prefix($display_prefix).unwrap_or(s);
                s.len() >= 4 && self.0.simple().to_string().starts_with(&s.to_lowercase())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", $display_prefix, &self.0.simple().to_string()[..8])
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.strip_prefix($display_prefix).unwrap_or(s);
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

define_id!(EstimateId, "est-");
define_id!(JobId, "job-");
define_id!(ItemId, "itm-");
define_id!(PublicLinkId, "lnk-");
define_id!(BundleId, "bun-");
define_id!(WorkorderId, "wo-");
define_id!(InvoiceId, "inv-");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display() {
        let id = EstimateId::new();
        let display = id.to_string();
        assert!(display.starts_with("est-"));
        assert_eq!(display.len(), 12);
    }

    #[test]
    fn test_short_match() {
        let id = WorkorderId::new();
        let display = id.to_string();
        assert!(id.matches_short(&display));
        assert!(id.matches_short(&display[3..]));
        assert!(!id.matches_short("wo-"));
        assert!(!id.matches_short("wo-zzzz"));
    }

    #[test]
    fn test_id_parse() {
        let uuid_str = "550e8400-e29b-41d4-a716-446655440000";
        let bare: InvoiceId = uuid_str.parse().unwrap();
        let prefixed: InvoiceId = format!("inv-{}", uuid_str).parse().unwrap();
        assert_eq!(bare, prefixed);
        assert_eq!(bare.to_string(), "inv-550e8400");
        assert!("inv-550e8400".parse::<InvoiceId>().is_err());
    }

    #[test]
    fn test_id_serialization() {
        let id = JobId::new();
        let json = serde_json::to_string(&id).unwrap();
        let deserialized: JobId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }
}
