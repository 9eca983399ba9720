//! Usage roles and access levels
//!
//! `UsageFlags` is an OR-accumulated bitset; once a role is set on a node it
//! is never cleared. `Access` is ordered so that `Public` is the widest value.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Bitset describing how a type participates in the package
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UsageFlags(u32);

impl UsageFlags {
    pub const NONE: UsageFlags = UsageFlags(0);
    pub const INPUT: UsageFlags = UsageFlags(1 << 1);
    pub const OUTPUT: UsageFlags = UsageFlags(1 << 2);
    pub const API_VERSION_ENUM: UsageFlags = UsageFlags(1 << 3);
    pub const JSON: UsageFlags = UsageFlags(1 << 4);
    pub const SPREAD: UsageFlags = UsageFlags(1 << 5);
    pub const CLIENT_INITIALIZATION: UsageFlags = UsageFlags(1 << 6);
    /// Body of an error response
    pub const EXCEPTION: UsageFlags = UsageFlags(1 << 7);

    const NAMED: [(UsageFlags, &'static str); 7] = [
        (UsageFlags::INPUT, "input"),
        (UsageFlags::OUTPUT, "output"),
        (UsageFlags::API_VERSION_ENUM, "api-version-enum"),
        (UsageFlags::JSON, "json"),
        (UsageFlags::SPREAD, "spread"),
        (UsageFlags::CLIENT_INITIALIZATION, "client-initialization"),
        (UsageFlags::EXCEPTION, "exception"),
    ];

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn from_bits(bits: u32) -> Self {
        UsageFlags(bits)
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True when every bit of `other` is set in `self`
    pub const fn contains(self, other: UsageFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn intersects(self, other: UsageFlags) -> bool {
        self.0 & other.0 != 0
    }

    /// Parse a role name as written in override directives
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.trim().to_lowercase();
        Self::NAMED
            .iter()
            .find(|(_, n)| *n == lower)
            .map(|(flag, _)| *flag)
    }

    /// Names of the roles set in this bitset, in bit order
    pub fn names(self) -> Vec<&'static str> {
        Self::NAMED
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, n)| *n)
            .collect()
    }
}

impl BitOr for UsageFlags {
    type Output = UsageFlags;

    fn bitor(self, rhs: UsageFlags) -> UsageFlags {
        UsageFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for UsageFlags {
    fn bitor_assign(&mut self, rhs: UsageFlags) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for UsageFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "none");
        }
        write!(f, "{}", self.names().join("|"))
    }
}

/// Visibility of a generated type, operation or parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    Internal,
    Public,
}

impl Access {
    /// The wider of two access levels
    pub fn widest(self, other: Access) -> Access {
        self.max(other)
    }

    pub fn parse(value: &str) -> Option<Access> {
        match value.trim().to_lowercase().as_str() {
            "public" => Some(Access::Public),
            "internal" => Some(Access::Internal),
            _ => None,
        }
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Access::Internal => write!(f, "internal"),
            Access::Public => write!(f, "public"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_accumulates() {
        let mut usage = UsageFlags::INPUT;
        usage |= UsageFlags::JSON;
        assert!(usage.contains(UsageFlags::INPUT | UsageFlags::JSON));
        assert!(!usage.contains(UsageFlags::OUTPUT));
        assert_eq!(usage.to_string(), "input|json");
    }

    #[test]
    fn test_usage_from_name() {
        assert_eq!(UsageFlags::from_name("Output"), Some(UsageFlags::OUTPUT));
        assert_eq!(
            UsageFlags::from_name("api-version-enum"),
            Some(UsageFlags::API_VERSION_ENUM)
        );
        assert_eq!(UsageFlags::from_name("bogus"), None);
    }

    #[test]
    fn test_access_widest() {
        assert_eq!(Access::Internal.widest(Access::Public), Access::Public);
        assert_eq!(Access::Internal.widest(Access::Internal), Access::Internal);
        assert_eq!(Access::parse("PUBLIC"), Some(Access::Public));
        assert_eq!(Access::parse("private"), None);
    }
}
