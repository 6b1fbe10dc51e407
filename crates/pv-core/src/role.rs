use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the two participants in a conversation.
///
/// `Alpha` is conventionally the human-controlled side (`u_` in documents),
/// `Beta` the NPC side (`npc_` in documents).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The human side.
    Alpha,
    /// The NPC side.
    Beta,
}

impl Role {
    /// The opposite role.
    pub fn other(self) -> Self {
        match self {
            Self::Alpha => Self::Beta,
            Self::Beta => Self::Alpha,
        }
    }

    /// Resolve a document key prefix (`u` or `npc`).
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "u" => Some(Self::Alpha),
            "npc" => Some(Self::Beta),
            _ => None,
        }
    }

    /// Split a document key such as `u_add_var` into its role and the rest.
    pub fn split_key(key: &str) -> Option<(Self, &str)> {
        if let Some(rest) = key.strip_prefix("u_") {
            Some((Self::Alpha, rest))
        } else {
            key.strip_prefix("npc_").map(|rest| (Self::Beta, rest))
        }
    }

    /// The document key prefix for this role.
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Alpha => "u",
            Self::Beta => "npc",
        }
    }

    /// Map the `is_npc` flag used by repeat responses.
    pub fn from_is_npc(is_npc: bool) -> Self {
        if is_npc { Self::Beta } else { Self::Alpha }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Alpha => write!(f, "alpha"),
            Self::Beta => write!(f, "beta"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn other_flips() {
        assert_eq!(Role::Alpha.other(), Role::Beta);
        assert_eq!(Role::Beta.other(), Role::Alpha);
    }

    #[test]
    fn split_document_keys() {
        assert_eq!(Role::split_key("u_add_var"), Some((Role::Alpha, "add_var")));
        assert_eq!(Role::split_key("npc_lose_trait"), Some((Role::Beta, "lose_trait")));
        assert_eq!(Role::split_key("mapgen_update"), None);
    }

    #[test]
    fn prefix_round_trip() {
        for role in [Role::Alpha, Role::Beta] {
            assert_eq!(Role::from_prefix(role.prefix()), Some(role));
        }
        assert_eq!(Role::from_prefix("global"), None);
    }
}
