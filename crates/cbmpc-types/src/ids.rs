//! Party, role, and session identifiers (§3).

use serde::{Deserialize, Serialize};

/// A stable, cluster-unique party name — the string bound to a role id and
/// verified against an X.509 leaf certificate's common name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartyName(String);

impl PartyName {
    /// Builds a `PartyName`, rejecting the empty string.
    pub fn new(name: impl Into<String>) -> Result<Self, crate::Error> {
        let name = name.into();
        if name.is_empty() {
            return Err(crate::Error::InvalidArgument(
                "party name must not be empty".to_string(),
            ));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PartyName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A role id in `[0, N)`, the index into a cluster's ordered party list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoleId(u32);

impl RoleId {
    pub fn new(value: u32) -> Self {
        Self(value)
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// Validates `self` against a party count, per §4.5's `NewJobMP`
    /// range check.
    pub fn validate(self, party_count: usize) -> Result<(), crate::Error> {
        if (self.0 as usize) >= party_count {
            return Err(crate::Error::InvalidArgument(format!(
                "role id {} out of range for {party_count} parties",
                self.0
            )));
        }
        Ok(())
    }
}

impl std::fmt::Display for RoleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The fixed role in a 2-party job. `P1` always goes first; `P2`'s peer
/// role is `P1` and vice versa (§3: "the peer role is `role XOR 1`").
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role2P {
    P1,
    P2,
}

impl Role2P {
    pub fn peer(self) -> Role2P {
        match self {
            Role2P::P1 => Role2P::P2,
            Role2P::P2 => Role2P::P1,
        }
    }

    pub fn as_role_id(self) -> RoleId {
        match self {
            Role2P::P1 => RoleId(0),
            Role2P::P2 => RoleId(1),
        }
    }
}

/// Opaque, variable-length session identifier minted by the engine on DKG
/// and updated on Refresh (§3). Equal-by-value, unordered, may be empty.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(#[serde(with = "hex_bytes")] Vec<u8>);

impl SessionId {
    /// The empty session id — "mint a fresh one" per §3.
    pub fn fresh() -> Self {
        Self(Vec::new())
    }

    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SessionId({})", hex::encode(&self.0))
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(d)?;
        hex::decode(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_party_name_rejects_empty() {
        assert!(PartyName::new("").is_err());
        assert!(PartyName::new("alice").is_ok());
    }

    #[test]
    fn test_role_id_validate() {
        assert!(RoleId::new(2).validate(3).is_ok());
        assert!(RoleId::new(3).validate(3).is_err());
    }

    #[test]
    fn test_role2p_peer_is_involution() {
        assert_eq!(Role2P::P1.peer(), Role2P::P2);
        assert_eq!(Role2P::P2.peer().peer(), Role2P::P2);
    }

    #[test]
    fn test_session_id_fresh_is_empty() {
        assert!(SessionId::fresh().is_empty());
        assert!(!SessionId::from_bytes(vec![1, 2, 3]).is_empty());
    }
}
