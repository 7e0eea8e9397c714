use serde::{Deserialize, Serialize};

/// Role identifier used for RBAC.
///
/// The known roles are a closed set; anything else decoded from a token is
/// kept verbatim as [`Role::Other`] so it can be logged, and maps to the
/// empty permission set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Admin,
    Client,
    Public,
    Other(String),
}

impl Role {
    /// Roles defined at process start, in table order.
    pub const KNOWN: [Role; 3] = [Role::Admin, Role::Client, Role::Public];

    /// Parse a role name, rejecting anything outside the known set.
    pub fn parse_known(name: &str) -> Option<Self> {
        match Self::from(name.trim().to_ascii_lowercase()) {
            Role::Other(_) => None,
            role => Some(role),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Role::Admin => "admin",
            Role::Client => "client",
            Role::Public => "public",
            Role::Other(name) => name,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        match value.as_str() {
            "admin" => Role::Admin,
            "client" => Role::Client,
            "public" => Role::Public,
            _ => Role::Other(value),
        }
    }
}

impl From<&str> for Role {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<Role> for String {
    fn from(value: Role) -> Self {
        match value {
            Role::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_round_trip() {
        for role in Role::KNOWN {
            let json = serde_json::to_string(&role).unwrap();
            let back: Role = serde_json::from_str(&json).unwrap();
            assert_eq!(back, role);
        }
    }

    #[test]
    fn unknown_names_are_preserved() {
        let role: Role = serde_json::from_str("\"auditor\"").unwrap();
        assert_eq!(role, Role::Other("auditor".to_string()));
        assert_eq!(role.as_str(), "auditor");
    }

    #[test]
    fn parse_known_is_case_insensitive_and_closed() {
        assert_eq!(Role::parse_known(" Admin "), Some(Role::Admin));
        assert_eq!(Role::parse_known("client"), Some(Role::Client));
        assert_eq!(Role::parse_known("root"), None);
    }
}
