//! Credential types.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{PolicyError, Result};

/// OS-level numeric credential of a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NumericCredential {
    pub user_id: u32,
    pub group_id: u32,
}

impl NumericCredential {
    pub fn new(user_id: u32, group_id: u32) -> Self {
        Self { user_id, group_id }
    }
}

impl fmt::Display for NumericCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "uid={} gid={}", self.user_id, self.group_id)
    }
}

/// Textual credential: a user id plus its groups, primary group first.
///
/// Always holds at least one group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "TextualCredentialRepr")]
pub struct TextualCredential {
    user_id: String,
    group_ids: Vec<String>,
}

#[derive(Deserialize)]
struct TextualCredentialRepr {
    user_id: String,
    group_ids: Vec<String>,
}

impl TryFrom<TextualCredentialRepr> for TextualCredential {
    type Error = PolicyError;

    fn try_from(repr: TextualCredentialRepr) -> Result<Self> {
        Self::new(repr.user_id, repr.group_ids)
    }
}

impl TextualCredential {
    /// Create a textual credential. Fails on an empty user id or group list.
    pub fn new(user_id: impl Into<String>, group_ids: Vec<String>) -> Result<Self> {
        let user_id = user_id.into();
        if user_id.is_empty() {
            return Err(PolicyError::InvalidInput("empty user id".to_string()));
        }
        if group_ids.is_empty() {
            return Err(PolicyError::InvalidInput(format!(
                "no group ids for user {}",
                user_id
            )));
        }
        Ok(Self { user_id, group_ids })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn group_ids(&self) -> &[String] {
        &self.group_ids
    }

    /// The primary group.
    pub fn primary_group(&self) -> &str {
        &self.group_ids[0]
    }

    pub fn into_parts(self) -> (String, Vec<String>) {
        (self.user_id, self.group_ids)
    }
}

impl fmt::Display for TextualCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.user_id, self.group_ids.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_textual_requires_groups() {
        assert!(TextualCredential::new("alice", vec![]).is_err());
        assert!(TextualCredential::new("", vec!["staff".into()]).is_err());

        let cred = TextualCredential::new("alice", vec!["staff".into(), "wheel".into()]).unwrap();
        assert_eq!(cred.primary_group(), "staff");
        assert_eq!(cred.to_string(), "alice (staff, wheel)");
    }

    #[test]
    fn test_deserialize_enforces_invariant() {
        let ok: TextualCredential =
            serde_json::from_str(r#"{"user_id":"root","group_ids":["root"]}"#).unwrap();
        assert_eq!(ok.user_id(), "root");

        let bad = serde_json::from_str::<TextualCredential>(r#"{"user_id":"root","group_ids":[]}"#);
        assert!(bad.is_err());
    }
}
