//! Static identity policy.
//!
//! Maps every caller to one identity taken from the environment of the host
//! process, and maps that identity back to configured numeric ids. Useful for
//! single-user deployments where local uids carry no meaning remotely.
//!
//! | Variable              | Meaning                                   |
//! |-----------------------|-------------------------------------------|
//! | `IDMAP_STATIC_USER`   | user id reported for every caller         |
//! | `IDMAP_STATIC_GROUPS` | comma-separated group ids, primary first  |
//! | `IDMAP_STATIC_UID`    | uid returned for the configured user      |
//! | `IDMAP_STATIC_GID`    | gid returned for the configured groups    |
//!
//! Unconfigured directions answer `ENOENT`.

use idmap_policy_sdk::prelude::*;
use once_cell::sync::Lazy;

pub const USER_VAR: &str = "IDMAP_STATIC_USER";
pub const GROUPS_VAR: &str = "IDMAP_STATIC_GROUPS";
pub const UID_VAR: &str = "IDMAP_STATIC_UID";
pub const GID_VAR: &str = "IDMAP_STATIC_GID";

static POLICY: Lazy<StaticPolicy> = Lazy::new(StaticPolicy::from_env);

/// Configured identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticPolicy {
    pub user_id: Option<String>,
    pub group_ids: Vec<String>,
    pub uid: Option<u32>,
    pub gid: Option<u32>,
}

impl StaticPolicy {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any variable source. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        Self {
            user_id: get(USER_VAR),
            group_ids: get(GROUPS_VAR)
                .map(|groups| {
                    groups
                        .split(',')
                        .map(str::trim)
                        .filter(|g| !g.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
            uid: get(UID_VAR).and_then(|v| v.parse().ok()),
            gid: get(GID_VAR).and_then(|v| v.parse().ok()),
        }
    }

    pub fn to_textual(&self, _uid: u32, _gid: u32) -> PolicyResult<TextualIdentity> {
        match &self.user_id {
            Some(user_id) if !self.group_ids.is_empty() => {
                Ok(TextualIdentity::new(user_id.clone(), self.group_ids.clone()))
            }
            _ => Err(PolicyError::NotFound(format!(
                "{} and {} are not set",
                USER_VAR, GROUPS_VAR
            ))),
        }
    }

    pub fn to_numeric(&self, user_id: &str, group_id: &str) -> PolicyResult<(u32, u32)> {
        if user_id.is_empty() || group_id.is_empty() {
            return Err(PolicyError::InvalidInput("empty user or group id".to_string()));
        }
        let (Some(uid), Some(gid)) = (self.uid, self.gid) else {
            return Err(PolicyError::NotFound(format!(
                "{} and {} are not set",
                UID_VAR, GID_VAR
            )));
        };
        if self.user_id.as_deref() != Some(user_id) || !self.group_ids.iter().any(|g| g == group_id) {
            return Err(PolicyError::NotFound(format!("{}/{}", user_id, group_id)));
        }
        Ok((uid, gid))
    }
}

fn to_textual(uid: u32, gid: u32) -> PolicyResult<TextualIdentity> {
    POLICY.to_textual(uid, gid)
}

fn to_numeric(user_id: &str, group_id: &str) -> PolicyResult<(u32, u32)> {
    POLICY.to_numeric(user_id, group_id)
}

idmap_policy_sdk::export_numeric_to_textual!(to_textual);
idmap_policy_sdk::export_textual_to_numeric!(to_numeric);
