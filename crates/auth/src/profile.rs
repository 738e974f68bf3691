//! Application-level identity record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use loadlink_core::UserId;

use crate::role::UserRole;

/// Commercial standing of the account. Informational only — never gates
/// access, but downstream pages read it.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Demo,
    #[default]
    Regular,
}

/// Profile row owned by an authenticated identity, keyed by the provider's
/// user id (one row per identity, enforced by the store).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: UserId,

    /// Dashboard family. Legacy rows may hold `null` or an unrecognized
    /// string; both arrive here as [`UserRole::Unset`].
    #[serde(default, deserialize_with = "de_user_role")]
    pub user_type: UserRole,

    #[serde(default)]
    pub account_type: AccountType,

    /// Application-level verification flag, tracked independently of the
    /// provider's own confirmation timestamp.
    #[serde(default)]
    pub email_verified: bool,

    // Contact/company fields: passed through opaquely, never inspected here.
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,

    /// When a verification message was last (re)sent on the user's behalf.
    #[serde(default)]
    pub verification_sent_at: Option<DateTime<Utc>>,
}

/// Partial update accepted by the profile store. `None` fields are left
/// untouched; the store merges, it does not replace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub email_verified: Option<bool>,
    pub verification_sent_at: Option<DateTime<Utc>>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub company_name: Option<String>,
}

fn de_user_role<'de, D>(deserializer: D) -> Result<UserRole, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().map(UserRole::parse).unwrap_or(UserRole::Unset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn null_user_type_deserializes_to_unset() {
        let profile: Profile = serde_json::from_value(json!({
            "id": uuid::Uuid::now_v7(),
            "user_type": null,
        }))
        .unwrap();

        assert_eq!(profile.user_type, UserRole::Unset);
        assert_eq!(profile.account_type, AccountType::Regular);
        assert!(!profile.email_verified);
    }

    #[test]
    fn legacy_role_string_deserializes_to_unset() {
        let profile: Profile = serde_json::from_value(json!({
            "id": uuid::Uuid::now_v7(),
            "user_type": "dispatcher",
        }))
        .unwrap();

        assert_eq!(profile.user_type, UserRole::Unset);
    }

    #[test]
    fn full_row_round_trips() {
        let profile: Profile = serde_json::from_value(json!({
            "id": uuid::Uuid::now_v7(),
            "user_type": "business",
            "account_type": "demo",
            "email_verified": true,
            "full_name": "Dana Freight",
            "company_name": "Freight & Co",
        }))
        .unwrap();

        assert_eq!(profile.user_type, UserRole::Business);
        assert_eq!(profile.account_type, AccountType::Demo);
        assert!(profile.email_verified);
        assert_eq!(profile.phone, None);
    }
}
