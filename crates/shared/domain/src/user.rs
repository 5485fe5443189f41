use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

/// Store-assigned user identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    #[must_use]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl From<i64> for UserId {
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for UserId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// A user that has not been persisted yet, so it has no id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub is_admin: bool,
}

impl NewUser {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self { name: name.into(), email: email.into(), is_admin: false }
    }

    #[must_use]
    pub const fn admin(mut self) -> Self {
        self.is_admin = true;
        self
    }

    /// The persisted form: active, registered on `registered_on`, no email change yet.
    #[must_use]
    pub fn into_user(self, id: UserId, registered_on: NaiveDate) -> User {
        User {
            id,
            name: self.name,
            email: self.email,
            is_admin: self.is_admin,
            is_active: true,
            registration_date: registered_on,
            last_email_change_date: None,
            deactivation_date: None,
        }
    }
}

/// A persisted user.
///
/// `registration_date` never changes after creation. `last_email_change_date` and
/// `deactivation_date` stay `None` until the corresponding operation succeeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
    pub is_active: bool,
    pub registration_date: NaiveDate,
    pub last_email_change_date: Option<NaiveDate>,
    pub deactivation_date: Option<NaiveDate>,
}

impl User {
    /// Copy with a new email, stamped with the date of the change.
    #[must_use]
    pub fn with_email(self, email: impl Into<String>, changed_on: NaiveDate) -> Self {
        Self { email: email.into(), last_email_change_date: Some(changed_on), ..self }
    }

    /// Copy marked inactive as of `deactivated_on`.
    #[must_use]
    pub fn deactivated(self, deactivated_on: NaiveDate) -> Self {
        Self { is_active: false, deactivation_date: Some(deactivated_on), ..self }
    }
}
