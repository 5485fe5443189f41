//! Business rules applied by the user service.

use crate::error::UserError;
use chrono::{Days, NaiveDate};
use strata_domain::config::UserSettings;
use strata_domain::{NewUser, User};

const DEFAULT_MIN_NAME_LENGTH: usize = 2;
const DEFAULT_COOLDOWN_DAYS: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserPolicy {
    /// Minimum name length in characters. Names are taken as given, without trimming.
    pub min_name_length: usize,
    /// Days that must pass after an email change before the next one.
    pub email_change_cooldown_days: u32,
}

impl Default for UserPolicy {
    fn default() -> Self {
        Self {
            min_name_length: DEFAULT_MIN_NAME_LENGTH,
            email_change_cooldown_days: DEFAULT_COOLDOWN_DAYS,
        }
    }
}

impl From<&UserSettings> for UserPolicy {
    fn from(settings: &UserSettings) -> Self {
        Self {
            min_name_length: settings.min_name_length,
            email_change_cooldown_days: settings.email_change_cooldown_days,
        }
    }
}

impl UserPolicy {
    /// # Errors
    /// [`UserError::InvalidInput`] naming the first offending field.
    pub fn validate_new_user(&self, user: &NewUser) -> Result<(), UserError> {
        if user.name.chars().count() < self.min_name_length {
            return Err(UserError::invalid(
                "name",
                format!("must be at least {} characters long", self.min_name_length),
            ));
        }
        Self::validate_email(&user.email)
    }

    /// An email only has to contain `@`.
    ///
    /// # Errors
    /// [`UserError::InvalidInput`] for the `email` field.
    pub fn validate_email(email: &str) -> Result<(), UserError> {
        if email.contains('@') {
            Ok(())
        } else {
            Err(UserError::invalid("email", "must contain '@'"))
        }
    }

    /// First day a new email change is accepted, or `None` if one is accepted right away.
    #[must_use]
    pub fn email_change_available_on(&self, user: &User) -> Option<NaiveDate> {
        let last = user.last_email_change_date?;
        Some(
            last.checked_add_days(Days::new(u64::from(self.email_change_cooldown_days)))
                .unwrap_or(NaiveDate::MAX),
        )
    }

    /// # Errors
    /// [`UserError::OperationNotPermitted`] while the cool-down since the last change runs.
    pub fn ensure_email_change_allowed(
        &self,
        user: &User,
        today: NaiveDate,
    ) -> Result<(), UserError> {
        match self.email_change_available_on(user) {
            Some(available_on) if today < available_on => Err(UserError::not_permitted(format!(
                "email of user {} can be changed again on {available_on}",
                user.id
            ))),
            _ => Ok(()),
        }
    }

    /// # Errors
    /// [`UserError::OperationNotPermitted`] for administrators and users already inactive.
    pub fn ensure_deactivation_allowed(user: &User) -> Result<(), UserError> {
        if user.is_admin {
            return Err(UserError::not_permitted("administrators cannot be deactivated"));
        }
        if !user.is_active {
            return Err(UserError::not_permitted(format!("user {} is already inactive", user.id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use strata_domain::UserId;

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, m, d).expect("date")
    }

    fn user() -> User {
        NewUser::new("Al", "al@x.com").into_user(UserId::new(1), day(1, 1))
    }

    #[test]
    fn names_are_counted_in_characters() {
        let policy = UserPolicy::default();
        assert!(policy.validate_new_user(&NewUser::new("Zo", "z@x")).is_ok());
        assert!(policy.validate_new_user(&NewUser::new("Åé", "z@x")).is_ok());

        let err = policy.validate_new_user(&NewUser::new("Z", "z@x")).unwrap_err();
        assert!(matches!(err, UserError::InvalidInput { field: "name", .. }));
    }

    #[test]
    fn whitespace_counts_towards_the_name() {
        let policy = UserPolicy::default();
        assert!(policy.validate_new_user(&NewUser::new(" a", "a@x")).is_ok());
        assert!(policy.validate_new_user(&NewUser::new("", "a@x")).is_err());
    }

    #[test]
    fn name_is_checked_before_email() {
        let err = UserPolicy::default().validate_new_user(&NewUser::new("A", "nope")).unwrap_err();
        assert!(matches!(err, UserError::InvalidInput { field: "name", .. }));
    }

    #[test]
    fn email_needs_an_at_sign_and_nothing_else() {
        assert!(UserPolicy::validate_email("@").is_ok());
        assert!(UserPolicy::validate_email("a@b").is_ok());
        let err = UserPolicy::validate_email("ab.com").unwrap_err();
        assert!(matches!(err, UserError::InvalidInput { field: "email", .. }));
    }

    #[test]
    fn first_email_change_is_always_allowed() {
        let policy = UserPolicy::default();
        assert_eq!(policy.email_change_available_on(&user()), None);
        assert!(policy.ensure_email_change_allowed(&user(), day(1, 1)).is_ok());
    }

    #[test]
    fn cooldown_ends_exactly_thirty_days_later() {
        let policy = UserPolicy::default();
        let changed = user().with_email("al@y.com", day(1, 10));

        assert_eq!(policy.email_change_available_on(&changed), Some(day(2, 9)));
        assert!(policy.ensure_email_change_allowed(&changed, day(2, 8)).is_err());
        assert!(policy.ensure_email_change_allowed(&changed, day(2, 9)).is_ok());
    }

    #[test]
    fn zero_day_cooldown_allows_same_day_changes() {
        let policy = UserPolicy { email_change_cooldown_days: 0, ..UserPolicy::default() };
        let changed = user().with_email("al@y.com", day(1, 10));
        assert!(policy.ensure_email_change_allowed(&changed, day(1, 10)).is_ok());
    }

    #[test]
    fn admins_and_inactive_users_cannot_be_deactivated() {
        let admin = NewUser::new("Ad", "ad@x").admin().into_user(UserId::new(2), day(1, 1));
        let err = UserPolicy::ensure_deactivation_allowed(&admin).unwrap_err();
        assert!(matches!(err, UserError::OperationNotPermitted { .. }));

        let gone = user().deactivated(day(1, 2));
        assert!(UserPolicy::ensure_deactivation_allowed(&gone).is_err());
        assert!(UserPolicy::ensure_deactivation_allowed(&user()).is_ok());
    }

    #[test]
    fn settings_feed_the_policy() {
        let settings = UserSettings {
            min_name_length: 4,
            email_change_cooldown_days: 7,
            ..UserSettings::default()
        };
        let policy = UserPolicy::from(&settings);
        assert_eq!(policy.min_name_length, 4);
        assert_eq!(policy.email_change_cooldown_days, 7);
    }

    proptest! {
        #[test]
        fn changes_inside_the_window_are_refused(offset in 0u64..30) {
            let policy = UserPolicy::default();
            let changed = user().with_email("al@y.com", day(3, 1));
            let today = day(3, 1).checked_add_days(Days::new(offset)).expect("date");
            prop_assert!(policy.ensure_email_change_allowed(&changed, today).is_err());
        }

        #[test]
        fn changes_after_the_window_are_allowed(offset in 30u64..2_000) {
            let policy = UserPolicy::default();
            let changed = user().with_email("al@y.com", day(3, 1));
            let today = day(3, 1).checked_add_days(Days::new(offset)).expect("date");
            prop_assert!(policy.ensure_email_change_allowed(&changed, today).is_ok());
        }
    }
}
