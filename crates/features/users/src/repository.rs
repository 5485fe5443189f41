//! Blocking data access for users.
//!
//! Every method runs inside the transaction the caller opened and knows nothing about async
//! execution or scheduling.

use crate::error::UserError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use strata_database::{DatabaseBuilder, DatabaseError, Record, Transaction};
use strata_domain::{NewUser, User, UserId};

#[strata_derive::strata_error]
pub enum RepositoryError {
    #[error("User {id} not found{}", format_context(.context))]
    NotFound { id: UserId, context: Option<Cow<'static, str>> },

    #[error("User storage error{}: {source}", format_context(.context))]
    Database { source: DatabaseError, context: Option<Cow<'static, str>> },
}

impl From<RepositoryError> for UserError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { id, context } => Self::NotFound { id, context },
            RepositoryError::Database { source, context } => Self::Database { source, context },
        }
    }
}

/// Stored shape of a user. The id is the row key, not part of the document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UserRow {
    name: String,
    email: String,
    is_admin: bool,
    is_active: bool,
    registration_date: NaiveDate,
    last_email_change_date: Option<NaiveDate>,
    deactivation_date: Option<NaiveDate>,
}

impl Record for UserRow {
    const TABLE: &'static str = "users";
}

impl UserRow {
    fn new(user: &NewUser, registered_on: NaiveDate) -> Self {
        Self {
            name: user.name.clone(),
            email: user.email.clone(),
            is_admin: user.is_admin,
            is_active: true,
            registration_date: registered_on,
            last_email_change_date: None,
            deactivation_date: None,
        }
    }

    fn into_user(self, id: UserId) -> User {
        User {
            id,
            name: self.name,
            email: self.email,
            is_admin: self.is_admin,
            is_active: self.is_active,
            registration_date: self.registration_date,
            last_email_change_date: self.last_email_change_date,
            deactivation_date: self.deactivation_date,
        }
    }
}

impl From<&User> for UserRow {
    fn from(user: &User) -> Self {
        Self {
            name: user.name.clone(),
            email: user.email.clone(),
            is_admin: user.is_admin,
            is_active: user.is_active,
            registration_date: user.registration_date,
            last_email_change_date: user.last_email_change_date,
            deactivation_date: user.deactivation_date,
        }
    }
}

/// Registers the tables this slice stores.
pub fn register_tables(builder: DatabaseBuilder) -> DatabaseBuilder {
    builder.table::<UserRow>()
}

#[derive(Debug)]
pub struct UserRepository<'tx, 'db> {
    tx: &'tx mut Transaction<'db>,
}

impl<'tx, 'db> UserRepository<'tx, 'db> {
    pub const fn new(tx: &'tx mut Transaction<'db>) -> Self {
        Self { tx }
    }

    /// All users ordered by id. An empty store yields an empty list.
    ///
    /// # Errors
    /// [`RepositoryError::Database`] on store failures.
    pub fn find_all(&mut self) -> Result<Vec<User>, RepositoryError> {
        let rows = self.tx.fetch_all::<UserRow>().context("Listing users")?;
        Ok(rows.into_iter().map(|(id, row)| row.into_user(UserId::new(id))).collect())
    }

    /// # Errors
    /// [`RepositoryError::Database`] on store failures. Absence is `Ok(None)`.
    pub fn find_by_id(&mut self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = self.tx.fetch_optional::<UserRow>(id.get()).context("Loading user")?;
        Ok(row.map(|row| row.into_user(id)))
    }

    /// Persists a new, active user registered on `registered_on` and returns its id.
    ///
    /// # Errors
    /// [`RepositoryError::Database`] on store failures.
    pub fn insert(
        &mut self,
        user: &NewUser,
        registered_on: NaiveDate,
    ) -> Result<UserId, RepositoryError> {
        let id = self.tx.insert(&UserRow::new(user, registered_on)).context("Inserting user")?;
        Ok(UserId::new(id))
    }

    /// Overwrites the stored fields of `user.id`.
    ///
    /// # Errors
    /// [`RepositoryError::NotFound`] when no row has this id.
    pub fn update(&mut self, user: &User) -> Result<(), RepositoryError> {
        match self.tx.update(user.id.get(), &UserRow::from(user)) {
            Ok(()) => Ok(()),
            Err(err) if err.is_row_not_found() => {
                Err(RepositoryError::NotFound { id: user.id, context: None })
            },
            Err(source) => Err(RepositoryError::Database {
                source,
                context: Some("Updating user".into()),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_database::{Database, TxOptions};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 4, d).expect("date")
    }

    fn database() -> Database {
        register_tables(Database::builder().name("repository")).build().expect("store")
    }

    #[test]
    fn insert_then_find_round_trips_the_domain_user() {
        let db = database();
        let new_user = NewUser::new("Al", "al@x.com").admin();

        let id = db
            .transaction(TxOptions::repeatable_read(), |tx| {
                UserRepository::new(tx).insert(&new_user, day(1))
            })
            .expect("insert");

        let found = db
            .transaction(TxOptions::read_only(), |tx| UserRepository::new(tx).find_by_id(id))
            .expect("find");
        assert_eq!(found, Some(new_user.into_user(id, day(1))));
    }

    #[test]
    fn find_all_is_empty_then_ordered() {
        let db = database();
        let empty = db
            .transaction(TxOptions::read_only(), |tx| UserRepository::new(tx).find_all())
            .expect("list");
        assert!(empty.is_empty());

        db.transaction(TxOptions::repeatable_read(), |tx| {
            let mut repo = UserRepository::new(tx);
            repo.insert(&NewUser::new("Bo", "bo@x.com"), day(2))?;
            repo.insert(&NewUser::new("Cy", "cy@x.com"), day(3))?;
            Ok::<_, RepositoryError>(())
        })
        .expect("seed");

        let names: Vec<String> = db
            .transaction(TxOptions::read_only(), |tx| UserRepository::new(tx).find_all())
            .expect("list")
            .into_iter()
            .map(|u| u.name)
            .collect();
        assert_eq!(names, ["Bo", "Cy"]);
    }

    #[test]
    fn missing_rows_are_absent_on_read_and_not_found_on_update() {
        let db = database();
        let ghost = NewUser::new("Gh", "gh@x.com").into_user(UserId::new(99), day(1));

        let result = db.transaction(TxOptions::repeatable_read(), |tx| {
            let mut repo = UserRepository::new(tx);
            assert_eq!(repo.find_by_id(ghost.id)?, None);
            repo.update(&ghost)
        });

        assert!(matches!(result, Err(RepositoryError::NotFound { id, .. }) if id == ghost.id));
    }

    #[test]
    fn not_found_maps_onto_the_service_taxonomy() {
        let err = UserError::from(RepositoryError::NotFound { id: UserId::new(3), context: None });
        assert!(matches!(err, UserError::NotFound { .. }));
        assert_eq!(err.to_string(), "User 3 not found");
    }
}
