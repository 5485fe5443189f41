use proptest::prelude::*;
use strata_database::Database;
use strata_domain::NewUser;
use strata_runtime::{BlockingPool, PoolConfig};
use strata_users::{UserError, UserService, register_tables};

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread().enable_all().build().expect("runtime")
}

fn service() -> (UserService, Database) {
    let database = register_tables(Database::builder().name("validation")).build().expect("store");
    let service = UserService::builder()
        .database(database.clone())
        .pool(BlockingPool::new(PoolConfig::default().with_max_concurrency(2)))
        .build()
        .expect("service");
    (service, database)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn short_names_write_nothing(name in ".{0,1}", email in "[a-z]{1,8}@[a-z]{1,8}") {
        let (service, database) = service();
        let result = runtime().block_on(service.create_user(NewUser::new(name, email)));

        let is_name_error = matches!(result, Err(UserError::InvalidInput { field: "name", .. }));
        prop_assert!(is_name_error);
        prop_assert_eq!(database.stats().rows, 0);
    }

    #[test]
    fn emails_without_at_write_nothing(name in "[A-Za-z]{2,12}", email in "[^@]{0,16}") {
        let (service, database) = service();
        let result = runtime().block_on(service.create_user(NewUser::new(name, email)));

        let is_email_error = matches!(result, Err(UserError::InvalidInput { field: "email", .. }));
        prop_assert!(is_email_error);
        prop_assert_eq!(database.stats().rows, 0);
    }

    #[test]
    fn valid_input_always_persists(name in "[A-Za-z ]{2,12}", local in "[a-z]{0,6}", host in "[a-z.]{0,6}") {
        let (service, database) = service();
        let created = runtime()
            .block_on(service.create_user(NewUser::new(name.clone(), format!("{local}@{host}"))));

        prop_assert!(created.is_ok());
        prop_assert_eq!(database.stats().rows, 1);
        prop_assert_eq!(created.map(|u| u.name).ok(), Some(name));
    }
}
