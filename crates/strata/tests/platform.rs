use chrono::NaiveDate;
use std::sync::Arc;
use strata::domain::NewUser;
use strata::domain::config::AppConfig;
use strata::kernel::clock::ManualClock;
use strata::users::UserError;
use strata::{Platform, PlatformError};

fn config() -> AppConfig {
    let mut config = AppConfig::default();
    config.database.name = "platform-tests".to_owned();
    config.pool.max_concurrency = Some(3);
    config.pool.queue_capacity = Some(5);
    config.users.email_change_cooldown_days = 2;
    config
}

#[tokio::test]
async fn settings_flow_into_pool_and_policy() {
    let clock = Arc::new(ManualClock::new(NaiveDate::from_ymd_opt(2026, 5, 1).expect("date")));
    let platform = Platform::builder().config(config()).clock(clock.clone()).build().expect("build");

    assert_eq!(platform.database().name(), "platform-tests");
    assert_eq!(platform.pool().config().max_concurrency, 3);
    assert_eq!(platform.pool().config().queue_capacity, 5);
    assert_eq!(platform.users().policy().email_change_cooldown_days, 2);

    let user = platform.users().create_user(NewUser::new("Al", "al@x.com")).await.expect("create");
    platform.users().change_email(user.id, "al@y.com").await.expect("first change");

    clock.advance_days(1);
    let err = platform.users().change_email(user.id, "al@z.com").await.unwrap_err();
    assert!(matches!(err, UserError::OperationNotPermitted { .. }));

    clock.advance_days(1);
    platform.users().change_email(user.id, "al@z.com").await.expect("after cooldown");

    let stats = platform.stats();
    assert_eq!(stats.database.rows, 1);
    assert_eq!(stats.pool.in_flight, 0);
}

#[tokio::test]
async fn shutdown_refuses_new_work() {
    let platform = Platform::builder().config(config()).build().expect("build");
    platform.users().list_users().await.expect("list before shutdown");

    platform.shutdown();

    let err = platform.users().list_users().await.unwrap_err();
    assert!(matches!(err, UserError::Unavailable { .. }));
}

#[test]
fn blank_store_name_is_rejected() {
    let mut config = AppConfig::default();
    config.database.name = "  ".to_owned();

    let err = Platform::builder().config(config).build().unwrap_err();
    assert!(matches!(err, PlatformError::Database { .. }));
    assert_eq!(err.kind(), "Database");
}
