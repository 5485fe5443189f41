use chrono::NaiveDate;
use serde_json::json;
use strata_domain::{NewUser, User, UserId};

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

#[test]
fn new_users_persist_active_without_history() {
    let user = NewUser::new("Al", "al@x.com").into_user(UserId::new(1), day(2026, 1, 5));

    assert_eq!(user.id.get(), 1);
    assert!(user.is_active);
    assert!(!user.is_admin);
    assert_eq!(user.registration_date, day(2026, 1, 5));
    assert_eq!(user.last_email_change_date, None);
    assert_eq!(user.deactivation_date, None);
}

#[test]
fn users_serialize_in_camel_case() {
    let user = NewUser::new("Al", "al@x.com").admin().into_user(UserId::new(7), day(2026, 1, 5));

    let value = serde_json::to_value(&user).expect("serialize");
    assert_eq!(
        value,
        json!({
            "id": 7,
            "name": "Al",
            "email": "al@x.com",
            "isAdmin": true,
            "isActive": true,
            "registrationDate": "2026-01-05",
            "lastEmailChangeDate": null,
            "deactivationDate": null
        })
    );

    let back: User = serde_json::from_value(value).expect("deserialize");
    assert_eq!(back, user);
}

#[test]
fn helpers_touch_only_their_fields() {
    let user = NewUser::new("Al", "al@x.com").into_user(UserId::new(1), day(2026, 1, 5));

    let moved = user.clone().with_email("al@y.com", day(2026, 2, 1));
    assert_eq!(moved.email, "al@y.com");
    assert_eq!(moved.last_email_change_date, Some(day(2026, 2, 1)));
    assert_eq!(moved.registration_date, user.registration_date);

    let gone = user.deactivated(day(2026, 3, 1));
    assert!(!gone.is_active);
    assert_eq!(gone.deactivation_date, Some(day(2026, 3, 1)));
    assert_eq!(gone.email, "al@x.com");
}

#[test]
fn ids_parse_from_text() {
    assert_eq!(" 42 ".parse::<UserId>().expect("parse"), UserId::new(42));
    assert!("abc".parse::<UserId>().is_err());
    assert_eq!(UserId::from(9).to_string(), "9");
}
