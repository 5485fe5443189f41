use std::sync::Arc;
use std::time::Duration;
use strata_database::Database;
use strata_domain::{NewUser, User};
use strata_runtime::{BlockingPool, PoolConfig};
use strata_users::{Notifier, NotifyError, NotifyFuture, UserService, register_tables};
use tokio::sync::mpsc;

/// Forwards every welcome to a channel.
#[derive(Debug)]
struct Recording(mpsc::UnboundedSender<User>);

impl Notifier for Recording {
    fn send_welcome<'a>(&'a self, user: &'a User) -> NotifyFuture<'a> {
        Box::pin(async move {
            self.0.send(user.clone()).map_err(|_| NotifyError::from("receiver gone"))
        })
    }
}

#[derive(Debug)]
struct Failing;

impl Notifier for Failing {
    fn send_welcome<'a>(&'a self, _user: &'a User) -> NotifyFuture<'a> {
        Box::pin(async {
            Err::<(), _>(NotifyError::Delivery { message: "mailbox full".into(), context: None })
        })
    }
}

#[derive(Debug)]
struct Hanging;

impl Notifier for Hanging {
    fn send_welcome<'a>(&'a self, _user: &'a User) -> NotifyFuture<'a> {
        Box::pin(std::future::pending::<Result<(), NotifyError>>())
    }
}

fn service(notifier: Arc<dyn Notifier>) -> UserService {
    let database = register_tables(Database::builder().name("notify")).build().expect("store");
    UserService::builder()
        .database(database)
        .pool(BlockingPool::new(PoolConfig::default()))
        .notifier(notifier)
        .welcome_timeout(Duration::from_millis(50))
        .build()
        .expect("service")
}

#[tokio::test]
async fn welcome_follows_a_successful_create() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let service = service(Arc::new(Recording(tx)));

    let created = service.create_user(NewUser::new("Al", "al@x.com")).await.expect("create");

    let welcomed = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("welcome sent in time")
        .expect("channel open");
    assert_eq!(welcomed, created);
}

#[tokio::test]
async fn no_welcome_for_rejected_input() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let service = service(Arc::new(Recording(tx)));

    assert!(service.create_user(NewUser::new("A", "al@x.com")).await.is_err());
    drop(service);

    assert!(rx.recv().await.is_none(), "sender dropped without sending");
}

#[tokio::test]
async fn failed_delivery_does_not_fail_the_create() {
    let service = service(Arc::new(Failing));

    let created = service.create_user(NewUser::new("Al", "al@x.com")).await.expect("create");
    tokio::task::yield_now().await;
    assert_eq!(service.get_user(created.id).await.expect("persisted"), created);
}

#[tokio::test]
async fn a_stuck_notifier_never_blocks_the_caller() {
    let service = service(Arc::new(Hanging));

    let created = tokio::time::timeout(
        Duration::from_secs(2),
        service.create_user(NewUser::new("Al", "al@x.com")),
    )
    .await
    .expect("create returns without waiting for the notifier")
    .expect("create");
    assert!(created.is_active);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(service.list_users().await.expect("list").len(), 1);
}
