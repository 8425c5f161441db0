use std::sync::Arc;
use std::time::Duration;

use schedly_core::{Actor, AppError, Role, UserId};
use schedly_domain::{EventId, NewNotification};

use super::NotificationService;
use crate::test_support::FakeNotificationRepository;

fn student() -> Actor {
    Actor::new(UserId::new(), "Sam", Role::Student)
}

fn service(repository: Arc<FakeNotificationRepository>) -> NotificationService {
    NotificationService::new(repository, Duration::from_secs(1))
}

#[tokio::test]
async fn dispatch_failure_is_swallowed() {
    let service = NotificationService::new(
        Arc::new(FakeNotificationRepository::unavailable()),
        Duration::from_secs(1),
    );
    service
        .dispatch(NewNotification::registered(
            UserId::new(),
            EventId::new(),
            "Hack Night",
        ))
        .await;
}

#[tokio::test]
async fn list_reports_unread_count() {
    let repository = Arc::new(FakeNotificationRepository::default());
    let service = service(repository.clone());
    let actor = student();

    for title in ["One", "Two", "Three"] {
        service
            .dispatch(NewNotification::registered(
                actor.user_id(),
                EventId::new(),
                title,
            ))
            .await;
    }
    service
        .dispatch(NewNotification::registered(
            UserId::new(),
            EventId::new(),
            "Someone else",
        ))
        .await;

    let feed = service
        .list(&actor, false)
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(feed.notifications.len(), 3);
    assert_eq!(feed.unread_count, 3);

    let first = feed.notifications[0].id;
    let read = service
        .mark_read(&actor, first)
        .await
        .unwrap_or_else(|_| unreachable!());
    assert!(read.is_read);

    let unread = service
        .list(&actor, true)
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(unread.notifications.len(), 2);
    assert_eq!(unread.unread_count, 2);
}

#[tokio::test]
async fn only_recipient_can_touch_notification() {
    let repository = Arc::new(FakeNotificationRepository::default());
    let service = service(repository.clone());
    let owner = student();

    service
        .dispatch(NewNotification::registered(
            owner.user_id(),
            EventId::new(),
            "Hack Night",
        ))
        .await;
    let feed = service
        .list(&owner, false)
        .await
        .unwrap_or_else(|_| unreachable!());
    let notification_id = feed.notifications[0].id;

    let intruder = student();
    assert!(matches!(
        service.mark_read(&intruder, notification_id).await,
        Err(AppError::Forbidden(_))
    ));
    assert!(matches!(
        service.delete(&intruder, notification_id).await,
        Err(AppError::Forbidden(_))
    ));

    assert!(service.delete(&owner, notification_id).await.is_ok());
    assert!(matches!(
        service.delete(&owner, notification_id).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn mark_all_read_only_touches_actor_inbox() {
    let repository = Arc::new(FakeNotificationRepository::default());
    let service = service(repository.clone());
    let actor = student();
    let other = student();

    for recipient in [actor.user_id(), actor.user_id(), other.user_id()] {
        service
            .dispatch(NewNotification::registered(
                recipient,
                EventId::new(),
                "Hack Night",
            ))
            .await;
    }

    let changed = service
        .mark_all_read(&actor)
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(changed, 2);

    let other_feed = service
        .list(&other, true)
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(other_feed.unread_count, 1);
}
