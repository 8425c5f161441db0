use chrono::{Duration, Utc};
use schedly_application::{
    AuditLogRepository, CertificateWriteOutcome, ConditionalWrite, EventListQuery,
    EventRepository, NotificationRepository, RegistrationRepository,
};
use schedly_core::{AppError, UserId};
use schedly_domain::{
    AuditAction, Event, EventCategory, EventDetails, EventDetailsInput, EventDetailsPatch,
    EventStatus, EventVisibility, LifecycleAction, NewNotification, Notification, NotificationId,
    Registration, TransitionStamp,
};
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;

use super::PostgresEventRepository;
use crate::{
    PostgresAuditLogRepository, PostgresNotificationRepository, PostgresRegistrationRepository,
};

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(8)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = MIGRATOR.run(&pool).await {
        panic!("failed to run migrations for postgres event tests: {error}");
    }

    Some(pool)
}

fn details(capacity: u32) -> EventDetails {
    let starts_at = Utc::now() + Duration::days(7);
    EventDetails::new(EventDetailsInput {
        title: "Robotics Expo".to_owned(),
        description: "Student-built robots".to_owned(),
        category: EventCategory::Technical,
        tags: vec!["robots".to_owned()],
        starts_at,
        ends_at: starts_at + Duration::hours(3),
        venue: "Quad".to_owned(),
        capacity,
        banner_url: None,
    })
    .unwrap_or_else(|_| unreachable!())
}

async fn apply(repository: &PostgresEventRepository, event: &Event, action: LifecycleAction) -> Event {
    let stamp = TransitionStamp::new(UserId::new(), None, Utc::now());
    let transition = event
        .transition(action, &stamp)
        .unwrap_or_else(|_| unreachable!());

    match repository.apply_transition(transition).await {
        Ok(ConditionalWrite::Applied(next)) => next,
        other => panic!("transition {} was not applied: {other:?}", action.as_str()),
    }
}

async fn published_event(repository: &PostgresEventRepository, capacity: u32) -> Event {
    let (event, audit) = Event::draft(UserId::new(), details(capacity), Utc::now());
    repository
        .insert_event(event.clone(), audit)
        .await
        .unwrap_or_else(|_| unreachable!());

    let mut event = event;
    for action in [
        LifecycleAction::Submit,
        LifecycleAction::FacultyApprove,
        LifecycleAction::AdminApprove,
    ] {
        event = apply(repository, &event, action).await;
    }
    event
}

#[tokio::test]
async fn transitions_write_status_and_audit_together() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let events = PostgresEventRepository::new(pool.clone());
    let audit_log = PostgresAuditLogRepository::new(pool);
    let event = published_event(&events, 10).await;

    let stored = events
        .find_event(event.id())
        .await
        .unwrap_or_else(|_| unreachable!())
        .unwrap_or_else(|| unreachable!());
    assert_eq!(stored.status(), EventStatus::Published);
    assert!(stored.faculty_review().is_some());
    assert!(stored.admin_approval().is_some());
    assert_eq!(stored.details().tags(), ["robots".to_owned()]);

    let trail = audit_log
        .list_for_event(event.id())
        .await
        .unwrap_or_else(|_| unreachable!());
    let actions: Vec<AuditAction> = trail.iter().map(|entry| entry.action).collect();
    assert_eq!(
        actions,
        vec![
            AuditAction::Approve,
            AuditAction::Approve,
            AuditAction::Submit,
            AuditAction::Create,
        ]
    );
    assert_eq!(trail[3].from_status, None);
}

#[tokio::test]
async fn stale_transition_reports_the_current_status() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let events = PostgresEventRepository::new(pool);
    let (draft, audit) = Event::draft(UserId::new(), details(5), Utc::now());
    events
        .insert_event(draft.clone(), audit)
        .await
        .unwrap_or_else(|_| unreachable!());
    apply(&events, &draft, LifecycleAction::Submit).await;

    let stamp = TransitionStamp::new(UserId::new(), None, Utc::now());
    let stale = draft
        .transition(LifecycleAction::Archive, &stamp)
        .unwrap_or_else(|_| unreachable!());
    let outcome = events
        .apply_transition(stale)
        .await
        .unwrap_or_else(|_| unreachable!());

    assert!(matches!(
        outcome,
        ConditionalWrite::Stale {
            status: EventStatus::Submitted,
            version: 2,
        }
    ));
}

#[tokio::test]
async fn transition_computed_before_a_revision_is_stale() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let events = PostgresEventRepository::new(pool);
    let organizer = UserId::new();
    let (draft, audit) = Event::draft(organizer, details(5), Utc::now());
    events
        .insert_event(draft.clone(), audit)
        .await
        .unwrap_or_else(|_| unreachable!());

    let stamp = TransitionStamp::new(organizer, None, Utc::now());
    let submit = draft
        .transition(LifecycleAction::Submit, &stamp)
        .unwrap_or_else(|_| unreachable!());
    let revision = draft
        .revise(
            EventDetailsPatch {
                title: Some("Edited Title".to_owned()),
                ..EventDetailsPatch::default()
            },
            &stamp,
        )
        .unwrap_or_else(|_| unreachable!());

    let revised = events
        .apply_transition(revision)
        .await
        .unwrap_or_else(|_| unreachable!());
    assert!(matches!(
        revised,
        ConditionalWrite::Applied(ref event) if event.version() == 2
    ));
    let outcome = events
        .apply_transition(submit)
        .await
        .unwrap_or_else(|_| unreachable!());
    assert!(matches!(
        outcome,
        ConditionalWrite::Stale {
            status: EventStatus::Draft,
            version: 2,
        }
    ));

    let stored = events
        .find_event(draft.id())
        .await
        .unwrap_or_else(|_| unreachable!())
        .unwrap_or_else(|| unreachable!());
    assert_eq!(stored.details().title(), "Edited Title");
    assert_eq!(stored.status(), EventStatus::Draft);
}

#[tokio::test]
async fn list_filters_by_visibility_and_status() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let events = PostgresEventRepository::new(pool);
    let published = published_event(&events, 5).await;

    let listed = events
        .list_events(&EventListQuery {
            visibility: EventVisibility::OrganizedBy(published.organizer()),
            category: Some(EventCategory::Technical),
            status: Some(EventStatus::Published),
        })
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id(), published.id());

    let other_category = events
        .list_events(&EventListQuery {
            visibility: EventVisibility::OrganizedBy(published.organizer()),
            category: Some(EventCategory::Sports),
            status: None,
        })
        .await
        .unwrap_or_else(|_| unreachable!());
    assert!(other_category.is_empty());
}

#[tokio::test]
async fn concurrent_enrollment_never_exceeds_capacity() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let events = PostgresEventRepository::new(pool.clone());
    let registrations = PostgresRegistrationRepository::new(pool);
    let event = published_event(&events, 3).await;

    let mut handles = Vec::new();
    for _ in 0..12 {
        let registrations = registrations.clone();
        let event_id = event.id();
        handles.push(tokio::spawn(async move {
            registrations
                .enroll(Registration::new(UserId::new(), event_id, Utc::now()))
                .await
        }));
    }

    let mut admitted = 0;
    let mut full = 0;
    for handle in handles {
        match handle.await.unwrap_or_else(|_| unreachable!()) {
            Ok(_) => admitted += 1,
            Err(AppError::Full(_)) => full += 1,
            Err(error) => panic!("unexpected enrollment error: {error}"),
        }
    }
    assert_eq!((admitted, full), (3, 9));

    let stored = events
        .find_event(event.id())
        .await
        .unwrap_or_else(|_| unreachable!())
        .unwrap_or_else(|| unreachable!());
    assert_eq!(stored.registration_count(), 3);
}

#[tokio::test]
async fn duplicate_registration_conflicts_and_withdraw_releases_the_seat() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let events = PostgresEventRepository::new(pool.clone());
    let registrations = PostgresRegistrationRepository::new(pool);
    let event = published_event(&events, 2).await;
    let student = UserId::new();

    let enrollment = registrations
        .enroll(Registration::new(student, event.id(), Utc::now()))
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(enrollment.event.registration_count(), 1);

    let duplicate = registrations
        .enroll(Registration::new(student, event.id(), Utc::now()))
        .await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));

    let withdrawn = registrations
        .withdraw(enrollment.registration.id)
        .await
        .unwrap_or_else(|_| unreachable!());
    assert!(withdrawn.is_some());

    let stored = events
        .find_event(event.id())
        .await
        .unwrap_or_else(|_| unreachable!())
        .unwrap_or_else(|| unreachable!());
    assert_eq!(stored.registration_count(), 0);
}

#[tokio::test]
async fn certificates_require_attendance_and_are_issued_once() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let events = PostgresEventRepository::new(pool.clone());
    let registrations = PostgresRegistrationRepository::new(pool);
    let event = published_event(&events, 2).await;
    let registration = registrations
        .enroll(Registration::new(UserId::new(), event.id(), Utc::now()))
        .await
        .unwrap_or_else(|_| unreachable!())
        .registration;
    let url = registration.default_certificate_url();

    let early = registrations
        .record_certificate(registration.id, url.clone())
        .await
        .unwrap_or_else(|_| unreachable!());
    assert!(matches!(early, CertificateWriteOutcome::NotAttended));

    registrations
        .set_attendance(registration.id, true)
        .await
        .unwrap_or_else(|_| unreachable!());
    let issued = registrations
        .record_certificate(registration.id, url.clone())
        .await
        .unwrap_or_else(|_| unreachable!());
    assert!(matches!(issued, CertificateWriteOutcome::Issued(_)));

    let again = registrations
        .record_certificate(registration.id, "https://elsewhere.example/x.pdf".to_owned())
        .await
        .unwrap_or_else(|_| unreachable!());
    match again {
        CertificateWriteOutcome::AlreadyIssued(existing) => {
            assert_eq!(existing.certificate_url, Some(url));
        }
        other => panic!("expected AlreadyIssued, got {other:?}"),
    }

    let cleared = registrations.set_attendance(registration.id, false).await;
    assert!(matches!(cleared, Err(AppError::InvalidState(_))));
    let kept = registrations
        .find_registration(registration.id)
        .await
        .unwrap_or_else(|_| unreachable!())
        .unwrap_or_else(|| unreachable!());
    assert!(kept.attended && kept.certificate_issued);
}

#[tokio::test]
async fn deleting_an_event_removes_registrations_and_keeps_the_audit_trail() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let events = PostgresEventRepository::new(pool.clone());
    let registrations = PostgresRegistrationRepository::new(pool.clone());
    let audit_log = PostgresAuditLogRepository::new(pool);
    let event = published_event(&events, 2).await;
    let registration = registrations
        .enroll(Registration::new(UserId::new(), event.id(), Utc::now()))
        .await
        .unwrap_or_else(|_| unreachable!())
        .registration;

    let outcome = events
        .delete_event(event.id(), EventStatus::Published)
        .await
        .unwrap_or_else(|_| unreachable!());
    assert!(matches!(outcome, ConditionalWrite::Applied(())));

    let orphan = registrations
        .find_registration(registration.id)
        .await
        .unwrap_or_else(|_| unreachable!());
    assert!(orphan.is_none());

    let trail = audit_log
        .list_for_event(event.id())
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(trail.len(), 4);

    let missing = events
        .delete_event(event.id(), EventStatus::Published)
        .await
        .unwrap_or_else(|_| unreachable!());
    assert!(matches!(missing, ConditionalWrite::Missing));
}

#[tokio::test]
async fn notifications_track_read_state_per_recipient() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let notifications = PostgresNotificationRepository::new(pool);
    let recipient = UserId::new();
    let event_id = schedly_domain::EventId::new();

    for title in ["Hack Night", "Robotics Expo"] {
        let request = NewNotification::published(recipient, event_id, title);
        notifications
            .create_notification(Notification {
                id: NotificationId::new(),
                recipient: request.recipient,
                notification_type: request.notification_type,
                title: request.title,
                message: request.message,
                event_id: request.event_id,
                is_read: false,
                link: request.link,
                created_at: Utc::now(),
            })
            .await
            .unwrap_or_else(|_| unreachable!());
    }

    let listed = notifications
        .list_for_recipient(recipient, true, 50)
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(listed.len(), 2);

    let marked = notifications
        .mark_read(listed[0].id)
        .await
        .unwrap_or_else(|_| unreachable!())
        .unwrap_or_else(|| unreachable!());
    assert!(marked.is_read);
    assert_eq!(
        notifications
            .count_unread(recipient)
            .await
            .unwrap_or_else(|_| unreachable!()),
        1
    );

    assert_eq!(
        notifications
            .mark_all_read(recipient)
            .await
            .unwrap_or_else(|_| unreachable!()),
        1
    );
    assert!(
        notifications
            .delete_notification(listed[1].id)
            .await
            .unwrap_or_else(|_| unreachable!())
    );
    assert!(
        !notifications
            .delete_notification(listed[1].id)
            .await
            .unwrap_or_else(|_| unreachable!())
    );
}
