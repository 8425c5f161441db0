use schedly_core::{Actor, AppError, AppResult};
use schedly_domain::{
    Capability, Event, EventId, LifecycleAction, NewNotification, ReviewDecision,
    deletion_allowed,
};

use super::{EventLifecycleService, event_not_found};
use crate::ConditionalWrite;
use crate::authorization::{require_capability, require_scope};
use crate::retry::retry_transient;

impl EventLifecycleService {
    /// Submits a draft for faculty review.
    pub async fn submit_event(
        &self,
        actor: &Actor,
        event_id: EventId,
        remarks: Option<String>,
    ) -> AppResult<Event> {
        self.apply_action(
            actor,
            event_id,
            Capability::SubmitEvent,
            LifecycleAction::Submit,
            remarks,
        )
        .await
    }

    /// Records a faculty decision and notifies the organizer.
    pub async fn faculty_review(
        &self,
        actor: &Actor,
        event_id: EventId,
        decision: ReviewDecision,
        remarks: Option<String>,
    ) -> AppResult<Event> {
        let event = self
            .apply_action(
                actor,
                event_id,
                Capability::ReviewEvent,
                decision.action(),
                remarks,
            )
            .await?;

        let title = event.details().title();
        let notification = match decision {
            ReviewDecision::Approve => {
                NewNotification::faculty_approved(event.organizer(), event.id(), title)
            }
            ReviewDecision::Reject => NewNotification::faculty_rejected(
                event.organizer(),
                event.id(),
                title,
                event
                    .faculty_review()
                    .map(|review| review.remarks.as_str())
                    .unwrap_or_default(),
            ),
        };
        self.notifications.dispatch(notification).await;

        Ok(event)
    }

    /// Publishes a faculty-approved event and notifies the organizer.
    pub async fn admin_approve(
        &self,
        actor: &Actor,
        event_id: EventId,
        remarks: Option<String>,
    ) -> AppResult<Event> {
        let event = self
            .apply_action(
                actor,
                event_id,
                Capability::PublishEvent,
                LifecycleAction::AdminApprove,
                remarks,
            )
            .await?;

        self.notifications
            .dispatch(NewNotification::published(
                event.organizer(),
                event.id(),
                event.details().title(),
            ))
            .await;

        Ok(event)
    }

    /// Marks a published event completed.
    pub async fn complete_event(
        &self,
        actor: &Actor,
        event_id: EventId,
        remarks: Option<String>,
    ) -> AppResult<Event> {
        self.apply_action(
            actor,
            event_id,
            Capability::CompleteEvent,
            LifecycleAction::Complete,
            remarks,
        )
        .await
    }

    /// Archives an event from any status except archived.
    pub async fn archive_event(
        &self,
        actor: &Actor,
        event_id: EventId,
        remarks: Option<String>,
    ) -> AppResult<Event> {
        self.apply_action(
            actor,
            event_id,
            Capability::ArchiveEvent,
            LifecycleAction::Archive,
            remarks,
        )
        .await
    }

    /// Deletes an event. Only drafts may be deleted unless the actor is a
    /// Super Admin. Registrations go with it; the audit trail stays.
    pub async fn delete_event(&self, actor: &Actor, event_id: EventId) -> AppResult<()> {
        let scope = require_capability(actor, Capability::DeleteEvent)?;
        let mut attempt = 0;

        loop {
            let event = self.load_event(event_id).await?;
            require_scope(actor, scope, event.organizer(), Capability::DeleteEvent)?;
            if !deletion_allowed(event.status(), actor.role()) {
                return Err(AppError::InvalidTransition(format!(
                    "cannot delete event '{event_id}' while it is '{}'",
                    event.status()
                )));
            }

            let events = self.events.clone();
            let expected_status = event.status();
            let write = retry_transient(self.retry_policy, move || {
                let events = events.clone();
                async move { events.delete_event(event_id, expected_status).await }
            })
            .await?;

            match write {
                ConditionalWrite::Applied(()) => {
                    tracing::info!(
                        event_id = %event_id,
                        actor = %actor.user_id(),
                        status = expected_status.as_str(),
                        "event deleted"
                    );
                    return Ok(());
                }
                ConditionalWrite::Missing => return Err(event_not_found(event_id)),
                ConditionalWrite::Stale { .. } if attempt < self.retry_policy.max_retries => {
                    attempt += 1;
                }
                ConditionalWrite::Stale { .. } => {
                    return Err(AppError::StorageUnavailable(format!(
                        "event '{event_id}' kept changing while deleting"
                    )));
                }
            }
        }
    }

    async fn apply_action(
        &self,
        actor: &Actor,
        event_id: EventId,
        capability: Capability,
        action: LifecycleAction,
        remarks: Option<String>,
    ) -> AppResult<Event> {
        self.run_transition(actor, event_id, capability, remarks, |event, stamp| {
            event.transition(action, stamp)
        })
        .await
    }
}
