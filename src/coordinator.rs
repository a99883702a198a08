/// file: src/coordinator.rs
/// description: turns local and remote club events into toasts for the current user
use crate::{
    bus::{LocalEventBus, Subscription},
    client::EventHandler,
    events::{ClientEvent, EventSender, emit},
    monitoring::LOCAL_EVENTS_COUNTER,
    types::{ClubJoinEvent, ClubNotification, Severity, StreamEvent, Toast},
};
use parking_lot::RwLock;
use std::{sync::Arc, time::Duration};
use tracing::{debug, info};

/// Fire-and-forget presentation sink.
pub trait Notifier: Send + Sync {
    fn notify(&self, toast: Toast);
}

/// Forwards toasts onto the client event channel for the UI loop.
pub struct ChannelNotifier {
    sender: EventSender,
}

impl ChannelNotifier {
    pub fn new(sender: EventSender) -> Self {
        Self { sender }
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, toast: Toast) {
        emit(&self.sender, ClientEvent::Toast(toast));
    }
}

pub struct NotificationCoordinator {
    current_user: RwLock<Option<i64>>,
    notifier: Arc<dyn Notifier>,
}

impl NotificationCoordinator {
    pub fn new(notifier: Arc<dyn Notifier>, current_user: Option<i64>) -> Arc<Self> {
        Arc::new(Self {
            current_user: RwLock::new(current_user),
            notifier,
        })
    }

    pub fn set_current_user(&self, user_id: Option<i64>) {
        *self.current_user.write() = user_id;
    }

    pub fn current_user(&self) -> Option<i64> {
        *self.current_user.read()
    }

    /// Registers the local join listener; keep the handle to stop listening.
    pub fn attach(self: &Arc<Self>, bus: &LocalEventBus) -> Subscription {
        let coordinator = Arc::clone(self);
        bus.on_club_join(move |event| coordinator.on_local_join(event))
    }

    /// Handler to hand to the stream subscription.
    pub fn stream_handler(self: &Arc<Self>) -> EventHandler {
        let coordinator = Arc::clone(self);
        Arc::new(move |event: StreamEvent| coordinator.on_stream_event(&event))
    }

    pub fn on_local_join(&self, event: &ClubJoinEvent) {
        LOCAL_EVENTS_COUNTER.increment(1);
        info!(
            club_id = event.club_id,
            user_id = event.user_id,
            user_name = %event.user_name,
            timestamp = ?event.timestamp,
            "Local event - user joined club"
        );
        self.notifier.notify(
            Toast::new(Severity::Success, format!("{} joined the club!", event.user_name))
                .description(format!("Club {}", event.club_id))
                .duration(Duration::from_secs(3)),
        );
    }

    pub fn on_stream_event(&self, event: &StreamEvent) {
        let notification = match event.notification() {
            Ok(notification) => notification,
            Err(e) => {
                debug!("Unknown stream event type {}: {}", event.event_type, e);
                return;
            }
        };

        if let Some(toast) = self.toast_for(notification) {
            self.notifier.notify(toast);
        }
    }

    /// `None` when the notification is addressed to someone else.
    pub fn toast_for(&self, notification: ClubNotification) -> Option<Toast> {
        let current_user = self.current_user();
        match notification {
            ClubNotification::JoinRequest {
                admin_id,
                user_name,
                club_id,
            } => (current_user == Some(admin_id)).then(|| {
                Toast::new(Severity::Info, "New club join request")
                    .description(format!("{user_name} wants to join"))
                    .duration(Duration::from_secs(5))
                    .action("View", format!("/clubs/{club_id}"))
            }),
            ClubNotification::UserJoined { user_name, club_id } => Some(
                Toast::new(Severity::Success, format!("{user_name} joined the club!"))
                    .description(format!("Club {club_id}"))
                    .duration(Duration::from_secs(4)),
            ),
            ClubNotification::RequestApproved { user_id, club_id } => {
                (current_user == Some(user_id)).then(|| {
                    Toast::new(Severity::Success, "Your request was approved!")
                        .description("You can now enter the club")
                        .duration(Duration::from_secs(5))
                        .action("View club", format!("/clubs/{club_id}"))
                })
            }
        }
    }
}
