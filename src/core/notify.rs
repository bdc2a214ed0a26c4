//! Outbound notification boundary.
//!
//! The portal tells new suppliers that their account exists. Delivery is behind
//! the [`Notifier`] trait; the bundled [`TracingNotifier`] only records the
//! message in the log.

use crate::{config::settings::NotificationSettings, errors::Result};
use std::future::Future;
use tracing::info;

/// A message addressed to one recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Recipient address
    pub to: String,
    /// Subject line
    pub subject: String,
    /// Message body
    pub body: String,
}

impl Notification {
    /// Renders the onboarding message for a newly created supplier.
    #[must_use]
    pub fn supplier_onboarding(
        settings: &NotificationSettings,
        email: &str,
        title: &str,
        username: &str,
        code: &str,
    ) -> Self {
        let body = settings
            .default_body
            .replace("{title}", title)
            .replace("{username}", username)
            .replace("{code}", code);
        Self {
            to: email.to_string(),
            subject: settings.default_subject.clone(),
            body,
        }
    }
}

/// Sends notifications. Implementations own retries and transport details.
pub trait Notifier {
    /// Delivers one message.
    fn notify(&self, notification: &Notification) -> impl Future<Output = Result<()>> + Send;
}

/// Notifier that writes each message to the `tracing` log.
#[derive(Debug, Clone, Default)]
pub struct TracingNotifier {
    sender: String,
}

impl TracingNotifier {
    /// Creates a notifier that reports `sender` as the origin.
    #[must_use]
    pub const fn new(sender: String) -> Self {
        Self { sender }
    }
}

impl Notifier for TracingNotifier {
    async fn notify(&self, notification: &Notification) -> Result<()> {
        info!(
            from = %self.sender,
            to = %notification.to,
            subject = %notification.subject,
            "Notification dispatched"
        );
        Ok(())
    }
}
