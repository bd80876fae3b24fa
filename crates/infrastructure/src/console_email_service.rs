//! Console email service for development. Logs emails to tracing output.

use async_trait::async_trait;
use rolegrid_application::{EmailMessage, EmailService};
use rolegrid_core::AppResult;
use tracing::info;

/// Development email service that logs emails to the console.
#[derive(Clone)]
pub struct ConsoleEmailService;

impl ConsoleEmailService {
    /// Creates a new console email service.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConsoleEmailService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmailService for ConsoleEmailService {
    async fn send(&self, message: &EmailMessage) -> AppResult<()> {
        info!(
            to = message.to,
            subject = message.subject,
            "--- EMAIL (console) ---\nTo: {}\nSubject: {}\n\n{}\n--- END EMAIL ---",
            message.to,
            message.subject,
            message.body
        );

        Ok(())
    }
}
