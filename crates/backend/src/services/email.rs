//! Order notification emails over SMTP via lettre.
//!
//! Notifications are best-effort: callers log failures and never let
//! them affect the outcome of order creation or verification.

use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::EmailConfig;
use crate::models::Order;

/// Errors that can occur when sending a notification.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build the email message.
    #[error("failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("invalid email address: {0}")]
    InvalidAddress(#[from] lettre::address::AddressError),

    /// Delivery failed for another reason.
    #[error("notification failed: {0}")]
    Failed(String),
}

/// Best-effort order notifications.
pub trait Notifier {
    /// Send the order confirmation with the claim code.
    fn order_confirmation(
        &self,
        recipient: &str,
        order: &Order,
    ) -> impl Future<Output = Result<(), NotifyError>> + Send;

    /// Send the pickup confirmation after verification.
    fn order_verified(
        &self,
        recipient: &str,
        order: &Order,
    ) -> impl Future<Output = Result<(), NotifyError>> + Send;
}

/// Render the shared plain-text order summary.
fn render_order_summary(order: &Order) -> String {
    let mut body = String::new();
    for item in &order.items {
        let unit = item.discounted_price.unwrap_or(item.unit_price);
        body.push_str(&format!(
            "  {} x {} by {} @ {} = {}\n",
            item.quantity, item.book_title, item.book_author, unit, item.line_total
        ));
    }
    body.push_str(&format!("\nTotal: {}\n", order.total_amount));
    if let Some(volume) = order.volume_discount_amount {
        body.push_str(&format!("Volume discount: -{volume}\n"));
    }
    if let Some(loyalty) = order.loyalty_discount_amount {
        body.push_str(&format!("Loyalty discount: -{loyalty}\n"));
    }
    body
}

/// SMTP notifier for transactional order emails.
#[derive(Clone)]
pub struct EmailNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: Mailbox,
}

impl EmailNotifier {
    /// Create a notifier from SMTP configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the relay cannot be configured or the from
    /// address is invalid.
    pub fn new(config: &EmailConfig) -> Result<Self, NotifyError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.parse()?,
        })
    }

    async fn send_plain(
        &self,
        recipient: &str,
        subject: String,
        body: String,
    ) -> Result<(), NotifyError> {
        let message = Message::builder()
            .from(self.from_address.clone())
            .to(recipient.parse()?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body)?;

        self.mailer.send(message).await?;
        Ok(())
    }
}

impl Notifier for EmailNotifier {
    async fn order_confirmation(
        &self,
        recipient: &str,
        order: &Order,
    ) -> Result<(), NotifyError> {
        let subject = format!("Your Readnook order {}", order.claim_code);
        let body = format!(
            "Thanks for your order!\n\n\
             Bring this claim code to the counter to pick it up:\n\n\
                 {}\n\n{}",
            order.claim_code,
            render_order_summary(order)
        );
        self.send_plain(recipient, subject, body).await
    }

    async fn order_verified(&self, recipient: &str, order: &Order) -> Result<(), NotifyError> {
        let subject = format!("Order {} picked up", order.claim_code);
        let body = format!(
            "Your order has been verified and picked up. Enjoy the books!\n\n{}",
            render_order_summary(order)
        );
        self.send_plain(recipient, subject, body).await
    }
}

/// The notifier wired into application state.
///
/// SMTP settings are optional in development; without them notifications
/// are skipped with a debug log instead of failing order flows.
#[derive(Clone)]
pub enum AppNotifier {
    Smtp(EmailNotifier),
    Disabled,
}

impl AppNotifier {
    /// Build from optional email configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if SMTP configuration is present but invalid.
    pub fn from_config(config: Option<&EmailConfig>) -> Result<Self, NotifyError> {
        match config {
            Some(email) => Ok(Self::Smtp(EmailNotifier::new(email)?)),
            None => Ok(Self::Disabled),
        }
    }
}

impl Notifier for AppNotifier {
    async fn order_confirmation(
        &self,
        recipient: &str,
        order: &Order,
    ) -> Result<(), NotifyError> {
        match self {
            Self::Smtp(notifier) => notifier.order_confirmation(recipient, order).await,
            Self::Disabled => {
                tracing::debug!(claim_code = %order.claim_code, "Email disabled, skipping confirmation");
                Ok(())
            }
        }
    }

    async fn order_verified(&self, recipient: &str, order: &Order) -> Result<(), NotifyError> {
        match self {
            Self::Smtp(notifier) => notifier.order_verified(recipient, order).await,
            Self::Disabled => {
                tracing::debug!(claim_code = %order.claim_code, "Email disabled, skipping verified notice");
                Ok(())
            }
        }
    }
}
