//! SMTP implementation of the verification notifier.

use async_trait::async_trait;
use gatehouse_auth::{NotifierError, VerificationMessage, VerificationNotifier};
use gatehouse_config::MailConfig;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{info, warn};

pub mod templates;

pub use templates::{html_escape, render_verification, verification_link, RenderedEmail};

pub struct SmtpNotifier {
    from: Mailbox,
    frontend_url: String,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpNotifier {
    pub fn from_config(config: &MailConfig) -> Result<Self, NotifierError> {
        let transport = if config.insecure {
            warn!(
                host = %config.smtp_host,
                port = config.smtp_port,
                "using unencrypted SMTP transport; only use for local development"
            );
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_host)
                .port(config.smtp_port)
                .build()
        } else {
            let builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
                .map_err(|e| NotifierError::Build(format!("failed to create SMTP transport: {e}")))?
                .port(config.smtp_port);

            match (config.username.as_deref(), config.password.as_deref()) {
                (Some(username), Some(password)) => builder
                    .credentials(Credentials::new(username.to_owned(), password.to_owned()))
                    .build(),
                (None, None) => builder.build(),
                _ => {
                    return Err(NotifierError::Build(
                        "SMTP username and password must both be provided or both be empty".into(),
                    ))
                }
            }
        };

        let from = format!("{} <{}>", config.from_name, config.from_address)
            .parse::<Mailbox>()
            .map_err(|e| NotifierError::Build(format!("invalid from address: {e}")))?;

        Ok(Self {
            from,
            frontend_url: config.frontend_url.clone(),
            transport,
        })
    }

    fn build_message(&self, message: &VerificationMessage) -> Result<Message, NotifierError> {
        let to: Mailbox = message
            .email
            .parse()
            .map_err(|_| NotifierError::InvalidRecipient(message.email.clone()))?;

        let rendered = render_verification(
            &self.frontend_url,
            &message.email,
            message.role,
            &message.token,
        );

        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(rendered.subject)
            .multipart(MultiPart::alternative_plain_html(rendered.text, rendered.html))
            .map_err(|e| NotifierError::Build(e.to_string()))
    }
}

#[async_trait]
impl VerificationNotifier for SmtpNotifier {
    async fn send(&self, message: VerificationMessage) -> Result<(), NotifierError> {
        let email = self.build_message(&message)?;
        self.transport
            .send(email)
            .await
            .map_err(|e| NotifierError::Delivery(e.to_string()))?;

        info!(email = %message.email, role = %message.role, "verification email sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatehouse_database::Role;

    fn insecure_config() -> MailConfig {
        MailConfig {
            enabled: true,
            smtp_host: "127.0.0.1".into(),
            smtp_port: 2525,
            insecure: true,
            ..MailConfig::default()
        }
    }

    #[tokio::test]
    async fn builds_multipart_message() {
        let notifier = SmtpNotifier::from_config(&insecure_config()).unwrap();
        let message = notifier
            .build_message(&VerificationMessage {
                email: "a@x.com".into(),
                role: Role::User,
                token: "tok".into(),
            })
            .unwrap();

        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("Subject: Verify your email"));
        assert!(raw.contains("To: a@x.com"));
        assert!(raw.contains("multipart/alternative"));
    }

    #[tokio::test]
    async fn invalid_recipient_fails_before_delivery() {
        let notifier = SmtpNotifier::from_config(&insecure_config()).unwrap();
        let result = notifier
            .send(VerificationMessage {
                email: "not an address".into(),
                role: Role::User,
                token: "tok".into(),
            })
            .await;
        assert!(matches!(result, Err(NotifierError::InvalidRecipient(_))));
    }

    #[tokio::test]
    async fn credentials_must_come_in_pairs() {
        let config = MailConfig {
            username: Some("mailer".into()),
            password: None,
            ..MailConfig::default()
        };
        assert!(matches!(
            SmtpNotifier::from_config(&config),
            Err(NotifierError::Build(_))
        ));
    }

    #[tokio::test]
    async fn invalid_from_address_is_rejected() {
        let config = MailConfig {
            from_address: "nope".into(),
            ..insecure_config()
        };
        assert!(SmtpNotifier::from_config(&config).is_err());
    }
}
