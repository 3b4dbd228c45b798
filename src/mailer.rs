//! Outbound email. Confirmation mail is a best-effort side effect:
//! registration succeeds whether or not delivery works, and failures are only
//! observable in the logs.

use anyhow::Result;
use lettre::{
    message::{header::ContentType, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::{info, warn};

use crate::config::SmtpConfig;

pub struct Mailer {
    config: SmtpConfig,
}

impl Mailer {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.is_configured()
    }

    /// Send the account-confirmation email with the activation link.
    pub async fn send_confirmation_email(
        &self,
        to_email: &str,
        first_name: &str,
        confirm_url: &str,
    ) -> Result<()> {
        if !self.is_enabled() {
            warn!(to = %to_email, "SMTP not configured, skipping confirmation email");
            return Ok(());
        }

        let subject = "Confirm your Shopdesk account";
        let html_body = render_confirmation_html(first_name, confirm_url);
        let text_body = render_confirmation_text(first_name, confirm_url);

        self.send_email(to_email, subject, &html_body, &text_body)
            .await
    }

    async fn send_email(
        &self,
        to_email: &str,
        subject: &str,
        html_body: &str,
        text_body: &str,
    ) -> Result<()> {
        let smtp_host = self
            .config
            .host
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("SMTP host not configured"))?;

        let from: Mailbox = self.config.from.parse()?;
        let to: Mailbox = to_email.parse()?;

        let email = Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )?;

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(smtp_host)?
            .port(self.config.port);

        let mailer = if let (Some(username), Some(password)) =
            (&self.config.username, &self.config.password)
        {
            mailer.credentials(Credentials::new(username.clone(), password.clone()))
        } else {
            mailer
        };

        mailer.build().send(email).await?;

        info!(to = %to_email, subject = %subject, "email sent");
        Ok(())
    }
}

fn render_confirmation_html(first_name: &str, confirm_url: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Confirm your account</title>
</head>
<body style="font-family: -apple-system, 'Segoe UI', Roboto, Arial, sans-serif; color: #374151;">
    <p>Hi {first_name},</p>
    <p>Thanks for registering. Click the link below to activate your account:</p>
    <p><a href="{confirm_url}">Confirm my account</a></p>
    <p>If you didn't create this account, you can safely ignore this email.</p>
</body>
</html>"#,
        first_name = html_escape(first_name),
        confirm_url = confirm_url,
    )
}

fn render_confirmation_text(first_name: &str, confirm_url: &str) -> String {
    format!(
        "Hi {first_name},\n\n\
         Thanks for registering. Open the link below to activate your account:\n\n\
         {confirm_url}\n\n\
         If you didn't create this account, you can safely ignore this email.\n",
    )
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
