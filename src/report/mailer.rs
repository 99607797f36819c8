use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

use crate::config::EmailSettings;
use crate::error::{AppError, Result};

const DEFAULT_SMTP_PORT: u16 = 587;

/// Send one HTML message through the configured smarthost.
pub fn send_html(settings: &EmailSettings, subject: &str, html: &str) -> Result<()> {
    if settings.smarthost.is_empty() || settings.to.is_empty() || settings.from.is_empty() {
        return Err(AppError::Config(
            "email configuration missing (smarthost, to, from)".to_string(),
        ));
    }

    let message = Message::builder()
        .from(
            settings
                .from
                .parse()
                .map_err(|err| AppError::Email(format!("invalid from address: {err}")))?,
        )
        .to(settings
            .to
            .parse()
            .map_err(|err| AppError::Email(format!("invalid to address: {err}")))?)
        .subject(subject)
        .header(ContentType::TEXT_HTML)
        .body(html.to_string())
        .map_err(|err| AppError::Email(format!("building message: {err}")))?;

    let (host, port) = split_smarthost(&settings.smarthost);
    let mut builder = SmtpTransport::starttls_relay(&host)
        .map_err(|err| AppError::Email(format!("connecting to {host}: {err}")))?
        .port(port);

    if let (Some(username), Some(password)) = (&settings.username, &settings.password) {
        builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
    }

    builder
        .build()
        .send(&message)
        .map_err(|err| AppError::Email(format!("failed to send email: {err}")))?;

    Ok(())
}

fn split_smarthost(smarthost: &str) -> (String, u16) {
    match smarthost.rsplit_once(':') {
        Some((host, port)) => match port.parse() {
            Ok(port) => (host.to_string(), port),
            Err(_) => (smarthost.to_string(), DEFAULT_SMTP_PORT),
        },
        None => (smarthost.to_string(), DEFAULT_SMTP_PORT),
    }
}
