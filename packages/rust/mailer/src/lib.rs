//! Digest delivery through the Brevo transactional email API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{error, info, instrument};

use lunathink_shared::{Dispatcher, EmailConfig, LunathinkError, Recipient, Result, api_key};

const SEND_TIMEOUT_SECS: u64 = 30;

/// Resolved settings for the Brevo client.
#[derive(Debug, Clone)]
pub struct BrevoOptions {
    pub endpoint: String,
    pub api_key: String,
    pub sender_name: String,
    pub sender_email: String,
    pub subject: String,
}

impl BrevoOptions {
    pub fn from_config(config: &EmailConfig) -> Result<Self> {
        Ok(Self {
            endpoint: config.endpoint.clone(),
            api_key: api_key(&config.api_key_env)?,
            sender_name: config.sender_name.clone(),
            sender_email: config.sender_email.clone(),
            subject: config.subject.clone(),
        })
    }
}

#[derive(Debug, Serialize)]
struct Contact<'a> {
    name: &'a str,
    email: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendRequest<'a> {
    sender: Contact<'a>,
    to: Vec<Contact<'a>>,
    subject: &'a str,
    html_content: String,
}

/// [`Dispatcher`] that emails the digest as an HTML letter.
pub struct BrevoMailer {
    client: Client,
    options: BrevoOptions,
}

impl BrevoMailer {
    pub fn new(options: BrevoOptions) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(SEND_TIMEOUT_SECS))
            .build()
            .map_err(|e| LunathinkError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, options })
    }
}

#[async_trait]
impl Dispatcher for BrevoMailer {
    #[instrument(skip_all, fields(to = %recipient.email))]
    async fn send(&self, recipient: &Recipient, body: &str) -> Result<()> {
        let request = SendRequest {
            sender: Contact {
                name: &self.options.sender_name,
                email: &self.options.sender_email,
            },
            to: vec![Contact {
                name: &recipient.name,
                email: &recipient.email,
            }],
            subject: &self.options.subject,
            html_content: render_letter(&recipient.name, body, &self.options.sender_name),
        };

        let response = self
            .client
            .post(&self.options.endpoint)
            .header("api-key", &self.options.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| LunathinkError::Network(format!("brevo: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(%status, "digest delivery rejected");
            return Err(LunathinkError::Network(format!("brevo: HTTP {status}: {body}")));
        }

        info!("digest sent");
        Ok(())
    }
}

/// Wrap the digest in a short letter: greeting, digest, thank-you note.
///
/// The digest is already HTML and goes in unchanged; names are escaped.
pub fn render_letter(name: &str, digest: &str, sender_name: &str) -> String {
    format!(
        "<html>\n<body>\n\
         <p>Dear {name},</p>\n\
         <p>We hope you're doing well!</p>\n\
         {digest}\n\
         <p>Thank you for choosing {sender}. We're honored to support your research journey.</p>\n\
         <p>Warm regards,<br>{sender} Team</p>\n\
         </body>\n</html>\n",
        name = escape_html(name),
        sender = escape_html(sender_name),
    )
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn options(server: &MockServer) -> BrevoOptions {
        BrevoOptions {
            endpoint: format!("{}/v3/smtp/email", server.uri()),
            api_key: "brevo-key".into(),
            sender_name: "Lunathink".into(),
            sender_email: "digest@lunathink.example".into(),
            subject: "Your digest".into(),
        }
    }

    fn recipient() -> Recipient {
        Recipient {
            name: "Ada".into(),
            email: "ada@example.com".into(),
        }
    }

    #[test]
    fn letter_escapes_name_but_keeps_digest_html() {
        let letter = render_letter("<Ada & co>", "<h2>News</h2>", "Lunathink");
        assert!(letter.starts_with("<html>\n<body>\n"));
        assert!(letter.contains("<p>Dear &lt;Ada &amp; co&gt;,</p>"));
        assert!(letter.contains("<p>We hope you're doing well!</p>\n<h2>News</h2>\n"));
        assert!(letter.contains("Thank you for choosing Lunathink."));
        assert!(letter.contains("<p>Warm regards,<br>Lunathink Team</p>"));
        assert!(letter.trim_end().ends_with("</html>"));
    }

    #[tokio::test]
    async fn send_posts_brevo_payload() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v3/smtp/email"))
            .and(header("api-key", "brevo-key"))
            .and(body_json(serde_json::json!({
                "sender": {"name": "Lunathink", "email": "digest@lunathink.example"},
                "to": [{"name": "Ada", "email": "ada@example.com"}],
                "subject": "Your digest",
                "htmlContent": render_letter("Ada", "<p>d</p>", "Lunathink")
            })))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(serde_json::json!({"messageId": "<1@x>"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let mailer = BrevoMailer::new(options(&server)).unwrap();
        mailer.send(&recipient(), "<p>d</p>").await.unwrap();
    }

    #[tokio::test]
    async fn rejected_send_is_network_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
            .mount(&server)
            .await;

        let mailer = BrevoMailer::new(options(&server)).unwrap();
        let err = mailer.send(&recipient(), "<p>d</p>").await.unwrap_err();
        assert!(matches!(err, LunathinkError::Network(_)));
        assert!(err.to_string().contains("401"));
    }
}
