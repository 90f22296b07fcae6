//! Mandrill transactional API client

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;

use super::{MailError, MailTemplate, Notifier};
use crate::config::MailConfig;
use crate::intake::Submission;

const USER_AGENT: &str = concat!("form-intake/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    key: &'a str,
    message: Message<'a>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    from_email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    from_name: Option<&'a str>,
    to: [Recipient<'a>; 1],
    subject: &'a str,
    html: String,
}

#[derive(Debug, Serialize)]
struct Recipient<'a> {
    email: &'a str,
    name: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
}

/// Sends the thank-you message through `messages/send.json`
pub struct MandrillNotifier {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    from_address: String,
    from_name: Option<String>,
    subject: String,
    template: MailTemplate,
}

impl MandrillNotifier {
    /// Build from configuration, reading the template file once
    pub fn from_config(config: &MailConfig) -> Result<Self, MailError> {
        let required = |value: &Option<String>, key: &str| {
            value
                .clone()
                .ok_or_else(|| MailError::Config(format!("{key} is not set")))
        };

        let template_path = required(&config.template_path, "mail.template_path")?;
        let template = MailTemplate::load(&template_path).map_err(|e| {
            MailError::Config(format!("cannot read template '{template_path}': {e}"))
        })?;

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| MailError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key: required(&config.api_key, "mail.api_key")?,
            from_address: required(&config.from_address, "mail.from_address")?,
            from_name: config.from_name.clone(),
            subject: config.subject.clone(),
            template,
        })
    }

    fn request_for<'a>(&'a self, submission: &'a Submission) -> SendRequest<'a> {
        SendRequest {
            key: &self.api_key,
            message: Message {
                from_email: &self.from_address,
                from_name: self.from_name.as_deref(),
                to: [Recipient {
                    email: &submission.email,
                    name: &submission.name,
                    kind: "to",
                }],
                subject: &self.subject,
                html: self.template.render(&submission.name, &submission.id),
            },
        }
    }
}

#[async_trait]
impl Notifier for MandrillNotifier {
    async fn notify(&self, submission: &Submission) -> Result<(), MailError> {
        let response = self
            .client
            .post(&self.api_url)
            .json(&self.request_for(submission))
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(()),
            status => Err(MailError::Status(status.as_u16())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn submission() -> Submission {
        Submission {
            id: "0f8fad5b-d9cb-469f-a165-70867728950e".to_string(),
            name: "Paulette".to_string(),
            email: "paulette@example.com".to_string(),
            notes: String::new(),
            tags: "newsletter".to_string(),
        }
    }

    fn template_file(contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("intake-mail-{}.html", uuid::Uuid::new_v4()));
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    fn config_for(api_url: String, template: &std::path::Path) -> MailConfig {
        MailConfig {
            enabled: true,
            api_key: Some("test-key".to_string()),
            api_url,
            template_path: Some(template.to_string_lossy().into_owned()),
            from_address: Some("hola@example.com".to_string()),
            from_name: Some("Paulette".to_string()),
            ..MailConfig::default()
        }
    }

    #[tokio::test]
    async fn test_sends_rendered_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/1.0/messages/send.json"))
            .and(body_partial_json(json!({
                "key": "test-key",
                "message": {
                    "from_email": "hola@example.com",
                    "from_name": "Paulette",
                    "to": [{"email": "paulette@example.com", "name": "Paulette", "type": "to"}],
                    "subject": "Thank you for your submission!",
                    "html": "Hola Paulette, code 0f8fad5b-d9cb-469f-a165-70867728950e"
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"status": "sent"}])))
            .expect(1)
            .mount(&server)
            .await;

        let tpl = template_file("Hola {{name}}, code {{uuid}}");
        let notifier = MandrillNotifier::from_config(&config_for(
            format!("{}/api/1.0/messages/send.json", server.uri()),
            &tpl,
        ))
        .unwrap();

        notifier.notify(&submission()).await.unwrap();
        let _ = std::fs::remove_file(tpl);
    }

    #[tokio::test]
    async fn test_non_200_is_status_error_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let tpl = template_file("x");
        let notifier =
            MandrillNotifier::from_config(&config_for(server.uri(), &tpl)).unwrap();

        let err = notifier.notify(&submission()).await.unwrap_err();
        assert!(matches!(err, MailError::Status(500)), "got {err:?}");
        let _ = std::fs::remove_file(tpl);
    }

    #[test]
    fn test_missing_template_is_config_error() {
        let mut cfg = config_for("http://localhost".to_string(), std::path::Path::new("/nope.html"));
        cfg.template_path = Some("/nonexistent/intake.html".to_string());
        assert!(matches!(
            MandrillNotifier::from_config(&cfg),
            Err(MailError::Config(_))
        ));
    }

    #[test]
    fn test_missing_key_is_config_error() {
        let tpl = template_file("x");
        let mut cfg = config_for("http://localhost".to_string(), &tpl);
        cfg.api_key = None;
        assert!(matches!(
            MandrillNotifier::from_config(&cfg),
            Err(MailError::Config(_))
        ));
        let _ = std::fs::remove_file(tpl);
    }
}
