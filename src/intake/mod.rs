//! Intake domain
//!
//! A `Submission` is built from raw form fields only when every field passes
//! its filter, and receives its identifier only after that.

pub mod email;
pub mod sanitize;
pub mod tags;

use hyper::body::Bytes;
use std::collections::HashMap;
use std::convert::Infallible;
use thiserror::Error;
use uuid::Uuid;

pub use tags::RedirectTargets;

/// Form keys every submission must carry
pub const REQUIRED_FIELDS: [&str; 4] = ["name", "email", "notes", "tags"];

/// Raw form fields as submitted, last value wins for repeated keys
pub type FormFields = HashMap<String, String>;

/// Why a payload was refused before persistence
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing field '{0}'")]
    MissingField(&'static str),

    #[error("invalid email address")]
    InvalidEmail,

    #[error("malformed form body: {0}")]
    MalformedBody(String),
}

/// Decode an `application/x-www-form-urlencoded` body
pub fn parse_form(body: &[u8]) -> Result<FormFields, ValidationError> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(body)
        .map_err(|e| ValidationError::MalformedBody(e.to_string()))?;
    Ok(pairs.into_iter().collect())
}

/// Decode a `multipart/form-data` body; file parts carry no form values
pub async fn parse_multipart(body: Bytes, boundary: &str) -> Result<FormFields, ValidationError> {
    let malformed = |e: multer::Error| ValidationError::MalformedBody(e.to_string());
    let stream = futures::stream::once(async move { Ok::<Bytes, Infallible>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    let mut fields = FormFields::new();
    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        if field.file_name().is_some() {
            continue;
        }
        let Some(name) = field.name().map(String::from) else {
            continue;
        };
        let value = field.text().await.map_err(malformed)?;
        fields.insert(name, value);
    }
    Ok(fields)
}

/// Form fields that passed every filter, not yet identified
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedForm {
    pub name: String,
    pub email: String,
    pub notes: String,
    pub tags: String,
}

impl ValidatedForm {
    /// Apply the per-field filters; any failure voids the whole form
    pub fn from_fields(fields: &FormFields) -> Result<Self, ValidationError> {
        if let Some(key) = REQUIRED_FIELDS.into_iter().find(|key| !fields.contains_key(*key)) {
            return Err(ValidationError::MissingField(key));
        }
        let field = |key: &str| fields.get(key).map_or("", String::as_str);

        let email = field("email");
        if !email::is_valid_email(email) {
            return Err(ValidationError::InvalidEmail);
        }

        Ok(Self {
            name: sanitize::sanitize_text(field("name")),
            email: email.to_string(),
            notes: sanitize::sanitize_text(field("notes")),
            tags: sanitize::sanitize_text(field("tags")),
        })
    }

    /// Assign a fresh identifier; each call yields a distinct one
    pub fn identify(self) -> Submission {
        Submission {
            id: generate_id(),
            name: self.name,
            email: self.email,
            notes: self.notes,
            tags: self.tags,
        }
    }
}

/// One validated, identified form entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub id: String,
    pub name: String,
    pub email: String,
    pub notes: String,
    pub tags: String,
}

/// Random version-4 UUID, lowercase and hyphenated
pub fn generate_id() -> String {
    Uuid::new_v4().hyphenated().to_string()
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use once_cell::sync::Lazy;
    use regex::Regex;

    pub static UUID_V4: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"^[0-9a-f]{8}-[0-9a-f]{4}-4[0-9a-f]{3}-[89ab][0-9a-f]{3}-[0-9a-f]{12}$")
            .unwrap()
    });

    pub fn fields(pairs: &[(&str, &str)]) -> FormFields {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn complete() -> FormFields {
        fields(&[
            ("name", "Paulette"),
            ("email", "paulette@example.com"),
            ("notes", "Quiero información"),
            ("tags", "newsletter"),
        ])
    }

    #[test]
    fn test_generate_id_shape() {
        for _ in 0..64 {
            let id = generate_id();
            assert_eq!(id.len(), 36);
            assert!(UUID_V4.is_match(&id), "not a v4 uuid: {id}");
        }
    }

    #[test]
    fn test_identify_yields_distinct_ids() {
        let form = ValidatedForm::from_fields(&complete()).unwrap();
        let a = form.clone().identify();
        let b = form.identify();
        assert_ne!(a.id, b.id);
        assert_eq!(a.email, b.email);
    }

    #[test]
    fn test_valid_form_is_sanitized() {
        let mut raw = complete();
        raw.insert("name".to_string(), "<b>Paulette</b>".to_string());
        raw.insert("notes".to_string(), "it's ok".to_string());
        let form = ValidatedForm::from_fields(&raw).unwrap();
        assert_eq!(form.name, "Paulette");
        assert_eq!(form.notes, "it&#39;s ok");
        assert_eq!(form.email, "paulette@example.com");
    }

    #[test]
    fn test_empty_values_are_allowed() {
        let mut raw = complete();
        raw.insert("name".to_string(), String::new());
        raw.insert("notes".to_string(), String::new());
        raw.insert("tags".to_string(), String::new());
        let form = ValidatedForm::from_fields(&raw).unwrap();
        assert_eq!(form.name, "");
        assert_eq!(form.tags, "");
    }

    #[test]
    fn test_each_missing_field_rejected() {
        for key in REQUIRED_FIELDS {
            let mut raw = complete();
            raw.remove(key);
            assert_eq!(
                ValidatedForm::from_fields(&raw),
                Err(ValidationError::MissingField(key))
            );
        }
    }

    #[test]
    fn test_invalid_email_rejected() {
        let mut raw = complete();
        raw.insert("email".to_string(), "paulette-at-example".to_string());
        assert_eq!(
            ValidatedForm::from_fields(&raw),
            Err(ValidationError::InvalidEmail)
        );
    }

    #[test]
    fn test_parse_form_decodes_and_last_wins() {
        let parsed = parse_form(b"name=Ana+Mar%C3%ADa&tags=a&tags=newsletter").unwrap();
        assert_eq!(parsed.get("name").unwrap(), "Ana María");
        assert_eq!(parsed.get("tags").unwrap(), "newsletter");
    }

    #[test]
    fn test_parse_form_empty_body() {
        assert!(parse_form(b"").unwrap().is_empty());
    }

    pub fn multipart_body(boundary: &str, pairs: &[(&str, &str)]) -> String {
        let mut body = String::new();
        for (name, value) in pairs {
            body.push_str(&format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            ));
        }
        body.push_str(&format!("--{boundary}--\r\n"));
        body
    }

    #[tokio::test]
    async fn test_parse_multipart_text_fields() {
        let body = multipart_body(
            "XyZ",
            &[("name", "Ana María"), ("email", "ana@example.com"), ("tags", "newsletter")],
        );
        let parsed = parse_multipart(Bytes::from(body), "XyZ").await.unwrap();
        assert_eq!(parsed.get("name").unwrap(), "Ana María");
        assert_eq!(parsed.get("email").unwrap(), "ana@example.com");
        assert_eq!(parsed.len(), 3);
    }

    #[tokio::test]
    async fn test_parse_multipart_skips_files() {
        let body = "--b\r\n\
                    Content-Disposition: form-data; name=\"cv\"; filename=\"cv.txt\"\r\n\
                    Content-Type: text/plain\r\n\r\n\
                    hello\r\n\
                    --b\r\n\
                    Content-Disposition: form-data; name=\"notes\"\r\n\r\n\
                    Hola\r\n\
                    --b--\r\n";
        let parsed = parse_multipart(Bytes::from_static(body.as_bytes()), "b").await.unwrap();
        assert!(parsed.get("cv").is_none());
        assert_eq!(parsed.get("notes").unwrap(), "Hola");
    }

    #[tokio::test]
    async fn test_parse_multipart_truncated_is_malformed() {
        let body = "--b\r\nContent-Disposition: form-data; name=\"notes\"\r\n\r\nHola";
        let err = parse_multipart(Bytes::from_static(body.as_bytes()), "b").await.unwrap_err();
        assert!(matches!(err, ValidationError::MalformedBody(_)));
    }

    #[test]
    fn test_parse_form_bare_key_is_empty_value() {
        let parsed = parse_form(b"name&email=a%40example.com").unwrap();
        assert_eq!(parsed.get("name").unwrap(), "");
        assert_eq!(parsed.get("email").unwrap(), "a@example.com");
    }
}
