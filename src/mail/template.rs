//! Notification body template

use std::path::Path;

/// HTML body with `{{name}}` and `{{uuid}}` placeholders
#[derive(Debug, Clone)]
pub struct MailTemplate {
    source: String,
}

impl MailTemplate {
    pub const fn new(source: String) -> Self {
        Self { source }
    }

    pub fn load(path: impl AsRef<Path>) -> std::io::Result<Self> {
        std::fs::read_to_string(path).map(Self::new)
    }

    pub fn render(&self, name: &str, uuid: &str) -> String {
        self.source
            .replace("{{name}}", name)
            .replace("{{uuid}}", uuid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_substitutes_all_occurrences() {
        let t = MailTemplate::new("<p>Hola {{name}}</p><p>{{uuid}} / {{name}}</p>".to_string());
        assert_eq!(
            t.render("Ana", "abc"),
            "<p>Hola Ana</p><p>abc / Ana</p>"
        );
    }

    #[test]
    fn test_unknown_placeholders_left_alone() {
        let t = MailTemplate::new("{{email}}".to_string());
        assert_eq!(t.render("Ana", "abc"), "{{email}}");
    }

    #[test]
    fn test_load_missing_file_errors() {
        assert!(MailTemplate::load("/nonexistent/intake-mail.html").is_err());
    }
}
