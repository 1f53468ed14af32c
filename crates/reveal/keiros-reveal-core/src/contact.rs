//! Contact form handoff: validate the fields, then build a `mailto:` link.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ContactError;

static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern should compile"));

pub const DEFAULT_RECIPIENT: &str = "info@keiros.com";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub company: String,
    pub message: String,
}

impl ContactForm {
    pub fn validate(&self) -> Result<(), ContactError> {
        for (field, value) in [
            ("name", &self.name),
            ("email", &self.email),
            ("message", &self.message),
        ] {
            if value.is_empty() {
                return Err(ContactError::MissingField {
                    field: field.to_string(),
                });
            }
        }
        if !EMAIL.is_match(&self.email) {
            return Err(ContactError::InvalidEmail {
                email: self.email.clone(),
            });
        }
        Ok(())
    }

    pub fn subject(&self) -> String {
        format!("Contact from {} - Keiros Inquiry", self.name)
    }

    pub fn body(&self) -> String {
        let company = if self.company.is_empty() {
            "N/A"
        } else {
            &self.company
        };
        format!(
            "Name: {}\nEmail: {}\nCompany: {}\n\nMessage:\n{}",
            self.name, self.email, company, self.message
        )
    }

    /// Validated `mailto:` URL with encoded subject and body.
    pub fn compose_mailto(&self, recipient: &str) -> Result<String, ContactError> {
        self.validate()?;
        Ok(format!(
            "mailto:{recipient}?subject={}&body={}",
            urlencoding::encode(&self.subject()),
            urlencoding::encode(&self.body())
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> ContactForm {
        ContactForm {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            company: String::new(),
            message: "Need 40 sensors".into(),
        }
    }

    #[test]
    fn builds_encoded_mailto() {
        let url = form().compose_mailto(DEFAULT_RECIPIENT).unwrap();
        assert!(url.starts_with("mailto:info@keiros.com?subject=Contact%20from%20Ada%20-%20Keiros%20Inquiry&body="));
        assert!(url.contains("Company%3A%20N%2FA"));
        assert!(url.contains("%0A%0AMessage%3A%0ANeed%2040%20sensors"));
    }

    #[test]
    fn required_fields() {
        let f = ContactForm {
            message: String::new(),
            ..form()
        };
        assert_eq!(
            f.validate(),
            Err(ContactError::MissingField {
                field: "message".into()
            })
        );
        // company is optional
        assert!(form().validate().is_ok());
    }

    #[test]
    fn email_shape() {
        for bad in ["ada", "ada@example", "a da@example.com", "@example.com"] {
            let f = ContactForm {
                email: bad.into(),
                ..form()
            };
            assert!(
                matches!(f.validate(), Err(ContactError::InvalidEmail { .. })),
                "{bad} should be rejected"
            );
        }
    }
}
