use serde::{Deserialize, Serialize};

/// A contact-form submission decoded from a request body.
///
/// Every field is optional on the wire and defaults to an empty string. No
/// format validation is applied; the values are only ever substituted into
/// the message template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Submission {
    /// Submitter's name.
    pub name: String,
    /// Submitter's email address, as typed.
    pub email: String,
    /// Free-form message text.
    pub message: String,
}

impl Submission {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            message: message.into(),
        }
    }
}
