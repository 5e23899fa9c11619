//! Validation outcome for profile requests.

use service_core::error::FieldMessages;

/// Validity flag plus every violation message, grouped by field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuditResponse {
    messages: FieldMessages,
}

impl AuditResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_message(&mut self, field: &str, message: impl Into<String>) {
        self.messages
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_valid(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn is_invalid(&self) -> bool {
        !self.is_valid()
    }

    pub fn messages(&self, field: &str) -> &[String] {
        self.messages.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.messages.keys().map(String::as_str)
    }

    pub fn into_messages(self) -> FieldMessages {
        self.messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_messages_per_field() {
        let mut audit = AuditResponse::new();
        assert!(audit.is_valid());

        audit.add_message("name", "Field Name is too short.");
        audit.add_message("name", "Field Name is too long.");
        audit.add_message("birthDay", "BirthDay date is in future");

        assert!(audit.is_invalid());
        assert_eq!(audit.messages("name").len(), 2);
        assert_eq!(audit.messages("email"), &[] as &[String]);
        assert_eq!(audit.fields().collect::<Vec<_>>(), vec!["birthDay", "name"]);
    }
}
