use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// The kind of content a QR code carries.
///
/// Exactly one type is active at a time; the field records of the others are
/// kept in [`FormState`] so switching back and forth never loses input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ContentType {
    #[default]
    Url,
    VCard,
    Wifi,
    Event,
    Message,
}

impl ContentType {
    /// All content types in display order
    pub const ALL: [ContentType; 5] = [
        ContentType::Url,
        ContentType::VCard,
        ContentType::Wifi,
        ContentType::Event,
        ContentType::Message,
    ];

    /// Label shown on the type selector
    pub fn label(&self) -> &'static str {
        match self {
            ContentType::Url => "URL",
            ContentType::VCard => "Contact",
            ContentType::Wifi => "Wi-Fi",
            ContentType::Event => "Event",
            ContentType::Message => "Message",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which link a `Message` form produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MessageKind {
    #[default]
    Email,
    Sms,
    Phone,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlFields {
    pub url: String,
}

impl Default for UrlFields {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
        }
    }
}

/// Initial content of the URL form
pub const DEFAULT_URL: &str = "https://example.com";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VCardFields {
    pub first_name: String,
    pub last_name: String,
    pub organization: String,
    pub title: String,
    pub phone: String,
    pub email: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WifiFields {
    pub ssid: String,
    pub password: String,
    pub hidden: bool,
}

/// Calendar event form. `start` and `end` hold the raw local-datetime text
/// (`YYYY-MM-DDTHH:MM`) exactly as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFields {
    pub summary: String,
    pub location: String,
    pub description: String,
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageFields {
    pub kind: MessageKind,
    pub email: String,
    pub subject: String,
    pub body: String,
    pub phone: String,
}

/// One field record per content type, all alive at once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    pub url: UrlFields,
    pub vcard: VCardFields,
    pub wifi: WifiFields,
    pub event: EventFields,
    pub message: MessageFields,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrlField {
    Url,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VCardField {
    FirstName,
    LastName,
    Organization,
    Title,
    Phone,
    Email,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WifiField {
    Ssid,
    Password,
    Hidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventField {
    Summary,
    Location,
    Description,
    Start,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageField {
    Email,
    Subject,
    Body,
    Phone,
}

/// Identifies a single editable field, scoped to the content type that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKey {
    Url(UrlField),
    VCard(VCardField),
    Wifi(WifiField),
    Event(EventField),
    Message(MessageField),
}

impl FieldKey {
    /// Whether the field takes a [`FieldValue::Flag`] rather than text
    pub fn is_flag(&self) -> bool {
        matches!(self, FieldKey::Wifi(WifiField::Hidden))
    }
}

/// A new value for a form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Flag(bool),
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Flag(value)
    }
}

/// Errors raised by form mutations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("field {key:?} does not accept a {given} value")]
    ValueMismatch { key: FieldKey, given: &'static str },
}

impl FormState {
    /// Replace a single field.
    ///
    /// Fails without touching the record when the value shape does not match the
    /// field (a flag for a text field or text for `Wifi.hidden`).
    pub fn set(&mut self, key: FieldKey, value: FieldValue) -> Result<(), FormError> {
        let text = match value {
            FieldValue::Flag(flag) if key.is_flag() => {
                self.wifi.hidden = flag;
                return Ok(());
            }
            FieldValue::Flag(_) => return Err(FormError::ValueMismatch { key, given: "flag" }),
            FieldValue::Text(text) => text,
        };

        let slot = match key {
            FieldKey::Url(UrlField::Url) => &mut self.url.url,
            FieldKey::VCard(field) => match field {
                VCardField::FirstName => &mut self.vcard.first_name,
                VCardField::LastName => &mut self.vcard.last_name,
                VCardField::Organization => &mut self.vcard.organization,
                VCardField::Title => &mut self.vcard.title,
                VCardField::Phone => &mut self.vcard.phone,
                VCardField::Email => &mut self.vcard.email,
            },
            FieldKey::Wifi(WifiField::Ssid) => &mut self.wifi.ssid,
            FieldKey::Wifi(WifiField::Password) => &mut self.wifi.password,
            FieldKey::Wifi(WifiField::Hidden) => {
                return Err(FormError::ValueMismatch { key, given: "text" });
            }
            FieldKey::Event(field) => match field {
                EventField::Summary => &mut self.event.summary,
                EventField::Location => &mut self.event.location,
                EventField::Description => &mut self.event.description,
                EventField::Start => &mut self.event.start,
                EventField::End => &mut self.event.end,
            },
            FieldKey::Message(field) => match field {
                MessageField::Email => &mut self.message.email,
                MessageField::Subject => &mut self.message.subject,
                MessageField::Body => &mut self.message.body,
                MessageField::Phone => &mut self.message.phone,
            },
        };
        *slot = text;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_forms() {
        let forms = FormState::default();
        assert_eq!(forms.url.url, "https://example.com");
        assert_eq!(forms.message.kind, MessageKind::Email);
        assert!(!forms.wifi.hidden);
        assert!(forms.vcard.first_name.is_empty());
    }

    #[test]
    fn test_set_text_field() {
        let mut forms = FormState::default();
        forms
            .set(FieldKey::VCard(VCardField::Organization), "Acme".into())
            .unwrap();
        assert_eq!(forms.vcard.organization, "Acme");
    }

    #[test]
    fn test_set_flag_field() {
        let mut forms = FormState::default();
        forms.set(FieldKey::Wifi(WifiField::Hidden), true.into()).unwrap();
        assert!(forms.wifi.hidden);
    }

    #[test]
    fn test_value_mismatch_leaves_record_untouched() {
        let mut forms = FormState::default();
        let before = forms.clone();

        let err = forms
            .set(FieldKey::Wifi(WifiField::Hidden), "yes".into())
            .unwrap_err();
        assert_eq!(
            err,
            FormError::ValueMismatch {
                key: FieldKey::Wifi(WifiField::Hidden),
                given: "text"
            }
        );

        assert!(forms.set(FieldKey::Url(UrlField::Url), false.into()).is_err());
        assert_eq!(forms, before);
    }
}
