//! Content encoders: form records to QR payload text.
//!
//! Every encoder is a pure string formatter. Nothing is validated or escaped:
//! empty fields produce an empty slot, and delimiter characters typed into a
//! field end up in the payload as-is.

use crate::models::{
    ContentType, EventFields, FormState, MessageFields, MessageKind, UrlFields, VCardFields,
    WifiFields,
};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Characters left alone by `encodeURIComponent`; everything else is escaped.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// A field record that can be turned into a QR payload
pub trait EncodePayload {
    fn encode(&self) -> String;
}

impl EncodePayload for UrlFields {
    fn encode(&self) -> String {
        self.url.clone()
    }
}

impl EncodePayload for VCardFields {
    fn encode(&self) -> String {
        [
            "BEGIN:VCARD".to_string(),
            "VERSION:3.0".to_string(),
            format!("N:{};{};;;", self.last_name, self.first_name),
            format!("FN:{} {}", self.first_name, self.last_name),
            format!("ORG:{}", self.organization),
            format!("TITLE:{}", self.title),
            format!("TEL:{}", self.phone),
            format!("EMAIL:{}", self.email),
            "END:VCARD".to_string(),
        ]
        .join("\n")
    }
}

impl EncodePayload for WifiFields {
    fn encode(&self) -> String {
        format!(
            "WIFI:T:WPA;S:{};P:{};H:{};;",
            self.ssid, self.password, self.hidden
        )
    }
}

impl EncodePayload for EventFields {
    fn encode(&self) -> String {
        [
            "BEGIN:VEVENT".to_string(),
            format!("SUMMARY:{}", self.summary),
            format!("LOCATION:{}", self.location),
            format!("DESCRIPTION:{}", self.description),
            format!("DTSTART:{}", self.start),
            format!("DTEND:{}", self.end),
            "END:VEVENT".to_string(),
        ]
        .join("\n")
    }
}

impl EncodePayload for MessageFields {
    fn encode(&self) -> String {
        match self.kind {
            MessageKind::Email => format!(
                "mailto:{}?subject={}&body={}",
                self.email,
                percent_encode_component(&self.subject),
                percent_encode_component(&self.body)
            ),
            // SMS bodies stay literal; only mailto query values are escaped
            MessageKind::Sms => format!("SMSTO:{}:{}", self.phone, self.body),
            MessageKind::Phone => format!("tel:{}", self.phone),
        }
    }
}

/// Encode the record belonging to `content_type`.
pub fn encode(content_type: ContentType, forms: &FormState) -> String {
    match content_type {
        ContentType::Url => forms.url.encode(),
        ContentType::VCard => forms.vcard.encode(),
        ContentType::Wifi => forms.wifi.encode(),
        ContentType::Event => forms.event.encode(),
        ContentType::Message => forms.message.encode(),
    }
}

/// Percent-encode a query value the way `encodeURIComponent` does
pub fn percent_encode_component(value: &str) -> String {
    utf8_percent_encode(value, URI_COMPONENT).to_string()
}
