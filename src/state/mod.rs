// State management module
//
// FormController wraps AppState with thread-safe access using Arc<RwLock<T>>
// and emits change events for the render adapter and the window.

use crate::models::{
    AppState, ContentType, ErrorCorrectionLevel, FieldKey, FieldValue, FormError, MessageKind,
    PixelSize, QrSettings, RenderOptions, UrlField,
};
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;

/// Change events emitted when the form state is modified
///
/// The render adapter listens for [`StateChange::PayloadChanged`] and
/// [`StateChange::RenderOptionsChanged`]; the window listens for the rest.
#[derive(Clone, Debug, PartialEq)]
pub enum StateChange {
    /// A different content type became active
    TypeSelected { content_type: ContentType },

    /// A field value changed (in any record, active or not)
    FieldChanged { key: FieldKey },

    /// The message form switched between email, SMS and phone
    MessageKindChanged { kind: MessageKind },

    /// The derived payload differs from before the mutation
    PayloadChanged { payload: String },

    /// Error-correction level or pixel size changed
    RenderOptionsChanged { options: RenderOptions },

    /// The advisory event date-range check flipped
    EventValidityChanged { valid: bool },
}

/// Thread-safe owner of the generator form state
///
/// - [`read()`](Self::read) / [`snapshot()`](Self::snapshot) for reading
/// - [`update()`](Self::update) for mutations with automatic event emission
/// - [`subscribe()`](Self::subscribe) for listening to state changes
///
/// Every mutation diffs the old and new state. The payload is recomputed from
/// both sides on each diff, so a `PayloadChanged` event always reflects the
/// current field values.
pub struct FormController {
    state: Arc<RwLock<AppState>>,
    state_tx: broadcast::Sender<StateChange>,
}

impl FormController {
    /// Create a new FormController with default state
    ///
    /// The broadcast channel buffers 100 events; keystrokes arrive one at a time.
    pub fn new() -> Self {
        let (state_tx, _) = broadcast::channel(100);
        Self {
            state: Arc::new(RwLock::new(AppState::default())),
            state_tx,
        }
    }

    /// Clone of the current state
    pub fn snapshot(&self) -> AppState {
        self.state.read().unwrap().clone()
    }

    /// Execute a function with read access to the state
    ///
    /// # Example
    /// ```ignore
    /// let payload = controller.read(|state| state.payload());
    /// ```
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&AppState) -> R,
    {
        let state = self.state.read().unwrap();
        f(&state)
    }

    /// Apply a mutation, then emit an event for everything it changed.
    ///
    /// # Returns
    /// The emitted events, in a fixed order
    pub fn update<F>(&self, update_fn: F) -> Vec<StateChange>
    where
        F: FnOnce(&mut AppState),
    {
        let mut state = self.state.write().unwrap();
        let old_state = state.clone();

        update_fn(&mut state);

        let changes = Self::detect_changes(&old_state, &state);
        drop(state);

        for change in &changes {
            // Nobody listening is fine
            let _ = self.state_tx.send(change.clone());
        }

        changes
    }

    /// Subscribe to state change events
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.state_tx.subscribe()
    }

    fn detect_changes(old: &AppState, new: &AppState) -> Vec<StateChange> {
        let mut changes = Vec::new();

        if old.active_type != new.active_type {
            changes.push(StateChange::TypeSelected {
                content_type: new.active_type,
            });
        }

        for key in changed_fields(old, new) {
            changes.push(StateChange::FieldChanged { key });
        }

        if old.forms.message.kind != new.forms.message.kind {
            changes.push(StateChange::MessageKindChanged {
                kind: new.forms.message.kind,
            });
        }

        let payload = new.payload();
        if old.payload() != payload {
            changes.push(StateChange::PayloadChanged { payload });
        }

        if old.options != new.options {
            changes.push(StateChange::RenderOptionsChanged {
                options: new.options,
            });
        }

        let valid = new.is_event_range_valid();
        if old.is_event_range_valid() != valid {
            changes.push(StateChange::EventValidityChanged { valid });
        }

        changes
    }

    // Operations used by the window

    /// Make `content_type` the active form. Field records are untouched.
    pub fn select_type(&self, content_type: ContentType) -> Vec<StateChange> {
        tracing::debug!("Selected content type: {}", content_type);
        self.update(|state| state.active_type = content_type)
    }

    /// Replace one field of the record that owns `key`.
    ///
    /// The record need not be the active one. A value of the wrong shape is
    /// rejected and nothing is emitted.
    pub fn set_field(
        &self,
        key: FieldKey,
        value: impl Into<FieldValue>,
    ) -> Result<Vec<StateChange>, FormError> {
        let value = value.into();
        let mut result = Ok(());
        let changes = self.update(|state| result = state.forms.set(key, value));
        result.map(|_| changes)
    }

    /// Switch the message form between email, SMS and phone, keeping all sub-fields
    pub fn set_message_kind(&self, kind: MessageKind) -> Vec<StateChange> {
        self.update(|state| state.forms.message.kind = kind)
    }

    pub fn set_error_correction(&self, level: ErrorCorrectionLevel) -> Vec<StateChange> {
        self.update(|state| state.options.error_correction = level)
    }

    pub fn set_pixel_size(&self, size: PixelSize) -> Vec<StateChange> {
        self.update(|state| state.options.pixel_size = size)
    }

    /// Current payload, derived on the spot
    pub fn payload(&self) -> String {
        self.read(|state| state.payload())
    }

    pub fn is_event_range_valid(&self) -> bool {
        self.read(|state| state.is_event_range_valid())
    }

    /// Seed render options and the URL form from the settings file
    pub fn load_from_settings(&self, settings: &QrSettings) -> Vec<StateChange> {
        let mut changes = self.update(|state| {
            state.options = settings.initial_options();
        });

        if let Ok(url_changes) =
            self.set_field(FieldKey::Url(UrlField::Url), settings.initial_url.as_str())
        {
            changes.extend(url_changes);
        }

        tracing::info!(
            "Loaded settings: error_correction={}, pixel_size={}, initial_url={}",
            settings.default_error_correction,
            settings.default_pixel_size.pixels(),
            settings.initial_url
        );

        changes
    }
}

impl Default for FormController {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for FormController {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            state_tx: self.state_tx.clone(),
        }
    }
}

/// Keys whose values differ between two states, in form order
fn changed_fields(old: &AppState, new: &AppState) -> Vec<FieldKey> {
    use crate::models::{EventField, MessageField, VCardField, WifiField};

    let (o, n) = (&old.forms, &new.forms);
    let candidates = [
        (FieldKey::Url(UrlField::Url), o.url.url != n.url.url),
        (
            FieldKey::VCard(VCardField::FirstName),
            o.vcard.first_name != n.vcard.first_name,
        ),
        (
            FieldKey::VCard(VCardField::LastName),
            o.vcard.last_name != n.vcard.last_name,
        ),
        (
            FieldKey::VCard(VCardField::Organization),
            o.vcard.organization != n.vcard.organization,
        ),
        (FieldKey::VCard(VCardField::Title), o.vcard.title != n.vcard.title),
        (FieldKey::VCard(VCardField::Phone), o.vcard.phone != n.vcard.phone),
        (FieldKey::VCard(VCardField::Email), o.vcard.email != n.vcard.email),
        (FieldKey::Wifi(WifiField::Ssid), o.wifi.ssid != n.wifi.ssid),
        (
            FieldKey::Wifi(WifiField::Password),
            o.wifi.password != n.wifi.password,
        ),
        (FieldKey::Wifi(WifiField::Hidden), o.wifi.hidden != n.wifi.hidden),
        (
            FieldKey::Event(EventField::Summary),
            o.event.summary != n.event.summary,
        ),
        (
            FieldKey::Event(EventField::Location),
            o.event.location != n.event.location,
        ),
        (
            FieldKey::Event(EventField::Description),
            o.event.description != n.event.description,
        ),
        (FieldKey::Event(EventField::Start), o.event.start != n.event.start),
        (FieldKey::Event(EventField::End), o.event.end != n.event.end),
        (
            FieldKey::Message(MessageField::Email),
            o.message.email != n.message.email,
        ),
        (
            FieldKey::Message(MessageField::Subject),
            o.message.subject != n.message.subject,
        ),
        (
            FieldKey::Message(MessageField::Body),
            o.message.body != n.message.body,
        ),
        (
            FieldKey::Message(MessageField::Phone),
            o.message.phone != n.message.phone,
        ),
    ];

    candidates
        .into_iter()
        .filter_map(|(key, changed)| changed.then_some(key))
        .collect()
}
