use crate::models::{ContentType, FormState, RenderOptions};
use crate::services::encoder;
use chrono::{NaiveDate, NaiveDateTime};

/// Formats accepted for event start/end when checking the range
const LOCAL_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
];

/// Date-only input; compared as midnight
const LOCAL_DATE_FORMAT: &str = "%Y-%m-%d";

/// Single source of truth for the generator window.
///
/// Holds the active content type, every form record, and the render options.
/// The payload is never stored; [`AppState::payload`] derives it from the
/// active record on every call.
///
/// # Thread Safety
///
/// `AppState` is wrapped in `Arc<RwLock<AppState>>` by [`crate::state::FormController`].
/// Mutate it through the controller so change events are emitted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AppState {
    pub active_type: ContentType,
    pub forms: FormState,
    pub options: RenderOptions,
}

impl AppState {
    /// Text the QR code should encode right now.
    pub fn payload(&self) -> String {
        encoder::encode(self.active_type, &self.forms)
    }

    /// Advisory check on the event form.
    ///
    /// The range is invalid only when both ends are filled in, both parse as
    /// local datetimes, and start falls after end. Anything else counts as valid.
    pub fn is_event_range_valid(&self) -> bool {
        let event = &self.forms.event;
        if event.start.is_empty() || event.end.is_empty() {
            return true;
        }

        match (
            parse_local_datetime(&event.start),
            parse_local_datetime(&event.end),
        ) {
            (Some(start), Some(end)) => start <= end,
            _ => true,
        }
    }
}

fn parse_local_datetime(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    LOCAL_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, LOCAL_DATE_FORMAT)
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}
