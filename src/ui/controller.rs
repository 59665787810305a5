// GUI Controller - Bridges the Slint window with the form state and the QR renderer
//
// This module contains the GuiController which coordinates between:
// - Slint UI (MainWindow)
// - FormController (form records, active type, render options)
// - RenderAdapter (QR widget lifecycle, save and copy)
// - EventLoopBridge (tokio/Slint coordination)
//
// Edits flow one way: window callback -> FormController -> StateChange ->
// subscription thread -> RenderAdapter / window properties.

use crate::models::{
    AppState, ContentType, ErrorCorrectionLevel, EventField, FieldKey, MessageField, MessageKind,
    PixelSize, QrSettings, UrlField, VCardField, WifiField,
};
use crate::render::{
    ActionLabels, DisplaySurface, Feedback, QrCodeWidget, QrStyle, RenderAdapter, RenderError,
    RenderParams,
};
use crate::services::export::{ArboardClipboard, DialogFileSink};
use crate::state::{FormController, StateChange};
use crate::ui::bridge::EventLoopBridge;
use anyhow::{Context, Result};
use image::RgbaImage;
use slint::{Image, ModelRc, Rgba8Pixel, SharedPixelBuffer, SharedString, VecModel};
use std::ops::ControlFlow;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::watch;

// Include the generated Slint code
slint::include_modules!();

type SharedAdapter = Arc<Mutex<RenderAdapter<QrCodeWidget>>>;

/// GUI Controller that wires up the Slint window with the form state and renderer
///
/// # Example
/// ```ignore
/// let form = Arc::new(FormController::new());
/// form.load_from_settings(&config.settings);
/// let runtime = tokio::runtime::Runtime::new()?;
///
/// let controller = GuiController::new(form, &config.settings, runtime.handle().clone())?;
/// controller.run()?;  // Blocks until window is closed
/// ```
pub struct GuiController {
    /// The Slint UI window
    ui: MainWindow,

    /// Event loop bridge for coordinating between tokio and Slint
    _bridge: EventLoopBridge<MainWindow>,

    /// Shared form state
    form: Arc<FormController>,

    /// QR widget owner; shared with the subscription thread
    adapter: SharedAdapter,

    /// Stops the subscription thread once the window has closed
    shutdown_tx: watch::Sender<bool>,
}

impl GuiController {
    /// Create the window, mount the QR widget and wire every callback.
    ///
    /// # Arguments
    /// * `form` - Shared form controller, already seeded from settings
    /// * `settings` - Feedback delay, export name, string table
    /// * `tokio_handle` - Runtime for export/copy tasks and feedback timers
    pub fn new(
        form: Arc<FormController>,
        settings: &QrSettings,
        tokio_handle: tokio::runtime::Handle,
    ) -> Result<Self> {
        let ui = MainWindow::new().context("Failed to create Slint UI")?;
        let bridge = EventLoopBridge::new(&ui, tokio_handle.clone());

        let feedback = Feedback::new(settings.feedback_delay(), tokio_handle.clone());
        let labels = ActionLabels {
            export_file_name: settings.export_file_name.clone(),
            saved: settings.strings.saved.clone(),
            copied: settings.strings.copied.clone(),
        };

        let mut adapter = RenderAdapter::new(
            Box::new(|params| QrCodeWidget::create(params, QrStyle::default())),
            Box::new(SlintSurface {
                bridge: bridge.clone(),
            }),
            Arc::new(ArboardClipboard::new()),
            Arc::new(DialogFileSink::new(settings.strings.save_dialog_title.clone())),
            feedback,
            tokio_handle.clone(),
        )
        .with_labels(labels);

        Self::sync_ui_with_state(&ui, &form.snapshot(), settings);

        adapter
            .mount(&current_params(&form))
            .context("Failed to mount QR widget")?;
        let adapter = Arc::new(Mutex::new(adapter));

        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Self::setup_callbacks(&ui, &form, &adapter);
        Self::setup_state_subscription(
            &bridge,
            &form,
            &adapter,
            settings,
            shutdown_rx,
            tokio_handle,
        );
        Self::setup_feedback_forwarding(&bridge, &adapter);

        tracing::info!("GUI controller initialized");

        Ok(Self {
            ui,
            _bridge: bridge,
            form,
            adapter,
            shutdown_tx,
        })
    }

    /// Run the GUI (blocks until window is closed), then dispose the QR widget
    pub fn run(self) -> Result<(), slint::PlatformError> {
        tracing::info!("Starting GUI event loop");
        let result = self.ui.run();

        self.adapter.lock().unwrap().dispose();
        // The subscription thread may already be gone
        let _ = self.shutdown_tx.send(true);
        tracing::debug!(
            "Window closed with {} active",
            self.form.read(|state| state.active_type)
        );

        result
    }

    /// Push the whole state into the window.
    ///
    /// Called once at startup, and again after the subscription lags.
    fn sync_ui_with_state(ui: &MainWindow, state: &AppState, settings: &QrSettings) {
        let strings = &settings.strings;
        ui.set_window_title(strings.window_title.as_str().into());
        ui.set_event_range_message(strings.event_range_invalid.as_str().into());

        ui.set_error_level_labels(labels_model(
            ErrorCorrectionLevel::ALL.iter().map(|level| level.label()),
        ));
        ui.set_pixel_size_labels(labels_model(
            PixelSize::ALL.iter().map(|size| size.label()),
        ));

        apply_state(ui, state);
    }

    /// Set up all Slint callbacks
    fn setup_callbacks(ui: &MainWindow, form: &Arc<FormController>, adapter: &SharedAdapter) {
        // Content type selector
        {
            let form = Arc::clone(form);
            ui.on_select_kind(move |kind| {
                form.select_type(content_type_from_ui(kind));
            });
        }

        // Text fields of every form
        {
            let form = Arc::clone(form);
            ui.on_field_edited(move |field, text| {
                let key = field_key(field);
                if let Err(e) = form.set_field(key, text.as_str()) {
                    tracing::error!("Rejected edit for {:?}: {}", key, e);
                }
            });
        }

        {
            let form = Arc::clone(form);
            ui.on_wifi_hidden_toggled(move |hidden| {
                if let Err(e) = form.set_field(FieldKey::Wifi(WifiField::Hidden), hidden) {
                    tracing::error!("Rejected hidden-network toggle: {}", e);
                }
            });
        }

        {
            let form = Arc::clone(form);
            ui.on_select_message_kind(move |kind| {
                form.set_message_kind(message_kind_from_ui(kind));
            });
        }

        // Render options
        {
            let form = Arc::clone(form);
            ui.on_error_level_selected(move |index| {
                match usize::try_from(index)
                    .ok()
                    .and_then(ErrorCorrectionLevel::from_index)
                {
                    Some(level) => {
                        form.set_error_correction(level);
                    }
                    None => tracing::warn!("Ignoring error correction index {}", index),
                }
            });
        }

        {
            let form = Arc::clone(form);
            ui.on_pixel_size_selected(move |index| {
                match usize::try_from(index).ok().and_then(PixelSize::from_index) {
                    Some(size) => {
                        form.set_pixel_size(size);
                    }
                    None => tracing::warn!("Ignoring pixel size index {}", index),
                }
            });
        }

        // Save and copy run on tokio; the handles are not awaited
        {
            let adapter = Arc::clone(adapter);
            ui.on_save_clicked(move || {
                tracing::debug!("Save requested");
                let _ = adapter.lock().unwrap().export();
            });
        }

        {
            let adapter = Arc::clone(adapter);
            ui.on_copy_clicked(move || {
                tracing::debug!("Copy requested");
                let _ = adapter.lock().unwrap().copy();
            });
        }
    }

    /// Subscribe to form changes on a background thread.
    ///
    /// Payload and option changes go to the render adapter; selection and
    /// validity changes go to the window. The thread exits when `shutdown`
    /// fires, since its own `Arc<FormController>` keeps the channel open.
    fn setup_state_subscription(
        bridge: &EventLoopBridge<MainWindow>,
        form: &Arc<FormController>,
        adapter: &SharedAdapter,
        settings: &QrSettings,
        shutdown: watch::Receiver<bool>,
        tokio_handle: tokio::runtime::Handle,
    ) {
        let bridge = bridge.clone();
        let form = Arc::clone(form);
        let adapter = Arc::clone(adapter);
        let settings = settings.clone();
        let rx = form.subscribe();

        std::thread::Builder::new()
            .name("qrdesk-state".to_string())
            .spawn(move || {
                tracing::debug!("State subscription thread started");

                tokio_handle.block_on(listen_for_changes(rx, shutdown, |received| {
                    let Some(change) = received else {
                        // Lagged: resync everything from a fresh snapshot
                        let state = form.snapshot();
                        if let Err(RenderError::Disposed) =
                            adapter.lock().unwrap().sync(&params_for(&state))
                        {
                            return ControlFlow::Break(());
                        }
                        let settings = settings.clone();
                        bridge.update_ui(move |ui| Self::sync_ui_with_state(ui, &state, &settings));
                        return ControlFlow::Continue(());
                    };

                    tracing::trace!("State change received: {:?}", change);

                    match change {
                        StateChange::PayloadChanged { .. }
                        | StateChange::RenderOptionsChanged { .. } => {
                            if let StateChange::RenderOptionsChanged { options } = &change {
                                let (level, size) = (
                                    options.error_correction.index() as i32,
                                    options.pixel_size.index() as i32,
                                );
                                bridge.update_ui(move |ui| {
                                    ui.set_error_level_index(level);
                                    ui.set_pixel_size_index(size);
                                });
                            }

                            if let Err(RenderError::Disposed) =
                                adapter.lock().unwrap().sync(&current_params(&form))
                            {
                                return ControlFlow::Break(());
                            }
                        }
                        StateChange::TypeSelected { content_type } => {
                            let kind = ui_content_kind(content_type);
                            bridge.update_ui(move |ui| ui.set_active_kind(kind));
                        }
                        StateChange::MessageKindChanged { kind } => {
                            let kind = ui_message_kind(kind);
                            bridge.update_ui(move |ui| ui.set_message_kind(kind));
                        }
                        StateChange::EventValidityChanged { valid } => {
                            bridge.update_ui(move |ui| ui.set_event_range_invalid(!valid));
                        }
                        // The window already holds the typed text
                        StateChange::FieldChanged { .. } => {}
                    }
                    ControlFlow::Continue(())
                }));

                tracing::debug!("State subscription thread terminated");
            })
            .map(|_| ())
            .unwrap_or_else(|e| tracing::error!("Failed to spawn state subscription thread: {}", e));
    }

    /// Mirror the "Saved" / "Copied" message into the window
    fn setup_feedback_forwarding(bridge: &EventLoopBridge<MainWindow>, adapter: &SharedAdapter) {
        let mut rx = adapter.lock().unwrap().feedback().subscribe();
        let ui_bridge = bridge.clone();

        bridge.spawn_async(move || async move {
            while rx.changed().await.is_ok() {
                let message = SharedString::from(rx.borrow_and_update().as_str());
                ui_bridge.update_ui(move |ui| ui.set_feedback(message));
            }
            tracing::debug!("Feedback channel closed");
        });
    }
}

/// [`DisplaySurface`] that shows the QR image in the window's preview
struct SlintSurface {
    bridge: EventLoopBridge<MainWindow>,
}

impl DisplaySurface for SlintSurface {
    fn attach(&mut self, image: &RgbaImage) {
        let (width, height) = image.dimensions();
        let buffer =
            SharedPixelBuffer::<Rgba8Pixel>::clone_from_slice(image.as_raw(), width, height);

        self.bridge.update_ui(move |ui| {
            ui.set_qr_image(Image::from_rgba8(buffer));
            ui.set_qr_size(width as i32);
            ui.set_has_qr(true);
        });
    }

    fn detach(&mut self) {
        self.bridge.update_ui(|ui| {
            ui.set_has_qr(false);
            ui.set_qr_image(Image::default());
        });
    }
}

/// Hand every form change to `on_change` until it breaks, the broadcast
/// channel closes, or `shutdown` turns true (or its sender is dropped).
///
/// `on_change` gets `None` after a lag; the caller should resync from a snapshot.
async fn listen_for_changes<F>(
    mut rx: broadcast::Receiver<StateChange>,
    mut shutdown: watch::Receiver<bool>,
    mut on_change: F,
) where
    F: FnMut(Option<StateChange>) -> ControlFlow<()>,
{
    if *shutdown.borrow_and_update() {
        return;
    }

    loop {
        let received = tokio::select! {
            biased;

            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow_and_update() {
                    tracing::info!("Window closed - shutting down state subscription");
                    break;
                }
                continue;
            }
            received = rx.recv() => received,
        };

        let flow = match received {
            Ok(change) => on_change(Some(change)),
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(
                    "State subscription lagged by {} events, resyncing from snapshot",
                    skipped
                );
                on_change(None)
            }
            Err(RecvError::Closed) => {
                tracing::info!("State broadcast channel closed - shutting down subscription");
                break;
            }
        };

        if flow.is_break() {
            break;
        }
    }
}

fn apply_state(ui: &MainWindow, state: &AppState) {
    let forms = &state.forms;

    ui.set_active_kind(ui_content_kind(state.active_type));
    ui.set_message_kind(ui_message_kind(forms.message.kind));

    ui.set_url(forms.url.url.as_str().into());

    ui.set_vcard_first_name(forms.vcard.first_name.as_str().into());
    ui.set_vcard_last_name(forms.vcard.last_name.as_str().into());
    ui.set_vcard_organization(forms.vcard.organization.as_str().into());
    ui.set_vcard_title(forms.vcard.title.as_str().into());
    ui.set_vcard_phone(forms.vcard.phone.as_str().into());
    ui.set_vcard_email(forms.vcard.email.as_str().into());

    ui.set_wifi_ssid(forms.wifi.ssid.as_str().into());
    ui.set_wifi_password(forms.wifi.password.as_str().into());
    ui.set_wifi_hidden(forms.wifi.hidden);

    ui.set_event_summary(forms.event.summary.as_str().into());
    ui.set_event_location(forms.event.location.as_str().into());
    ui.set_event_description(forms.event.description.as_str().into());
    ui.set_event_start(forms.event.start.as_str().into());
    ui.set_event_end(forms.event.end.as_str().into());
    ui.set_event_range_invalid(!state.is_event_range_valid());

    ui.set_message_email(forms.message.email.as_str().into());
    ui.set_message_subject(forms.message.subject.as_str().into());
    ui.set_message_body(forms.message.body.as_str().into());
    ui.set_message_phone(forms.message.phone.as_str().into());

    ui.set_error_level_index(state.options.error_correction.index() as i32);
    ui.set_pixel_size_index(state.options.pixel_size.index() as i32);
}

fn labels_model<'a>(labels: impl Iterator<Item = &'a str>) -> ModelRc<SharedString> {
    ModelRc::new(VecModel::from(
        labels.map(SharedString::from).collect::<Vec<_>>(),
    ))
}

fn current_params(form: &FormController) -> RenderParams {
    form.read(params_for)
}

fn params_for(state: &AppState) -> RenderParams {
    RenderParams::new(state.payload(), &state.options)
}

// Slint enum <-> model enum

fn field_key(field: UiField) -> FieldKey {
    match field {
        UiField::Url => FieldKey::Url(UrlField::Url),
        UiField::VcardFirstName => FieldKey::VCard(VCardField::FirstName),
        UiField::VcardLastName => FieldKey::VCard(VCardField::LastName),
        UiField::VcardOrganization => FieldKey::VCard(VCardField::Organization),
        UiField::VcardTitle => FieldKey::VCard(VCardField::Title),
        UiField::VcardPhone => FieldKey::VCard(VCardField::Phone),
        UiField::VcardEmail => FieldKey::VCard(VCardField::Email),
        UiField::WifiSsid => FieldKey::Wifi(WifiField::Ssid),
        UiField::WifiPassword => FieldKey::Wifi(WifiField::Password),
        UiField::EventSummary => FieldKey::Event(EventField::Summary),
        UiField::EventLocation => FieldKey::Event(EventField::Location),
        UiField::EventDescription => FieldKey::Event(EventField::Description),
        UiField::EventStart => FieldKey::Event(EventField::Start),
        UiField::EventEnd => FieldKey::Event(EventField::End),
        UiField::MessageEmail => FieldKey::Message(MessageField::Email),
        UiField::MessageSubject => FieldKey::Message(MessageField::Subject),
        UiField::MessageBody => FieldKey::Message(MessageField::Body),
        UiField::MessagePhone => FieldKey::Message(MessageField::Phone),
    }
}

fn content_type_from_ui(kind: UiContentKind) -> ContentType {
    match kind {
        UiContentKind::Url => ContentType::Url,
        UiContentKind::Vcard => ContentType::VCard,
        UiContentKind::Wifi => ContentType::Wifi,
        UiContentKind::Event => ContentType::Event,
        UiContentKind::Message => ContentType::Message,
    }
}

fn ui_content_kind(content_type: ContentType) -> UiContentKind {
    match content_type {
        ContentType::Url => UiContentKind::Url,
        ContentType::VCard => UiContentKind::Vcard,
        ContentType::Wifi => UiContentKind::Wifi,
        ContentType::Event => UiContentKind::Event,
        ContentType::Message => UiContentKind::Message,
    }
}

fn message_kind_from_ui(kind: UiMessageKind) -> MessageKind {
    match kind {
        UiMessageKind::Email => MessageKind::Email,
        UiMessageKind::Sms => MessageKind::Sms,
        UiMessageKind::Phone => MessageKind::Phone,
    }
}

fn ui_message_kind(kind: MessageKind) -> UiMessageKind {
    match kind {
        MessageKind::Email => UiMessageKind::Email,
        MessageKind::Sms => UiMessageKind::Sms,
        MessageKind::Phone => UiMessageKind::Phone,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::time::timeout;

    // Creating MainWindow needs a display; these tests cover the wiring around it.

    const ALL_FIELDS: [UiField; 18] = [
        UiField::Url,
        UiField::VcardFirstName,
        UiField::VcardLastName,
        UiField::VcardOrganization,
        UiField::VcardTitle,
        UiField::VcardPhone,
        UiField::VcardEmail,
        UiField::WifiSsid,
        UiField::WifiPassword,
        UiField::EventSummary,
        UiField::EventLocation,
        UiField::EventDescription,
        UiField::EventStart,
        UiField::EventEnd,
        UiField::MessageEmail,
        UiField::MessageSubject,
        UiField::MessageBody,
        UiField::MessagePhone,
    ];

    #[test]
    fn test_every_text_field_maps_to_a_distinct_key() {
        let keys: HashSet<FieldKey> = ALL_FIELDS.into_iter().map(field_key).collect();

        assert_eq!(keys.len(), ALL_FIELDS.len());
        assert!(keys.iter().all(|key| !key.is_flag()));
    }

    #[test]
    fn test_text_fields_accept_text() {
        let form = FormController::new();

        for field in ALL_FIELDS {
            assert!(form.set_field(field_key(field), "x").is_ok(), "{:?}", field);
        }
    }

    #[test]
    fn test_heading_uses_configured_title() {
        let source = include_str!("../../ui/main.slint");

        assert!(source.contains("text: root.window-title;"));
        // Only the property default may spell the title out
        assert_eq!(source.matches("\"QR Code Generator\"").count(), 1);
        assert_eq!(
            QrSettings::default().strings.window_title,
            "QR Code Generator"
        );
    }

    #[test]
    fn test_content_kind_mapping() {
        for content_type in ContentType::ALL {
            assert_eq!(
                content_type_from_ui(ui_content_kind(content_type)),
                content_type
            );
        }
    }

    #[test]
    fn test_message_kind_mapping() {
        for kind in [MessageKind::Email, MessageKind::Sms, MessageKind::Phone] {
            assert_eq!(message_kind_from_ui(ui_message_kind(kind)), kind);
        }
    }

    #[test]
    fn test_current_spec_follows_state() {
        let form = FormController::new();
        form.set_pixel_size(PixelSize::Large);
        form.set_error_correction(ErrorCorrectionLevel::High);

        let params = current_params(&form);

        assert_eq!(params.payload, "https://example.com");
        assert_eq!(params.width, 300);
        assert_eq!(params.height, 300);
        assert_eq!(params.error_correction, ErrorCorrectionLevel::High);
    }

    fn counting(
        seen: &Arc<AtomicUsize>,
    ) -> impl FnMut(Option<StateChange>) -> ControlFlow<()> + Send + 'static {
        let seen = Arc::clone(seen);
        move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
            ControlFlow::Continue(())
        }
    }

    async fn wait_for(seen: &AtomicUsize, count: usize) {
        timeout(Duration::from_secs(1), async {
            while seen.load(Ordering::SeqCst) < count {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("listener did not see the changes");
    }

    #[tokio::test]
    async fn test_listener_stops_on_shutdown_while_form_is_alive() {
        let form = Arc::new(FormController::new());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let seen = Arc::new(AtomicUsize::new(0));
        let listener = tokio::spawn(listen_for_changes(
            form.subscribe(),
            shutdown_rx,
            counting(&seen),
        ));

        // TypeSelected + PayloadChanged
        form.select_type(ContentType::Wifi);
        wait_for(&seen, 2).await;

        shutdown_tx.send(true).unwrap();

        timeout(Duration::from_secs(1), listener)
            .await
            .expect("listener kept running after shutdown")
            .unwrap();
        // The broadcast sender is still alive, so only the signal could stop it
        form.select_type(ContentType::Url);
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_listener_stops_when_controller_is_dropped() {
        let form = Arc::new(FormController::new());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let seen = Arc::new(AtomicUsize::new(0));
        let listener = tokio::spawn(listen_for_changes(
            form.subscribe(),
            shutdown_rx,
            counting(&seen),
        ));

        drop(shutdown_tx);

        timeout(Duration::from_secs(1), listener)
            .await
            .expect("listener kept running after the sender dropped")
            .unwrap();
    }

    #[tokio::test]
    async fn test_listener_stops_when_handler_breaks() {
        let form = Arc::new(FormController::new());
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let listener = tokio::spawn(listen_for_changes(form.subscribe(), shutdown_rx, |_| {
            ControlFlow::Break(())
        }));

        form.set_pixel_size(PixelSize::Large);

        timeout(Duration::from_secs(1), listener)
            .await
            .expect("listener ignored Break")
            .unwrap();
    }

    #[tokio::test]
    async fn test_listener_reports_lag_as_resync() {
        let form = Arc::new(FormController::new());
        let rx = form.subscribe();
        for i in 0..150 {
            form.set_field(FieldKey::Url(UrlField::Url), format!("https://{}.example", i))
                .unwrap();
        }
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let resyncs = Arc::new(AtomicUsize::new(0));
        let listener = tokio::spawn(listen_for_changes(rx, shutdown_rx, {
            let resyncs = Arc::clone(&resyncs);
            move |received| {
                if received.is_none() {
                    resyncs.fetch_add(1, Ordering::SeqCst);
                    return ControlFlow::Break(());
                }
                ControlFlow::Continue(())
            }
        }));

        timeout(Duration::from_secs(1), listener)
            .await
            .expect("listener never resynced")
            .unwrap();
        assert_eq!(resyncs.load(Ordering::SeqCst), 1);
    }
}
