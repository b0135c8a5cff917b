//! UI automation tests using egui_kittest and AccessKit
//!
//! The full application is rendered against an in-process backend and driven
//! through the accessibility tree.

mod common;

use common::{runtime, session, wait_until, DownBackend, EchoBackend};
use egui_kittest::kittest::Queryable;
use egui_kittest::Harness;
use speech_studio::backend::Backend;
use speech_studio::messages::Role;
use speech_studio::ui::{AppState, StudioApp};
use std::sync::Arc;
use tokio::runtime::Runtime;

struct TestApp {
    app: StudioApp,
    _runtime: Runtime,
}

impl TestApp {
    fn new(backend: Arc<dyn Backend>) -> Self {
        let runtime = runtime();
        let state = AppState::with_session(session(backend, &runtime));
        Self {
            app: StudioApp::with_state(state),
            _runtime: runtime,
        }
    }

    fn state(&self) -> &AppState {
        self.app.state()
    }
}

fn harness(backend: Arc<dyn Backend>) -> Harness<'static, TestApp> {
    Harness::builder()
        .with_size(egui::Vec2::new(900.0, 700.0))
        .build_state(|ctx, app: &mut TestApp| app.app.run_frame(ctx), TestApp::new(backend))
}

/// The app repaints every frame, so step explicitly instead of `run`
fn frames(harness: &mut Harness<'_, TestApp>, n: usize) {
    for _ in 0..n {
        harness.step();
    }
}

fn send(harness: &mut Harness<'_, TestApp>, text: &str) {
    harness.get_by_label("Message input").focus();
    frames(harness, 1);
    harness.get_by_label("Message input").type_text(text);
    frames(harness, 1);
    harness.get_by_label("Send message").click();
    frames(harness, 1);
}

fn wait_for_messages(harness: &mut Harness<'_, TestApp>, count: usize) -> bool {
    wait_until(|| {
        harness.step();
        harness.state().state().session.storage().len() >= count
    })
}

#[test]
fn test_controls_are_accessible() {
    let mut harness = harness(Arc::new(EchoBackend::default()));
    frames(&mut harness, 2);

    let _input = harness.get_by_label("Message input");
    let _send = harness.get_by_label("Send message");
    let _mic = harness.get_by_label("Start voice input");
    let _language = harness.get_by_label("Language");
    let _mode = harness.get_by_label("Mode");
}

#[test]
fn test_empty_history_shows_placeholder() {
    let mut harness = harness(Arc::new(EchoBackend::default()));
    frames(&mut harness, 2);

    let _placeholder = harness.get_by_label("No messages yet...");
}

#[test]
fn test_typing_updates_draft() {
    let mut harness = harness(Arc::new(EchoBackend::default()));
    frames(&mut harness, 2);

    harness.get_by_label("Message input").focus();
    frames(&mut harness, 1);
    harness.get_by_label("Message input").type_text("Hello, world!");
    frames(&mut harness, 1);

    assert_eq!(harness.state().state().session.draft(), "Hello, world!");
}

#[test]
fn test_send_shows_user_message_then_reply() {
    let backend = Arc::new(EchoBackend::default());
    let mut harness = harness(backend.clone());
    frames(&mut harness, 2);

    send(&mut harness, "What is 2 + 2?");

    {
        let messages = harness.state().state().session.messages();
        assert_eq!(messages[0].role(), Role::User);
        assert_eq!(messages[0].content(), "What is 2 + 2?");
        assert!(harness.state().state().session.draft().is_empty());
    }

    assert!(wait_for_messages(&mut harness, 2), "reply never arrived");
    frames(&mut harness, 1);

    let _user = harness.get_by_label("User message: What is 2 + 2?");
    let _bot = harness.get_by_label("Bot reply: echo What is 2 + 2?");

    let requests = backend.requests.lock();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].mode, 0);
}

#[test]
fn test_cannot_send_empty_message() {
    let mut harness = harness(Arc::new(EchoBackend::default()));
    frames(&mut harness, 2);

    harness.get_by_label("Send message").click();
    frames(&mut harness, 2);

    assert!(harness.state().state().session.storage().is_empty());
}

#[test]
fn test_backend_failure_shows_error_reply() {
    let mut harness = harness(Arc::new(DownBackend));
    frames(&mut harness, 2);

    send(&mut harness, "hello?");
    assert!(wait_for_messages(&mut harness, 2));
    frames(&mut harness, 1);

    let messages = harness.state().state().session.messages();
    assert_eq!(messages.len(), 2);
    assert!(messages[1].metadata().is_error);
    let _error = harness.get_by_label("Bot reply: ❌ Backend error");
}

#[test]
fn test_mic_without_recognizer_shows_warning() {
    let mut harness = harness(Arc::new(EchoBackend::default()));
    frames(&mut harness, 2);

    harness.get_by_label("Start voice input").click();
    frames(&mut harness, 2);

    let _notice = harness.get_by_label("Notice: Speech recognition not supported.");

    harness.get_by_label("Dismiss notice").click();
    frames(&mut harness, 2);
    assert!(harness.state().state().notice.is_none());
}

#[test]
fn test_diagnostics_toggle() {
    let mut harness = harness(Arc::new(EchoBackend::default()));
    frames(&mut harness, 2);
    assert!(harness.query_by_label("Diagnostics").is_none());

    harness.get_by_label("Toggle diagnostics").click();
    frames(&mut harness, 2);

    assert!(harness.state().state().show_debug_panel);
    let _title = harness.get_by_label("Diagnostics");
}
