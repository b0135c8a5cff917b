//! Frame-loop coordination tests
//!
//! Drive `AppState::tick` with fake speech engines and check that speech,
//! chat and playback are wired together.

mod common;

use common::{runtime, session, wait_until, EchoBackend};
use crossbeam_channel::{bounded, Sender};
use parking_lot::Mutex;
use speech_studio::audio::{EndpointConfig, SpeechDetector};
use speech_studio::integration::{AudioStack, MicrophoneStatus};
use speech_studio::messages::Role;
use speech_studio::speech::{
    Language, PlaybackSink, RecognitionPhase, SpeechInput, SpeechOutput, SynthesizedAudio,
    Synthesizer, Transcriber, Voice,
};
use speech_studio::ui::{AppState, NoticeKind};
use speech_studio::visual::ParticleConfig;
use speech_studio::Result;
use std::sync::Arc;

const RATE: u32 = 16000;

struct FixedTranscriber(&'static str);

impl Transcriber for FixedTranscriber {
    fn transcribe(&mut self, _samples: &[f32], _language: &str) -> Result<String> {
        Ok(self.0.to_string())
    }
}

struct ToneSynthesizer {
    spoken: Arc<Mutex<Vec<(String, Option<String>)>>>,
}

impl Synthesizer for ToneSynthesizer {
    fn voices(&self) -> Vec<Voice> {
        vec![
            Voice { id: 0, name: "amy".into(), language: "en-US".into() },
            Voice { id: 1, name: "priyamvada".into(), language: "hi-IN".into() },
        ]
    }

    fn synthesize(&mut self, text: &str, voice: Option<&Voice>) -> Result<SynthesizedAudio> {
        self.spoken.lock().push((text.to_string(), voice.map(|v| v.name.clone())));
        Ok(SynthesizedAudio::new(vec![0.1; 100], 22050))
    }
}

/// Treats any loud chunk as speech
struct LoudnessDetector;

impl SpeechDetector for LoudnessDetector {
    fn speech_probability(&mut self, chunk: &[f32]) -> f32 {
        let peak = chunk.iter().fold(0.0f32, |peak, s| peak.max(s.abs()));
        if peak > 0.1 {
            0.9
        } else {
            0.05
        }
    }

    fn reset(&mut self) {}
}

#[derive(Default)]
struct CountingSink {
    played: Mutex<usize>,
}

impl PlaybackSink for CountingSink {
    fn play(&self, _audio: &SynthesizedAudio) -> Result<()> {
        *self.played.lock() += 1;
        Ok(())
    }

    fn stop(&self) {}

    fn is_playing(&self) -> bool {
        false
    }
}

struct Rig {
    state: AppState,
    mic: Sender<Vec<f32>>,
    spoken: Arc<Mutex<Vec<(String, Option<String>)>>>,
    sink: Arc<CountingSink>,
    backend: Arc<EchoBackend>,
    _runtime: tokio::runtime::Runtime,
}

fn rig(transcript: &'static str) -> Rig {
    let runtime = runtime();
    let backend = Arc::new(EchoBackend::default());

    let (mic, chunks) = bounded(64);
    let speech_input = SpeechInput::with_detector(
        Some(Box::new(FixedTranscriber(transcript))),
        Some(chunks),
        RATE,
        EndpointConfig::default(),
        Box::new(LoudnessDetector),
    );

    let spoken = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::new(CountingSink::default());
    let speech_output = SpeechOutput::new(
        Box::new(ToneSynthesizer { spoken: Arc::clone(&spoken) }),
        sink.clone(),
    );

    let audio = AudioStack {
        speech_input,
        speech_output,
        microphone: MicrophoneStatus::Live,
        ..AudioStack::silent()
    };

    let state = AppState::from_parts(session(backend.clone(), &runtime), audio, ParticleConfig::default());

    Rig {
        state,
        mic,
        spoken,
        sink,
        backend,
        _runtime: runtime,
    }
}

fn say_something(mic: &Sender<Vec<f32>>) {
    let loud: Vec<f32> = (0..1600).map(|i| if i % 2 == 0 { 0.3 } else { -0.3 }).collect();
    for _ in 0..5 {
        mic.send(loud.clone()).unwrap();
    }
    for _ in 0..8 {
        mic.send(vec![0.0; 1600]).unwrap();
    }
}

#[test]
fn test_spoken_query_is_sent_answered_and_spoken() {
    let mut rig = rig("turn on the lights");

    rig.state.start_voice_input();
    assert_eq!(rig.state.recognition_phase(), RecognitionPhase::Listening);
    say_something(&rig.mic);

    let state = &mut rig.state;
    assert!(wait_until(|| {
        state.tick(0.0);
        state.session.storage().len() >= 2
    }));

    let messages = rig.state.session.messages();
    assert_eq!(messages[0].role(), Role::User);
    assert_eq!(messages[0].content(), "turn on the lights");
    assert!(messages[0].metadata().from_speech);
    assert_eq!(messages[1].content(), "echo turn on the lights");
    assert_eq!(rig.backend.requests.lock()[0].query, "turn on the lights");

    let spoken = Arc::clone(&rig.spoken);
    assert!(wait_until(|| !spoken.lock().is_empty()));
    assert_eq!(
        rig.spoken.lock()[0],
        ("echo turn on the lights".to_string(), Some("amy".to_string()))
    );
    let sink = rig.sink.clone();
    assert!(wait_until(|| *sink.played.lock() == 1));
    assert_eq!(rig.state.backend_latency().count(), 1);
}

#[test]
fn test_bhojpuri_replies_use_hindi_voice() {
    let mut rig = rig("unused");
    rig.state.session.set_language(Language::BhoIn);
    rig.state.session.submit("का हाल बा");

    let state = &mut rig.state;
    assert!(wait_until(|| {
        state.tick(0.0);
        state.session.storage().len() >= 2
    }));

    let spoken = Arc::clone(&rig.spoken);
    assert!(wait_until(|| !spoken.lock().is_empty()));
    assert_eq!(rig.spoken.lock()[0].1.as_deref(), Some("priyamvada"));
}

#[test]
fn test_bhojpuri_voice_input_is_refused() {
    let mut rig = rig("unused");
    rig.state.session.set_language(Language::BhoIn);

    rig.state.start_voice_input();

    assert_eq!(rig.state.recognition_phase(), RecognitionPhase::Idle);
    let notice = rig.state.notice.clone().expect("a warning");
    assert_eq!(notice.kind, NoticeKind::Warning);
}

#[test]
fn test_cancel_discards_the_utterance() {
    let mut rig = rig("never sent");

    rig.state.start_voice_input();
    rig.state.cancel_voice_input();
    say_something(&rig.mic);

    for _ in 0..20 {
        rig.state.tick(0.0);
        std::thread::sleep(std::time::Duration::from_millis(10));
    }

    assert_eq!(rig.state.recognition_phase(), RecognitionPhase::Idle);
    assert!(rig.state.session.storage().is_empty());
}

#[test]
fn test_tick_keeps_particle_count() {
    let mut rig = rig("unused");
    let count = rig.state.particles.len();

    rig.state.audio.amplitude.set(120.0);
    rig.state.update_particle_anchor(-1.0);
    for frame in 0..300 {
        rig.state.tick(frame as f64 / 60.0);
    }

    assert_eq!(rig.state.particles.len(), count);
    assert_eq!(rig.state.particles.anchor_y(), -1.0);
}

#[test]
fn test_unavailable_microphone_is_reported() {
    let runtime = runtime();
    let audio = AudioStack {
        microphone: MicrophoneStatus::Unavailable("Allow microphone access for live particle effects.".into()),
        ..AudioStack::silent()
    };
    let state = AppState::from_parts(
        session(Arc::new(EchoBackend::default()), &runtime),
        audio,
        ParticleConfig::default(),
    );

    let notice = state.notice.expect("a warning");
    assert_eq!(notice.text, "Allow microphone access for live particle effects.");
}
