//! Text-to-speech output
//!
//! [`SpeechOutput`] keeps at most one utterance audible. Every `speak` call
//! cancels whatever is being synthesised or played before queuing new text,
//! and the worker only starts playback if its utterance is still the latest.

use crate::speech::language::Language;
use crate::{Result, StudioError};
use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::thread;
use tracing::{debug, error, info, warn};

/// A voice offered by the synthesizer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    pub id: usize,
    pub name: String,
    /// BCP-47 tag, e.g. "hi-IN"
    pub language: String,
}

/// Model files for one synthesis voice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceModelConfig {
    pub name: String,
    pub language: String,
    pub model: String,
    pub tokens: String,
    #[serde(default)]
    pub lexicon: Option<String>,
    #[serde(default)]
    pub data_dir: Option<String>,
}

/// Mono synthesised speech
#[derive(Clone, Debug)]
pub struct SynthesizedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl SynthesizedAudio {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

/// Speech synthesis engine run on the output worker
pub trait Synthesizer: Send {
    fn voices(&self) -> Vec<Voice>;

    /// Synthesize with `voice`, or the engine default when `None`
    fn synthesize(&mut self, text: &str, voice: Option<&Voice>) -> Result<SynthesizedAudio>;
}

/// Where synthesised speech is played
pub trait PlaybackSink: Send + Sync {
    /// Convert `audio` into what `play` consumes, e.g. the device rate
    ///
    /// Called by the speech worker outside any lock, so it may be slow.
    fn prepare(&self, audio: SynthesizedAudio) -> Result<SynthesizedAudio> {
        Ok(audio)
    }

    /// Start playing `audio`, replacing anything still audible
    fn play(&self, audio: &SynthesizedAudio) -> Result<()>;

    /// Silence the sink immediately
    fn stop(&self);

    fn is_playing(&self) -> bool;
}

/// Sink for setups without speakers
#[derive(Debug, Default)]
pub struct NullSink;

impl PlaybackSink for NullSink {
    fn play(&self, _audio: &SynthesizedAudio) -> Result<()> {
        Ok(())
    }

    fn stop(&self) {}

    fn is_playing(&self) -> bool {
        false
    }
}

/// First voice whose tag matches exactly
pub fn select_voice<'a>(voices: &'a [Voice], tag: &str) -> Option<&'a Voice> {
    voices.iter().find(|voice| voice.language == tag)
}

/// Strip markdown emphasis and heading markers and collapse whitespace
/// before synthesis
///
/// Markers are only removed at word edges, so operators such as `5 > 3` and
/// identifiers such as `snake_case` are read as written.
pub fn speakable_text(text: &str) -> String {
    let mut words = Vec::new();
    for line in text.lines() {
        for word in strip_heading(line).split_whitespace() {
            let word = strip_emphasis(word);
            if !word.is_empty() {
                words.push(word);
            }
        }
    }
    words.join(" ")
}

/// `## Title` becomes `Title`; `#hashtag` is left alone
fn strip_heading(line: &str) -> &str {
    let trimmed = line.trim_start();
    let rest = trimmed.trim_start_matches('#');
    let level = trimmed.len() - rest.len();
    if (1..=6).contains(&level) && (rest.is_empty() || rest.starts_with(char::is_whitespace)) {
        rest
    } else {
        line
    }
}

fn strip_emphasis(word: &str) -> String {
    let is_marker = |c: char| matches!(c, '*' | '_' | '`');
    let is_closing = |c: char| matches!(c, '.' | ',' | ';' | ':' | '!' | '?' | ')' | '"' | '\'');

    // Keep punctuation that follows a closing marker, e.g. `**done**.`
    let body = word.trim_end_matches(is_closing);
    let tail = &word[body.len()..];

    let mut core = body;
    loop {
        let before = core.len();
        core = core.trim_start_matches(is_marker);
        core = core.strip_prefix("~~").unwrap_or(core);
        core = core.trim_end_matches(is_marker);
        core = core.strip_suffix("~~").unwrap_or(core);
        if core.len() == before {
            break;
        }
    }

    if core.is_empty() && body != word {
        // Only punctuation, e.g. a lone `?`
        return word.to_string();
    }
    if core.is_empty() {
        return String::new();
    }
    format!("{}{}", core, tail)
}

#[derive(Default)]
struct UtteranceState {
    /// Id of the latest requested utterance
    current: u64,
    /// Set while the latest utterance is queued or being synthesised
    pending: Option<u64>,
}

struct SpeakJob {
    id: u64,
    text: String,
    voice: Option<Voice>,
}

/// Speaks replies, one utterance at a time, last call wins
pub struct SpeechOutput {
    state: Arc<Mutex<UtteranceState>>,
    sink: Arc<dyn PlaybackSink>,
    voices: Vec<Voice>,
    job_tx: Option<Sender<SpeakJob>>,
    worker: Option<thread::JoinHandle<()>>,
}

impl SpeechOutput {
    pub fn new(synthesizer: Box<dyn Synthesizer>, sink: Arc<dyn PlaybackSink>) -> Self {
        let voices = synthesizer.voices();
        let state = Arc::new(Mutex::new(UtteranceState::default()));
        let (job_tx, job_rx) = unbounded();

        info!("Speech output ready with {} voice(s)", voices.len());

        let worker = spawn_worker(synthesizer, job_rx, Arc::clone(&state), Arc::clone(&sink));

        Self {
            state,
            sink,
            voices,
            job_tx: Some(job_tx),
            worker: Some(worker),
        }
    }

    /// Output without a synthesizer; `speak` only cancels
    pub fn disabled(sink: Arc<dyn PlaybackSink>) -> Self {
        Self {
            state: Arc::new(Mutex::new(UtteranceState::default())),
            sink,
            voices: Vec::new(),
            job_tx: None,
            worker: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.job_tx.is_some()
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    /// Voice used for `language`, `None` meaning the engine default
    pub fn voice_for(&self, language: Language) -> Option<&Voice> {
        select_voice(&self.voices, language.synthesis_tag())
    }

    /// Speak `text`, cancelling any current utterance first
    ///
    /// Returns the utterance id, or an error when there is nothing to speak
    /// with.
    pub fn speak(&self, text: &str, language: Language) -> Result<u64> {
        let id = self.cancel_current();

        let Some(tx) = &self.job_tx else {
            return Err(StudioError::UnsupportedCapability(
                "No speech synthesizer configured".into(),
            ));
        };

        let text = speakable_text(text);
        if text.is_empty() {
            return Ok(id);
        }

        let voice = self.voice_for(language).cloned();
        match &voice {
            Some(v) => debug!("Utterance {} using voice '{}' ({})", id, v.name, v.language),
            None => debug!("Utterance {} using default voice for {}", id, language.tag()),
        }

        self.state.lock().pending = Some(id);

        tx.send(SpeakJob { id, text, voice }).map_err(|e| {
            self.state.lock().pending = None;
            StudioError::ChannelError(format!("Speech worker stopped: {}", e))
        })?;

        Ok(id)
    }

    /// Stop speaking
    pub fn cancel(&self) {
        self.cancel_current();
    }

    fn cancel_current(&self) -> u64 {
        let mut state = self.state.lock();
        state.current += 1;
        state.pending = None;
        self.sink.stop();
        state.current
    }

    /// True while an utterance is being synthesised or is audible
    pub fn is_speaking(&self) -> bool {
        self.state.lock().pending.is_some() || self.sink.is_playing()
    }
}

impl Drop for SpeechOutput {
    fn drop(&mut self) {
        self.cancel_current();
        // Closing the channel ends the worker loop
        self.job_tx.take();
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}

fn spawn_worker(
    mut synthesizer: Box<dyn Synthesizer>,
    job_rx: Receiver<SpeakJob>,
    state: Arc<Mutex<UtteranceState>>,
    sink: Arc<dyn PlaybackSink>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        info!("Speech worker starting");

        while let Ok(job) = job_rx.recv() {
            if state.lock().current != job.id {
                debug!("Skipping superseded utterance {}", job.id);
                continue;
            }

            let audio = synthesizer
                .synthesize(&job.text, job.voice.as_ref())
                .and_then(|audio| {
                    if audio.samples.is_empty() {
                        Ok(audio)
                    } else {
                        sink.prepare(audio)
                    }
                });

            // Only the id check and the queue swap happen under the lock
            let mut guard = state.lock();
            if guard.current != job.id {
                debug!("Utterance {} superseded during synthesis", job.id);
                continue;
            }
            guard.pending = None;

            match audio {
                Ok(audio) if audio.samples.is_empty() => {}
                Ok(audio) => {
                    debug!("Playing utterance {} ({:.2}s)", job.id, audio.duration_secs());
                    if let Err(e) = sink.play(&audio) {
                        error!("Playback failed: {}", e);
                    }
                }
                Err(e) => warn!("Utterance {} could not be synthesised: {}", job.id, e),
            }
        }

        info!("Speech worker stopped");
    })
}

#[cfg(feature = "sherpa")]
pub use vits::VitsSynthesizer;

#[cfg(feature = "sherpa")]
mod vits {
    use super::{SynthesizedAudio, Synthesizer, Voice, VoiceModelConfig};
    use crate::{Result, StudioError};
    use sherpa_rs::tts::{VitsTts, VitsTtsConfig};
    use std::path::Path;
    use tracing::{debug, info};

    /// VITS voices loaded through sherpa-onnx, one model per voice
    pub struct VitsSynthesizer {
        engines: Vec<(Voice, VitsTts)>,
    }

    impl VitsSynthesizer {
        pub fn new(models: &[VoiceModelConfig]) -> Result<Self> {
            if models.is_empty() {
                return Err(StudioError::ConfigError("No synthesis voices configured".into()));
            }

            let mut engines = Vec::with_capacity(models.len());

            for (id, model) in models.iter().enumerate() {
                for path in [&model.model, &model.tokens] {
                    if !Path::new(path).exists() {
                        return Err(StudioError::ModelLoadError(format!("File not found: {}", path)));
                    }
                }

                info!("Loading VITS voice '{}' ({}) from {}", model.name, model.language, model.model);

                let config = VitsTtsConfig {
                    model: model.model.clone(),
                    tokens: model.tokens.clone(),
                    lexicon: model.lexicon.clone().unwrap_or_default(),
                    data_dir: model.data_dir.clone().unwrap_or_default(),
                    length_scale: 1.0,
                    ..Default::default()
                };

                let voice = Voice {
                    id,
                    name: model.name.clone(),
                    language: model.language.clone(),
                };

                engines.push((voice, VitsTts::new(config)));
            }

            Ok(Self { engines })
        }
    }

    impl Synthesizer for VitsSynthesizer {
        fn voices(&self) -> Vec<Voice> {
            self.engines.iter().map(|(voice, _)| voice.clone()).collect()
        }

        fn synthesize(&mut self, text: &str, voice: Option<&Voice>) -> Result<SynthesizedAudio> {
            let index = voice
                .and_then(|v| self.engines.iter().position(|(known, _)| known.id == v.id))
                .unwrap_or(0);

            let (voice, tts) = self
                .engines
                .get_mut(index)
                .ok_or_else(|| StudioError::SynthesisError("No voice loaded".into()))?;

            debug!("Synthesizing with '{}': {}", voice.name, text);

            let audio = tts
                .create(text, 0, 1.0)
                .map_err(|e| StudioError::SynthesisError(format!("Synthesis failed: {}", e)))?;

            Ok(SynthesizedAudio::new(audio.samples, audio.sample_rate as u32))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<String>>,
        playing: Mutex<bool>,
    }

    impl RecordingSink {
        fn events(&self) -> Vec<String> {
            self.events.lock().clone()
        }
    }

    impl PlaybackSink for RecordingSink {
        fn play(&self, audio: &SynthesizedAudio) -> Result<()> {
            self.events.lock().push(format!("play:{}", audio.samples.len()));
            *self.playing.lock() = true;
            Ok(())
        }

        fn stop(&self) {
            self.events.lock().push("stop".into());
            *self.playing.lock() = false;
        }

        fn is_playing(&self) -> bool {
            *self.playing.lock()
        }
    }

    /// Produces one sample per character, remembering the voice it was asked for
    struct LengthSynthesizer {
        delay: Duration,
        used: Arc<Mutex<Vec<Option<String>>>>,
    }

    impl Synthesizer for LengthSynthesizer {
        fn voices(&self) -> Vec<Voice> {
            vec![
                Voice { id: 0, name: "amy".into(), language: "en-US".into() },
                Voice { id: 1, name: "priyamvada".into(), language: "hi-IN".into() },
                Voice { id: 2, name: "pratham".into(), language: "hi-IN".into() },
            ]
        }

        fn synthesize(&mut self, text: &str, voice: Option<&Voice>) -> Result<SynthesizedAudio> {
            thread::sleep(self.delay);
            self.used.lock().push(voice.map(|v| v.name.clone()));
            Ok(SynthesizedAudio::new(vec![0.1; text.chars().count()], 22050))
        }
    }

    fn output(delay: Duration) -> (SpeechOutput, Arc<RecordingSink>, Arc<Mutex<Vec<Option<String>>>>) {
        let sink = Arc::new(RecordingSink::default());
        let used = Arc::new(Mutex::new(Vec::new()));
        let synth = LengthSynthesizer {
            delay,
            used: Arc::clone(&used),
        };
        let out = SpeechOutput::new(Box::new(synth), sink.clone());
        (out, sink, used)
    }

    fn wait_until_idle(out: &SpeechOutput, sink: &RecordingSink) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while out.state.lock().pending.is_some() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert!(sink.is_playing() || out.state.lock().pending.is_none());
    }

    #[test]
    fn test_last_speak_wins() {
        let (out, sink, _) = output(Duration::from_millis(50));

        out.speak("first reply", Language::EnUs).unwrap();
        out.speak("second", Language::EnUs).unwrap();
        wait_until_idle(&out, &sink);

        let events = sink.events();
        assert_eq!(events.last().map(String::as_str), Some("play:6"));
        assert!(!events.contains(&"play:11".to_string()));

        // Every playback is preceded by a cancellation
        let first_play = events.iter().position(|e| e.starts_with("play")).unwrap();
        assert!(events[..first_play].iter().filter(|e| *e == "stop").count() >= 2);
    }

    #[test]
    fn test_cancel_observed_before_second_playback() {
        let (out, sink, _) = output(Duration::ZERO);

        out.speak("one", Language::EnUs).unwrap();
        wait_until_idle(&out, &sink);
        out.speak("three", Language::EnUs).unwrap();
        wait_until_idle(&out, &sink);

        assert_eq!(sink.events(), vec!["stop", "play:3", "stop", "play:5"]);
        assert!(out.is_speaking());

        out.cancel();
        assert!(!out.is_speaking());
    }

    #[test]
    fn test_bhojpuri_uses_first_hindi_voice() {
        let (out, sink, used) = output(Duration::ZERO);

        assert_eq!(out.voice_for(Language::BhoIn).map(|v| v.id), Some(1));

        out.speak("नमस्ते", Language::BhoIn).unwrap();
        wait_until_idle(&out, &sink);

        assert_eq!(used.lock().clone(), vec![Some("priyamvada".to_string())]);
    }

    #[test]
    fn test_missing_voice_falls_back_to_default() {
        let (out, sink, used) = output(Duration::ZERO);

        assert!(out.voice_for(Language::EnGb).is_none());
        out.speak("cheerio", Language::EnGb).unwrap();
        wait_until_idle(&out, &sink);

        assert_eq!(used.lock().clone(), vec![None]);
    }

    #[test]
    fn test_disabled_output_still_cancels() {
        let sink = Arc::new(RecordingSink::default());
        let out = SpeechOutput::disabled(sink.clone());

        assert!(out.speak("hello", Language::EnUs).is_err());
        assert_eq!(sink.events(), vec!["stop"]);
        assert!(!out.is_speaking());
    }

    /// Sink whose `prepare` blocks until the test lets it go
    struct SlowPrepareSink {
        started: Sender<()>,
        release: Receiver<()>,
        played: Mutex<usize>,
    }

    impl PlaybackSink for SlowPrepareSink {
        fn prepare(&self, audio: SynthesizedAudio) -> Result<SynthesizedAudio> {
            let _ = self.started.send(());
            let _ = self.release.recv_timeout(Duration::from_secs(5));
            Ok(audio)
        }

        fn play(&self, _audio: &SynthesizedAudio) -> Result<()> {
            *self.played.lock() += 1;
            Ok(())
        }

        fn stop(&self) {}

        fn is_playing(&self) -> bool {
            false
        }
    }

    #[test]
    fn test_cancel_is_not_blocked_by_prepare() {
        let (started_tx, started_rx) = unbounded();
        let (release_tx, release_rx) = unbounded();
        let sink = Arc::new(SlowPrepareSink {
            started: started_tx,
            release: release_rx,
            played: Mutex::new(0),
        });
        let synth = LengthSynthesizer {
            delay: Duration::ZERO,
            used: Arc::new(Mutex::new(Vec::new())),
        };
        let out = SpeechOutput::new(Box::new(synth), sink.clone());

        out.speak("hello", Language::EnUs).unwrap();
        started_rx.recv_timeout(Duration::from_secs(5)).unwrap();

        // The worker is inside prepare; the utterance lock must be free
        let begun = Instant::now();
        out.cancel();
        assert!(!out.is_speaking());
        assert!(begun.elapsed() < Duration::from_millis(500));

        release_tx.send(()).unwrap();
        drop(out);
        assert_eq!(*sink.played.lock(), 0, "cancelled utterance must not play");
    }

    #[test]
    fn test_speakable_text() {
        assert_eq!(speakable_text("**Hello**   _world_\n# ok"), "Hello world ok");
        assert_eq!(speakable_text("  "), "");
    }

    #[test]
    fn test_speakable_text_keeps_symbols_inside_sentences() {
        assert_eq!(speakable_text("5 > 3"), "5 > 3");
        assert_eq!(speakable_text("a | b and x ~ y"), "a | b and x ~ y");
        assert_eq!(speakable_text("call snake_case now"), "call snake_case now");
        assert_eq!(speakable_text("#1 fan of C#"), "#1 fan of C#");
        assert_eq!(speakable_text("Is it ready?"), "Is it ready?");
    }

    #[test]
    fn test_speakable_text_strips_markers_at_word_edges() {
        assert_eq!(speakable_text("### Plan\n- **done**, `code` and ~~old~~."), "Plan - done, code and old.");
        assert_eq!(speakable_text("नमस्ते **दुनिया**"), "नमस्ते दुनिया");
        assert_eq!(speakable_text("---\n***"), "---");
    }
}
