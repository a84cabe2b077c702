//! Bulk generation end to end, with a recording synthesizer in place of
//! the ElevenLabs API.

use std::sync::Mutex;

use eleventools_server::error::AppError;
use eleventools_server::services::bulk::{
    parse_bulk_csv, plan_clips, run_bulk_generation, BulkJob, PlannedClip,
};
use eleventools_server::services::elevenlabs::{
    SpeechRequest, SpeechSynthesizer, SynthesizedSpeech, VoiceSettings,
};
use eleventools_server::session::{OutputRoot, SessionContext};
use eleventools_server::utils::limits::ResourceLimits;
use eleventools_server::utils::sanitize::PathComponent;

#[derive(Default)]
struct RecordingSynth {
    requests: Mutex<Vec<SpeechRequest>>,
    /// Zero-based call index that returns an API error.
    fail_on: Option<usize>,
}

impl RecordingSynth {
    fn failing_on(call: usize) -> Self {
        Self {
            fail_on: Some(call),
            ..Self::default()
        }
    }

    fn requests(&self) -> Vec<SpeechRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl SpeechSynthesizer for RecordingSynth {
    async fn synthesize(&self, request: &SpeechRequest) -> Result<SynthesizedSpeech, AppError> {
        let mut requests = self.requests.lock().unwrap();
        let call = requests.len();
        requests.push(request.clone());
        if self.fail_on == Some(call) {
            return Err(AppError::api("Failed to generate audio", "status 429"));
        }
        Ok(SynthesizedSpeech {
            audio: format!("audio:{}", request.text).into_bytes(),
            seed: None,
        })
    }
}

fn job(seed: Option<u64>) -> BulkJob {
    BulkJob {
        name: PathComponent::sanitize("greetings", 100),
        voice_id: "21m00Tcm4TlvDq8ikWAM".into(),
        model_id: "eleven_multilingual_v2".into(),
        voice_settings: VoiceSettings::default(),
        seed,
        language_code: None,
    }
}

fn clips(csv: &str) -> Vec<PlannedClip> {
    let limits = ResourceLimits::default();
    let sheet = parse_bulk_csv(csv.as_bytes(), &limits).unwrap();
    plan_clips(&sheet, &limits).unwrap()
}

const CSV: &str = "text,name,filename\nHello {name},Ada,hello_{name}\nHello {name},Bob,hello_{name}\nBye,Cy,\n";

#[tokio::test]
async fn test_every_row_written_to_session_batch() {
    let tmp = tempfile::tempdir().unwrap();
    let mut session = SessionContext::new(OutputRoot::new(tmp.path()));
    let synth = RecordingSynth::default();

    let report = run_bulk_generation(&synth, &mut session, &job(Some(42)), clips(CSV))
        .await
        .unwrap();

    assert_eq!(report.group, "greetings");
    let names: Vec<&str> = report.files.iter().map(|f| f.file_name.as_str()).collect();
    assert_eq!(names, vec!["hello_Ada.mp3", "hello_Bob.mp3", "audio_2.mp3"]);

    let dir = session.bulk_path().join("greetings");
    assert_eq!(
        std::fs::read(dir.join("hello_Ada.mp3")).unwrap(),
        b"audio:Hello Ada"
    );
    assert!(dir.join("audio_2.mp3").is_file());

    // Fixed seed reaches every request.
    let requests = synth.requests();
    assert_eq!(requests.len(), 3);
    assert!(requests.iter().all(|r| r.seed == Some(42)));
    assert!(report.files.iter().all(|f| f.seed.as_deref() == Some("42")));
}

#[tokio::test]
async fn test_random_seeds_in_range() {
    let tmp = tempfile::tempdir().unwrap();
    let mut session = SessionContext::new(OutputRoot::new(tmp.path()));
    let synth = RecordingSynth::default();

    run_bulk_generation(&synth, &mut session, &job(None), clips(CSV))
        .await
        .unwrap();

    for request in synth.requests() {
        let seed = request.seed.unwrap();
        assert!(seed < 10_000_000_000);
    }
}

#[tokio::test]
async fn test_invalid_job_writes_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    let mut session = SessionContext::new(OutputRoot::new(tmp.path()));
    let synth = RecordingSynth::default();
    let mut bad = job(None);
    bad.voice_settings.stability = 3.0;

    let err = run_bulk_generation(&synth, &mut session, &bad, clips(CSV))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "validation");
    assert!(synth.requests().is_empty());
    assert!(!session.bulk_path().exists());
}

#[tokio::test]
async fn test_failure_stops_batch_and_names_row() {
    let tmp = tempfile::tempdir().unwrap();
    let mut session = SessionContext::new(OutputRoot::new(tmp.path()));
    let synth = RecordingSynth::failing_on(1);

    let err = run_bulk_generation(&synth, &mut session, &job(Some(1)), clips(CSV))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "api");
    assert!(err.to_string().contains("row 2"));
    assert_eq!(synth.requests().len(), 2);

    let dir = session.bulk_path().join("greetings");
    assert!(dir.join("hello_Ada.mp3").is_file());
    assert!(!dir.join("hello_Bob.mp3").exists());
}
