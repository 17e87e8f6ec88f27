//! Integration tests for the tempo analysis pipeline

use std::path::Path;

use tempo_dsp::analysis::result::round2;
use tempo_dsp::{analyze_audio, analyze_file, AnalysisConfig, AnalysisError};

/// Decaying noise bursts on every beat
fn click_track(sample_rate: u32, bpm: f32, seconds: f32) -> Vec<f32> {
    let len = (sample_rate as f32 * seconds) as usize;
    let period = (60.0 * sample_rate as f32 / bpm) as usize;
    let decay = sample_rate as f32 * 0.01;
    let burst = sample_rate as usize / 20;
    let mut state = 0x9e37_79b9u32;
    let mut out = vec![0.0f32; len];
    for start in (0..len).step_by(period) {
        for i in 0..burst.min(len - start) {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            let noise = (state as f32 / u32::MAX as f32) * 2.0 - 1.0;
            out[start + i] = 0.8 * noise * (-(i as f32) / decay).exp();
        }
    }
    out
}

/// Write interleaved 16-bit PCM to `path`
fn write_wav(path: &Path, samples: &[f32], sample_rate: u32, channels: u16) {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for &s in samples {
        for _ in 0..channels {
            writer
                .write_sample((s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
                .unwrap();
        }
    }
    writer.finalize().unwrap();
}

#[test]
fn test_click_track_120bpm() {
    let samples = click_track(22050, 120.0, 15.0);
    let result = analyze_audio(&samples, 22050, AnalysisConfig::default())
        .expect("Analysis should succeed");

    println!(
        "120 BPM click: bpm={:.2} conf={:.2} methods={:?}/{:?}/{:?}",
        result.bpm, result.confidence, result.method1_bpm, result.method2_bpm, result.method3_bpm
    );
    assert!(
        (result.bpm - 120.0).abs() <= 2.0,
        "BPM should be close to 120, got {:.2}",
        result.bpm
    );
    assert!(
        result.confidence >= 0.8,
        "Strategies should agree on a click track, confidence {:.2}",
        result.confidence
    );
    assert_eq!(result.duration_seconds, 15.0);
    assert_eq!(result.metadata.strategies_used.len(), 3);
    assert!(result.metadata.processing_time_ms > 0.0);
}

#[test]
fn test_final_bpm_stays_in_band() {
    for bpm in [72.0, 95.0, 128.0, 174.0] {
        let samples = click_track(22050, bpm, 12.0);
        let result = analyze_audio(&samples, 22050, AnalysisConfig::default()).unwrap();
        assert!(
            (60.0..=200.0).contains(&result.bpm),
            "{} BPM click produced out-of-band {:.2}",
            bpm,
            result.bpm
        );
        assert!((0.0..=1.0).contains(&result.confidence));
        assert_eq!(round2(result.bpm), result.bpm);
        assert_eq!(round2(result.confidence), result.confidence);
    }
}

#[test]
fn test_click_tracks_are_accurate() {
    for bpm in [95.0f32, 128.0, 140.0, 150.0] {
        let samples = click_track(22050, bpm, 15.0);
        let result = analyze_audio(&samples, 22050, AnalysisConfig::default()).unwrap();

        println!(
            "{} BPM click: bpm={:.2} conf={:.2} methods={:?}/{:?}/{:?}",
            bpm,
            result.bpm,
            result.confidence,
            result.method1_bpm,
            result.method2_bpm,
            result.method3_bpm
        );
        assert!(
            (result.bpm - bpm).abs() <= 2.0,
            "{} BPM click estimated at {:.2}",
            bpm,
            result.bpm
        );
        assert!(
            result.confidence >= 0.8,
            "{} BPM click: strategies disagree, confidence {:.2}",
            bpm,
            result.confidence
        );
    }
}

#[test]
fn test_beat_track_does_not_halve_at_44100() {
    let samples = click_track(44100, 140.0, 15.0);
    let result = analyze_audio(&samples, 44100, AnalysisConfig::default()).unwrap();

    let method1 = result.method1_bpm.expect("beat track should report a tempo");
    assert!(
        (method1 - 140.0).abs() <= 2.0,
        "Beat track locked onto {:.2} instead of 140",
        method1
    );
    assert!((result.bpm - 140.0).abs() <= 2.0, "got {:.2}", result.bpm);
    assert!(result.confidence >= 0.8, "confidence {:.2}", result.confidence);
}

#[test]
fn test_high_rate_input_is_resampled() {
    let samples = click_track(44100, 120.0, 12.0);
    let result = analyze_audio(&samples, 44100, AnalysisConfig::default()).unwrap();

    assert_eq!(result.sample_rate, 44100);
    assert_eq!(result.metadata.analysis_sample_rate, 22050);
    assert!((result.bpm - 120.0).abs() <= 2.0, "got {:.2}", result.bpm);
}

#[test]
fn test_silent_input_fails() {
    let samples = vec![0.0f32; 44100 * 30];
    let err = analyze_audio(&samples, 44100, AnalysisConfig::default()).unwrap_err();
    assert!(
        err.to_string().contains("silent"),
        "Error should mention silence: {}",
        err
    );
}

#[test]
fn test_empty_input_fails() {
    let err = analyze_audio(&[], 44100, AnalysisConfig::default()).unwrap_err();
    assert!(matches!(err, AnalysisError::InvalidInput(_)));
}

#[test]
fn test_analyze_stereo_wav_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("click_120.wav");
    write_wav(&path, &click_track(44100, 120.0, 20.0), 44100, 2);

    let result = analyze_file(&path, AnalysisConfig::default()).expect("Analysis should succeed");

    assert_eq!(result.sample_rate, 44100);
    assert!(result.metadata.truncated);
    assert!(result.duration_seconds <= 15.0);
    assert!((result.bpm - 120.0).abs() <= 2.0, "got {:.2}", result.bpm);
}

#[test]
fn test_empty_wav_is_a_decoding_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.wav");
    write_wav(&path, &[], 22050, 1);

    let err = analyze_file(&path, AnalysisConfig::default()).unwrap_err();
    assert!(err.is_client_error(), "expected client error, got {}", err);
}

#[test]
fn test_missing_file_is_a_decoding_error() {
    let err = analyze_file("/nonexistent/track.mp3", AnalysisConfig::default()).unwrap_err();
    assert!(matches!(err, AnalysisError::DecodingError(_)));
}

#[test]
fn test_json_shape() {
    let samples = click_track(22050, 120.0, 10.0);
    let result = analyze_audio(&samples, 22050, AnalysisConfig::default()).unwrap();
    let json = serde_json::to_value(&result).unwrap();

    for key in ["bpm", "confidence", "sample_rate", "duration_seconds", "metadata"] {
        assert!(json.get(key).is_some(), "missing {}", key);
    }
    assert!(json.get("method1_bpm").is_some());
    assert_eq!(json["metadata"]["strategies_used"][0], "beat_track");
}
