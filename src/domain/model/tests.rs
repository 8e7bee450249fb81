// Unit tests for domain models

use super::*;

#[test]
fn test_time_spec_parse_seconds() {
    let time = TimeSpec::parse("123.456").unwrap();
    assert_eq!(time.seconds, 123.456);
}

#[test]
fn test_time_spec_parse_mm_ss() {
    let time = TimeSpec::parse("01:30.5").unwrap();
    assert_eq!(time.seconds, 90.5);
}

#[test]
fn test_time_spec_parse_hh_mm_ss() {
    let time = TimeSpec::parse("01:02:03.5").unwrap();
    assert_eq!(time.seconds, 3723.5);
}

#[test]
fn test_time_spec_parse_invalid() {
    assert!(TimeSpec::parse("invalid").is_err());
    assert!(TimeSpec::parse("00:60").is_err());
    assert!(TimeSpec::parse("01:60:00").is_err());
    assert!(TimeSpec::parse("-10").is_err());
}

#[test]
fn test_time_spec_display() {
    assert_eq!(TimeSpec::from_seconds(3723.456).to_string(), "1:02:03.456");
    assert_eq!(TimeSpec::from_seconds(123.5).to_string(), "2:03.500");
}

#[test]
fn test_scene_creation() {
    let scene = Scene::new(10.0, 25.5).unwrap();
    assert_eq!(scene.start(), 10.0);
    assert_eq!(scene.end(), 25.5);
    assert_eq!(scene.duration(), 15.5);
    assert_eq!(scene.start_ms(), 10_000);
    assert_eq!(scene.end_ms(), 25_500);
}

#[test]
fn test_scene_rejects_invalid_bounds() {
    assert!(Scene::new(5.0, 5.0).is_err());
    assert!(Scene::new(6.0, 5.0).is_err());
    assert!(Scene::new(-1.0, 5.0).is_err());
    assert!(Scene::new(0.0, f64::NAN).is_err());
    assert!(Scene::new(0.0, f64::INFINITY).is_err());
}

#[test]
fn test_scene_deserialize_validates() {
    let scene: Scene = serde_json::from_str(r#"{"start": 1.0, "end": 2.0}"#).unwrap();
    assert_eq!(scene.duration(), 1.0);

    let invalid: Result<Scene, _> = serde_json::from_str(r#"{"start": 3.0, "end": 2.0}"#);
    assert!(invalid.is_err());
}

#[test]
fn test_change_signal_clamps() {
    let signal = ChangeSignal::new(-1.0, 1.7);
    assert_eq!(signal.motion_intensity, 0.0);
    assert_eq!(signal.color_divergence, 1.0);

    let signal = ChangeSignal::new(f64::NAN, -0.2);
    assert_eq!(signal.motion_intensity, 0.0);
    assert_eq!(signal.color_divergence, 0.0);
}

fn scored(start: f64, score: f64) -> ScoredScene {
    ScoredScene {
        features: SceneFeatures {
            scene: Scene::new(start, start + 1.0).unwrap(),
            audio_energy: 0.0,
            motion_activity: 0.0,
            speech_detected: false,
        },
        score,
    }
}

#[test]
fn test_scored_scene_rank_order() {
    let mut scenes = vec![scored(5.0, 1.0), scored(0.0, 1.0), scored(2.0, 3.0)];
    scenes.sort_by(ScoredScene::rank_cmp);

    let starts: Vec<f64> = scenes.iter().map(|s| s.scene().start()).collect();
    assert_eq!(starts, vec![2.0, 0.0, 5.0]);
}

#[test]
fn test_highlight_plan_is_chronological() {
    let plan = HighlightPlan::new(vec![
        Scene::new(30.0, 40.0).unwrap(),
        Scene::new(0.0, 5.0).unwrap(),
    ]);

    assert_eq!(plan.len(), 2);
    assert_eq!(plan.segments(), vec![(0.0, 5.0), (30.0, 40.0)]);
    assert_eq!(plan.total_duration(), 15.0);
}

#[test]
fn test_detection_params_validation() {
    assert!(DetectionParams::default().validate().is_ok());
    assert!(DetectionParams::fine().validate().is_ok());

    let params = DetectionParams {
        diff_threshold: 1.5,
        ..DetectionParams::default()
    };
    assert!(params.validate().is_err());

    let params = DetectionParams {
        frame_skip: 0,
        ..DetectionParams::default()
    };
    assert!(params.validate().is_err());

    let params = DetectionParams {
        min_scene_duration: -1.0,
        ..DetectionParams::default()
    };
    assert!(params.validate().is_err());
}

#[test]
fn test_scoring_weights_validation() {
    assert!(ScoringWeights::default().validate().is_ok());

    let weights = ScoringWeights {
        motion: -0.5,
        ..ScoringWeights::default()
    };
    assert!(matches!(weights.validate(), Err(DomainError::ConfigFail(_))));
}

#[test]
fn test_selection_params_validation() {
    assert!(SelectionParams::default().validate().is_ok());

    let params = SelectionParams {
        summary_fraction: 0.0,
        min_scenes: 3,
    };
    assert!(params.validate().is_ok());

    let params = SelectionParams {
        summary_fraction: 2.0,
        min_scenes: 3,
    };
    assert!(params.validate().is_err());
    let params = SelectionParams {
        summary_fraction: 0.2,
        min_scenes: 0,
    };
    assert!(matches!(params.validate(), Err(DomainError::ConfigFail(msg)) if msg.contains("min_scenes")));
}
