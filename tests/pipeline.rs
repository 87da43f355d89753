use pitch_speed::config::HistoryConfig;
use pitch_speed::{ErrorKind, PitchSpeedService, ResourcePaths, ResourceStore};
use std::path::Path;
use std::sync::Arc;

const MAPPING: &str = r#"{
    "pitcher": {"519242": 0, "543037": 1},
    "p_throws": {"L": 0, "R": 1},
    "inning": {"1": 0, "2": 1},
    "at_bat_number": {"1": 0, "2": 1},
    "pitch_number": {"1": 0, "2": 1},
    "pitch_type": {"FF": 0, "SL": 1}
}"#;

const MODEL: &str = r#"{"intercept": 92.0, "coefficients": [3.5, 1.0, -0.5, -0.1, -0.2, -8.0]}"#;

const HISTORY: &str = "\
player_name,pitcher,p_throws,game_date,inning,at_bat_number,pitch_number,pitch_type,release_speed
\"Cole, Gerrit\",543037.0,R,2023-09-27,1,1,1,FF,97.8
\"Cole, Gerrit\",543037.0,R,2023-09-27,1,1,2,SL,88.4
\"Cole, Gerrit\",543037.0,R,2023-09-27,1,2,1,FF,98.1
\"Sale, Chris\",519242.0,L,2023-09-26,1,1,1,FF,94.6
\"Cole, Gerrit\",543037.0,R,2023-09-21,1,1,1,FF,96.9
\"Cole, Gerrit\",543037.0,R,2023-09-15,2,1,1,FF,97.0
";

fn write_artifacts(dir: &Path) -> ResourcePaths {
    let paths = ResourcePaths::new(
        dir.join("first_pitch_speed.json"),
        dir.join("feature_mappings.json"),
        dir.join("historical_pitches.csv"),
    );
    std::fs::write(&paths.model, MODEL).unwrap();
    std::fs::write(&paths.mapping, MAPPING).unwrap();
    std::fs::write(&paths.history, HISTORY).unwrap();
    paths
}

fn service(dir: &Path) -> PitchSpeedService {
    let store = Arc::new(ResourceStore::new(write_artifacts(dir)));
    PitchSpeedService::new(store, HistoryConfig::default())
}

#[test]
fn test_known_pitcher_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let service = service(dir.path());

    let result = service.predict_first_pitch_speed("Cole", "Gerrit").unwrap();

    assert_eq!(result.pitcher, "Cole, Gerrit");
    assert_eq!(result.pitcher_id, "543037");
    assert_eq!(result.throws, "R");
    // 92 + 3.5 (pitcher) + 1.0 (R); every other code is 0
    assert!((result.predicted_speed_mph - 96.5).abs() < 1e-6);

    let rows: Vec<_> = result
        .history
        .iter()
        .map(|p| (p.date.as_str(), p.speed_mph, p.pitch_type.as_deref()))
        .collect();
    assert_eq!(
        rows,
        vec![
            ("2023-09-27", Some(97.8), Some("FF")),
            ("2023-09-21", Some(96.9), Some("FF")),
        ]
    );
}

#[test]
fn test_unknown_pitcher_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let service = service(dir.path());

    let err = service
        .predict_first_pitch_speed("Nonexistent", "Player")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(err.to_string().contains("Nonexistent, Player"));
}

#[test]
fn test_resources_load_once_across_requests() {
    let dir = tempfile::tempdir().unwrap();
    let service = service(dir.path());

    service.predict_first_pitch_speed("Cole", "Gerrit").unwrap();
    service.predict_first_pitch_speed("Sale", "Chris").unwrap();
    let _ = service.predict_first_pitch_speed("Doe", "John");

    assert_eq!(service.store().load_count(), 1);
}

#[test]
fn test_mapping_without_required_feature_fails_at_load() {
    let dir = tempfile::tempdir().unwrap();
    let paths = write_artifacts(dir.path());
    std::fs::write(&paths.mapping, r#"{"pitcher": {"543037": 1}}"#).unwrap();

    let store = ResourceStore::new(paths);
    let err = store.get().unwrap_err();
    assert!(err.to_string().contains("schema mismatch"));
}
