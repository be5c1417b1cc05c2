//! Integration tests for configuration loading.

use std::io::Write;

use tc_core::config::Config;

#[test]
fn partial_file_keeps_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "server": {{ "port": 9100 }},
            "streaming": {{ "ready_timeout_secs": 0 }},
            "reaper": {{ "ttl_secs": 600 }}
        }}"#
    )
    .unwrap();

    let config = Config::load_or_default(Some(file.path()));
    assert_eq!(config.server.port, 9100);
    assert_eq!(config.server.host, "0.0.0.0");
    assert!(config.streaming.ready_timeout().is_none());
    assert_eq!(config.streaming.segment_length_ms, 3000);
    assert_eq!(config.reaper.ttl().as_secs(), 600);
    assert!(config.reaper.enabled);
}

#[test]
fn missing_file_falls_back_to_defaults() {
    let config = Config::load_or_default(Some(std::path::Path::new("/nonexistent/tunecast.json")));
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.storage.hls_dir, std::path::PathBuf::from("data/hls"));
}

#[test]
fn malformed_json_is_a_validation_error() {
    let err = Config::from_json("{ not json").unwrap_err();
    assert!(matches!(err, tc_core::Error::Validation(_)));
}

#[test]
fn suspicious_values_produce_warnings() {
    let config = Config::from_json(
        r#"{ "streaming": { "segment_length_ms": 0 }, "reaper": { "ttl_secs": 5 } }"#,
    )
    .unwrap();
    let warnings = config.validate();
    assert!(warnings.len() >= 2, "{warnings:?}");
}
