// ABOUTME: Integration tests for the function config document model.
// ABOUTME: YAML defaults, label schema rules, and message truncation.

use funcdock::config::{
    FunctionConfig, MESSAGE_LIMIT, labels, truncate_message,
};
use proptest::prelude::*;
use std::time::Duration;

const MINIMAL_YAML: &str = r#"
meta:
  name: echo
spec:
  image: echo:1
"#;

const FULL_YAML: &str = r#"
meta:
  name: echo
  namespace: staging
  labels:
    nuclio.io/project-name: default
  annotations:
    owner: data-team
spec:
  image: ghcr.io/acme/echo:1.2
  httpPort: 9000
  readinessTimeout: 30s
  network: funcnet
  env:
    LOG_LEVEL: debug
  volumes:
    - hostPath: /srv/models
      mountPath: /models
"#;

/// Test: A minimal document parses with defaults applied.
#[test]
fn minimal_document_applies_defaults() {
    let config: FunctionConfig = serde_yaml::from_str(MINIMAL_YAML).unwrap();

    assert_eq!(config.meta.name, "echo");
    assert_eq!(config.spec.readiness_timeout, Duration::from_secs(60));
    assert!(config.spec.http_port.is_none());
    assert!(config.spec.volumes.is_empty());

    let identity = config.identity().unwrap();
    assert_eq!(identity.namespace.as_str(), "nuclio");
    assert_eq!(identity.container_name(), "nuclio-echo");
}

/// Test: A full document round-trips every field.
#[test]
fn full_document_parses_every_field() {
    let config: FunctionConfig = serde_yaml::from_str(FULL_YAML).unwrap();

    assert_eq!(config.meta.project(), Some("default"));
    assert_eq!(config.meta.annotations.get("owner").unwrap(), "data-team");
    assert_eq!(config.spec.http_port, Some(9000));
    assert_eq!(config.spec.readiness_timeout, Duration::from_secs(30));
    assert_eq!(config.spec.network.as_deref(), Some("funcnet"));
    assert_eq!(config.spec.volumes.len(), 1);
    assert_eq!(config.spec.volumes[0].host_path, "/srv/models");
    assert_eq!(config.spec.volumes[0].mount_path, "/models");

    let identity = config.identity().unwrap();
    assert_eq!(identity.container_name(), "staging-echo");
}

/// Test: Reserved label keys are exactly the ones the platform writes.
#[test]
fn reserved_label_keys() {
    assert!(labels::is_reserved(labels::PLATFORM));
    assert!(labels::is_reserved(labels::FUNCTION_SPEC));
    // project-name legitimately arrives through user labels
    assert!(!labels::is_reserved(labels::PROJECT_NAME));
    assert!(!labels::is_reserved("team"));
}

/// Test: Specs serialize to JSON suitable for the function-spec label.
#[test]
fn spec_serializes_for_label_payload() {
    let config: FunctionConfig = serde_yaml::from_str(FULL_YAML).unwrap();
    let payload = serde_json::to_string(&config.spec).unwrap();
    assert!(payload.contains("\"httpPort\":9000"));
    assert!(payload.contains("ghcr.io/acme/echo:1.2"));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Truncation never exceeds the limit and never splits a character.
    #[test]
    fn truncation_is_bounded_and_valid(tail in ".{0,64}") {
        // Pad up to just below the limit so the generated tail straddles it.
        let mut message = "x".repeat(MESSAGE_LIMIT - 32);
        message.push_str(&tail);
        let out = truncate_message(message);
        prop_assert!(out.len() <= MESSAGE_LIMIT);
        prop_assert!(out.is_char_boundary(out.len()));
    }

    /// Short messages are never modified.
    #[test]
    fn short_messages_pass_through(s in ".{0,256}") {
        prop_assert_eq!(truncate_message(s.clone()), s);
    }
}
