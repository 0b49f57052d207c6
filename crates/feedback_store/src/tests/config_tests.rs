use super::{apply_env_overrides, apply_file_overrides, DeletePolicy, Settings};

use std::collections::HashMap;

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

#[test]
fn defaults_point_at_local_feedback_collection() {
    let settings = Settings::default();
    assert_eq!(
        settings.collection_url().expect("url").as_str(),
        "http://localhost:5000/feedback"
    );
    assert_eq!(settings.delete_policy, DeletePolicy::AlwaysRemove);
}

#[test]
fn collection_url_keeps_base_path() {
    let settings = Settings {
        api_url: "http://example.test/api".into(),
        ..Settings::default()
    };
    assert_eq!(
        settings.collection_url().expect("url").as_str(),
        "http://example.test/api/feedback"
    );

    let settings = Settings {
        api_url: "http://example.test/api/".into(),
        collection: "/reviews/".into(),
        ..Settings::default()
    };
    assert_eq!(
        settings.collection_url().expect("url").as_str(),
        "http://example.test/api/reviews"
    );
}

#[test]
fn collection_url_rejects_relative_base() {
    let settings = Settings {
        api_url: "not a url".into(),
        ..Settings::default()
    };
    assert!(settings.collection_url().is_err());
}

#[test]
fn file_values_override_defaults() {
    let mut settings = Settings::default();
    apply_file_overrides(
        &mut settings,
        r#"
api_url = "http://10.0.0.2:3000"
collection = "reviews"
delete_policy = "require_server_success"
"#,
    );

    assert_eq!(settings.api_url, "http://10.0.0.2:3000");
    assert_eq!(settings.collection, "reviews");
    assert_eq!(settings.delete_policy, DeletePolicy::RequireServerSuccess);
}

#[test]
fn malformed_file_is_ignored() {
    let mut settings = Settings::default();
    apply_file_overrides(&mut settings, "api_url = [");
    assert_eq!(settings, Settings::default());
}

#[test]
fn app_prefixed_env_wins_over_plain_env() {
    let mut settings = Settings::default();
    apply_env_overrides(
        &mut settings,
        env_from(&[
            ("FEEDBACK_API_URL", "http://plain:1"),
            ("APP__API_URL", "http://prefixed:2"),
            ("APP__COLLECTION", "notes"),
        ]),
    );

    assert_eq!(settings.api_url, "http://prefixed:2");
    assert_eq!(settings.collection, "notes");
}

#[test]
fn unknown_delete_policy_keeps_previous_value() {
    let mut settings = Settings::default();
    apply_env_overrides(
        &mut settings,
        env_from(&[("APP__DELETE_POLICY", "sometimes")]),
    );
    assert_eq!(settings.delete_policy, DeletePolicy::AlwaysRemove);
}

#[test]
fn delete_policy_parses_case_insensitively() {
    assert_eq!(
        " Require_Server_Success ".parse::<DeletePolicy>(),
        Ok(DeletePolicy::RequireServerSuccess)
    );
    assert!("never".parse::<DeletePolicy>().is_err());
}
