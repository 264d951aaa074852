// tests/config_env.rs
//
// Layered config: file → env overrides → validation. Serialized because every test
// touches process-wide env vars.

use std::env;
use std::fs;

use safechatter::config::AppConfig;

const VARS: &[&str] = &[
    "CLASSIFIER_THRESHOLD",
    "CLASSIFIER_CONTEXT_WINDOW",
    "CLASSIFIER_ENDPOINT",
    "OLLAMA_BASE_URL",
    "LLM_MODEL",
    "AI_TEST_MODE",
    "HF_API_TOKEN",
    "SAFECHATTER_CONFIG",
];

fn clear_env() {
    for v in VARS {
        env::remove_var(v);
    }
}

fn write_config(dir: &tempfile::TempDir, body: &str) -> std::path::PathBuf {
    let path = dir.path().join("safechatter.toml");
    fs::write(&path, body).unwrap();
    path
}

#[test]
#[serial_test::serial]
fn missing_file_means_defaults() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let cfg = AppConfig::load_from(&dir.path().join("nope.toml")).unwrap();
    assert_eq!(cfg.classifier.provider, "huggingface");
    assert!((cfg.classifier.threshold - 0.6).abs() < f64::EPSILON);
    assert_eq!(cfg.classifier.context_window, 8);
    assert_eq!(cfg.llm.base_url, "http://localhost:11434");
}

#[test]
#[serial_test::serial]
fn env_overrides_win_over_file() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        r#"
        [classifier]
        threshold = 0.7
        context_window = 4

        [llm]
        model = "llama3:8b"
        "#,
    );

    env::set_var("CLASSIFIER_CONTEXT_WINDOW", "3");
    env::set_var("CLASSIFIER_ENDPOINT", "http://127.0.0.1:9000/zs");
    env::set_var("OLLAMA_BASE_URL", "http://gpu-box:11434");
    let cfg = AppConfig::load_from(&path).unwrap();
    clear_env();

    assert!((cfg.classifier.threshold - 0.7).abs() < f64::EPSILON);
    assert_eq!(cfg.classifier.context_window, 3);
    assert_eq!(cfg.classifier.endpoint_url(), "http://127.0.0.1:9000/zs");
    assert_eq!(cfg.llm.base_url, "http://gpu-box:11434");
    assert_eq!(cfg.llm.model, "llama3:8b");
}

#[test]
#[serial_test::serial]
fn threshold_env_is_clamped_and_garbage_ignored() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");

    env::set_var("CLASSIFIER_THRESHOLD", "1.5");
    let cfg = AppConfig::load_from(&path).unwrap();
    assert!((cfg.classifier.threshold - 1.0).abs() < f64::EPSILON);

    env::set_var("CLASSIFIER_THRESHOLD", "high");
    env::set_var("CLASSIFIER_CONTEXT_WINDOW", "-2");
    let cfg = AppConfig::load_from(&path).unwrap();
    clear_env();
    assert!((cfg.classifier.threshold - 0.6).abs() < f64::EPSILON);
    assert_eq!(cfg.classifier.context_window, 8);
}

#[test]
#[serial_test::serial]
fn api_key_env_indirection() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, "[classifier]\napi_key = \"ENV\"\n");

    assert!(
        AppConfig::load_from(&path).is_err(),
        "hosted classifier without a token must fail at startup"
    );

    env::set_var("HF_API_TOKEN", "hf_test_token");
    let cfg = AppConfig::load_from(&path).unwrap();
    clear_env();
    assert_eq!(cfg.classifier.api_key, "hf_test_token");
}

#[test]
#[serial_test::serial]
fn test_mode_forces_mocks_and_skips_token() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, "[classifier]\napi_key = \"ENV\"\n[llm]\nprovider = \"ollama\"\n");

    env::set_var("AI_TEST_MODE", "mock");
    let cfg = AppConfig::load_from(&path).unwrap();
    clear_env();
    assert_eq!(cfg.classifier.provider, "mock");
    assert_eq!(cfg.llm.provider, "mock");
}

#[test]
#[serial_test::serial]
fn config_path_comes_from_env() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, "[classifier]\nprovider = \"mock\"\nuse_context = false\n");

    env::set_var("SAFECHATTER_CONFIG", &path);
    let cfg = AppConfig::load().unwrap();
    clear_env();
    assert_eq!(cfg.classifier.provider, "mock");
    assert!(!cfg.classifier.use_context);
}

#[test]
#[serial_test::serial]
fn candidate_labels_must_cover_the_taxonomy() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        "[classifier]\nprovider = \"mock\"\ncandidate_labels = [\"Wrong Number\", \"Benign\"]\n",
    );
    let err = AppConfig::load_from(&path).unwrap_err();
    assert!(err.to_string().contains("missing"), "got: {err}");
}

#[test]
#[serial_test::serial]
fn malformed_file_is_a_startup_error() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, "[classifier\nthreshold = ");
    assert!(AppConfig::load_from(&path).is_err());
}
