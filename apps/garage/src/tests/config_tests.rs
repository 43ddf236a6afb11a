use super::{load_settings_from, normalize_backend_url, prepare_backend_url, GarageSettings};

use std::{
    collections::HashMap,
    env, fs,
    path::Path,
    time::{SystemTime, UNIX_EPOCH},
};

fn no_env(_: &str) -> Option<String> {
    None
}

#[test]
fn missing_file_and_env_yields_defaults() {
    let settings = load_settings_from(Path::new("/nonexistent/garage.toml"), no_env);
    assert_eq!(settings, GarageSettings::default());
}

#[test]
fn reads_flat_settings_file_and_applies_env_overrides() {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let temp_root = env::temp_dir().join(format!("garage_config_test_{suffix}"));
    fs::create_dir_all(&temp_root).expect("temp root");
    let path = temp_root.join("garage.toml");
    fs::write(
        &path,
        "backend_url = \"https://project.supabase.co\"\nanon_key = \"file-key\"\naccess_token = \"file-token\"\n",
    )
    .expect("write settings");

    let env_vars = HashMap::from([
        ("SUPABASE_ANON_KEY", "env-key"),
        ("APP__ANON_KEY", "app-key"),
        ("SUPABASE_ACCESS_TOKEN", ""),
    ]);
    let settings = load_settings_from(&path, |key| env_vars.get(key).map(|v| v.to_string()));

    assert_eq!(settings.backend_url, "https://project.supabase.co");
    assert_eq!(settings.anon_key, "app-key");
    assert_eq!(settings.access_token, None);

    fs::remove_dir_all(temp_root).expect("cleanup");
}

#[test]
fn normalizes_bare_host_to_https() {
    assert_eq!(
        normalize_backend_url(" project.supabase.co "),
        "https://project.supabase.co"
    );
    assert_eq!(normalize_backend_url(""), "http://127.0.0.1:54321");
}

#[test]
fn rejects_non_http_schemes() {
    let err = prepare_backend_url("ftp://files.example.test").expect_err("must fail");
    assert!(err.to_string().contains("must use http or https"));
}

#[test]
fn accepts_local_backend_url() {
    let url = prepare_backend_url("http://localhost:54321").expect("url");
    assert_eq!(url.host_str(), Some("localhost"));
    assert_eq!(url.port(), Some(54321));
}
