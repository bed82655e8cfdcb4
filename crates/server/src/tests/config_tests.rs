use super::*;

use std::collections::HashMap;

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn defaults_apply_without_file_or_env() {
    let settings = resolve_settings(None, env_from(&[]));
    assert_eq!(settings, Settings::default());
}

#[test]
fn env_overrides_file_and_app_prefix_wins() {
    let file_cfg: FileSettings = toml::from_str(
        r#"
        bind_addr = "0.0.0.0:9000"
        database_url = "sqlite://./from-file.db"
        graphiql = false
        "#,
    )
    .expect("toml");

    let settings = resolve_settings(
        Some(file_cfg),
        env_from(&[
            ("SERVER_BIND", "127.0.0.1:7000"),
            ("APP__BIND_ADDR", "127.0.0.1:7001"),
            ("APP__MAX_BODY_BYTES", "1024"),
        ]),
    );
    assert_eq!(settings.server_bind, "127.0.0.1:7001");
    assert_eq!(settings.database_url, "sqlite://./from-file.db");
    assert!(!settings.graphiql);
    assert_eq!(settings.max_body_bytes, 1024);
}

#[test]
fn unparseable_body_limit_keeps_default() {
    let settings = resolve_settings(None, env_from(&[("APP__MAX_BODY_BYTES", "lots")]));
    assert_eq!(settings.max_body_bytes, Settings::default().max_body_bytes);
}

#[test]
fn normalizes_plain_file_path_to_sqlite_url() {
    assert_eq!(
        normalize_database_url("./data/test.db"),
        "sqlite://./data/test.db"
    );
    assert_eq!(
        normalize_database_url("sqlite:./data/test.db"),
        "sqlite://./data/test.db"
    );
    assert_eq!(normalize_database_url("   "), Settings::default().database_url);
    assert_eq!(normalize_database_url("sqlite::memory:"), "sqlite::memory:");
}

#[test]
fn creates_parent_dir_for_sqlite_url() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let db_path = temp_root.path().join("data").join("test.db");

    prepare_database_url(db_path.to_string_lossy().as_ref()).expect("prepare db url");
    assert!(temp_root.path().join("data").exists());
}

#[tokio::test]
async fn prepared_database_url_creates_openable_sqlite_file() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let db_path = temp_root.path().join("nested").join("server.db");

    let prepared = prepare_database_url(db_path.to_string_lossy().as_ref()).expect("prepare");
    let storage = storage::Storage::new(&prepared).await.expect("open sqlite");
    drop(storage);

    assert!(
        db_path.exists(),
        "database file should be created: {}",
        db_path.display()
    );
}
