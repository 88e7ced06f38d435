use kevast::{Kevast, KevastSync, SyncStorage};
use kevast_cli::{AccessLog, SqliteStorage, StoreConfig};
use tempfile::TempDir;

fn config_for(dir: &TempDir) -> StoreConfig {
    let json = serde_json::json!({
        "master": {"kind": "sqlite", "path": dir.path().join("main.db")},
        "redundancies": [
            {"kind": "sqlite", "path": dir.path().join("mirror.db")},
            {"kind": "memory_deferred"}
        ]
    });
    StoreConfig::from_json(&json.to_string()).unwrap()
}

#[tokio::test]
async fn test_writes_persist_and_replicate() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(&dir);

    {
        let (master, redundancies) = config.open().unwrap();
        let mut kevast = Kevast::new(master, redundancies);
        kevast.use_middleware(AccessLog);
        kevast.set("a", "1").await.unwrap();
        kevast.set("b", "2").await.unwrap();
        kevast.set("a", "3").await.unwrap();
        kevast.delete("b").await.unwrap();
        kevast.set("c", "4").await.unwrap();
    }

    let master = SqliteStorage::open(dir.path().join("main.db")).unwrap();
    let mirror = SqliteStorage::open(dir.path().join("mirror.db")).unwrap();
    let expected = vec![
        ("a".to_string(), "3".to_string()),
        ("c".to_string(), "4".to_string()),
    ];
    assert_eq!(master.entries().unwrap(), expected);
    assert_eq!(mirror.entries().unwrap(), expected);
}

#[tokio::test]
async fn test_reopened_store_reads_previous_run() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(&dir);

    {
        let (master, redundancies) = config.open().unwrap();
        Kevast::new(master, redundancies).set("k", "v").await.unwrap();
    }

    let (master, redundancies) = config.open().unwrap();
    let kevast = Kevast::new(master, redundancies);
    assert_eq!(kevast.get("k").await.unwrap().as_deref(), Some("v"));
    assert_eq!(kevast.size().await.unwrap(), 1);

    kevast.clear().await.unwrap();
    assert_eq!(kevast.size().await.unwrap(), 0);
}

#[test]
fn test_sqlite_under_sync_facade() {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig::from_json(
        &serde_json::json!({
            "master": {"kind": "sqlite", "path": dir.path().join("main.db")},
            "redundancies": [{"kind": "memory"}]
        })
        .to_string(),
    )
    .unwrap();
    let (master, redundancies) = config.open().unwrap();
    let kevast = KevastSync::new(master, redundancies).unwrap();

    kevast.set("x", "1").unwrap();
    kevast.set("y", "2").unwrap();

    assert_eq!(kevast.keys().unwrap().collect::<Vec<_>>(), vec!["x", "y"]);
    assert!(kevast.has("y").unwrap());
}

#[test]
fn test_unopenable_database_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig::from_json(
        &serde_json::json!({
            "master": {"kind": "sqlite", "path": dir.path().join("missing").join("main.db")}
        })
        .to_string(),
    )
    .unwrap();

    assert!(matches!(
        config.open(),
        Err(kevast_cli::ConfigError::Sqlite { .. })
    ));
}
