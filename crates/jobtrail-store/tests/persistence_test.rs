use jobtrail_core::{JobKey, SiteId, Timestamp};
use jobtrail_sites::JobDescriptor;
use jobtrail_store::{RecordStore, SqliteStore, StoredJob};
use tempfile::TempDir;

fn descriptor(site: &str, id: &str) -> JobDescriptor {
    JobDescriptor {
        site: SiteId::new(site).expect("valid site"),
        local_id: Some(id.to_string()),
        title: "Rust Engineer".to_string(),
        company: "Acme".to_string(),
        location: "Remote".to_string(),
    }
}

#[tokio::test]
async fn test_records_survive_reopen() {
    let tmp = TempDir::new().expect("create temp dir");
    let path = tmp.path().join("data").join("jobtrail.db");
    let key = JobKey::from_local_id("42").expect("valid key");

    {
        let store = SqliteStore::open(&path).await.expect("open store");
        let entry = StoredJob::merge(None, &descriptor("linkedin", "42"), "42", Timestamp::now());
        store.set(&key, &entry).await.expect("set");
        store.close().await;
    }

    let store = SqliteStore::open(&path).await.expect("reopen store");
    let existing = store.get(&key).await.expect("get");
    assert!(existing.is_some());

    let merged = StoredJob::merge(existing, &descriptor("xing", "42"), "42", Timestamp::now());
    store.set(&key, &merged).await.expect("set merged");

    let stored = store.get(&key).await.expect("get").expect("entry present");
    let sites: Vec<&str> = stored.job.sites().map(SiteId::as_str).collect();
    assert_eq!(sites, vec!["linkedin", "xing"]);
}

#[tokio::test]
async fn test_persisted_value_matches_wire_shape() {
    let store = SqliteStore::in_memory().await.expect("open store");
    let key = JobKey::from_local_id("123").expect("valid key");
    let entry = StoredJob::merge(None, &descriptor("stepstone", "123"), "123", Timestamp::now());
    store.set(&key, &entry).await.expect("set");

    let (raw,): (String,) = sqlx::query_as("SELECT value FROM job_records WHERE key = 'job_123'")
        .fetch_one(store.pool())
        .await
        .expect("fetch raw value");

    let json: serde_json::Value = serde_json::from_str(&raw).expect("valid JSON");
    assert_eq!(json["job"]["occurrences"]["stepstone"], "123");
    assert!(json["job"]["savedAt"].is_i64());
}
