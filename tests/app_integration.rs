use chrono::NaiveDate;
use fxsync::core::config::AppConfig;
use fxsync::core::rate::RateKey;
use fxsync::core::store::RateStore;
use fxsync::store::disk::DiskRateStore;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod test_utils {
    use super::*;

    /// Writes a config pointing at `server` with no request delay.
    pub fn write_config(dir: &TempDir, server_uri: &str, sync_section: &str) -> String {
        let config_path = dir.path().join("config.yaml");
        let data_path = dir.path().join("data");
        let config_content = format!(
            r#"
sync:
{sync_section}
provider:
  kind: open_exchange_rates
  base_url: "{server_uri}"
  max_attempts: 2
  request_delay_ms: 0
retention_days: 1
data_path: "{}"
"#,
            data_path.display()
        );
        fs::write(&config_path, config_content).expect("Failed to write config file");
        config_path.to_str().unwrap().to_string()
    }

    pub async fn mount_latest(server: &MockServer, base: &str, body: &str) {
        Mock::given(method("GET"))
            .and(path("/latest.json"))
            .and(query_param("base", base))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(server)
            .await;
    }

    pub fn stored_rate(dir: &Path, date: NaiveDate, from: &str, to: &str) -> Option<f64> {
        let store = DiskRateStore::open(&dir.join("data").join("rates")).unwrap();
        store
            .find(&RateKey::new(date, from, to))
            .unwrap()
            .map(|r| r.rate)
    }
}

const SYNC_USD: &str = r#"
  enabled: true
  api_key: "test-key"
  base_currencies: ["usd"]
  target_currencies: ["EUR", "GBP"]
  cross_rate_conversion: true"#;

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
}

#[test_log::test(tokio::test)]
async fn test_sync_stores_direct_inverse_and_cross_rates() {
    let server = MockServer::start().await;
    test_utils::mount_latest(
        &server,
        "USD",
        r#"{"base": "USD", "rates": {"EUR": 0.9, "GBP": 0.8}}"#,
    )
    .await;
    let dir = TempDir::new().unwrap();
    let config_path = test_utils::write_config(&dir, &server.uri(), SYNC_USD);

    let result = fxsync::run_command(
        fxsync::AppCommand::Sync {
            base: None,
            date: Some(date()),
            dry_run: false,
        },
        Some(&config_path),
    )
    .await;
    assert!(result.is_ok(), "Sync failed with: {:?}", result.err());

    let stored = |from, to| test_utils::stored_rate(dir.path(), date(), from, to);
    assert_eq!(stored("USD", "EUR"), Some(0.9));
    assert_eq!(stored("EUR", "USD"), Some(1.0 / 0.9));
    assert_eq!(stored("GBP", "USD"), Some(1.0 / 0.8));
    assert_eq!(stored("EUR", "GBP"), Some(0.8 / 0.9));
    assert_eq!(stored("GBP", "EUR"), Some(1.0 / (0.8 / 0.9)));
}

#[test_log::test(tokio::test)]
async fn test_dry_run_leaves_store_untouched() {
    let server = MockServer::start().await;
    test_utils::mount_latest(&server, "USD", r#"{"rates": {"EUR": 0.9, "GBP": 0.8}}"#).await;
    let dir = TempDir::new().unwrap();
    let config_path = test_utils::write_config(&dir, &server.uri(), SYNC_USD);

    let result = fxsync::run_command(
        fxsync::AppCommand::Sync {
            base: None,
            date: Some(date()),
            dry_run: true,
        },
        Some(&config_path),
    )
    .await;
    assert!(result.is_ok(), "Dry run failed with: {:?}", result.err());

    assert!(!dir.path().join("data").exists());
}

#[test_log::test(tokio::test)]
async fn test_sync_retries_then_fails_on_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/latest.json"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(2)
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();
    let config_path = test_utils::write_config(&dir, &server.uri(), SYNC_USD);

    let result = fxsync::run_command(
        fxsync::AppCommand::Sync {
            base: None,
            date: Some(date()),
            dry_run: false,
        },
        Some(&config_path),
    )
    .await;

    let err = result.expect_err("Sync should fail when every base fails");
    assert!(
        err.to_string()
            .contains("API request failed for base USD with status code 500"),
        "unexpected error: {err}"
    );
    assert_eq!(test_utils::stored_rate(dir.path(), date(), "USD", "EUR"), None);
}

#[test_log::test(tokio::test)]
async fn test_sync_disabled_makes_no_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();
    let config_path = test_utils::write_config(
        &dir,
        &server.uri(),
        r#"
  enabled: false
  api_key: "test-key"
  base_currencies: ["USD"]
  target_currencies: ["EUR"]"#,
    );

    let result = fxsync::run_command(
        fxsync::AppCommand::Sync {
            base: None,
            date: Some(date()),
            dry_run: false,
        },
        Some(&config_path),
    )
    .await;

    let err = result.expect_err("Disabled sync should report failure");
    assert_eq!(
        err.to_string(),
        "Exchange rate sync is disabled in the sync configuration"
    );
}

#[test_log::test(tokio::test)]
async fn test_single_base_resync() {
    let server = MockServer::start().await;
    test_utils::mount_latest(&server, "EUR", r#"{"rates": {"GBP": 0.85, "USD": 1.1}}"#).await;
    Mock::given(method("GET"))
        .and(path("/latest.json"))
        .and(query_param("base", "USD"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();
    let config_path = test_utils::write_config(&dir, &server.uri(), SYNC_USD);

    let result = fxsync::run_command(
        fxsync::AppCommand::Sync {
            base: Some("eur".to_string()),
            date: Some(date()),
            dry_run: false,
        },
        Some(&config_path),
    )
    .await;
    assert!(result.is_ok(), "Resync failed with: {:?}", result.err());

    assert_eq!(
        test_utils::stored_rate(dir.path(), date(), "EUR", "GBP"),
        Some(0.85)
    );
    // No USD rates were fetched, so nothing is derived.
    assert_eq!(
        test_utils::stored_rate(dir.path(), date(), "GBP", "USD"),
        None
    );
}

#[test_log::test(tokio::test)]
async fn test_resync_rejects_malformed_base() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();
    let config_path = test_utils::write_config(&dir, &server.uri(), SYNC_USD);

    let result = fxsync::run_command(
        fxsync::AppCommand::Sync {
            base: Some("A/B".to_string()),
            date: Some(date()),
            dry_run: false,
        },
        Some(&config_path),
    )
    .await;

    let err = result.expect_err("Malformed base should be refused");
    assert!(err.to_string().contains("Invalid currency code"), "unexpected error: {err}");
}

#[test_log::test(tokio::test)]
async fn test_sweep_removes_records_older_than_retention() {
    let dir = TempDir::new().unwrap();
    let config_path = test_utils::write_config(&dir, "http://127.0.0.1:9", SYNC_USD);
    let today = chrono::Local::now().date_naive();
    let old = today - chrono::Duration::days(5);
    let yesterday = today - chrono::Duration::days(1);
    {
        let store = DiskRateStore::open(&dir.path().join("data").join("rates")).unwrap();
        for day in [old, yesterday] {
            store
                .insert(&fxsync::core::RateRecord::new(
                    RateKey::new(day, "USD", "EUR"),
                    0.9,
                ))
                .unwrap();
        }
        store.commit().unwrap();
    }

    let result = fxsync::run_command(fxsync::AppCommand::Sweep, Some(&config_path)).await;
    assert!(result.is_ok(), "Sweep failed with: {:?}", result.err());

    assert_eq!(test_utils::stored_rate(dir.path(), old, "USD", "EUR"), None);
    assert_eq!(
        test_utils::stored_rate(dir.path(), yesterday, "USD", "EUR"),
        Some(0.9)
    );
}

#[test_log::test(tokio::test)]
async fn test_connection_result_is_recorded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/usage.json"))
        .and(query_param("app_id", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{
                "status": 200,
                "data": {
                    "app_id": "test-key",
                    "status": "active",
                    "plan": {
                        "name": "Developer",
                        "quota": "10,000 requests / month",
                        "features": {"base": true}
                    },
                    "usage": {
                        "requests": 12, "requests_quota": 10000, "requests_remaining": 9988,
                        "days_elapsed": 2, "days_remaining": 28, "daily_average": 6
                    }
                }
            }"#,
        ))
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();
    let config_path = test_utils::write_config(&dir, &server.uri(), SYNC_USD);

    let result = fxsync::run_command(fxsync::AppCommand::TestConnection, Some(&config_path)).await;
    assert!(result.is_ok(), "Connection test failed with: {:?}", result.err());

    let usage = fxsync::run_command(fxsync::AppCommand::Usage, Some(&config_path)).await;
    assert!(usage.is_ok(), "Usage failed with: {:?}", usage.err());

    let config = AppConfig::load_from_path(&config_path).unwrap();
    let connection = config.connection.expect("connection result saved");
    assert!(connection.success);
    assert_eq!(connection.plan, "Developer");
    assert_eq!(connection.base_option, "All Currencies");
    // The rest of the configuration survives the save.
    assert_eq!(config.sync.base_currencies, vec!["USD"]);
}

#[test_log::test(tokio::test)]
async fn test_currency_mutations_are_saved() {
    let dir = TempDir::new().unwrap();
    let config_path = test_utils::write_config(&dir, "http://127.0.0.1:9", SYNC_USD);

    fxsync::run_command(fxsync::AppCommand::AddBase("gbp".into()), Some(&config_path))
        .await
        .unwrap();
    fxsync::run_command(fxsync::AppCommand::RemoveTarget("gbp".into()), Some(&config_path))
        .await
        .unwrap();
    let invalid =
        fxsync::run_command(fxsync::AppCommand::AddTarget("EURO".into()), Some(&config_path)).await;
    assert!(invalid.is_err());

    let config = AppConfig::load_from_path(&config_path).unwrap();
    assert_eq!(config.sync.base_currencies, vec!["USD", "GBP"]);
    assert_eq!(config.sync.target_currencies, vec!["EUR"]);
}
