//! Common test utilities for pay-service integration tests.

#![allow(dead_code)]

use pay_service::config::{DatabaseConfig, EftConfig, PayConfig};
use pay_service::startup::Application;
use rust_decimal::Decimal;
use secrecy::Secret;
use serde_json::{json, Value};
use service_core::config::Config as CommonConfig;
use std::sync::Once;
use uuid::Uuid;

pub const STAFF_USER: &str = "staff-user";
pub const INVOICE_PREFIX: &str = "REG";

static INIT: Once = Once::new();

/// Initialize tracing for tests (only once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,pay_service=debug,sqlx=warn")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

pub fn test_config(database_url: String) -> PayConfig {
    PayConfig {
        common: CommonConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        service_name: "pay-service-test".to_string(),
        service_version: "test".to_string(),
        log_level: "debug".to_string(),
        otlp_endpoint: None,
        database: DatabaseConfig {
            url: Secret::new(database_url),
            max_connections: 4,
            min_connections: 1,
        },
        eft: EftConfig {
            invoice_prefix: INVOICE_PREFIX.to_string(),
        },
    }
}

/// Unique value so tests sharing one database do not see each other's rows.
pub fn unique(prefix: &str) -> String {
    format!("{}-{}", prefix, &Uuid::new_v4().simple().to_string()[..12])
}

pub fn money(value: &Value) -> Decimal {
    value
        .as_str()
        .expect("money is serialized as a string")
        .parse()
        .expect("money parses as a decimal")
}

pub struct TestApp {
    pub address: String,
    pub http_port: u16,
    pub client: reqwest::Client,
}

/// Spawn the application against `TEST_DATABASE_URL`, running migrations.
pub async fn spawn_app() -> TestApp {
    init_tracing();

    let database_url = std::env::var("TEST_DATABASE_URL")
        .expect("TEST_DATABASE_URL must be set to run PostgreSQL tests");

    let app = Application::build(test_config(database_url))
        .await
        .expect("Failed to build application");

    let http_port = app.http_port();
    let address = format!("http://127.0.0.1:{}", http_port);

    tokio::spawn(async move {
        app.run_until_stopped().await.ok();
    });

    let client = reqwest::Client::new();
    for _ in 0..50 {
        if client
            .get(format!("{}/health", address))
            .send()
            .await
            .is_ok()
        {
            break;
        }
        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
    }

    TestApp {
        address,
        http_port,
        client,
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.address, path)
    }

    /// Request builder carrying staff identity headers.
    pub fn staff(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, self.url(path))
            .header("X-User-ID", STAFF_USER)
            .header("X-User-Roles", "staff")
    }

    pub async fn create_account(&self, payment_method: &str) -> String {
        let account_id = unique("acct");
        let response = self
            .staff(reqwest::Method::POST, "/accounts")
            .json(&json!({
                "accountId": account_id,
                "name": "Test Account",
                "paymentMethod": payment_method
            }))
            .send()
            .await
            .expect("Failed to create account");
        assert_eq!(response.status().as_u16(), 201);
        account_id
    }

    /// Create a single-line invoice and return its id.
    pub async fn create_invoice(&self, account_id: &str, total: &str) -> i64 {
        let response = self
            .staff(
                reqwest::Method::POST,
                &format!("/accounts/{}/invoices", account_id),
            )
            .json(&json!({
                "businessIdentifier": "BC1234567",
                "lineItems": [{"description": "Filing fee", "total": total}]
            }))
            .send()
            .await
            .expect("Failed to create invoice");
        assert_eq!(response.status().as_u16(), 201);
        let body: Value = response.json().await.expect("invoice json");
        body["id"].as_i64().expect("invoice id")
    }

    pub async fn get_invoice(&self, invoice_id: i64) -> Value {
        self.staff(reqwest::Method::GET, &format!("/invoices/{}", invoice_id))
            .send()
            .await
            .expect("Failed to get invoice")
            .json()
            .await
            .expect("invoice json")
    }

    /// Post an EFT file with one credit per amount, all under `short_name`.
    pub async fn ingest(&self, short_name: &str, amounts: &[&str]) -> Value {
        let credits: Vec<Value> = amounts
            .iter()
            .map(|amount| json!({"shortName": short_name, "amount": amount}))
            .collect();

        let response = self
            .staff(reqwest::Method::POST, "/eft-files")
            .json(&json!({"fileRef": unique("file"), "credits": credits}))
            .send()
            .await
            .expect("Failed to post EFT file");
        assert_eq!(response.status().as_u16(), 201);
        response.json().await.expect("eft file json")
    }

    /// Id of the short name with this exact text.
    pub async fn short_name_id(&self, short_name: &str) -> i64 {
        let body: Value = self
            .staff(reqwest::Method::GET, "/eft-shortnames")
            .query(&[("includeAll", "true"), ("shortName", short_name)])
            .send()
            .await
            .expect("Failed to search short names")
            .json()
            .await
            .expect("search json");

        body["items"]
            .as_array()
            .and_then(|items| items.iter().find(|i| i["shortName"] == short_name))
            .and_then(|item| item["id"].as_i64())
            .expect("short name present")
    }

    pub async fn map(&self, short_name_id: i64, account_id: &str) -> reqwest::Response {
        self.staff(
            reqwest::Method::PATCH,
            &format!("/eft-shortnames/{}", short_name_id),
        )
        .json(&json!({ "accountId": account_id }))
        .send()
        .await
        .expect("Failed to map short name")
    }
}
