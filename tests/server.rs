mod common;

use std::sync::Arc;

use serde_json::{json, Value};
use tempfile::TempDir;

use common::{config_toml, write_assets, MODEL, SKEWED_MODEL};
use medpredict::assets::load_engine;
use medpredict::config::Config;
use medpredict::server::run_server_with;
use medpredict_core::{AuditSink, InMemoryAuditLog};

fn find_free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

async fn wait_for_server(port: u16) {
    let client = reqwest::Client::new();
    let url = format!("http://127.0.0.1:{}/api/health", port);
    for _ in 0..50 {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        if let Ok(resp) = client.get(&url).send().await {
            if resp.status().is_success() {
                return;
            }
        }
    }
    panic!("Server did not become ready within 5 seconds");
}

struct TestServer {
    _tmp: TempDir,
    base: String,
    audit: Arc<InMemoryAuditLog>,
    client: reqwest::Client,
}

impl TestServer {
    async fn start(model: &str) -> Self {
        let tmp = TempDir::new().unwrap();
        write_assets(&tmp.path().join("ml_assets"), model);

        let port = find_free_port();
        let bind = format!("127.0.0.1:{}", port);
        let cfg: Config = toml::from_str(&config_toml(tmp.path(), &bind)).unwrap();

        let (engine, _) = load_engine(&cfg).unwrap();
        let audit = Arc::new(InMemoryAuditLog::new());
        let sink: Arc<dyn AuditSink> = audit.clone();
        let engine = Arc::new(engine);

        tokio::spawn(async move {
            run_server_with(&cfg, engine, sink).await.unwrap();
        });
        wait_for_server(port).await;

        Self {
            _tmp: tmp,
            base: format!("http://127.0.0.1:{}", port),
            audit,
            client: reqwest::Client::new(),
        }
    }

    async fn get(&self, path: &str, user: Option<&str>) -> (u16, Value) {
        let mut req = self.client.get(format!("{}{}", self.base, path));
        if let Some(user) = user {
            req = req.header("X-User-Id", user);
        }
        let resp = req.send().await.unwrap();
        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap())
    }

    async fn post(&self, path: &str, body: Value, user: Option<&str>) -> (u16, Value) {
        let mut req = self
            .client
            .post(format!("{}{}", self.base, path))
            .json(&body);
        if let Some(user) = user {
            req = req.header("X-User-Id", user);
        }
        let resp = req.send().await.unwrap();
        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap())
    }
}

#[tokio::test]
async fn test_predict_success_shape() {
    let srv = TestServer::start(MODEL).await;

    let (status, body) = srv
        .post(
            "/api/ml/predict",
            json!({"symptoms": ["itching", "skin_rash", "bogus"]}),
            None,
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    assert_eq!(body["predicted_disease"], "Fungal infection");
    assert_eq!(body["confidence"], 1.0);
    assert_eq!(body["symptoms_detected"], json!(["itching", "skin_rash"]));
    assert_eq!(body["invalid_symptoms"], json!(["bogus"]));
    assert_eq!(body["total_symptoms"], 2);
    assert!(body["description"].as_str().unwrap().starts_with("Fungal"));
    assert_eq!(body["precautions"].as_array().unwrap().len(), 4);
    assert_eq!(body["workout"].as_array().unwrap().len(), 2);
    assert_eq!(body["model_version"], "2.1.0");
    assert!(body["timestamp"].is_string());
    assert!(body.get("user_id").is_none());

    // anonymous successes are audited, without an id in the response
    assert_eq!(srv.audit.len(), 1);
    assert!(body.get("prediction_id").is_none());
}

#[tokio::test]
async fn test_predict_order_independent() {
    let srv = TestServer::start(MODEL).await;

    let (_, a) = srv
        .post("/api/ml/predict", json!({"symptoms": ["headache", "itching", "skin_rash"]}), None)
        .await;
    let (_, b) = srv
        .post("/api/ml/predict", json!({"symptoms": ["skin_rash", "headache", "itching"]}), None)
        .await;
    assert_eq!(a["predicted_disease"], b["predicted_disease"]);
    assert_eq!(a["confidence"], b["confidence"]);
}

#[tokio::test]
async fn test_predict_no_valid_symptoms_is_400() {
    let srv = TestServer::start(MODEL).await;

    let (status, body) = srv
        .post("/api/ml/predict", json!({"symptoms": ["not_a_real_symptom"]}), None)
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["success"], false);
    assert_eq!(body["invalid_symptoms"], json!(["not_a_real_symptom"]));
    assert_eq!(body["error"], "No valid symptoms provided");
    assert!(body.get("predicted_disease").is_none());
    assert!(srv.audit.is_empty());
}

#[tokio::test]
async fn test_predict_rejects_malformed_requests() {
    let srv = TestServer::start(MODEL).await;

    for body in [
        json!({}),
        json!({"symptoms": "itching"}),
        json!({"symptoms": []}),
        json!({"symptoms": ["itching", 3]}),
        json!({"symptoms": ["a", "b", "c", "d"]}),
        json!(["itching"]),
    ] {
        let (status, resp) = srv.post("/api/ml/predict", body.clone(), None).await;
        assert_eq!(status, 400, "body {} should be rejected", body);
        assert_eq!(resp["success"], false);
        assert_eq!(resp["error"]["code"], "bad_request");
    }

    let resp = srv
        .client
        .post(format!("{}/api/ml/predict", srv.base))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
}

#[tokio::test]
async fn test_catalog_skew_is_500_and_health_degrades() {
    let srv = TestServer::start(SKEWED_MODEL).await;

    let (status, body) = srv
        .post("/api/ml/predict", json!({"symptoms": ["itching"]}), None)
        .await;
    assert_eq!(status, 500);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Prediction failed");
    assert_eq!(body["symptoms_detected"], json!(["itching"]));
    assert!(srv.audit.is_empty());

    let (status, body) = srv.get("/api/ml/health", None).await;
    assert_eq!(status, 503);
    assert_eq!(body["test_prediction"], false);
}

#[tokio::test]
async fn test_authenticated_prediction_and_history() {
    let srv = TestServer::start(MODEL).await;

    let (status, _) = srv
        .post("/api/ml/predict-authenticated", json!({"symptoms": ["headache"]}), None)
        .await;
    assert_eq!(status, 401);

    let (status, first) = srv
        .post(
            "/api/ml/predict-authenticated",
            json!({"symptoms": ["headache"]}),
            Some("user-1"),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(first["user_id"], "user-1");
    assert!(first["prediction_id"].is_string());

    srv.post(
        "/api/ml/predict-authenticated",
        json!({"symptoms": ["high_fever"]}),
        Some("user-1"),
    )
    .await;
    srv.post("/api/ml/predict", json!({"symptoms": ["itching"]}), None)
        .await;

    let (status, _) = srv.get("/api/ml/history", None).await;
    assert_eq!(status, 401);

    let (status, body) = srv.get("/api/ml/history?limit=5", Some("user-1")).await;
    assert_eq!(status, 200);
    assert_eq!(body["count"], 2);
    let history = body["history"].as_array().unwrap();
    assert_eq!(history[0]["predicted_disease"], "Malaria");
    assert_eq!(history[1]["predicted_disease"], "Migraine");
    assert_eq!(history[1]["id"], first["prediction_id"]);
    assert_eq!(history[0]["metadata"]["source"], "authenticated_prediction");

    let (_, body) = srv.get("/api/ml/history?limit=1", Some("user-1")).await;
    assert_eq!(body["count"], 1);
}

#[tokio::test]
async fn test_symptom_and_disease_listing() {
    let srv = TestServer::start(MODEL).await;

    let (status, body) = srv.get("/api/ml/symptoms/list", None).await;
    assert_eq!(status, 200);
    assert_eq!(
        body["symptoms"],
        json!(["headache", "high_fever", "itching", "skin_rash"])
    );
    assert_eq!(body["total_count"], 4);

    let (_, body) = srv.get("/api/ml/diseases/list", None).await;
    assert_eq!(body["diseases"], json!(["Fungal infection", "Malaria", "Migraine"]));
    assert_eq!(body["total_count"], 3);
}

#[tokio::test]
async fn test_symptom_search_bounds() {
    let srv = TestServer::start(MODEL).await;

    let (status, _) = srv.get("/api/ml/symptoms/search", None).await;
    assert_eq!(status, 400);

    let (status, body) = srv.get("/api/ml/symptoms/search?q=h", None).await;
    assert_eq!(status, 400);
    assert!(body["message"].as_str().unwrap().contains("at least 2"));

    let (status, body) = srv.get("/api/ml/symptoms/search?q=xyzzynotfound", None).await;
    assert_eq!(status, 200);
    assert_eq!(body["count"], 0);

    let (_, body) = srv.get("/api/ml/symptoms/search?q=IN&limit=1", None).await;
    assert_eq!(body["symptoms"], json!(["itching"]));
    assert_eq!(body["query"], "IN");

    let (_, body) = srv.get("/api/ml/symptoms/search?q=in&limit=9999", None).await;
    assert_eq!(body["symptoms"], json!(["itching", "skin_rash"]));

    let (status, _) = srv.get("/api/ml/symptoms/search?q=in&limit=many", None).await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn test_validate_symptoms() {
    let srv = TestServer::start(MODEL).await;

    let (status, body) = srv
        .post(
            "/api/ml/validate-symptoms",
            json!({"symptoms": [" itching ", "fever", "zzz"]}),
            None,
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    assert_eq!(body["valid_symptoms"], json!(["itching"]));
    assert_eq!(body["invalid_symptoms"], json!(["fever", "zzz"]));
    assert_eq!(body["suggestions"], json!({"fever": ["high_fever"]}));
    assert_eq!(body["validation_summary"], json!({"total": 3, "valid": 1, "invalid": 2}));

    let (status, _) = srv
        .post("/api/ml/validate-symptoms", json!({"symptoms": "itching"}), None)
        .await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn test_model_info_and_health() {
    let srv = TestServer::start(MODEL).await;

    let (status, body) = srv.get("/api/ml/model/info", None).await;
    assert_eq!(status, 200);
    let info = &body["model_info"];
    assert_eq!(info["kind"], "linear_ovr");
    assert_eq!(info["features"], 4);
    assert_eq!(info["labels"], 3);
    assert_eq!(info["total_symptoms"], 4);
    assert_eq!(info["total_diseases"], 3);
    assert_eq!(info["metadata"]["algorithm"], "linear");

    let (status, body) = srv.get("/api/ml/health", None).await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["test_prediction"], true);
    assert_eq!(body["symptoms_count"], 4);

    let (_, body) = srv.get("/api/health", None).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}
