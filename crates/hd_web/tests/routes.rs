use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use hd_core::{
    DigestConfig, Error, Extractor, Feed, ItemId, Result, StoryDetail, Summarizer, Summary,
};
use hd_digest::{ConsoleSender, DigestPipeline, Shutdown};
use hd_storage::MemoryStorage;
use hd_web::{create_app, AppState};
use serde_json::{json, Value};
use tokio::sync::Semaphore;
use tower::ServiceExt;

/// Serves stories 1 and 2; `gate` must grant a permit before the id
/// list is returned, `down` makes the listing fail.
struct TestFeed {
    gate: Option<Arc<Semaphore>>,
    down: bool,
}

#[async_trait]
impl Feed for TestFeed {
    async fn top_stories(&self) -> Result<Vec<ItemId>> {
        if let Some(gate) = &self.gate {
            let _permit = gate.acquire().await.map_err(|e| Error::Feed(e.to_string()))?;
        }
        if self.down {
            return Err(Error::Feed("503 from upstream".to_string()));
        }
        Ok(vec![1, 2])
    }

    async fn get_item(&self, id: ItemId) -> Result<StoryDetail> {
        Ok(StoryDetail {
            id,
            title: format!("Story {}", id),
            url: format!("https://example.com/{}", id),
            score: id as u32 * 10,
            descendants: 0,
        })
    }
}

struct EchoExtractor;

#[async_trait]
impl Extractor for EchoExtractor {
    async fn extract(&self, url: &str) -> Result<String> {
        Ok(format!("content at {}", url))
    }
}

struct FixedTags;

#[async_trait]
impl Summarizer for FixedTags {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn summarize(&self, title: &str, _content: &str) -> Result<Summary> {
        Ok(Summary {
            summary: title.to_string(),
            tags: vec!["databases".to_string()],
        })
    }
}

fn app_with(feed: TestFeed) -> (Router, Arc<DigestPipeline>) {
    let store = Arc::new(MemoryStorage::new());
    let config = DigestConfig {
        digest_size: 1,
        ..DigestConfig::default()
    };
    let pipeline = Arc::new(DigestPipeline::new(
        Arc::new(feed),
        Arc::new(EchoExtractor),
        Arc::new(FixedTags),
        Arc::new(ConsoleSender::new()),
        store,
        config,
    ));
    let app = create_app(AppState::new(pipeline.clone(), Shutdown::new()));
    (app, pipeline)
}

fn app() -> Router {
    app_with(TestFeed { gate: None, down: false }).0
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder().method(method).uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn digest_then_reaction_updates_preferences() {
    let app = app();

    let response = app.clone().oneshot(empty_request("POST", "/api/digest")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let report = body_json(response).await;
    let delivered = report["delivered"].as_array().unwrap();
    assert_eq!(delivered.len(), 1);
    // Same tags everywhere, so engagement decides: story 2 scores 20.
    assert_eq!(delivered[0]["id"], 2);
    let message_id = delivered[0]["message_id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/reactions", json!({"message_id": message_id, "reaction": "👍"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let outcome = body_json(response).await;
    assert_eq!(outcome["outcome"], "liked");
    assert_eq!(outcome["item_id"], 2);

    let response = app.oneshot(empty_request("GET", "/api/preferences")).await.unwrap();
    let prefs = body_json(response).await;
    assert_eq!(prefs[0]["tag"], "databases");
    assert_eq!(prefs[0]["weight"], 1.5);
}

#[tokio::test]
async fn telegram_webhook_forwards_positive_reactions_only() {
    let app = app();
    let response = app.clone().oneshot(empty_request("POST", "/api/digest")).await.unwrap();
    let message_id = body_json(response).await["delivered"][0]["message_id"].as_i64().unwrap();

    let update = json!({
        "update_id": 10,
        "message_reaction": {
            "message_id": message_id,
            "new_reaction": [{"type": "emoji", "emoji": "👍"}]
        }
    });
    let response = app.clone().oneshot(json_request("POST", "/telegram/webhook", update)).await.unwrap();
    assert_eq!(body_json(response).await["outcome"], "liked");

    let update = json!({"update_id": 11, "message": {"message_id": 1, "text": "/start"}});
    let response = app.clone().oneshot(json_request("POST", "/telegram/webhook", update)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["outcome"], "ignored");

    let update = json!({
        "update_id": 12,
        "message_reaction": {"message_id": message_id, "new_reaction": [{"type": "emoji", "emoji": "👎"}]}
    });
    let response = app.oneshot(json_request("POST", "/telegram/webhook", update)).await.unwrap();
    assert_eq!(body_json(response).await["outcome"], "ignored");
}

#[tokio::test]
async fn feed_outage_is_bad_gateway() {
    let (app, _) = app_with(TestFeed { gate: None, down: true });
    let response = app.oneshot(empty_request("POST", "/api/digest")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert!(body_json(response).await["error"].as_str().unwrap().contains("503"));
}

#[tokio::test]
async fn overlapping_trigger_is_conflict() {
    let gate = Arc::new(Semaphore::new(0));
    let (app, pipeline) = app_with(TestFeed {
        gate: Some(gate.clone()),
        down: false,
    });

    let first = tokio::spawn(app.clone().oneshot(empty_request("POST", "/api/digest")));
    tokio::time::timeout(Duration::from_secs(5), async {
        while !pipeline.is_running() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();

    let response = app.oneshot(empty_request("POST", "/api/digest")).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    gate.add_permits(1);
    let response = first.await.unwrap().unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn settings_roundtrip_and_validation() {
    let app = app();

    let response = app.clone().oneshot(empty_request("GET", "/api/settings/chat_id")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(json_request("PUT", "/api/settings/chat_id", json!({"value": "123456"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.clone().oneshot(empty_request("GET", "/api/settings/chat_id")).await.unwrap();
    assert_eq!(body_json(response).await, json!({"key": "chat_id", "value": "123456"}));

    let response = app
        .clone()
        .oneshot(json_request("PUT", "/api/settings/digest_size", json!({"value": "zero"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.oneshot(empty_request("GET", "/health")).await.unwrap();
    assert_eq!(body_json(response).await["status"], "ok");
}
