use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use axum::{Json, Router, extract::Query, http::StatusCode, response::IntoResponse, routing::get};
use metrics_util::debugging::DebuggingRecorder;
use serde_json::json;
use url::Url;

use tagfeed::application::query::QueryService;
use tagfeed::cache::TagCache;
use tagfeed::config::UpstreamSettings;
use tagfeed::domain::posts::{SortDirection, SortKey};
use tagfeed::infra::{telemetry, upstream::HttpPostSource};

#[derive(serde::Deserialize)]
struct TagParam {
    tag: String,
}

async fn stub_posts(Query(params): Query<TagParam>) -> axum::response::Response {
    if params.tag == "down" {
        return StatusCode::BAD_GATEWAY.into_response();
    }
    Json(json!({
        "posts": [
            {
                "id": 3,
                "author": "Jon Abbott",
                "authorId": 4,
                "likes": 10,
                "popularity": 0.5,
                "reads": 100,
                "tags": [params.tag]
            }
        ]
    }))
    .into_response()
}

#[tokio::test]
async fn query_paths_emit_expected_metric_keys() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");
    telemetry::describe_metrics();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub upstream");
    let addr = listener.local_addr().expect("stub address");
    let app = Router::new().route("/posts", get(stub_posts));
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("stub upstream");
    });

    let source = HttpPostSource::new(&UpstreamSettings {
        endpoint: Url::parse(&format!("http://{addr}/posts")).expect("endpoint"),
        tag_param: "tag".to_string(),
        request_timeout: Duration::from_secs(5),
        max_retries: 0,
        retry_backoff: Duration::from_millis(5),
    })
    .expect("client builds");
    let service = QueryService::new(Arc::new(TagCache::default()), Arc::new(source));

    // miss, then hit
    for _ in 0..2 {
        let posts = service
            .query("tech", SortKey::Likes, SortDirection::Desc)
            .await
            .expect("query succeeds");
        assert_eq!(posts.ids(), vec![3]);
    }
    service
        .query("tech,down", SortKey::Id, SortDirection::Asc)
        .await
        .expect_err("upstream failure");

    let names: HashSet<String> = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .map(|(composite_key, _, _, _)| composite_key.key().name().to_string())
        .collect();

    let expected = [
        "tagfeed_tag_cache_hit_total",
        "tagfeed_tag_cache_miss_total",
        "tagfeed_upstream_fetch_total",
        "tagfeed_upstream_error_total",
        "tagfeed_fanout_ms",
    ];

    for metric in expected {
        assert!(names.contains(metric), "missing metric: {metric}");
    }
}
