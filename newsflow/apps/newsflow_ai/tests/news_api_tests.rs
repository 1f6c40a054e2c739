use newsflow_ai::news_api::{ArticleSource, NewsApiClient};
use newsflow_ai::{AiError, NewsCfg};
use wiremock::matchers::{header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> NewsApiClient {
    NewsApiClient::new(&NewsCfg {
        api_key: "test-key".into(),
        base_url: server.uri(),
        request_timeout_secs: 2,
    })
    .unwrap()
}

#[tokio::test]
async fn top_headlines_sends_category_and_page_size() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/top-headlines"))
        .and(header("X-Api-Key", "test-key"))
        .and(query_param_is_missing("apiKey"))
        .and(query_param("category", "science"))
        .and(query_param("language", "en"))
        .and(query_param("pageSize", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "ok",
            "totalResults": 2,
            "articles": [
                {"source": {"id": null, "name": "Lab"}, "title": "Comet", "url": "https://x.test/1"},
                {"source": {"id": null, "name": "Lab"}, "title": "Quasar", "url": "https://x.test/2"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let articles = client_for(&server).top_headlines("science", 20).await.unwrap();
    assert_eq!(articles.len(), 2);
    assert_eq!(articles[0].title.as_deref(), Some("Comet"));
    assert_eq!(articles[1].source.as_ref().and_then(|s| s.name.as_deref()), Some("Lab"));
}

#[tokio::test]
async fn search_sorts_by_relevancy() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/everything"))
        .and(query_param("q", "rust lang"))
        .and(query_param("sortBy", "relevancy"))
        .and(query_param("pageSize", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "ok",
            "articles": [{"title": "Ferris", "url": "https://x.test/ferris"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let articles = client_for(&server).search("rust lang", 10).await.unwrap();
    assert_eq!(articles.len(), 1);
}

#[tokio::test]
async fn missing_articles_field_is_an_empty_listing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/top-headlines"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "ok"})))
        .mount(&server)
        .await;

    let articles = client_for(&server).top_headlines("general", 20).await.unwrap();
    assert!(articles.is_empty());
}

#[tokio::test]
async fn non_success_status_is_an_upstream_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/top-headlines"))
        .respond_with(ResponseTemplate::new(401).set_body_string("apiKeyInvalid"))
        .mount(&server)
        .await;

    let err = client_for(&server).top_headlines("general", 20).await.unwrap_err();
    match err {
        AiError::Upstream { status, body } => {
            assert_eq!(status, 401);
            assert_eq!(body, "apiKeyInvalid");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn null_fields_do_not_sink_the_listing() {
    let server = MockServer::start().await;
    let listed = serde_json::json!([
        {"source": {"id": null, "name": "Lab"}, "author": null, "title": "Comet", "url": "https://x.test/1", "content": null},
        {"source": {"id": "wire", "name": "Wire"}, "author": "Ann", "title": null, "url": null, "content": "c"}
    ]);
    Mock::given(method("GET"))
        .and(path("/top-headlines"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "ok", "articles": listed})),
        )
        .mount(&server)
        .await;

    let articles = client_for(&server).top_headlines("science", 20).await.unwrap();
    assert_eq!(articles.len(), 2);
    assert_eq!(articles[1].title, None);

    let back = serde_json::to_value(&articles).unwrap();
    assert_eq!(back[0]["author"], serde_json::Value::Null);
    assert_eq!(back[0]["source"]["id"], serde_json::Value::Null);
    assert_eq!(back[1]["title"], serde_json::Value::Null);
    assert_eq!(back[1]["source"], listed[1]["source"]);
}

#[tokio::test]
async fn errors_never_mention_the_api_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let err = client_for(&server).top_headlines("general", 20).await.unwrap_err();
    assert!(matches!(err, AiError::Network(_)));
    assert!(!err.to_string().contains("test-key"), "{err}");
    assert!(!format!("{err:?}").contains("test-key"), "{err:?}");
}
