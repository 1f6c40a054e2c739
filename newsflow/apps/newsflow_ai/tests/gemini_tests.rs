use std::time::Duration;

use async_trait::async_trait;
use newsflow_ai::gemini::{summarize_article, ArticleBrief, GeminiClient, TextGenerator};
use newsflow_ai::{validate_key, AiError, GeminiCfg, KeyValidationPolicy, KeyVerdict};
use wiremock::matchers::{body_string_contains, header, method, path, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

const KEY: &str = "AIzaTestKey";

fn client_for(server: &MockServer) -> GeminiClient {
    GeminiClient::new(&GeminiCfg {
        base_url: server.uri(),
        model: "gemini-test".into(),
        generation_timeout_secs: 5,
        validation_timeout_secs: 5,
        validation_policy: KeyValidationPolicy::Lenient,
    })
    .unwrap()
}

fn reply(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "candidates": [{"content": {"role": "model", "parts": [{"text": text}]}}]
    }))
}

#[tokio::test]
async fn generate_posts_prompt_and_joins_parts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-test:generateContent"))
        .and(header("x-goog-api-key", KEY))
        .and(query_param_is_missing("key"))
        .and(body_string_contains("Title: Solar record"))
        .respond_with(reply("A long article."))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let brief = ArticleBrief { title: "Solar record".into(), ..Default::default() };
    let text = summarize_article(&client, KEY, &brief, Duration::from_secs(5)).await.unwrap();
    assert_eq!(text, "A long article.");
}

#[tokio::test]
async fn empty_candidates_are_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"candidates": []})))
        .mount(&server)
        .await;

    let err = client_for(&server).generate(KEY, "Hello").await.unwrap_err();
    assert!(matches!(err, AiError::EmptyResponse));
}

#[tokio::test]
async fn rejected_key_is_invalid() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": {"code": 400, "message": "API key not valid. Please pass a valid API key.", "status": "INVALID_ARGUMENT"}
        })))
        .mount(&server)
        .await;

    let verdict = validate_key(
        &client_for(&server),
        KEY,
        KeyValidationPolicy::Lenient,
        Duration::from_secs(5),
    )
    .await;
    assert_eq!(verdict, KeyVerdict::Invalid);
}

#[tokio::test]
async fn working_key_is_valid() {
    let server = MockServer::start().await;
    Mock::given(method("POST")).respond_with(reply("Hi!")).mount(&server).await;

    let verdict = validate_key(
        &client_for(&server),
        KEY,
        KeyValidationPolicy::Strict,
        Duration::from_secs(5),
    )
    .await;
    assert_eq!(verdict, KeyVerdict::Valid);
}

#[tokio::test]
async fn inconclusive_errors_follow_the_policy() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("backend overloaded"))
        .mount(&server)
        .await;
    let client = client_for(&server);

    let lenient = validate_key(&client, KEY, KeyValidationPolicy::Lenient, Duration::from_secs(5)).await;
    assert_eq!(lenient, KeyVerdict::AssumedValid);
    assert!(lenient.is_usable());

    let strict = validate_key(&client, KEY, KeyValidationPolicy::Strict, Duration::from_secs(5)).await;
    assert_eq!(strict, KeyVerdict::Invalid);
}

struct Stalled;

#[async_trait]
impl TextGenerator for Stalled {
    async fn generate(&self, _api_key: &str, _prompt: &str) -> Result<String, AiError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok("late".into())
    }
}

#[tokio::test]
async fn deadline_expiry_follows_the_policy() {
    let deadline = Duration::from_millis(20);
    assert_eq!(
        validate_key(&Stalled, KEY, KeyValidationPolicy::Lenient, deadline).await,
        KeyVerdict::AssumedValid
    );
    assert_eq!(
        validate_key(&Stalled, KEY, KeyValidationPolicy::Strict, deadline).await,
        KeyVerdict::Invalid
    );

    let err = summarize_article(&Stalled, KEY, &ArticleBrief::default(), deadline)
        .await
        .unwrap_err();
    assert!(matches!(err, AiError::Timeout));
}

#[tokio::test]
async fn malformed_keys_never_reach_upstream() {
    assert_eq!(
        validate_key(&Stalled, "", KeyValidationPolicy::Lenient, Duration::from_secs(1)).await,
        KeyVerdict::Invalid
    );
    assert_eq!(
        validate_key(&Stalled, "sk-not-google", KeyValidationPolicy::Lenient, Duration::from_secs(1)).await,
        KeyVerdict::Invalid
    );
}

#[tokio::test]
async fn network_errors_never_mention_the_key() {
    // nothing listens on the discard port
    let client = GeminiClient::new(&GeminiCfg {
        base_url: "http://127.0.0.1:9".into(),
        model: "gemini-test".into(),
        generation_timeout_secs: 2,
        validation_timeout_secs: 2,
        validation_policy: KeyValidationPolicy::Lenient,
    })
    .unwrap();

    let err = client.generate(KEY, "Hello").await.unwrap_err();
    assert!(!err.to_string().contains(KEY), "{err}");
    assert!(!format!("{err:?}").contains(KEY), "{err:?}");
}

#[tokio::test]
async fn undecodable_replies_never_mention_the_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = client_for(&server).generate(KEY, "Hello").await.unwrap_err();
    assert!(matches!(err, AiError::Network(_)));
    assert!(!err.to_string().contains(KEY), "{err}");
}
