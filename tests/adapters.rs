//! HTTP-level adapter tests against a local mock server.

use std::net::TcpListener;
use std::time::{Duration, Instant};

use mockito::{Matcher, Server};
use storyboard_ai::{
    service, AppSettings, AspectRatio, ErrorKind, GenerationConfig, Provider, ProviderAdapter,
    ProviderRouter,
};

fn router() -> ProviderRouter {
    ProviderRouter::new(reqwest::Client::new(), None)
}

/// A local address that accepts connections and never answers.
fn silent_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    std::thread::spawn(move || {
        let mut held = Vec::new();
        for stream in listener.incoming().flatten() {
            held.push(stream);
        }
    });
    format!("http://{addr}")
}

/// A local address with nothing listening.
fn closed_port() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

fn rest_settings(provider: Provider, base_url: String) -> AppSettings {
    AppSettings { base_url: Some(base_url), ..AppSettings::new(provider, "test-key") }
}

#[tokio::test]
async fn api_error_carries_status_and_provider_message() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .with_status(429)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error":{"message":"rate limited"}}"#)
        .create_async()
        .await;

    let settings = rest_settings(Provider::Custom, server.url());
    let err = router().generate_text("hi", "sys", &settings).await.unwrap_err();

    mock.assert_async().await;
    assert_eq!(err.kind(), ErrorKind::ApiError);
    let message = err.to_string();
    assert!(message.contains("429"), "{message}");
    assert!(message.contains("rate limited"), "{message}");
}

#[tokio::test]
async fn chat_image_prefers_images_array() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .match_header("authorization", "Bearer test-key")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "model": "google/gemini-3-pro-image-preview",
            "modalities": ["image", "text"],
        })))
        .with_status(200)
        .with_body(
            r#"{"choices":[{"message":{
                "content":"Here it is ![x](https://cdn.example.com/markdown.png)",
                "images":[{"image_url":{"url":"data:image/png;base64,iVBORw0KGgo="}}]
            }}]}"#,
        )
        .create_async()
        .await;

    let settings = rest_settings(Provider::Custom, format!("{}/", server.url()));
    let config = GenerationConfig::new("External", "a lighthouse");
    let artifact = router().generate_image(&config, &settings).await.unwrap();

    mock.assert_async().await;
    assert_eq!(artifact, "data:image/png;base64,iVBORw0KGgo=");
}

#[tokio::test]
async fn chat_image_with_null_images_uses_markdown() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_body(
            r#"{"choices":[{"message":{"content":"![x](https://cdn.example.com/a.png)","images":null}}]}"#,
        )
        .create_async()
        .await;

    let settings = rest_settings(Provider::Custom, server.url());
    let config = GenerationConfig::new("External", "a lighthouse");
    let artifact = router().generate_image(&config, &settings).await.unwrap();
    assert_eq!(artifact, "https://cdn.example.com/a.png");
}

#[tokio::test]
async fn chat_image_without_reference_is_no_image_found() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_body(r#"{"choices":[{"message":{"content":"I cannot draw that."}}]}"#)
        .create_async()
        .await;

    let settings = rest_settings(Provider::Custom, server.url());
    let config = GenerationConfig::new("External", "a lighthouse");
    let err = router().generate_image(&config, &settings).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NoImageFound);
}

#[tokio::test]
async fn classic_endpoint_returns_base64_artifact() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/images/generations")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "model": "dall-e-3",
            "size": "1792x1024",
            "response_format": "b64_json",
        })))
        .with_status(200)
        .with_body(r#"{"data":[{"b64_json":"iVBORw0KGgo="}]}"#)
        .create_async()
        .await;

    let settings = rest_settings(Provider::OpenAi, server.url());
    let config = GenerationConfig::new("External", "a harbor at dawn")
        .with_aspect_ratio(AspectRatio::Landscape);
    let artifact = router().generate_image(&config, &settings).await.unwrap();

    mock.assert_async().await;
    assert_eq!(artifact, "data:image/png;base64,iVBORw0KGgo=");
}

#[tokio::test]
async fn classic_endpoint_refuses_variations_without_calling_out() {
    let mut server = Server::new_async().await;
    let mock = server.mock("POST", Matcher::Any).expect(0).create_async().await;

    let settings = rest_settings(Provider::OpenAi, server.url());
    let err = service::generate_image_variation(
        &router(),
        "https://cdn.example.com/in.png",
        "make it night",
        "nano-banana",
        &settings,
    )
    .await
    .unwrap_err();

    mock.assert_async().await;
    assert_eq!(err.kind(), ErrorKind::UnsupportedOperation);
}

#[tokio::test]
async fn native_image_returns_inline_data() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/gemini-2.5-flash-image:generateContent")
        .match_header("x-goog-api-key", "g-key")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "generationConfig": {"imageConfig": {"aspectRatio": "9:16"}}
        })))
        .with_status(200)
        .with_body(
            r#"{"candidates":[{"content":{"parts":[
                {"text":"Here you go"},
                {"inlineData":{"mimeType":"image/png","data":"iVBORw0KGgo="}}
            ]}}]}"#,
        )
        .create_async()
        .await;

    let router = router().with_native_base_url(server.url());
    let settings = AppSettings::new(Provider::Google, "g-key");
    let config =
        GenerationConfig::new("nano-banana", "a fox").with_aspect_ratio(AspectRatio::Portrait);
    let artifact = router.generate_image(&config, &settings).await.unwrap();

    mock.assert_async().await;
    assert_eq!(artifact, "data:image/png;base64,iVBORw0KGgo=");
}

#[tokio::test]
async fn native_text_only_response_is_no_image_data() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", Matcher::Regex(":generateContent$".into()))
        .with_status(200)
        .with_body(r#"{"candidates":[{"content":{"parts":[{"text":"no can do"}]}}]}"#)
        .create_async()
        .await;

    let router = router().with_native_base_url(server.url());
    let settings = AppSettings::new(Provider::Google, "g-key");
    let config = GenerationConfig::new("nano-banana-pro", "a fox");
    let err = router.generate_image(&config, &settings).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NoImageData);
}

#[tokio::test]
async fn unreachable_input_image_is_fetch_error() {
    let mut server = Server::new_async().await;
    server.mock("GET", "/missing.png").with_status(404).create_async().await;
    let generate = server.mock("POST", Matcher::Any).expect(0).create_async().await;

    let router = router().with_native_base_url(server.url());
    let settings = AppSettings::new(Provider::Google, "g-key");
    let err = service::generate_image_variation(
        &router,
        &format!("{}/missing.png", server.url()),
        "make it night",
        "nano-banana",
        &settings,
    )
    .await
    .unwrap_err();

    generate.assert_async().await;
    assert_eq!(err.kind(), ErrorKind::FetchError);
}

#[tokio::test]
async fn native_variation_sends_fetched_image_inline() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/in.jpg")
        .with_status(200)
        .with_header("content-type", "image/jpeg")
        .with_body([1u8, 2, 3])
        .create_async()
        .await;
    let mock = server
        .mock("POST", "/gemini-2.5-flash-image:generateContent")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "contents": [{"parts": [
                {"inlineData": {"mimeType": "image/jpeg", "data": "AQID"}},
                {"text": "Change category: Lighting. Directive: Golden hour."}
            ]}]
        })))
        .with_status(200)
        .with_body(
            r#"{"candidates":[{"content":{"parts":[
                {"inlineData":{"mimeType":"image/png","data":"iVBORw0KGgo="}}
            ]}}]}"#,
        )
        .create_async()
        .await;

    let router = router().with_native_base_url(server.url());
    let settings = AppSettings::new(Provider::Google, "g-key");
    let artifacts = service::generate_variation_batch(
        &router,
        &format!("{}/in.jpg", server.url()),
        "Lighting",
        &["Golden hour".to_string()],
        "nano-banana",
        &settings,
    )
    .await
    .unwrap();

    mock.assert_async().await;
    assert_eq!(artifacts, vec!["data:image/png;base64,iVBORw0KGgo=".to_string()]);
}

#[tokio::test]
async fn silent_endpoint_times_out_as_network_failure() {
    let settings = AppSettings {
        timeout: Duration::from_secs(1),
        ..rest_settings(Provider::Custom, format!("{}/v1", silent_server()))
    };

    let started = Instant::now();
    let err = router().generate_text("hi", "sys", &settings).await.unwrap_err();

    assert!(started.elapsed() < Duration::from_secs(10));
    assert_eq!(err.kind(), ErrorKind::NetworkFailure);
    let message = err.to_string();
    assert!(message.contains("timed out"), "{message}");
    assert!(message.contains("/v1/chat/completions"), "{message}");
}

#[tokio::test]
async fn refused_connection_explains_network_failure() {
    let settings = rest_settings(Provider::Custom, closed_port());
    let config = GenerationConfig::new("External", "a lighthouse");
    let err = router().generate_image(&config, &settings).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NetworkFailure);
    assert!(matches!(err, storyboard_ai::GenerationError::Network { .. }), "{err:?}");
    let message = err.to_string();
    assert!(message.contains("Check your internet connection, proxy or CORS settings"), "{message}");
}

#[tokio::test]
async fn silent_image_host_times_out_as_fetch_error() {
    let client = reqwest::Client::new();
    let url = format!("{}/in.png", silent_server());

    let started = Instant::now();
    let err = storyboard_ai::image_ref::to_inline_bytes(&client, &url, Duration::from_secs(1))
        .await
        .unwrap_err();

    assert!(started.elapsed() < Duration::from_secs(10));
    assert_eq!(err.kind(), ErrorKind::FetchError);
}
