//! Integration tests for the generation client against a local mock server.

use tiny_http::{Response, Server};

use imgduel::genai::{ClientConfig, GenAiClient, MODEL_FLASH};
use imgduel::{BattleSession, Error, ImageRef};

/// Start a server that answers every request with the same status and body.
/// Returns the base URL to point the client at.
fn serve(status: u16, body: &'static str) -> String {
    let server = Server::http("127.0.0.1:0").unwrap();
    let port = server.server_addr().to_ip().unwrap().port();
    std::thread::spawn(move || {
        for request in server.incoming_requests() {
            let resp = Response::from_string(body)
                .with_status_code(status)
                .with_header(
                    "Content-Type: application/json"
                        .parse::<tiny_http::Header>()
                        .unwrap(),
                );
            let _ = request.respond(resp);
        }
    });
    format!("http://127.0.0.1:{}", port)
}

fn client_for(base_url: String) -> GenAiClient {
    let mut config = ClientConfig::new("test-key");
    config.base_url = base_url;
    GenAiClient::new(config).unwrap()
}

const IMAGE_RESPONSE: &str = r#"{"candidates":[{"content":{"parts":[
    {"text":"here you go"},
    {"inlineData":{"mimeType":"image/png","data":"AAAA"}}
]}}]}"#;

#[tokio::test]
async fn generate_returns_the_first_inline_image() {
    let client = client_for(serve(200, IMAGE_RESPONSE));
    let image = client
        .generate(MODEL_FLASH, "a red square", &[])
        .await
        .unwrap();
    // The payload is not a decodable PNG, so the watermark pass returns the
    // original handle untouched.
    assert_eq!(image.as_str(), "data:image/png;base64,AAAA");
}

#[tokio::test]
async fn references_allow_an_empty_prompt() {
    let client = client_for(serve(200, IMAGE_RESPONSE));
    let reference = ImageRef::from_bytes("image/jpeg", &[0xFF, 0xD8]);
    let image = client
        .generate(MODEL_FLASH, "   ", &[reference])
        .await
        .unwrap();
    assert_eq!(image.mime_type(), "image/png");
}

#[tokio::test]
async fn http_403_maps_to_permission_denied() {
    let client = client_for(serve(403, r#"{"error":{"status":"PERMISSION_DENIED"}}"#));
    let err = client.generate(MODEL_FLASH, "anything", &[]).await.unwrap_err();
    assert!(err.is_permission_denied());
}

#[tokio::test]
async fn permission_denied_body_is_detected_even_on_http_200() {
    let client = client_for(serve(200, r#"{"error":{"status":"PERMISSION_DENIED"}}"#));
    let err = client.generate(MODEL_FLASH, "anything", &[]).await.unwrap_err();
    assert!(err.is_permission_denied());
}

#[tokio::test]
async fn server_error_carries_the_status_and_body() {
    let client = client_for(serve(500, r#"{"error":"overloaded"}"#));
    let err = client.generate(MODEL_FLASH, "anything", &[]).await.unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("500"), "unexpected error: {}", msg);
    assert!(msg.contains("overloaded"), "unexpected error: {}", msg);
}

#[tokio::test]
async fn empty_candidates_is_a_generation_error() {
    let client = client_for(serve(200, r#"{"candidates":[]}"#));
    let err = client.generate(MODEL_FLASH, "anything", &[]).await.unwrap_err();
    assert!(matches!(err, Error::GenerationError(_)));
}

#[tokio::test]
async fn permission_failure_flips_the_session_credentials_flag() {
    let client = client_for(serve(403, r#"{"error":{"status":"PERMISSION_DENIED"}}"#));
    let mut session = BattleSession::new(client);
    assert!(session.credentials_verified());

    let outcome = session.run("a prompt", &[]).await.unwrap();
    assert!(outcome.left.result.is_err());
    assert!(outcome.right.result.is_err());
    assert!(!outcome.is_complete());
    assert!(!session.credentials_verified());

    session.mark_credentials_verified();
    assert!(session.credentials_verified());
}

#[tokio::test]
async fn panels_resolve_independently() {
    // Both panels succeed against the same server; each carries its own
    // latency and result rather than sharing one.
    let client = client_for(serve(200, IMAGE_RESPONSE));
    let mut session = BattleSession::new(client);
    let outcome = session.run("a prompt", &[]).await.unwrap();
    assert!(outcome.is_complete());
    assert_ne!(outcome.left.model_id, outcome.right.model_id);
    assert_eq!(outcome.left.label, "NANO");
    assert_eq!(outcome.right.label, "PRO");
    assert!(session.credentials_verified());
}

#[tokio::test]
async fn describe_collects_text_parts() {
    let client = client_for(serve(
        200,
        r#"{"candidates":[{"content":{"parts":[{"text":"a watercolor of "},{"text":"a harbor"}]}}]}"#,
    ));
    let image = ImageRef::from_bytes("image/png", &[1, 2, 3]);
    let prompt = client.describe(&image).await.unwrap();
    assert_eq!(prompt, "a watercolor of a harbor");
}
