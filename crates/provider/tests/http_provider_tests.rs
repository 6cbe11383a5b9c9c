//! Provider tests against a local mock HTTP server

use mockito::Matcher;
use serde_json::json;
use zaprelay_provider::{
    CompletionParams, HuggingFaceProvider, OpenAiProvider, Provider, ProviderError,
};

fn params(prompt: &str) -> CompletionParams {
    CompletionParams {
        model: "gpt-3.5-turbo-instruct".to_string(),
        prompt: prompt.to_string(),
        max_tokens: 128,
        temperature: 0.0,
        stop: vec!["\nObservation:".to_string()],
    }
}

#[tokio::test]
async fn test_openai_completion_success() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/completions")
        .match_header("authorization", "Bearer sk-test")
        .match_body(Matcher::PartialJson(json!({
            "model": "gpt-3.5-turbo-instruct",
            "prompt": "Question: hi",
            "stop": ["\nObservation:"]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "choices": [{ "text": " I now know the final answer\nFinal Answer: hello", "finish_reason": "stop" }],
                "usage": { "prompt_tokens": 3, "completion_tokens": 9, "total_tokens": 12 }
            })
            .to_string(),
        )
        .create_async()
        .await;

    let provider = OpenAiProvider::new("sk-test", Some(format!("{}/v1", server.url())), None);
    let completion = provider.complete(params("Question: hi")).await.unwrap();

    assert!(completion.text.ends_with("Final Answer: hello"));
    assert_eq!(completion.usage.total_tokens, 12);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_openai_unauthorized() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/v1/completions")
        .with_status(401)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error":{"message":"Incorrect API key provided"}}"#)
        .create_async()
        .await;

    let provider = OpenAiProvider::new("sk-bad", Some(format!("{}/v1", server.url())), None);
    let result = provider.complete(params("q")).await;

    match result {
        Err(ProviderError::Unauthorized(msg)) => assert!(msg.contains("Incorrect API key")),
        other => panic!("Expected Unauthorized, got {:?}", other.map(|c| c.text)),
    }
}

#[tokio::test]
async fn test_openai_rate_limited() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/v1/completions")
        .with_status(429)
        .with_body("slow down")
        .create_async()
        .await;

    let provider = OpenAiProvider::new("sk-test", Some(format!("{}/v1", server.url())), None);
    let result = provider.complete(params("q")).await;
    assert!(matches!(result, Err(ProviderError::RateLimited)));
}

#[tokio::test]
async fn test_openai_without_key_makes_no_request() {
    let provider = OpenAiProvider::new("", Some("http://127.0.0.1:1".to_string()), None);
    let result = provider.complete(params("q")).await;
    assert!(matches!(result, Err(ProviderError::NoApiKey)));
}

#[tokio::test]
async fn test_hugging_face_generation_enforces_stop() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/models/tiiuae/falcon-40b")
        .match_header("authorization", "Bearer hf_token")
        .match_body(Matcher::PartialJson(json!({ "inputs": "Question: hi" })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!([{ "generated_text": " check mail\nAction: Gmail\nAction Input: latest\nObservation: made up" }])
                .to_string(),
        )
        .create_async()
        .await;

    let provider = HuggingFaceProvider::new("hf_token", Some(server.url()), None);
    let mut request = params("Question: hi");
    request.model = String::new();
    let completion = provider.complete(request).await.unwrap();

    assert_eq!(
        completion.text,
        " check mail\nAction: Gmail\nAction Input: latest"
    );
    mock.assert_async().await;
}

#[tokio::test]
async fn test_hugging_face_api_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/models/bigscience/bloom")
        .with_status(503)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error":"Model is currently loading"}"#)
        .create_async()
        .await;

    let provider = HuggingFaceProvider::new("hf_token", Some(server.url()), None);
    let mut request = params("q");
    request.model = "bigscience/bloom".to_string();

    match provider.complete(request).await {
        Err(ProviderError::Api(msg)) => assert_eq!(msg, "Model is currently loading"),
        _ => panic!("Expected Api error"),
    }
}

#[tokio::test]
async fn test_openai_partial_usage_is_tolerated() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/v1/completions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "choices": [{ "text": "Final Answer: ok", "finish_reason": "stop" }],
                "usage": { "total_tokens": 3 }
            })
            .to_string(),
        )
        .create_async()
        .await;

    let provider = OpenAiProvider::new("sk-test", Some(format!("{}/v1", server.url())), None);
    let completion = provider.complete(params("Question: hi")).await.unwrap();

    assert_eq!(completion.text, "Final Answer: ok");
    assert_eq!(completion.usage.prompt_tokens, 0);
    assert_eq!(completion.usage.total_tokens, 3);
}
