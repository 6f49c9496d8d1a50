//! Catalog refresh, validation and invocation against a mock catalog.

use cognition_tools::{ToolError, ToolRegistry};
use serde_json::{Value, json};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn catalog(server: &MockServer) -> Value {
    json!([
        {
            "name": "echo",
            "description": "Echo text back",
            "endpoint": format!("{}/run/echo", server.uri()),
            "parameters": {"text": ["string", "Text to echo"]}
        },
        {
            "name": "translate",
            "description": "Translate text",
            "endpoint": "run/translate",
            "parameters": {
                "text": ["str", "Text"],
                "lang": {"type": "str", "description": "Target", "required": false}
            },
            "cache_enabled": true,
            "cache_rules": {"lang": "en"}
        }
    ])
}

async fn mount_catalog(server: &MockServer, body: Value) {
    Mock::given(method("GET"))
        .and(path("/tools"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

fn registry(server: &MockServer) -> ToolRegistry {
    ToolRegistry::builder()
        .catalog_url(server.uri())
        .build()
        .expect("registry")
}

#[tokio::test]
async fn refresh_lists_tools_in_catalog_order() {
    let server = MockServer::start().await;
    mount_catalog(&server, catalog(&server)).await;

    let tools = registry(&server);
    assert_eq!(tools.refresh().await.unwrap(), 2);
    assert_eq!(tools.list(), vec!["echo", "translate"]);
    assert_eq!(tools.get("echo").unwrap().description(), "Echo text back");
}

#[tokio::test]
async fn echo_validates_then_returns_response_verbatim() {
    let server = MockServer::start().await;
    mount_catalog(&server, catalog(&server)).await;
    let reply = json!({"echo": "hi", "meta": {"n": [1, 2, 3]}});
    Mock::given(method("POST"))
        .and(path("/run/echo"))
        .and(body_json(json!({"text": "hi"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let tools = registry(&server);
    tools.refresh().await.unwrap();

    let err = tools.invoke("echo", &json!({})).await.unwrap_err();
    assert_eq!(err.error_code(), "INVALID_TOOL_ARGUMENTS");

    let err = tools.invoke("echo", &json!({"text": 7})).await.unwrap_err();
    assert!(matches!(err, ToolError::InvalidArguments { .. }));

    let result = tools.invoke("echo", &json!({"text": "hi"})).await.unwrap();
    assert_eq!(result, reply);
}

#[tokio::test]
async fn relative_endpoints_resolve_against_catalog() {
    let server = MockServer::start().await;
    mount_catalog(&server, catalog(&server)).await;
    Mock::given(method("POST"))
        .and(path("/run/translate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!("bonjour")))
        .mount(&server)
        .await;

    let tools = registry(&server);
    tools.refresh().await.unwrap();

    let args = json!({"text": "hello", "lang": "fr"});
    assert_eq!(tools.invoke("translate", &args).await.unwrap(), json!("bonjour"));
}

#[tokio::test]
async fn cache_policy_per_tool() {
    let server = MockServer::start().await;
    mount_catalog(&server, catalog(&server)).await;

    let tools = registry(&server);
    tools.refresh().await.unwrap();
    let result = json!({"ok": true});

    assert!(!tools.should_cache("echo", &json!({"text": "x"}), &result).unwrap());
    assert!(
        tools
            .should_cache("translate", &json!({"lang": "en", "text": "x"}), &result)
            .unwrap()
    );
    assert!(
        !tools
            .should_cache("translate", &json!({"lang": "fr", "text": "x"}), &result)
            .unwrap()
    );
    assert!(
        tools
            .should_cache("translate", &json!({"text": "x"}), &result)
            .unwrap()
    );
}

#[tokio::test]
async fn registry_wide_cache_switch() {
    let server = MockServer::start().await;
    mount_catalog(&server, catalog(&server)).await;

    let tools = ToolRegistry::builder()
        .catalog_url(server.uri())
        .cache_enabled(false)
        .build()
        .unwrap();
    tools.refresh().await.unwrap();

    assert!(
        !tools
            .should_cache("translate", &json!({"lang": "en"}), &Value::Null)
            .unwrap()
    );
}

#[tokio::test]
async fn failed_refresh_keeps_previous_snapshot() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tools"))
        .respond_with(ResponseTemplate::new(200).set_body_json(catalog(&server)))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/tools"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let tools = registry(&server);
    tools.refresh().await.unwrap();

    let err = tools.refresh().await.unwrap_err();
    assert_eq!(err.error_code(), "TOOL_CATALOG_UNAVAILABLE");
    assert_eq!(tools.list(), vec!["echo", "translate"]);
}

#[tokio::test]
async fn invalid_descriptor_rejects_whole_catalog() {
    let server = MockServer::start().await;
    mount_catalog(
        &server,
        json!([
            {"name": "ok", "description": "", "endpoint": "ok", "parameters": {}},
            {"name": "bad", "description": "", "endpoint": "bad",
             "parameters": {"when": ["datetime", "Moment"]}}
        ]),
    )
    .await;

    let tools = registry(&server);
    let err = tools.refresh().await.unwrap_err();
    assert!(err.to_string().contains("unknown type 'datetime'"));
    assert!(tools.list().is_empty());
}

#[tokio::test]
async fn duplicate_names_reject_catalog() {
    let server = MockServer::start().await;
    mount_catalog(
        &server,
        json!([
            {"name": "echo", "description": "", "endpoint": "a"},
            {"name": "echo", "description": "", "endpoint": "b"}
        ]),
    )
    .await;

    let err = registry(&server).refresh().await.unwrap_err();
    assert!(err.to_string().contains("duplicate tool name 'echo'"));
}

#[tokio::test]
async fn endpoint_failures_are_execution_errors() {
    let server = MockServer::start().await;
    mount_catalog(&server, catalog(&server)).await;
    Mock::given(method("POST"))
        .and(path("/run/echo"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let tools = registry(&server);
    tools.refresh().await.unwrap();

    let err = tools.invoke("echo", &json!({"text": "hi"})).await.unwrap_err();
    assert_eq!(err.error_code(), "TOOL_EXECUTION_FAILED");
    assert!(err.to_string().contains("boom"));
}

#[tokio::test]
async fn close_is_idempotent_under_concurrency() {
    let server = MockServer::start().await;
    mount_catalog(&server, catalog(&server)).await;

    let tools = std::sync::Arc::new(registry(&server));
    tools.refresh().await.unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let tools = tools.clone();
            tokio::spawn(async move { tools.close() })
        })
        .collect();

    let mut released = 0;
    for handle in handles {
        if handle.await.unwrap() {
            released += 1;
        }
    }
    assert_eq!(released, 1);

    let err = tools.invoke("echo", &json!({"text": "hi"})).await.unwrap_err();
    assert_eq!(err, ToolError::RegistryClosed);
}

#[tokio::test]
async fn tool_names_are_free_form() {
    let server = MockServer::start().await;
    mount_catalog(
        &server,
        json!([
            {"name": "search", "description": "", "endpoint": "search"},
            {"name": "web search", "description": "", "endpoint": "web-search",
             "parameters": {"query": "string"}},
            {"name": "files/read:v2", "description": "", "endpoint": "files"}
        ]),
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/web-search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["result"])))
        .mount(&server)
        .await;

    let tools = registry(&server);
    assert_eq!(tools.refresh().await.unwrap(), 3);
    assert_eq!(tools.list(), vec!["search", "web search", "files/read:v2"]);

    let reply = tools
        .invoke("web search", &json!({"query": "rust"}))
        .await
        .unwrap();
    assert_eq!(reply, json!(["result"]));
}

#[tokio::test]
async fn empty_tool_name_rejects_catalog() {
    let server = MockServer::start().await;
    mount_catalog(
        &server,
        json!([
            {"name": "echo", "description": "", "endpoint": "echo"},
            {"name": "  ", "description": "", "endpoint": "blank"}
        ]),
    )
    .await;

    let tools = registry(&server);
    let err = tools.refresh().await.unwrap_err();
    assert_eq!(err.error_code(), "TOOL_CATALOG_UNAVAILABLE");
    assert!(tools.list().is_empty());
}

#[tokio::test]
async fn close_during_refresh_leaves_no_tools() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tools"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(catalog(&server))
                .set_delay(std::time::Duration::from_millis(300)),
        )
        .mount(&server)
        .await;

    let tools = std::sync::Arc::new(registry(&server));
    let refreshing = {
        let tools = tools.clone();
        tokio::spawn(async move { tools.refresh().await })
    };

    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert!(tools.close());

    let err = refreshing.await.unwrap().unwrap_err();
    assert_eq!(err, ToolError::RegistryClosed);
    assert!(tools.list().is_empty());
    assert!(tools.get("echo").is_none());
}
