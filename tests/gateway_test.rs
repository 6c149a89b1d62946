// SPDX-License-Identifier: MIT
//! Integration tests for the stdio JSON-RPC gateway against scripted
//! helper processes.

#![cfg(unix)]

use mcpstore::gateway::{Gateway, GatewayError, StdioGateway};

/// Replies to every request with its own method name as the result, and
/// emits an id-less notification line before each response.
const ECHO_HELPER: &str = r#"
while IFS= read -r line; do
  id=$(printf '%s' "$line" | sed -n 's/.*"id":\([0-9]*\).*/\1/p')
  method=$(printf '%s' "$line" | sed -n 's/.*"method":"\([^"]*\)".*/\1/p')
  printf '{"method":"gateway.log","params":{"message":"working"}}\n'
  printf '{"jsonrpc":"2.0","id":%s,"result":"%s"}\n' "$id" "$method"
done
"#;

const FAILING_HELPER: &str = r#"
while IFS= read -r line; do
  id=$(printf '%s' "$line" | sed -n 's/.*"id":\([0-9]*\).*/\1/p')
  printf '{"jsonrpc":"2.0","id":%s,"error":{"code":-32000,"message":"uv not found"}}\n' "$id"
done
"#;

async fn spawn_helper(script: &str) -> StdioGateway {
    StdioGateway::spawn("sh", &["-c".to_string(), script.to_string()])
        .await
        .unwrap()
}

#[tokio::test]
async fn responses_pair_with_their_requests_under_concurrency() {
    let gateway = spawn_helper(ECHO_HELPER).await;

    // Independent user actions may call the gateway concurrently; each
    // caller must get the answer to its own request, never a neighbor's.
    let (env, uv, bun) = tokio::join!(
        gateway.ensure_environment(),
        gateway.check_uv_version(),
        gateway.check_bun_version(),
    );

    assert_eq!(env.unwrap(), "ensure_environment");
    assert_eq!(uv.unwrap(), "check_uv_version");
    assert_eq!(bun.unwrap(), "check_bun_version");
}

#[tokio::test]
async fn id_less_notification_lines_are_skipped() {
    let gateway = spawn_helper(ECHO_HELPER).await;
    // The helper emits a notification before every response.
    let result = gateway.check_uv_version().await.unwrap();
    assert_eq!(result, "check_uv_version");
}

#[tokio::test]
async fn helper_errors_surface_as_call_failures() {
    let gateway = spawn_helper(FAILING_HELPER).await;
    let err = gateway.ensure_environment().await.unwrap_err();
    assert!(matches!(err, GatewayError::Call { .. }));
    assert!(err.to_string().contains("uv not found"));
}

#[tokio::test]
async fn exited_helper_reports_an_error() {
    let gateway = spawn_helper("exit 0").await;
    // Broken pipe or closed stdout, depending on timing; either way the
    // call fails instead of hanging.
    assert!(gateway.ensure_environment().await.is_err());
}
