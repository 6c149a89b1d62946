//! JSON-RPC 2.0 gateway client over a helper subprocess's stdio.
//!
//! `StdioGateway` spawns the native helper once and keeps it alive for the
//! whole session; each call writes one request line to its stdin and reads
//! one response line from its stdout. Request ids are monotonically
//! increasing integers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout};
use tokio::sync::Mutex;
use tracing::debug;

use crate::clients::ClientType;
use crate::registry::AppDescriptor;
use crate::status::AppStatuses;

use super::{Gateway, GatewayError};

/// Both ends of the helper's stdio, locked together so one request/response
/// exchange is never interleaved with another.
struct GatewayIo {
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

/// A live connection to the native helper process.
pub struct StdioGateway {
    command: String,
    /// The child process (kept alive for the duration of the session).
    _child: Child,
    io: Mutex<GatewayIo>,
    next_id: AtomicU64,
}

impl StdioGateway {
    /// Spawn the helper subprocess and open its stdio pipes.
    pub async fn spawn(command: &str, args: &[String]) -> Result<Self, GatewayError> {
        let mut cmd = tokio::process::Command::new(command);
        cmd.args(args);
        cmd.stdin(std::process::Stdio::piped());
        cmd.stdout(std::process::Stdio::piped());
        cmd.stderr(std::process::Stdio::null());

        let mut child = cmd
            .spawn()
            .map_err(|e| GatewayError::Unavailable(format!("failed to spawn '{command}': {e}")))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| GatewayError::Unavailable("helper stdin not available".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| GatewayError::Unavailable("helper stdout not available".into()))?;

        debug!(command, "gateway helper spawned");

        Ok(Self {
            command: command.to_string(),
            _child: child,
            io: Mutex::new(GatewayIo {
                stdin,
                stdout: BufReader::new(stdout),
            }),
            next_id: AtomicU64::new(1),
        })
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Send a JSON-RPC request and read back its response.
    ///
    /// The io lock is held across the whole exchange, so concurrent callers
    /// serialize and can never read each other's responses. Lines whose id
    /// does not match the request (helper notifications, stray output) are
    /// skipped.
    async fn send_request(&self, method: &str, params: Value) -> Result<Value, GatewayError> {
        let id = self.next_id();
        let req = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params
        });
        let mut line = serde_json::to_string(&req)
            .map_err(|e| GatewayError::Protocol(e.to_string()))?;
        line.push('\n');

        let mut io = self.io.lock().await;
        io.stdin.write_all(line.as_bytes()).await?;
        io.stdin.flush().await?;

        // One JSON object per line.
        loop {
            let mut buf = String::new();
            let read = io.stdout.read_line(&mut buf).await?;
            if read == 0 {
                return Err(GatewayError::Unavailable(format!(
                    "helper '{}' closed stdout unexpectedly",
                    self.command
                )));
            }

            let resp: Value = serde_json::from_str(buf.trim())
                .map_err(|e| GatewayError::Protocol(format!("bad response for {method}: {e}")))?;

            if resp.get("id").and_then(Value::as_u64) != Some(id) {
                debug!(method, "skipping out-of-band gateway message");
                continue;
            }

            if let Some(error) = resp.get("error") {
                let message = error
                    .get("message")
                    .and_then(|m| m.as_str())
                    .unwrap_or("unknown error")
                    .to_string();
                return Err(GatewayError::call(method, message));
            }

            return Ok(resp.get("result").cloned().unwrap_or(Value::Null));
        }
    }

    async fn call_string(&self, method: &str, params: Value) -> Result<String, GatewayError> {
        let result = self.send_request(method, params).await?;
        result
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| GatewayError::Protocol(format!("{method}: expected string result")))
    }

    async fn call_bool(&self, method: &str, params: Value) -> Result<bool, GatewayError> {
        let result = self.send_request(method, params).await?;
        result
            .as_bool()
            .ok_or_else(|| GatewayError::Protocol(format!("{method}: expected boolean result")))
    }
}

#[async_trait]
impl Gateway for StdioGateway {
    async fn ensure_environment(&self) -> Result<String, GatewayError> {
        self.call_string("ensure_environment", Value::Null).await
    }

    async fn get_app_registry(&self) -> Result<Vec<AppDescriptor>, GatewayError> {
        let result = self.send_request("get_app_registry", Value::Null).await?;
        serde_json::from_value(result)
            .map_err(|e| GatewayError::Protocol(format!("get_app_registry: {e}")))
    }

    async fn refresh_app_registry(&self) -> Result<Vec<AppDescriptor>, GatewayError> {
        let result = self.send_request("refresh_app_registry", Value::Null).await?;
        serde_json::from_value(result)
            .map_err(|e| GatewayError::Protocol(format!("refresh_app_registry: {e}")))
    }

    async fn get_app_statuses(&self, client: ClientType) -> Result<AppStatuses, GatewayError> {
        let result = self
            .send_request("get_app_statuses", json!({ "client": client.as_str() }))
            .await?;
        serde_json::from_value(result)
            .map_err(|e| GatewayError::Protocol(format!("get_app_statuses: {e}")))
    }

    async fn is_app_installed(
        &self,
        app_name: &str,
        client: ClientType,
    ) -> Result<bool, GatewayError> {
        self.call_bool(
            "is_app_installed",
            json!({ "appName": app_name, "client": client.as_str() }),
        )
        .await
    }

    async fn is_app_configured(&self, app_name: &str) -> Result<bool, GatewayError> {
        self.call_bool("is_app_configured", json!({ "appName": app_name }))
            .await
    }

    async fn install(
        &self,
        app_name: &str,
        env_vars: Option<&HashMap<String, String>>,
        client: ClientType,
    ) -> Result<String, GatewayError> {
        self.call_string(
            "install",
            json!({
                "appName": app_name,
                "envVars": env_vars,
                "client": client.as_str()
            }),
        )
        .await
    }

    async fn uninstall(&self, app_name: &str, client: ClientType) -> Result<String, GatewayError> {
        self.call_string(
            "uninstall",
            json!({ "appName": app_name, "client": client.as_str() }),
        )
        .await
    }

    async fn get_app_env(&self, app_name: &str) -> Result<HashMap<String, String>, GatewayError> {
        let result = self
            .send_request("get_app_env", json!({ "appName": app_name }))
            .await?;
        serde_json::from_value(result)
            .map_err(|e| GatewayError::Protocol(format!("get_app_env: {e}")))
    }

    async fn save_app_env(
        &self,
        app_name: &str,
        values: &HashMap<String, String>,
    ) -> Result<(), GatewayError> {
        self.send_request(
            "save_app_env",
            json!({ "appName": app_name, "values": values }),
        )
        .await?;
        Ok(())
    }

    async fn restart_client_app(&self, client: ClientType) -> Result<String, GatewayError> {
        self.call_string("restart_client_app", json!({ "client": client.as_str() }))
            .await
    }

    async fn check_client_installed(&self, client: ClientType) -> Result<bool, GatewayError> {
        self.call_bool(
            "check_client_installed",
            json!({ "client": client.as_str() }),
        )
        .await
    }

    async fn check_uv_version(&self) -> Result<String, GatewayError> {
        self.call_string("check_uv_version", Value::Null).await
    }

    async fn check_bun_version(&self) -> Result<String, GatewayError> {
        self.call_string("check_bun_version", Value::Null).await
    }
}
