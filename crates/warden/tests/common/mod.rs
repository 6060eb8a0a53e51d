#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_file(true)
        .with_thread_ids(false)
        .with_target(false)
        .with_line_number(true)
        .try_init();
}

#[derive(Clone)]
struct StubState {
    status: Arc<Mutex<String>>,
    shutdown_ops: Arc<AtomicUsize>,
    describe_ops: Arc<AtomicUsize>,
    probed_attributes: Arc<Mutex<Vec<String>>>,
}

/// Loopback management endpoint answering the operations the controller
/// issues, with a scriptable status value and per-operation counters.
pub struct ManagementStub {
    addr: SocketAddr,
    state: StubState,
    handle: JoinHandle<()>,
}

impl ManagementStub {
    pub async fn start(initial_status: &str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = StubState {
            status: Arc::new(Mutex::new(initial_status.to_string())),
            shutdown_ops: Arc::new(AtomicUsize::new(0)),
            describe_ops: Arc::new(AtomicUsize::new(0)),
            probed_attributes: Arc::new(Mutex::new(Vec::new())),
        };

        let serve_state = state.clone();
        let handle = tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                tokio::spawn(handle_connection(stream, serve_state.clone()));
            }
        });

        Self { addr, state, handle }
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub fn set_status(&self, status: &str) {
        *self.state.status.lock().unwrap() = status.to_string();
    }

    pub fn shutdown_requests(&self) -> usize {
        self.state.shutdown_ops.load(Ordering::SeqCst)
    }

    pub fn describe_requests(&self) -> usize {
        self.state.describe_ops.load(Ordering::SeqCst)
    }

    pub fn probed_attributes(&self) -> Vec<String> {
        self.state.probed_attributes.lock().unwrap().clone()
    }
}

impl Drop for ManagementStub {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn handle_connection(mut stream: TcpStream, state: StubState) {
    // The client reuses connections, so answer requests until it hangs up.
    loop {
        let Some(body) = read_request(&mut stream).await else {
            return;
        };
        let Ok(operation) = serde_json::from_slice::<serde_json::Value>(&body) else {
            return;
        };

        let response_body = dispatch(&operation, &state);
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
            response_body.len(),
            response_body
        );
        if stream.write_all(response.as_bytes()).await.is_err() {
            return;
        }
    }
}

async fn read_request(stream: &mut TcpStream) -> Option<Vec<u8>> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];

    let header_end = loop {
        if let Some(pos) = find_subslice(&buf, b"\r\n\r\n") {
            break pos + 4;
        }
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let headers = String::from_utf8_lossy(&buf[..header_end]).to_ascii_lowercase();
    let content_length = headers
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|value| value.trim().parse::<usize>().ok())?;

    while buf.len() < header_end + content_length {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    Some(buf[header_end..header_end + content_length].to_vec())
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn dispatch(operation: &serde_json::Value, state: &StubState) -> String {
    match operation.get("operation").and_then(|v| v.as_str()) {
        Some("read-attribute") => {
            if let Some(name) = operation.get("name").and_then(|v| v.as_str()) {
                state
                    .probed_attributes
                    .lock()
                    .unwrap()
                    .push(name.to_string());
            }
            let status = state.status.lock().unwrap().clone();
            serde_json::json!({ "outcome": "success", "result": status }).to_string()
        }
        Some("read-resource") => {
            state.describe_ops.fetch_add(1, Ordering::SeqCst);
            serde_json::json!({
                "outcome": "success",
                "result": {
                    "product-name": "WildFly Full",
                    "product-version": "10.1.0.Final",
                    "release-version": "2.2.0.Final",
                },
            })
            .to_string()
        }
        Some("shutdown") | Some("stop-servers") => {
            state.shutdown_ops.fetch_add(1, Ordering::SeqCst);
            serde_json::json!({ "outcome": "success", "result": null }).to_string()
        }
        _ => serde_json::json!({
            "outcome": "failed",
            "failure-description": "unsupported operation",
        })
        .to_string(),
    }
}

/// A server installation whose JVM is a shell script, so lifecycle tests run
/// against a controllable child process. The script records its pid in
/// `$JBOSS_HOME/server.pid` before running `body`.
#[cfg(unix)]
pub struct FakeInstall {
    dir: tempfile::TempDir,
}

#[cfg(unix)]
impl FakeInstall {
    pub fn new(body: &str) -> Self {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let home = dir.path().join("home");
        std::fs::create_dir_all(home.join("modules")).unwrap();
        std::fs::write(home.join("jboss-modules.jar"), b"").unwrap();

        let bin = dir.path().join("jdk").join("bin");
        std::fs::create_dir_all(&bin).unwrap();
        let java = bin.join("java");
        let script = format!("#!/bin/sh\necho $$ > \"$JBOSS_HOME/server.pid\"\n{body}\n");
        std::fs::write(&java, script).unwrap();
        std::fs::set_permissions(&java, std::fs::Permissions::from_mode(0o755)).unwrap();

        Self { dir }
    }

    pub fn home(&self) -> std::path::PathBuf {
        self.dir.path().join("home")
    }

    pub fn java_home(&self) -> std::path::PathBuf {
        self.dir.path().join("jdk")
    }

    /// Pid recorded by the launched script, waiting briefly for it to appear.
    pub async fn pid(&self) -> Option<u32> {
        let pid_file = self.home().join("server.pid");
        for _ in 0..40 {
            if let Ok(contents) = std::fs::read_to_string(&pid_file) {
                if let Ok(pid) = contents.trim().parse() {
                    return Some(pid);
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        None
    }
}

/// Whether a process with `pid` still exists.
#[cfg(unix)]
pub fn process_alive(pid: u32) -> bool {
    nix::sys::signal::kill(nix::unistd::Pid::from_raw(pid as i32), None).is_ok()
}

/// Assert that the recorded process, if one was ever launched, is gone.
#[cfg(unix)]
pub async fn assert_process_gone(install: &FakeInstall) {
    let pid_file = install.home().join("server.pid");
    let Ok(contents) = std::fs::read_to_string(&pid_file) else {
        // The process was torn down before it recorded itself.
        return;
    };
    let pid: u32 = contents.trim().parse().unwrap();

    for _ in 0..40 {
        if !process_alive(pid) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("process {pid} is still alive");
}
