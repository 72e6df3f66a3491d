#![allow(dead_code)]

use serde_json::{json, Value as JsonValue};
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use zabbix_rpc::{HttpReply, HttpSender, TransportFailure};

pub const ENDPOINT: &str = "http://zabbix.test/api_jsonrpc.php";

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// What the stub answers for one request.
pub enum Reply {
    Result(JsonValue),
    Error { code: i64, message: &'static str, data: &'static str },
    Status(u16),
    Fail(TransportFailure),
}

type Route = dyn Fn(&str, &JsonValue) -> Reply + Send + Sync;

/// In-process `HttpSender` that routes by JSON-RPC method and counts every request.
pub struct StubSender {
    route: Box<Route>,
    requests: Mutex<Vec<JsonValue>>,
    calls: AtomicUsize,
}

impl StubSender {
    pub fn new(route: impl Fn(&str, &JsonValue) -> Reply + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self { route: Box::new(route), requests: Mutex::new(Vec::new()), calls: AtomicUsize::new(0) })
    }

    /// A server at `version` that accepts any login and answers everything else with `[]`.
    pub fn zabbix(version: &'static str) -> Arc<Self> {
        Self::new(move |method, _params| match method {
            "apiinfo.version" => Reply::Result(json!(version)),
            "user.login" => Reply::Result(json!("0424bd59b807674191e7d77572075f33")),
            "user.logout" => Reply::Result(json!(true)),
            _ => Reply::Result(json!([])),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn calls_to(&self, method: &str) -> usize {
        self.requests().iter().filter(|request| request["method"] == method).count()
    }

    pub fn requests(&self) -> Vec<JsonValue> {
        self.requests.lock().expect("requests mutex poisoned").clone()
    }

    pub fn last_request(&self, method: &str) -> Option<JsonValue> {
        self.requests().into_iter().rev().find(|request| request["method"] == method)
    }
}

impl HttpSender for StubSender {
    fn post(
        &self,
        _url: &str,
        _headers: &[(String, String)],
        body: &[u8],
    ) -> Result<HttpReply, TransportFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let request: JsonValue = serde_json::from_slice(body).expect("request body is json");
        self.requests.lock().expect("requests mutex poisoned").push(request.clone());

        let method = request["method"].as_str().unwrap_or_default().to_owned();
        let id = request["id"].clone();
        let envelope = match (self.route)(&method, &request["params"]) {
            Reply::Result(result) => json!({"jsonrpc": "2.0", "result": result, "id": id}),
            Reply::Error { code, message, data } => json!({
                "jsonrpc": "2.0",
                "error": {"code": code, "message": message, "data": data},
                "id": id
            }),
            Reply::Status(status) => return Ok(HttpReply { status, body: b"unavailable".to_vec() }),
            Reply::Fail(failure) => return Err(failure),
        };
        Ok(HttpReply::ok(envelope.to_string()))
    }
}

/// A request as the stub HTTP server saw it.
#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub headers: Vec<(String, String)>,
    pub body: JsonValue,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

type Handler = dyn Fn(&JsonValue) -> String + Send + Sync;

/// Minimal HTTP/1.1 server on a loopback port, one request per connection.
pub struct StubHttpServer {
    pub endpoint: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    stop: Arc<AtomicBool>,
    join: Option<JoinHandle<()>>,
}

impl StubHttpServer {
    pub fn start(handler: impl Fn(&JsonValue) -> (u16, String) + Send + Sync + 'static) -> Self {
        Self::start_raw(move |request| {
            let (status, payload) = handler(request);
            format!(
                "HTTP/1.1 {status} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{payload}",
                if status == 200 { "OK" } else { "Error" },
                payload.len()
            )
        })
    }

    /// Like [`StubHttpServer::start`], but `handler` writes the whole HTTP response itself.
    pub fn start_raw(handler: impl Fn(&JsonValue) -> String + Send + Sync + 'static) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub http listener");
        listener.set_nonblocking(true).expect("set listener non-blocking");
        let addr = listener.local_addr().expect("listener addr");
        let endpoint = format!("http://{addr}/api_jsonrpc.php");

        let requests = Arc::new(Mutex::new(Vec::new()));
        let stop = Arc::new(AtomicBool::new(false));
        let handler: Arc<Handler> = Arc::new(handler);
        let requests_for_thread = Arc::clone(&requests);
        let stop_for_thread = Arc::clone(&stop);

        let join = thread::spawn(move || {
            while !stop_for_thread.load(Ordering::Relaxed) {
                match listener.accept() {
                    Ok((stream, _addr)) => {
                        let handler = Arc::clone(&handler);
                        let requests = Arc::clone(&requests_for_thread);
                        thread::spawn(move || serve_one(stream, handler.as_ref(), &requests));
                    }
                    Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                        thread::sleep(Duration::from_millis(5));
                    }
                    Err(_) => break,
                }
            }
        });

        Self { endpoint, requests, stop, join: Some(join) }
    }

    /// Answers every request with `result` in a success envelope.
    pub fn answering(result: JsonValue) -> Self {
        Self::start(move |request| {
            let body = json!({"jsonrpc": "2.0", "result": result, "id": request["id"]});
            (200, body.to_string())
        })
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().expect("requests mutex poisoned").clone()
    }
}

impl Drop for StubHttpServer {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

fn serve_one(stream: TcpStream, handler: &Handler, requests: &Mutex<Vec<RecordedRequest>>) {
    let _ = stream.set_nonblocking(false);
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let Ok(read_half) = stream.try_clone() else {
        return;
    };
    let mut reader = BufReader::new(read_half);

    let mut request_line = String::new();
    if reader.read_line(&mut request_line).is_err() || request_line.is_empty() {
        return;
    }
    let mut headers = Vec::new();
    let mut content_length = 0usize;
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).is_err() {
            return;
        }
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            let (name, value) = (name.trim().to_owned(), value.trim().to_owned());
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.parse().unwrap_or(0);
            }
            headers.push((name, value));
        }
    }
    let mut body = vec![0u8; content_length];
    if reader.read_exact(&mut body).is_err() {
        return;
    }

    let body: JsonValue = serde_json::from_slice(&body).unwrap_or(JsonValue::Null);
    let response = handler(&body);
    requests.lock().expect("requests mutex poisoned").push(RecordedRequest { headers, body });

    let mut stream = stream;
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}
