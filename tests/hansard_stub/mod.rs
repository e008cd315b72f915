use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::Duration;

/// One scripted reply. The last reply of a route repeats once the script runs out.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub body: String,
}

impl Reply {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: String::new(),
        }
    }

    /// Fragment payload the way the live endpoint returns it: a JSON string
    /// wrapping a JSON object.
    pub fn fragment(html: &str) -> Self {
        let inner = serde_json::json!({ "DocumentHtml": html }).to_string();
        Self::ok(serde_json::Value::String(inner).to_string())
    }
}

pub struct HansardStub {
    pub api_base: String,
    hits: Arc<Mutex<HashMap<String, usize>>>,
    total: Arc<AtomicUsize>,
    shutdown_tx: Option<mpsc::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl HansardStub {
    /// Routes are paths below the API base, e.g. `tableofcontentsbydate/HANSARD-1`.
    pub fn spawn(routes: Vec<(&str, Vec<Reply>)>) -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("start hansard stub server");
        let addr = server.server_addr();
        let api_base = format!("http://{addr}/api/hansard/search/daily");
        let prefix = "/api/hansard/search/daily/".to_owned();

        let routes: HashMap<String, Vec<Reply>> = routes
            .into_iter()
            .map(|(path, replies)| (path.to_owned(), replies))
            .collect();
        let hits = Arc::new(Mutex::new(HashMap::<String, usize>::new()));
        let total = Arc::new(AtomicUsize::new(0));

        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let server_hits = Arc::clone(&hits);
        let server_total = Arc::clone(&total);

        let handle = thread::spawn(move || {
            loop {
                if shutdown_rx.try_recv().is_ok() {
                    break;
                }

                let request = match server.recv_timeout(Duration::from_millis(50)) {
                    Ok(Some(req)) => req,
                    Ok(None) => continue,
                    Err(_) => break,
                };
                server_total.fetch_add(1, Ordering::SeqCst);

                if request.method() != &tiny_http::Method::Post {
                    let _ = request.respond(
                        tiny_http::Response::from_string("method not allowed")
                            .with_status_code(405),
                    );
                    continue;
                }

                let url = request.url().to_string();
                let Some(path) = url.strip_prefix(&prefix).map(str::to_owned) else {
                    let _ = request.respond(
                        tiny_http::Response::from_string("not found").with_status_code(404),
                    );
                    continue;
                };

                let seen = {
                    let mut hits = server_hits.lock().expect("lock hits");
                    let count = hits.entry(path.clone()).or_insert(0);
                    *count += 1;
                    *count
                };

                let reply = routes
                    .get(&path)
                    .and_then(|replies| replies.get(seen - 1).or_else(|| replies.last()))
                    .cloned()
                    .unwrap_or_else(|| Reply::status(404));

                let header =
                    tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
                        .expect("build header");
                let response = tiny_http::Response::from_string(reply.body)
                    .with_status_code(reply.status)
                    .with_header(header);
                let _ = request.respond(response);
            }
        });

        Self {
            api_base,
            hits,
            total,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    pub fn hits(&self, path: &str) -> usize {
        self.hits
            .lock()
            .expect("lock hits")
            .get(path)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_requests(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }
}

impl Drop for HansardStub {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
