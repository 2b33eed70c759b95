//! Doubles shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use book_client::{ApiError, HttpRequest, HttpResponse, MessageSink, Severity, Transport};

/// Records every message instead of showing it.
#[derive(Clone, Default)]
pub struct RecordingSink {
    shown: Arc<Mutex<Vec<(String, String, Severity)>>>,
}

impl RecordingSink {
    pub fn messages(&self) -> Vec<(String, String, Severity)> {
        self.shown.lock().unwrap().clone()
    }
}

impl MessageSink for RecordingSink {
    fn show_message(&self, message: &str, title: &str, severity: Severity) {
        self.shown
            .lock()
            .unwrap()
            .push((message.to_string(), title.to_string(), severity));
    }
}

/// Answers requests from a queue and counts opened and released connections.
#[derive(Default)]
pub struct Scripted {
    replies: Mutex<VecDeque<Result<HttpResponse, ApiError>>>,
    pub requests: Mutex<Vec<HttpRequest>>,
    released: AtomicUsize,
}

impl Scripted {
    pub fn replying(replies: Vec<Result<HttpResponse, ApiError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            ..Default::default()
        })
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    pub fn sent(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl Transport for Scripted {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .expect("no scripted reply left")
    }

    fn release(&self, _request: &HttpRequest) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

/// Wraps a real transport and counts released connections.
pub struct Counting<T> {
    inner: T,
    released: AtomicUsize,
}

impl<T: Transport> Counting<T> {
    pub fn new(inner: T) -> Arc<Self> {
        Arc::new(Self {
            inner,
            released: AtomicUsize::new(0),
        })
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

impl<T: Transport> Transport for Counting<T> {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        self.inner.execute(request)
    }

    fn release(&self, _request: &HttpRequest) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

/// Starts the mock server on a random port and returns its base URL.
pub fn spawn_mock_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}
