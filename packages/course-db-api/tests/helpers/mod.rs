//! Test server and HTTP client helpers.

use std::net::SocketAddr;
use std::sync::Arc;
use std::thread;

use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::header::{CONTENT_TYPE, HOST};
use hyper::{Method, Request, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use course_db_api::router::Router;
use course_db_api::server::Server;
use course_db_core::config::DbConfig;
use course_db_core::{Course, Database, NewCourse, NewStudent, Student};
use course_db_runtime::{FlushCommand, Runtime};

/// A running server with direct access to its database for seeding.
pub struct TestServer {
    pub addr: SocketAddr,
    pub db: Arc<Database>,
    _flush_rx: mpsc::Receiver<FlushCommand>,
}

/// Buffered HTTP response.
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body)
            .unwrap_or_else(|e| panic!("invalid JSON body {:?}: {}", self.body, e))
    }
}

impl TestServer {
    /// Starts a memory-only runtime thread and an HTTP server on an ephemeral port.
    pub async fn start() -> anyhow::Result<Self> {
        let db = Arc::new(Database::new());
        let config = Arc::new(DbConfig {
            tickrate: 120,
            ..DbConfig::in_memory()
        });

        let (api_tx, api_rx) = mpsc::channel(1000);
        let (persistence_tx, flush_rx) = mpsc::channel(1);
        let mut runtime = Runtime::new(db.clone(), (*config).clone(), api_rx, persistence_tx);
        // Exits once the server task, and with it the router's sender, is dropped.
        thread::spawn(move || runtime.run());

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let server = Server::new(addr, Router::new(config, api_tx));
        tokio::spawn(server.serve_with_listener(listener));

        Ok(Self {
            addr,
            db,
            _flush_rx: flush_rx,
        })
    }

    /// Inserts courses directly into the store, bypassing HTTP.
    pub fn make_courses(&self, count: usize) -> Vec<Course> {
        (0..count)
            .map(|i| {
                self.db
                    .create_course(NewCourse::new(format!("course-{}", i)))
                    .expect("create course")
            })
            .collect()
    }

    /// Inserts students directly into the store.
    pub fn make_students(&self, count: usize) -> Vec<Student> {
        (0..count)
            .map(|i| {
                self.db
                    .create_student(NewStudent::new(format!("student-{}", i)))
                    .expect("create student")
            })
            .collect()
    }

    pub fn course_count(&self) -> usize {
        self.db.course_count().expect("course count")
    }

    pub async fn get(&self, path: &str) -> anyhow::Result<TestResponse> {
        self.request(Method::GET, path, None).await
    }

    pub async fn delete(&self, path: &str) -> anyhow::Result<TestResponse> {
        self.request(Method::DELETE, path, None).await
    }

    pub async fn send_json(
        &self,
        method: Method,
        path: &str,
        body: serde_json::Value,
    ) -> anyhow::Result<TestResponse> {
        let bytes = serde_json::to_vec(&body)?;
        self.request(method, path, Some(("application/json", bytes)))
            .await
    }

    pub async fn send_form(
        &self,
        method: Method,
        path: &str,
        body: &str,
    ) -> anyhow::Result<TestResponse> {
        self.request(
            method,
            path,
            Some((
                "application/x-www-form-urlencoded",
                body.as_bytes().to_vec(),
            )),
        )
        .await
    }

    /// Sends text fields as `multipart/form-data`.
    pub async fn send_multipart(
        &self,
        method: Method,
        path: &str,
        fields: &[(&str, &str)],
    ) -> anyhow::Result<TestResponse> {
        const BOUNDARY: &str = "course-db-test-boundary";

        let mut body = String::new();
        for (name, value) in fields {
            body.push_str(&format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            ));
        }
        body.push_str(&format!("--{}--\r\n", BOUNDARY));

        let content_type = format!("multipart/form-data; boundary={}", BOUNDARY);
        self.request(method, path, Some((&content_type, body.into_bytes())))
            .await
    }

    /// Sends one request over a fresh HTTP/1.1 connection.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<(&str, Vec<u8>)>,
    ) -> anyhow::Result<TestResponse> {
        let stream = TcpStream::connect(self.addr).await?;
        let (mut sender, conn) = hyper::client::conn::http1::handshake(TokioIo::new(stream)).await?;
        tokio::spawn(conn);

        let mut builder = Request::builder()
            .method(method)
            .uri(path)
            .header(HOST, self.addr.to_string());
        let payload = match body {
            Some((content_type, bytes)) => {
                builder = builder.header(CONTENT_TYPE, content_type);
                Bytes::from(bytes)
            }
            None => Bytes::new(),
        };
        let request = builder.body(Full::new(payload))?;

        let response = sender.send_request(request).await?;
        let status = response.status();
        let body = response.into_body().collect().await?.to_bytes();
        Ok(TestResponse { status, body })
    }
}
