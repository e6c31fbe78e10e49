//! Loopback HTTP stub shared by the integration tests.

#![allow(dead_code)]

use std::io::Read;
use std::sync::{Arc, Mutex};
use std::thread;

use tiny_http::{Response, Server};

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Recorded {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Answers requests with the scripted `(status, body)` pairs, in order, and
/// records each request before replying.
pub struct StubServer {
    base: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl StubServer {
    pub fn start(script: Vec<(u16, &str)>) -> Self {
        let server = Server::http("127.0.0.1:0").expect("bind loopback");
        let addr = server.server_addr().to_ip().expect("ip listener");
        let requests = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&requests);
        let script: Vec<(u16, String)> = script.into_iter().map(|(s, b)| (s, b.to_string())).collect();

        thread::spawn(move || {
            for (status, body) in script {
                let Ok(mut request) = server.recv() else { return };
                let mut payload = Vec::new();
                let _ = request.as_reader().read_to_end(&mut payload);
                log.lock().unwrap().push(Recorded {
                    method: request.method().to_string(),
                    url: request.url().to_string(),
                    headers: request
                        .headers()
                        .iter()
                        .map(|h| (h.field.to_string(), h.value.to_string()))
                        .collect(),
                    body: payload,
                });
                let _ = request.respond(Response::from_string(body).with_status_code(status));
            }
        });

        Self { base: format!("http://{addr}"), requests }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

pub const ROSTER_CSV: &str = "\
first_name,last_name,file_name,seen,intend_view,cv_saved,contacted
Jane,Doe,https://files.example/jane.pdf,1,0,0,0
Amir,Khan,https://files.example/amir.pdf,0,0,true,0
";
