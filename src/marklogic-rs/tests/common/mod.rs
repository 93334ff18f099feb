//! In-memory stand-in for the MarkLogic REST API, served through wiremock.
//!
//! Every request must carry a valid Digest `Authorization` header; requests
//! without one get a 401 challenge. Documents and graphs are kept in maps so
//! tests can run full create/read/delete round trips.

#![allow(dead_code)]

use marklogic_rs::auth::{authorization_header, Challenge, DigestRequest};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use url::Position;
use wiremock::matchers::any;
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

pub const USERNAME: &str = "rest-writer";
pub const PASSWORD: &str = "s3cret-pass";
pub const REALM: &str = "public";

#[derive(Default)]
struct State {
    nonce: Mutex<String>,
    documents: Mutex<HashMap<String, (String, Vec<u8>)>>,
    graphs: Mutex<HashMap<String, Vec<u8>>>,
}

#[derive(Clone)]
pub struct FakeMarkLogic {
    state: Arc<State>,
}

impl FakeMarkLogic {
    /// Start a server answering every path with the fake REST API
    pub async fn start() -> (MockServer, FakeMarkLogic) {
        let fake = FakeMarkLogic {
            state: Arc::new(State::default()),
        };
        fake.rotate_nonce();

        let server = MockServer::start().await;
        Mock::given(any())
            .respond_with(fake.clone())
            .mount(&server)
            .await;
        (server, fake)
    }

    /// Issue a fresh nonce; headers built on the old one become stale
    pub fn rotate_nonce(&self) {
        *self.state.nonce.lock().unwrap() = uuid::Uuid::new_v4().simple().to_string();
    }

    pub fn nonce(&self) -> String {
        self.state.nonce.lock().unwrap().clone()
    }

    pub fn document_count(&self) -> usize {
        self.state.documents.lock().unwrap().len()
    }

    fn challenge(&self, stale: bool) -> ResponseTemplate {
        let header = format!(
            "Digest realm=\"{}\", qop=\"auth\", nonce=\"{}\", opaque=\"d0c5\", stale={}",
            REALM,
            self.nonce(),
            if stale { "true" } else { "false" }
        );
        ResponseTemplate::new(401)
            .insert_header("WWW-Authenticate", header.as_str())
            .set_body_string("Unauthorized")
    }

    /// `None` when authorized, otherwise the 401 to send back
    fn check_auth(&self, request: &Request) -> Option<ResponseTemplate> {
        let header = match request
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
        {
            Some(header) => header.to_string(),
            None => return Some(self.challenge(false)),
        };
        let fields = digest_fields(&header);
        let field = |key: &str| fields.get(key).cloned().unwrap_or_default();

        if field("nonce") != self.nonce() {
            return Some(self.challenge(true));
        }

        let target = &request.url[Position::BeforePath..];
        if field("uri") != target || field("username") != USERNAME {
            return Some(ResponseTemplate::new(400).set_body_string("Bad digest uri"));
        }

        let challenge = Challenge::parse(&format!(
            "Digest realm=\"{}\", qop=\"auth\", nonce=\"{}\", opaque=\"d0c5\"",
            REALM,
            self.nonce()
        ))
        .unwrap()
        .unwrap();
        let nonce_count = u32::from_str_radix(&field("nc"), 16).unwrap_or(0);
        let cnonce = field("cnonce");
        let expected = authorization_header(
            USERNAME,
            PASSWORD,
            &challenge,
            &DigestRequest {
                method: request.method.as_str(),
                uri: target,
                body: &request.body,
                nonce_count,
                cnonce: &cnonce,
            },
        );

        if digest_fields(&expected).get("response") != fields.get("response") {
            return Some(self.challenge(false));
        }
        None
    }

    fn query(request: &Request, key: &str) -> Option<String> {
        request
            .url
            .query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }

    fn documents(&self, request: &Request) -> ResponseTemplate {
        let Some(uri) = Self::query(request, "uri") else {
            return ResponseTemplate::new(400).set_body_string("Missing uri");
        };
        let mut documents = self.state.documents.lock().unwrap();

        match request.method.as_str() {
            "PUT" => {
                let content_type = request
                    .headers
                    .get("content-type")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let existed = documents
                    .insert(uri, (content_type, request.body.clone()))
                    .is_some();
                ResponseTemplate::new(if existed { 204 } else { 201 })
            }
            "GET" => match documents.get(&uri) {
                Some((content_type, body)) => ResponseTemplate::new(200)
                    .set_body_raw(body.clone(), content_type.as_str()),
                None => ResponseTemplate::new(404).set_body_string("Document not found"),
            },
            "DELETE" => match documents.remove(&uri) {
                Some(_) => ResponseTemplate::new(204),
                None => ResponseTemplate::new(404).set_body_string("Document not found"),
            },
            _ => ResponseTemplate::new(405),
        }
    }

    fn graphs(&self, request: &Request) -> ResponseTemplate {
        let key = match (
            Self::query(request, "graph"),
            Self::query(request, "default"),
        ) {
            (Some(graph), None) => graph,
            (None, Some(default)) if default.is_empty() => String::new(),
            _ => return ResponseTemplate::new(400).set_body_string("Bad graph selector"),
        };
        let mut graphs = self.state.graphs.lock().unwrap();

        match request.method.as_str() {
            "POST" => {
                let existed = graphs.contains_key(&key);
                graphs
                    .entry(key)
                    .or_default()
                    .extend_from_slice(&request.body);
                ResponseTemplate::new(if existed { 204 } else { 201 })
            }
            "GET" => match graphs.get(&key) {
                Some(triples) => {
                    ResponseTemplate::new(200).set_body_raw(triples.clone(), "text/turtle")
                }
                None => ResponseTemplate::new(404).set_body_string("Graph not found"),
            },
            "DELETE" => match graphs.remove(&key) {
                Some(_) => ResponseTemplate::new(204),
                None => ResponseTemplate::new(404).set_body_string("Graph not found"),
            },
            _ => ResponseTemplate::new(405),
        }
    }
}

impl Respond for FakeMarkLogic {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        if let Some(denied) = self.check_auth(request) {
            return denied;
        }
        match request.url.path() {
            "/LATEST/documents" | "/v1/documents" => self.documents(request),
            "/LATEST/graphs" | "/v1/graphs" => self.graphs(request),
            _ => ResponseTemplate::new(404).set_body_string("No such endpoint"),
        }
    }
}

/// Key/value pairs of a `Digest ...` header
pub fn digest_fields(header: &str) -> HashMap<String, String> {
    header
        .trim_start_matches("Digest ")
        .split(", ")
        .filter_map(|pair| pair.split_once('='))
        .map(|(k, v)| (k.to_string(), v.trim_matches('"').to_string()))
        .collect()
}

pub fn test_data(name: &str) -> String {
    format!("{}/tests/test_data/{}", env!("CARGO_MANIFEST_DIR"), name)
}
