//! HTTP Digest authentication (RFC 7616, RFC 2617)
//!
//! `reqwest` only knows Basic and Bearer auth, so the client answers Digest
//! challenges itself. [`Challenge`] parses the `WWW-Authenticate` header of a
//! 401 response, [`DigestAuth`] keeps the latest challenge and produces
//! `Authorization` headers for subsequent requests.

use md5::Md5;
use reqwest::header::{HeaderMap, WWW_AUTHENTICATE};
use sha2::{Digest, Sha256, Sha512_256};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::{ClientError, Result};

/// Hash function named by the challenge's `algorithm` parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Md5,
    Md5Sess,
    Sha256,
    Sha256Sess,
    Sha512_256,
    Sha512_256Sess,
}

impl Algorithm {
    pub fn parse(name: &str) -> Result<Self> {
        match name.to_ascii_uppercase().as_str() {
            "MD5" => Ok(Algorithm::Md5),
            "MD5-SESS" => Ok(Algorithm::Md5Sess),
            "SHA-256" => Ok(Algorithm::Sha256),
            "SHA-256-SESS" => Ok(Algorithm::Sha256Sess),
            "SHA-512-256" => Ok(Algorithm::Sha512_256),
            "SHA-512-256-SESS" => Ok(Algorithm::Sha512_256Sess),
            _ => Err(ClientError::Auth(format!(
                "unsupported digest algorithm '{}'",
                name
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::Md5 => "MD5",
            Algorithm::Md5Sess => "MD5-sess",
            Algorithm::Sha256 => "SHA-256",
            Algorithm::Sha256Sess => "SHA-256-sess",
            Algorithm::Sha512_256 => "SHA-512-256",
            Algorithm::Sha512_256Sess => "SHA-512-256-sess",
        }
    }

    fn is_session(&self) -> bool {
        matches!(
            self,
            Algorithm::Md5Sess | Algorithm::Sha256Sess | Algorithm::Sha512_256Sess
        )
    }

    fn hash(&self, data: &[u8]) -> String {
        match self {
            Algorithm::Md5 | Algorithm::Md5Sess => hex::encode(Md5::digest(data)),
            Algorithm::Sha256 | Algorithm::Sha256Sess => hex::encode(Sha256::digest(data)),
            Algorithm::Sha512_256 | Algorithm::Sha512_256Sess => {
                hex::encode(Sha512_256::digest(data))
            }
        }
    }
}

/// Quality of protection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Qop {
    Auth,
    /// Also covers the request body
    AuthInt,
}

impl Qop {
    pub fn as_str(&self) -> &'static str {
        match self {
            Qop::Auth => "auth",
            Qop::AuthInt => "auth-int",
        }
    }

    /// Pick from a comma separated offer, preferring `auth`
    fn select(offer: &str) -> Result<Self> {
        let offered: Vec<&str> = offer.split(',').map(str::trim).collect();
        if offered.iter().any(|q| q.eq_ignore_ascii_case("auth")) {
            Ok(Qop::Auth)
        } else if offered.iter().any(|q| q.eq_ignore_ascii_case("auth-int")) {
            Ok(Qop::AuthInt)
        } else {
            Err(ClientError::Auth(format!("unsupported qop '{}'", offer)))
        }
    }
}

/// A parsed `WWW-Authenticate: Digest ...` challenge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    pub realm: String,
    pub nonce: String,
    pub opaque: Option<String>,
    pub algorithm: Algorithm,
    /// `None` when the server offers no qop (RFC 2069 compatibility)
    pub qop: Option<Qop>,
    pub stale: bool,
}

impl Challenge {
    /// Parse a single header value.
    ///
    /// Returns `Ok(None)` when the header carries another scheme (e.g. Basic).
    pub fn parse(header: &str) -> Result<Option<Self>> {
        let header = header.trim();
        let (scheme, rest) = match header.find(char::is_whitespace) {
            Some(idx) => (&header[..idx], &header[idx..]),
            None => (header, ""),
        };
        if !scheme.eq_ignore_ascii_case("digest") {
            return Ok(None);
        }

        let mut params = parse_params(rest)?;

        let nonce = params
            .remove("nonce")
            .ok_or_else(|| ClientError::Auth("digest challenge without nonce".to_string()))?;
        let algorithm = match params.remove("algorithm") {
            Some(name) => Algorithm::parse(&name)?,
            None => Algorithm::Md5,
        };
        let qop = match params.remove("qop") {
            Some(offer) => Some(Qop::select(&offer)?),
            None => None,
        };
        let stale = params
            .remove("stale")
            .map(|s| s.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Ok(Some(Self {
            realm: params.remove("realm").unwrap_or_default(),
            nonce,
            opaque: params.remove("opaque"),
            algorithm,
            qop,
            stale,
        }))
    }

    /// First usable Digest challenge among the response's `WWW-Authenticate`
    /// headers, in the server's order of preference.
    ///
    /// Digest challenges this client cannot answer are skipped; the error of
    /// the first one is returned only when no other Digest challenge works.
    pub fn from_headers(headers: &HeaderMap) -> Result<Option<Self>> {
        let mut first_error = None;
        for value in headers.get_all(WWW_AUTHENTICATE) {
            let Ok(value) = value.to_str() else {
                continue;
            };
            match Self::parse(value) {
                Ok(Some(challenge)) => return Ok(Some(challenge)),
                Ok(None) => {}
                Err(e) => {
                    tracing::debug!("Skipping digest challenge: {}", e);
                    first_error.get_or_insert(e);
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(None),
        }
    }
}

/// Split `key=value, key="quoted value"` pairs. Keys are lowercased.
fn parse_params(input: &str) -> Result<HashMap<String, String>> {
    let mut params = HashMap::new();
    let mut chars = input.chars().peekable();

    loop {
        while matches!(chars.peek(), Some(c) if c.is_whitespace() || *c == ',') {
            chars.next();
        }
        if chars.peek().is_none() {
            break;
        }

        let mut key = String::new();
        while let Some(&c) = chars.peek() {
            if c == '=' || c == ',' || c.is_whitespace() {
                break;
            }
            key.push(c);
            chars.next();
        }
        while matches!(chars.peek(), Some(c) if c.is_whitespace()) {
            chars.next();
        }
        if key.is_empty() || chars.next() != Some('=') {
            return Err(ClientError::Auth(format!(
                "malformed digest challenge near '{}'",
                key
            )));
        }
        while matches!(chars.peek(), Some(c) if c.is_whitespace()) {
            chars.next();
        }

        let mut value = String::new();
        if chars.peek() == Some(&'"') {
            chars.next();
            let mut closed = false;
            while let Some(c) = chars.next() {
                match c {
                    '\\' => {
                        if let Some(escaped) = chars.next() {
                            value.push(escaped);
                        }
                    }
                    '"' => {
                        closed = true;
                        break;
                    }
                    _ => value.push(c),
                }
            }
            if !closed {
                return Err(ClientError::Auth(format!(
                    "unterminated quoted value for '{}'",
                    key
                )));
            }
        } else {
            while let Some(&c) = chars.peek() {
                if c == ',' || c.is_whitespace() {
                    break;
                }
                value.push(c);
                chars.next();
            }
        }

        params.insert(key.to_ascii_lowercase(), value);
    }

    Ok(params)
}

/// Inputs for one `Authorization` header
#[derive(Debug, Clone)]
pub struct DigestRequest<'a> {
    pub method: &'a str,
    /// Request target as sent: path plus query
    pub uri: &'a str,
    pub body: &'a [u8],
    pub nonce_count: u32,
    pub cnonce: &'a str,
}

/// Compute the `Authorization` header value answering `challenge`
pub fn authorization_header(
    username: &str,
    password: &str,
    challenge: &Challenge,
    request: &DigestRequest<'_>,
) -> String {
    let algorithm = challenge.algorithm;
    let nc = format!("{:08x}", request.nonce_count);

    let mut ha1 = algorithm.hash(format!("{}:{}:{}", username, challenge.realm, password).as_bytes());
    if algorithm.is_session() {
        ha1 = algorithm.hash(format!("{}:{}:{}", ha1, challenge.nonce, request.cnonce).as_bytes());
    }

    let ha2 = match challenge.qop {
        Some(Qop::AuthInt) => algorithm.hash(
            format!(
                "{}:{}:{}",
                request.method,
                request.uri,
                algorithm.hash(request.body)
            )
            .as_bytes(),
        ),
        _ => algorithm.hash(format!("{}:{}", request.method, request.uri).as_bytes()),
    };

    let response = match challenge.qop {
        Some(qop) => algorithm.hash(
            format!(
                "{}:{}:{}:{}:{}:{}",
                ha1,
                challenge.nonce,
                nc,
                request.cnonce,
                qop.as_str(),
                ha2
            )
            .as_bytes(),
        ),
        None => algorithm.hash(format!("{}:{}:{}", ha1, challenge.nonce, ha2).as_bytes()),
    };

    let mut header = format!(
        "Digest username=\"{}\", realm=\"{}\", nonce=\"{}\", uri=\"{}\", algorithm={}, response=\"{}\"",
        quote(username),
        quote(&challenge.realm),
        quote(&challenge.nonce),
        quote(request.uri),
        algorithm.as_str(),
        response
    );
    if let Some(opaque) = &challenge.opaque {
        let _ = write!(header, ", opaque=\"{}\"", quote(opaque));
    }
    if let Some(qop) = challenge.qop {
        let _ = write!(header, ", qop={}, nc={}", qop.as_str(), nc);
    }
    if challenge.qop.is_some() || algorithm.is_session() {
        let _ = write!(header, ", cnonce=\"{}\"", quote(request.cnonce));
    }
    header
}

fn quote(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

fn new_cnonce() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

#[derive(Debug)]
struct NonceState {
    challenge: Challenge,
    nonce_count: u32,
}

/// Digest credentials plus the most recent server challenge
#[derive(Debug)]
pub struct DigestAuth {
    username: String,
    password: String,
    state: Mutex<Option<NonceState>>,
}

impl DigestAuth {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            state: Mutex::new(None),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Whether a challenge has been received yet
    pub fn has_challenge(&self) -> bool {
        self.lock().is_some()
    }

    /// Remember a challenge. The nonce count restarts when the nonce changes.
    pub fn accept_challenge(&self, challenge: Challenge) {
        let mut state = self.lock();
        let nonce_count = match state.as_ref() {
            Some(current) if current.challenge.nonce == challenge.nonce => current.nonce_count,
            _ => 0,
        };
        *state = Some(NonceState {
            challenge,
            nonce_count,
        });
    }

    /// `Authorization` value for the next request, or `None` before the first
    /// challenge
    pub fn authorization(&self, method: &str, uri: &str, body: &[u8]) -> Option<String> {
        let mut state = self.lock();
        let current = state.as_mut()?;
        current.nonce_count = current.nonce_count.wrapping_add(1);

        let cnonce = new_cnonce();
        let request = DigestRequest {
            method,
            uri,
            body,
            nonce_count: current.nonce_count,
            cnonce: &cnonce,
        };
        Some(authorization_header(
            &self.username,
            &self.password,
            &current.challenge,
            &request,
        ))
    }

    fn lock(&self) -> MutexGuard<'_, Option<NonceState>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
