use crate::auth::{Challenge, DigestAuth};
use crate::{ClientError, Payload, Response, Result};
use bytes::Bytes;
use marklogic_core::models::{
    Collection, GraphTarget, CONTENT_TYPE_JSON, CONTENT_TYPE_RDF_XML, CONTENT_TYPE_TURTLE,
    CONTENT_TYPE_XML,
};
use marklogic_core::{ClientConfig, LATEST_API_VERSION};
use reqwest::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client as HttpClient, Method, StatusCode};
use std::time::Duration;
use url::{Position, Url};

/// MarkLogic REST API Client
///
/// Owns one HTTP session (connection pool plus digest state) for its whole
/// lifetime. No network traffic happens until the first operation.
pub struct Client {
    base_url: String,
    api_version: String,
    client: HttpClient,
    auth: DigestAuth,
}

/// Body and its content type for PUT/POST
struct Upload<'a> {
    body: Bytes,
    content_type: &'a str,
}

impl Client {
    /// Create a new client for the given base URL, using the latest API version
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self> {
        Self::with_http_client(base_url, username, password, HttpClient::new())
    }

    /// Create a client on top of a preconfigured transport (timeouts, proxies, TLS)
    pub fn with_http_client(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        client: HttpClient,
    ) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Url::parse(&base_url)?;

        Ok(Self {
            base_url,
            api_version: LATEST_API_VERSION.to_string(),
            client,
            auth: DigestAuth::new(username, password),
        })
    }

    /// Create a client from loaded settings
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let mut builder = HttpClient::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        if config.insecure_skip_verify {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = Self::with_http_client(
            config.url.clone(),
            config.username.clone(),
            config.password.clone(),
            builder.build()?,
        )?;
        Ok(client.with_api_version(config.api_version.clone()))
    }

    /// Use a specific REST API version segment, e.g. "v1"
    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    pub fn username(&self) -> &str {
        self.auth.username()
    }

    /// Create (or replace) a document with the given data and content type
    pub async fn create_document(
        &self,
        uri: &str,
        data: impl Into<Payload>,
        content_type: &str,
    ) -> Result<Response> {
        let upload = Upload {
            body: data.into().into_bytes(),
            content_type,
        };
        self.send(Method::PUT, Collection::Documents, &[("uri", uri)], Some(upload))
            .await
    }

    /// Create an XML document
    pub async fn create_xml(&self, uri: &str, data: impl Into<Payload>) -> Result<Response> {
        self.create_document(uri, data, CONTENT_TYPE_XML).await
    }

    /// Create a JSON document
    pub async fn create_json(&self, uri: &str, data: impl Into<Payload>) -> Result<Response> {
        self.create_document(uri, data, CONTENT_TYPE_JSON).await
    }

    /// Get the document at the given URI
    pub async fn get_document(&self, uri: &str) -> Result<Response> {
        self.send(Method::GET, Collection::Documents, &[("uri", uri)], None)
            .await
    }

    /// Delete the document at the given URI
    pub async fn delete_document(&self, uri: &str) -> Result<Response> {
        self.send(Method::DELETE, Collection::Documents, &[("uri", uri)], None)
            .await
    }

    /// Merge triples into the named graph, or the default graph when
    /// `graph_uri` is `None`
    pub async fn create_triples(
        &self,
        data: impl Into<Payload>,
        content_type: &str,
        graph_uri: Option<&str>,
    ) -> Result<Response> {
        let target = GraphTarget::from(graph_uri);
        let upload = Upload {
            body: data.into().into_bytes(),
            content_type,
        };
        self.send(
            Method::POST,
            Collection::Graphs,
            &[target.query_param()],
            Some(upload),
        )
        .await
    }

    /// Merge RDF/XML triples
    pub async fn create_triples_rdf_xml(
        &self,
        data: impl Into<Payload>,
        graph_uri: Option<&str>,
    ) -> Result<Response> {
        self.create_triples(data, CONTENT_TYPE_RDF_XML, graph_uri)
            .await
    }

    /// Merge Turtle triples
    pub async fn create_triples_ttl(
        &self,
        data: impl Into<Payload>,
        graph_uri: Option<&str>,
    ) -> Result<Response> {
        self.create_triples(data, CONTENT_TYPE_TURTLE, graph_uri)
            .await
    }

    /// Get the graph with the given URI
    pub async fn get_graph(&self, graph_uri: &str) -> Result<Response> {
        self.send(Method::GET, Collection::Graphs, &[("graph", graph_uri)], None)
            .await
    }

    /// Delete the graph with the given URI
    pub async fn delete_graph(&self, graph_uri: &str) -> Result<Response> {
        self.send(Method::DELETE, Collection::Graphs, &[("graph", graph_uri)], None)
            .await
    }

    /// `{base_url}/{api_version}/{collection}?{params}`
    fn endpoint(&self, collection: Collection, params: &[(&str, &str)]) -> Result<Url> {
        let mut url = Url::parse(&format!(
            "{}/{}/{}",
            self.base_url, self.api_version, collection
        ))?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        Ok(url)
    }

    /// Send one request, answering at most one digest challenge on the way
    async fn send(
        &self,
        method: Method,
        collection: Collection,
        params: &[(&str, &str)],
        upload: Option<Upload<'_>>,
    ) -> Result<Response> {
        let url = self.endpoint(collection, params)?;
        let request_target = &url[Position::BeforePath..];
        let body: &[u8] = upload.as_ref().map(|u| &u.body[..]).unwrap_or_default();

        let mut authorization = self.auth.authorization(method.as_str(), request_target, body);
        let mut challenge_answered = false;

        loop {
            let mut request = self.client.request(method.clone(), url.clone());
            if let Some(upload) = &upload {
                request = request
                    .header(CONTENT_TYPE, upload.content_type)
                    .body(upload.body.clone());
            }
            if let Some(value) = &authorization {
                let value = HeaderValue::from_str(value)
                    .map_err(|e| ClientError::Auth(format!("invalid Authorization header: {}", e)))?;
                request = request.header(AUTHORIZATION, value);
            }

            let response = request.send().await?;
            let status = response.status();
            tracing::debug!("{} {} -> {}", method, url, status);

            if status == StatusCode::UNAUTHORIZED && !challenge_answered {
                match Challenge::from_headers(response.headers()) {
                    Ok(Some(challenge)) => {
                        tracing::debug!(
                            "Answering digest challenge (realm={}, algorithm={}, stale={})",
                            challenge.realm,
                            challenge.algorithm.as_str(),
                            challenge.stale
                        );
                        self.auth.accept_challenge(challenge);
                        authorization =
                            self.auth.authorization(method.as_str(), request_target, body);
                        challenge_answered = true;
                        continue;
                    }
                    Ok(None) => {}
                    Err(e) => tracing::warn!("Cannot answer authentication challenge: {}", e),
                }
            }

            return Response::read(response).await;
        }
    }
}
