//! SPARQL 1.1 Protocol transport over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{self, HeaderValue};
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::Serialize;

use sparqy_core::{HttpAuth, SparqyError, StoreConfig};

use crate::auth::DigestChallenge;
use crate::results::SelectResults;

/// Media type of SPARQL JSON result documents.
pub const SPARQL_RESULTS_JSON: &str = "application/sparql-results+json";

const PASSTHROUGH_ACCEPT: &str =
    "application/sparql-results+json, application/json;q=0.9, text/turtle;q=0.8, */*;q=0.5";

/// Errors from store operations.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("SPARQL connection error: {0}")]
    Connection(String),

    #[error("SPARQL request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("SPARQL endpoint returned {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Failed to decode SPARQL results: {0}")]
    Decode(String),

    #[error(transparent)]
    Core(#[from] SparqyError),
}

/// The two kinds of SPARQL request a store accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Read query (SELECT, ASK, CONSTRUCT, DESCRIBE), sent as GET.
    Query,
    /// SPARQL Update, sent as a form-encoded POST.
    Update,
}

impl Operation {
    /// Classify raw SPARQL text by its first keyword after the prologue.
    pub fn detect(text: &str) -> Self {
        let mut tokens = text
            .lines()
            .map(strip_comment)
            .flat_map(str::split_whitespace);

        while let Some(token) = tokens.next() {
            let keyword = token.to_ascii_uppercase();
            match keyword.as_str() {
                "BASE" | "PREFIX" => {
                    // Skip to the end of the IRI reference.
                    if !token.ends_with('>') {
                        for t in tokens.by_ref() {
                            if t.ends_with('>') {
                                break;
                            }
                        }
                    }
                }
                "INSERT" | "DELETE" | "LOAD" | "CLEAR" | "CREATE" | "DROP" | "COPY" | "MOVE"
                | "ADD" | "WITH" => return Self::Update,
                _ => return Self::Query,
            }
        }
        Self::Query
    }
}

/// Drop a trailing `#` comment, ignoring `#` inside IRI references.
fn strip_comment(line: &str) -> &str {
    let mut in_iri = false;
    for (i, c) in line.char_indices() {
        match c {
            '<' => in_iri = true,
            '>' => in_iri = false,
            '#' if !in_iri => return &line[..i],
            _ => {}
        }
    }
    line
}

/// Raw response of a pass-through query.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

impl QueryResponse {
    pub fn json(&self) -> Result<serde_json::Value, GraphError> {
        serde_json::from_str(&self.body).map_err(|e| GraphError::Decode(e.to_string()))
    }

    pub fn select_results(&self) -> Result<SelectResults, GraphError> {
        SelectResults::from_json(&self.body)
    }
}

/// The external store as the adapter sees it: read, write, and raw pass-through.
#[async_trait]
pub trait SparqlEndpoint: Send + Sync {
    /// Execute a SELECT query and decode its bindings.
    async fn select(&self, query: &str) -> Result<SelectResults, GraphError>;

    /// Execute a SPARQL Update and return the endpoint's response body.
    async fn update(&self, update: &str) -> Result<String, GraphError>;

    /// Execute arbitrary SPARQL text and return the response untouched.
    async fn query(&self, text: &str) -> Result<QueryResponse, GraphError>;
}

#[derive(Clone)]
struct Credentials {
    user: String,
    password: String,
    scheme: HttpAuth,
}

/// HTTP client for one SPARQL endpoint.
///
/// The inner [`reqwest::Client`] is a shared connection pool; every operation
/// takes its own single-use [`SparqlRequest`] from [`SparqlClient::request`].
/// Clone is cheap.
#[derive(Clone)]
pub struct SparqlClient {
    http: Client,
    query_url: Url,
    update_url: Url,
    credentials: Option<Credentials>,
}

impl SparqlClient {
    pub fn new(config: &StoreConfig) -> Result<Self, GraphError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(format!("sparqy/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GraphError::Connection(format!("Failed to create HTTP client: {e}")))?;

        let parse = |url: &str| {
            Url::parse(url).map_err(|e| GraphError::Connection(format!("Invalid endpoint {url}: {e}")))
        };

        let credentials = config.credentials().map(|(user, password)| Credentials {
            user: user.to_string(),
            password: password.to_string(),
            scheme: config.http_auth,
        });

        tracing::info!(
            endpoint = %config.endpoint,
            update_endpoint = %config.update_url(),
            authenticated = credentials.is_some(),
            "SPARQL client ready"
        );

        Ok(Self {
            http,
            query_url: parse(&config.endpoint)?,
            update_url: parse(config.update_url())?,
            credentials,
        })
    }

    /// Start a request-scoped handle for one operation.
    pub fn request<'a>(&'a self, operation: Operation, text: &'a str) -> SparqlRequest<'a> {
        SparqlRequest {
            client: self,
            operation,
            text,
            accept: None,
        }
    }
}

/// A single-use request handle, consumed by [`SparqlRequest::send`].
pub struct SparqlRequest<'a> {
    client: &'a SparqlClient,
    operation: Operation,
    text: &'a str,
    accept: Option<&'static str>,
}

impl SparqlRequest<'_> {
    pub fn accept(mut self, media_type: &'static str) -> Self {
        self.accept = Some(media_type);
        self
    }

    fn builder(&self) -> RequestBuilder {
        let client = self.client;
        let builder = match self.operation {
            Operation::Query => client
                .http
                .get(client.query_url.clone())
                .query(&[("query", self.text)]),
            Operation::Update => client
                .http
                .post(client.update_url.clone())
                .form(&[("update", self.text)]),
        };
        let builder = match self.accept {
            Some(accept) => builder.header(header::ACCEPT, accept),
            None => builder,
        };
        match &client.credentials {
            Some(c) if c.scheme == HttpAuth::Basic => builder.basic_auth(&c.user, Some(&c.password)),
            _ => builder,
        }
    }

    /// Send the request, answering one digest challenge if the endpoint issues it.
    ///
    /// Non-success statuses are turned into [`GraphError::Http`].
    pub async fn send(self) -> Result<Response, GraphError> {
        let response = self.builder().send().await?;

        let digest_credentials = self
            .client
            .credentials
            .as_ref()
            .filter(|c| c.scheme == HttpAuth::Digest);

        let response = match digest_credentials {
            Some(creds) if response.status() == reqwest::StatusCode::UNAUTHORIZED => {
                self.answer_challenge(&response, creds).await?
            }
            _ => response,
        };

        ensure_success(response).await
    }

    async fn answer_challenge(
        &self,
        unauthorized: &Response,
        creds: &Credentials,
    ) -> Result<Response, GraphError> {
        let header_value = unauthorized
            .headers()
            .get(header::WWW_AUTHENTICATE)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| GraphError::Auth("401 without a WWW-Authenticate challenge".into()))?;

        let challenge = DigestChallenge::parse(header_value)
            .ok_or_else(|| GraphError::Auth(format!("Unsupported challenge: {header_value}")))?;

        let mut request = self.builder().build()?;
        let uri = request_uri(request.url());
        let authorization = challenge.authorization(
            &creds.user,
            &creds.password,
            request.method().as_str(),
            &uri,
            &DigestChallenge::cnonce(),
        );
        let value = HeaderValue::from_str(&authorization)
            .map_err(|e| GraphError::Auth(format!("Invalid authorization header: {e}")))?;
        request.headers_mut().insert(header::AUTHORIZATION, value);

        tracing::debug!(realm = %challenge.realm, "Answering digest challenge");
        Ok(self.client.http.execute(request).await?)
    }
}

/// Path and query of `url`, the `uri` field of a digest response.
fn request_uri(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    }
}

async fn ensure_success(response: Response) -> Result<Response, GraphError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(GraphError::Http {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl SparqlEndpoint for SparqlClient {
    async fn select(&self, query: &str) -> Result<SelectResults, GraphError> {
        let response = self
            .request(Operation::Query, query)
            .accept(SPARQL_RESULTS_JSON)
            .send()
            .await?;
        let body = response.text().await?;
        SelectResults::from_json(&body)
    }

    async fn update(&self, update: &str) -> Result<String, GraphError> {
        let response = self.request(Operation::Update, update).send().await?;
        Ok(response.text().await?)
    }

    async fn query(&self, text: &str) -> Result<QueryResponse, GraphError> {
        let operation = Operation::detect(text);
        let response = self
            .request(operation, text)
            .accept(PASSTHROUGH_ACCEPT)
            .send()
            .await?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await?;

        Ok(QueryResponse {
            status,
            content_type,
            body,
        })
    }
}
