//! HTTP-level tests of the adapter against a mock SPARQL endpoint.

use std::collections::BTreeMap;

use reqwest::Url;
use wiremock::matchers::{header, header_exists, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use sparqy_core::{HttpAuth, StoreConfig};
use sparqy_graph::{GraphError, SparqlGraphStore};

const GRAPH: &str = "http://purl.org/stuff/guardians";

const TWO_ROWS: &str = r#"{
  "head": { "vars": ["rel1", "obj1", "rel2", "obj2"] },
  "results": { "bindings": [
    { "rel1": { "type": "literal", "value": "knows" },
      "obj1": { "type": "literal", "value": "B" } },
    { "rel1": { "type": "literal", "value": "knows" },
      "obj1": { "type": "literal", "value": "C" },
      "rel2": { "type": "literal", "value": "likes" },
      "obj2": { "type": "literal", "value": "D" } }
  ] }
}"#;

fn config_for(server: &MockServer) -> StoreConfig {
    let mut config = StoreConfig::new(
        format!("{}/sparql", server.uri()),
        GRAPH,
        "http://purl.org/stuff/data",
    );
    config.create_graph = false;
    config
}

fn sparql_json(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "application/sparql-results+json")
}

/// Decoded value of a form or query-string parameter.
fn param(encoded: &str, name: &str) -> Option<String> {
    let url = Url::parse(&format!("http://local/?{encoded}")).ok()?;
    url.query_pairs()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
}

fn query_text(request: &Request) -> String {
    param(request.url.query().unwrap_or_default(), "query").unwrap_or_default()
}

fn update_text(request: &Request) -> String {
    param(&String::from_utf8_lossy(&request.body), "update").unwrap_or_default()
}

#[tokio::test]
async fn get_decodes_bindings_into_arrows() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sparql"))
        .respond_with(sparql_json(TWO_ROWS))
        .expect(1)
        .mount(&server)
        .await;

    let store = SparqlGraphStore::connect(config_for(&server)).await.unwrap();
    let map = store.get("A").await;

    assert_eq!(
        map["A"],
        vec!["A, -[knows]->, B", "A, -[knows]->, C',<-[likes]-, D"]
    );

    let requests = server.received_requests().await.unwrap();
    let query = query_text(&requests[0]);
    assert!(query.contains(r#"?subject er:value "A" ."#));
    assert!(query.contains(&format!("GRAPH <{GRAPH}>")));
    assert_eq!(
        requests[0].headers.get("accept").unwrap(),
        "application/sparql-results+json"
    );
}

#[tokio::test]
async fn limit_reaches_the_wire() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(sparql_json(TWO_ROWS))
        .mount(&server)
        .await;

    let store = SparqlGraphStore::connect(config_for(&server)).await.unwrap();
    store.get_triplets("A", Some(1)).await;

    let requests = server.received_requests().await.unwrap();
    assert!(query_text(&requests[0]).ends_with("LIMIT 1"));
}

#[tokio::test]
async fn server_error_on_read_yields_empty_rows() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let store = SparqlGraphStore::connect(config_for(&server)).await.unwrap();
    let map = store.get("A").await;
    assert_eq!(map.get("A"), Some(&Vec::new()));
}

#[tokio::test]
async fn malformed_read_body_yields_empty_rows() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let store = SparqlGraphStore::connect(config_for(&server)).await.unwrap();
    assert!(store.get("A").await["A"].is_empty());
}

#[tokio::test]
async fn upsert_posts_one_form_encoded_update() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/sparql"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Insert into <g>, 8 triples -- done"))
        .expect(1)
        .mount(&server)
        .await;

    let store = SparqlGraphStore::connect(config_for(&server)).await.unwrap();
    store.upsert_triplet("A", "knows", "B").await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let update = update_text(&requests[0]);
    assert_eq!(update.matches("INSERT DATA").count(), 1);
    assert_eq!(update.matches("a er:Triplet").count(), 1);
    assert_eq!(update.matches("a er:Entity").count(), 2);
    assert_eq!(update.matches("a er:Relationship").count(), 1);
}

#[tokio::test]
async fn write_failure_propagates() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_string("SPARQL syntax error"))
        .mount(&server)
        .await;

    let store = SparqlGraphStore::connect(config_for(&server)).await.unwrap();
    let err = store.delete("A", "knows", "B").await.unwrap_err();
    match err {
        GraphError::Http { status, body } => {
            assert_eq!(status, 400);
            assert_eq!(body, "SPARQL syntax error");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn connect_creates_the_named_graph() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.create_graph = true;
    SparqlGraphStore::connect(config).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(update_text(&requests[0]), format!("CREATE GRAPH <{GRAPH}>"));
}

#[tokio::test]
async fn connect_fails_when_graph_creation_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.create_graph = true;
    assert!(SparqlGraphStore::connect(config).await.is_err());
}

#[tokio::test]
async fn separate_update_endpoint_receives_writes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/update"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.update_endpoint = Some(format!("{}/update", server.uri()));
    let store = SparqlGraphStore::connect(config).await.unwrap();
    store.drop_graph(GRAPH).await.unwrap();
}

#[tokio::test]
async fn basic_credentials_on_reads_and_writes() {
    let server = MockServer::start().await;
    Mock::given(header("authorization", "Basic ZGJhOnNlY3JldA=="))
        .respond_with(sparql_json(TWO_ROWS))
        .expect(2)
        .mount(&server)
        .await;

    let config = config_for(&server).with_credentials("dba", "secret", HttpAuth::Basic);
    let store = SparqlGraphStore::connect(config).await.unwrap();

    assert_eq!(store.get("A").await["A"].len(), 2);
    store.upsert_triplet("A", "knows", "B").await.unwrap();
}

#[tokio::test]
async fn no_credentials_means_no_authorization_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(sparql_json(TWO_ROWS))
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.user_name = Some("dba".to_string());
    let store = SparqlGraphStore::connect(config).await.unwrap();
    store.get("A").await;

    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn digest_challenge_is_answered() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header_exists("authorization"))
        .respond_with(sparql_json(TWO_ROWS))
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).insert_header(
            "www-authenticate",
            r#"Digest realm="SPARQL", nonce="4e6f6e6365", qop="auth", opaque="0a1b""#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&server).with_credentials("dba", "dba", HttpAuth::Digest);
    let store = SparqlGraphStore::connect(config).await.unwrap();
    assert_eq!(store.get("A").await["A"].len(), 2);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    let authorization = requests[1]
        .headers
        .get("authorization")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(authorization.starts_with(r#"Digest username="dba", realm="SPARQL", nonce="4e6f6e6365", uri="/sparql?query="#));
    assert!(authorization.contains("qop=auth, nc=00000001"));
    assert!(authorization.contains(r#"opaque="0a1b""#));
}

#[tokio::test]
async fn unanswerable_challenge_on_write_is_an_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(401).insert_header("www-authenticate", r#"Bearer realm="x""#),
        )
        .mount(&server)
        .await;

    let config = config_for(&server).with_credentials("dba", "dba", HttpAuth::Digest);
    let store = SparqlGraphStore::connect(config).await.unwrap();
    let err = store.upsert_triplet("A", "knows", "B").await.unwrap_err();
    assert!(matches!(err, GraphError::Auth(_)));
}

#[tokio::test]
async fn raw_query_passes_through() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(sparql_json(r#"{"head":{},"boolean":true}"#))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    let store = SparqlGraphStore::connect(config_for(&server)).await.unwrap();

    let response = store
        .query("ASK { ?s ?p ?o }", &BTreeMap::new())
        .await
        .unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.json().unwrap()["boolean"], true);

    let response = store
        .query("CLEAR GRAPH <http://example.org/scratch>", &BTreeMap::new())
        .await
        .unwrap();
    assert_eq!(response.body, "ok");

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests[1].method.as_str(), "POST");
    assert_eq!(update_text(&requests[1]), "CLEAR GRAPH <http://example.org/scratch>");
}
