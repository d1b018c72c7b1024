use hubtest::auth::StaticTokenProvider;
use hubtest::config::StreamIdentity;
use hubtest::discovery::{
    AtomFeedSource, PartitionDirectory, PartitionMode, PartitionSource,
};
use hubtest::error::HarnessError;
use hubtest::partition::PartitionId;
use integration::init_tracing;
use std::sync::Arc;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SIGNATURE: &str = "SharedAccessSignature sr=test&sig=abc&se=123&skn=key";
const FEED: &str = r#"<feed xmlns="http://www.w3.org/2005/Atom">
    <title type="text">myhub</title>
    <entry><title type="text">0</title></entry>
    <entry><title type="text">1</title></entry>
    <entry><title type="text">2</title></entry>
</feed>"#;

fn identity() -> StreamIdentity {
    StreamIdentity {
        host: "test.servicebus.windows.net".to_string(),
        entity: "myhub".to_string(),
        consumer_group: "$Default".to_string(),
    }
}

fn source_for(server: &MockServer) -> AtomFeedSource {
    init_tracing();
    AtomFeedSource::with_endpoint(
        &server.uri(),
        &identity(),
        Arc::new(StaticTokenProvider::new(SIGNATURE)),
    )
    .unwrap()
}

#[tokio::test]
async fn discovery_request_follows_the_metadata_contract() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/myhub/consumergroups/$Default/partitions"))
        .and(header("Authorization", SIGNATURE))
        .and(header("Content-Type", "application/atom+xml;type=entry"))
        .and(header("charset", "utf-8"))
        .respond_with(ResponseTemplate::new(200).set_body_string(FEED))
        .expect(1)
        .mount(&server)
        .await;

    let source = source_for(&server);
    let partition_ids = source.fetch_partitions().await.unwrap();
    assert_eq!(
        partition_ids,
        vec![
            PartitionId::from("0"),
            PartitionId::from("1"),
            PartitionId::from("2"),
        ]
    );
}

#[tokio::test]
async fn directory_issues_at_most_one_discovery_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(FEED))
        .expect(1)
        .mount(&server)
        .await;

    let directory = PartitionDirectory::new(Arc::new(source_for(&server)));
    let first = directory.resolve(PartitionMode::Query).await.unwrap();
    let second = directory.resolve(PartitionMode::Query).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.len(), 3);
}

#[tokio::test]
async fn error_status_surfaces_as_a_discovery_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let source = source_for(&server);
    let result = source.fetch_partitions().await;
    assert!(matches!(result, Err(HarnessError::Discovery { .. })));
}

#[tokio::test]
async fn feed_without_entries_means_the_entity_does_not_exist() {
    let server = MockServer::start().await;
    let empty_feed = r#"<feed xmlns="http://www.w3.org/2005/Atom"><title>myhub</title></feed>"#;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(empty_feed))
        .mount(&server)
        .await;

    let directory = PartitionDirectory::new(Arc::new(source_for(&server)));
    let result = directory.resolve(PartitionMode::Query).await;
    assert!(matches!(result, Err(HarnessError::EntityNotFound)));
}
