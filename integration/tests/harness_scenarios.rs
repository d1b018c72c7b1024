use hubtest::config::HarnessConfig;
use hubtest::discovery::PartitionMode;
use hubtest::error::{CloseScope, HarnessError};
use hubtest::harness::EventHubHarness;
use hubtest::partition::PartitionId;
use integration::init_tracing;
use integration::mock_client::{MockClientFactory, MockHubClient, MockPartitionSource};
use std::sync::Arc;

const CONNECTION_STRING: &str =
    "Endpoint=sb://test.servicebus.windows.net/;SharedAccessKeyName=k;SharedAccessKey=v;EntityPath=myhub";

fn harness_with(source: Arc<MockPartitionSource>) -> EventHubHarness {
    init_tracing();
    let config = HarnessConfig::new(CONNECTION_STRING.parse().unwrap());
    EventHubHarness::with_partition_source(config, source)
}

#[tokio::test]
async fn sending_twice_to_one_synthetic_partition_reuses_a_single_sender() {
    let source = Arc::new(MockPartitionSource::new(&["unused"]));
    let mut harness = harness_with(source.clone());
    let client = Arc::new(MockHubClient::new());
    let factory = MockClientFactory::new(client.clone());

    let partition_ids = harness
        .setup(PartitionMode::Synthetic(4), &factory)
        .await
        .unwrap();
    assert_eq!(
        partition_ids,
        vec![
            PartitionId::from("0"),
            PartitionId::from("1"),
            PartitionId::from("2"),
            PartitionId::from("3"),
        ]
    );

    let partition_id = PartitionId::from("2");
    harness
        .send_to_partition(&partition_id, "hello")
        .await
        .unwrap();
    harness
        .send_to_partition(&partition_id, "world")
        .await
        .unwrap();

    assert_eq!(client.creations_for(&partition_id), 1);
    let senders = client.senders();
    assert_eq!(senders.len(), 1);
    assert_eq!(senders[0].send_count(), 2);
    let payloads = senders[0].payloads();
    assert_eq!(payloads[0].as_bytes(), b"hello");
    assert_eq!(payloads[1].as_bytes(), b"world");
    // Synthetic mode must never reach the metadata endpoint.
    assert_eq!(source.fetch_count(), 0);
    assert_eq!(factory.creation_count(), 1);
}

#[tokio::test]
async fn query_setup_resolves_partitions_through_the_source_once() {
    let source = Arc::new(MockPartitionSource::new(&["0", "1"]));
    let mut harness = harness_with(source.clone());
    let factory = MockClientFactory::new(Arc::new(MockHubClient::new()));

    let first = harness.setup(PartitionMode::Query, &factory).await.unwrap();
    let second = harness
        .setup_without_senders(PartitionMode::Query)
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(source.fetch_count(), 1);
}

#[tokio::test]
async fn sends_before_setup_fail_with_client_not_initialized() {
    let harness = harness_with(Arc::new(MockPartitionSource::new(&["0"])));

    let to_partition = harness
        .send_to_partition(&PartitionId::from("0"), "hello")
        .await;
    assert!(matches!(
        to_partition,
        Err(HarnessError::ClientNotInitialized)
    ));

    let to_any = harness.send_to_any("hello").await;
    assert!(matches!(to_any, Err(HarnessError::ClientNotInitialized)));
}

#[tokio::test]
async fn send_to_any_issues_independent_events_through_the_default_sender() {
    let mut harness = harness_with(Arc::new(MockPartitionSource::new(&["0"])));
    let client = Arc::new(MockHubClient::new());
    let factory = MockClientFactory::new(client.clone());
    harness
        .setup(PartitionMode::Synthetic(1), &factory)
        .await
        .unwrap();

    harness.send_to_any("one").await.unwrap();
    harness.send_to_any_n("again".into(), 3).await.unwrap();

    assert_eq!(client.default_send_count(), 4);
    // Default sends never create partition senders.
    assert!(client.senders().is_empty());
}

#[tokio::test]
async fn shutdown_closes_each_sender_once_and_the_client() {
    let mut harness = harness_with(Arc::new(MockPartitionSource::new(&["0"])));
    let client = Arc::new(MockHubClient::new());
    let factory = MockClientFactory::new(client.clone());
    harness
        .setup(PartitionMode::Synthetic(3), &factory)
        .await
        .unwrap();
    for id in ["0", "1", "2"] {
        harness
            .send_to_partition(&PartitionId::from(id), "ping")
            .await
            .unwrap();
    }

    harness.shutdown().await.unwrap();

    let senders = client.senders();
    assert_eq!(senders.len(), 3);
    for sender in &senders {
        assert_eq!(sender.close_count(), 1);
    }
    assert_eq!(client.close_count(), 1);

    // Repeated shutdown is a no-op: nothing is closed twice.
    harness.shutdown().await.unwrap();
    for sender in &senders {
        assert_eq!(sender.close_count(), 1);
    }
    assert_eq!(client.close_count(), 1);
}

#[tokio::test]
async fn shutdown_without_a_client_closes_nothing() {
    let mut harness = harness_with(Arc::new(MockPartitionSource::new(&["0"])));
    harness
        .setup_without_senders(PartitionMode::Synthetic(2))
        .await
        .unwrap();
    harness.shutdown().await.unwrap();
}

#[tokio::test]
async fn shutdown_aggregates_every_close_failure() {
    let mut harness = harness_with(Arc::new(MockPartitionSource::new(&["0"])));
    let client = Arc::new(MockHubClient::with_failing_closes());
    let factory = MockClientFactory::new(client.clone());
    harness
        .setup(PartitionMode::Synthetic(2), &factory)
        .await
        .unwrap();
    harness
        .send_to_partition(&PartitionId::from("0"), "a")
        .await
        .unwrap();
    harness
        .send_to_partition(&PartitionId::from("1"), "b")
        .await
        .unwrap();

    let result = harness.shutdown().await;
    let Err(HarnessError::Close(failures)) = result else {
        panic!("expected aggregated close failures");
    };
    // Two failing senders plus the failing client, all of them attempted.
    assert_eq!(failures.len(), 3);
    assert_eq!(
        failures
            .iter()
            .filter(|(scope, _)| matches!(scope, CloseScope::Sender(_)))
            .count(),
        2
    );
    assert_eq!(
        failures
            .iter()
            .filter(|(scope, _)| *scope == CloseScope::Client)
            .count(),
        1
    );
    for sender in client.senders() {
        assert_eq!(sender.close_count(), 1);
    }
    assert_eq!(client.close_count(), 1);
}

#[tokio::test]
async fn harness_exposes_the_resolved_stream_identity() {
    let harness = harness_with(Arc::new(MockPartitionSource::new(&["0"])));
    assert_eq!(harness.hub_name(), "myhub");
    assert_eq!(harness.consumer_group(), "$Default");
    assert_eq!(
        harness.connection_string().endpoint_host(),
        "test.servicebus.windows.net"
    );
}
