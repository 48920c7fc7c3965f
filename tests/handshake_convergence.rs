//! Subscribe handshake under datagram loss

mod support;

use std::time::Duration;

use tokio_test::{assert_err, assert_ok};

use smb_rs::client::{Subscriber, SubscriberPhase};
use smb_rs::{BrokerConfig, Error, TopicFilter};

use support::{loopback_socket, spawn_broker, spawn_broker_on, LossyTransport, RECV_DEADLINE};

fn filter() -> TopicFilter {
    TopicFilter::parse("weather/berlin").unwrap()
}

#[tokio::test]
async fn test_lost_subscribes() {
    let broker = spawn_broker().await;

    let transport = LossyTransport::loopback(3).await;
    let mut subscriber = Subscriber::with_transport(broker.client_config(), filter(), transport);

    assert_ok!(tokio::time::timeout(RECV_DEADLINE, subscriber.subscribe())
        .await
        .unwrap());

    assert_eq!(subscriber.phase(), SubscriberPhase::Listening);
    assert_eq!(subscriber.transport().dropped(), 3);
    assert_eq!(subscriber.attempts(), 4);

    let stats = broker.broker.stats().await;
    assert_eq!(stats.subscribes, 1);
    assert_eq!(stats.registrations, 1);
}

#[tokio::test]
async fn test_lost_acks() {
    let broker = spawn_broker_on(BrokerConfig::default(), LossyTransport::loopback(2).await);

    let mut subscriber = Subscriber::connect(broker.client_config(), filter())
        .await
        .unwrap();

    assert_ok!(tokio::time::timeout(RECV_DEADLINE, subscriber.subscribe())
        .await
        .unwrap());

    assert_eq!(subscriber.attempts(), 3);
    assert_eq!(broker.broker.transport().dropped(), 2);

    // Every retry hit the same registration
    let stats = broker.broker.stats().await;
    assert_eq!(stats.registrations, 1);
    assert_eq!(stats.registrations_created, 1);
    assert_eq!(stats.registrations_updated, 2);
    assert_eq!(stats.acks_sent, 3);
}

#[tokio::test]
async fn test_lost_subscribes_and_acks() {
    let broker = spawn_broker_on(BrokerConfig::default(), LossyTransport::loopback(2).await);

    let transport = LossyTransport::loopback(2).await;
    let mut subscriber = Subscriber::with_transport(broker.client_config(), filter(), transport);

    assert_ok!(tokio::time::timeout(RECV_DEADLINE, subscriber.subscribe())
        .await
        .unwrap());

    assert_eq!(subscriber.attempts(), 5);
    assert_eq!(broker.broker.registry().read().await.len(), 1);
}

#[tokio::test]
async fn test_registry_full_never_acks() {
    let config = BrokerConfig::default().max_registrations(1);
    let broker = spawn_broker_on(config, loopback_socket().await);

    let mut first = Subscriber::connect(broker.client_config(), filter())
        .await
        .unwrap();
    assert_ok!(tokio::time::timeout(RECV_DEADLINE, first.subscribe())
        .await
        .unwrap());

    let mut second = Subscriber::connect(broker.client_config(), filter())
        .await
        .unwrap();
    let result = second
        .subscribe_until(tokio::time::sleep(Duration::from_millis(350)))
        .await;

    assert!(matches!(result, Err(Error::Cancelled)));
    assert_eq!(second.phase(), SubscriberPhase::AwaitingAck);
    assert!(second.attempts() >= 2);
    assert!(broker.broker.stats().await.subscribes_rejected >= 2);
}

#[tokio::test]
async fn test_cancel_when_broker_silent() {
    // Bound but never answers
    let silent = loopback_socket().await;
    let config = smb_rs::ClientConfig::new(silent.local_addr().unwrap())
        .ack_timeout(support::ACK_TIMEOUT);

    let mut subscriber = Subscriber::connect(config, filter()).await.unwrap();
    let result = subscriber
        .subscribe_until(tokio::time::sleep(Duration::from_millis(350)))
        .await;

    assert_err!(&result);
    assert!(matches!(result, Err(Error::Cancelled)));
    assert!(subscriber.attempts() >= 2);

    // Every attempt reached the socket unchanged
    let mut buf = [0u8; 64];
    let (len, _) = silent.recv_from(&mut buf).await.unwrap();
    assert_eq!(&buf[..len], b"Sweather/berlin");
}
