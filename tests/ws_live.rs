//! Integration tests against a live deployment of the platform.
//!
//! These exercise the full login → connect → subscribe → receive →
//! disconnect lifecycle against a real backend.
//!
//! All tests are `#[ignore]` because they require network access and a
//! configured environment:
//!
//! ```bash
//! PRICEWATCH_API_URL=... PRICEWATCH_EMAIL=... PRICEWATCH_PASSWORD=... \
//!     cargo test --test ws_live -- --ignored
//! ```

#![cfg(all(feature = "http", feature = "ws-native"))]

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::time::timeout;

use pricewatch_sdk::auth::store::MemoryTokenStore;
use pricewatch_sdk::client::PriceWatchClient;
use pricewatch_sdk::shared::AssetType;
use pricewatch_sdk::ws::{Kind, WsEvent};

const TEST_TIMEOUT: Duration = Duration::from_secs(15);

fn env(key: &str) -> String {
    dotenvy::dotenv().ok();
    std::env::var(key).unwrap_or_else(|_| panic!("{key} must be set for live tests"))
}

async fn logged_in_client() -> PriceWatchClient {
    let client = PriceWatchClient::builder()
        .base_url(&env("PRICEWATCH_API_URL"))
        .token_store(Arc::new(MemoryTokenStore::new()))
        .build()
        .expect("client builds");

    client
        .auth()
        .login(&env("PRICEWATCH_EMAIL"), &env("PRICEWATCH_PASSWORD"))
        .await
        .expect("login should succeed");

    client
}

#[tokio::test]
#[ignore]
async fn login_and_fetch_profile() {
    let client = logged_in_client().await;
    assert!(client.auth().is_authenticated().await);
    let session = client.auth().session().await.unwrap();
    assert!(session.user_id > 0);
    client.auth().logout().await;
}

#[tokio::test]
#[ignore]
async fn pull_single_and_batch_prices() {
    let client = logged_in_client().await;

    let btc = client
        .markets()
        .price("BTC", AssetType::Crypto)
        .await
        .expect("BTC price resolves");
    assert!(btc.price > 0.into());

    let batch = client
        .markets()
        .prices(&["BTC".into(), "ETH".into()], AssetType::Crypto)
        .await
        .expect("batch resolves");
    assert!(!batch.prices.is_empty());

    client.auth().logout().await;
}

#[tokio::test]
#[ignore]
async fn connect_subscribe_and_receive() {
    let client = logged_in_client().await;

    let mut relay = client.ws().await.expect("relay for live session");
    relay.connect().await.expect("connect should succeed");

    {
        let events = relay.events();
        tokio::pin!(events);

        let first = timeout(TEST_TIMEOUT, events.next())
            .await
            .expect("timed out waiting for Connected")
            .expect("event stream ended");
        assert!(matches!(first, WsEvent::Connected));

        relay.subscribe("BTC").expect("subscribe");

        // Either the ack or an actual update proves the round trip.
        let ev = timeout(TEST_TIMEOUT, async {
            while let Some(ev) = events.next().await {
                match &ev {
                    WsEvent::Message(Kind::Subscribed(_))
                    | WsEvent::Message(Kind::PriceUpdate(_)) => return ev,
                    _ => {}
                }
            }
            panic!("event stream ended");
        })
        .await
        .expect("timed out waiting for subscribe ack");
        drop(ev);
    }

    relay.disconnect().await.expect("disconnect");
    assert!(!relay.is_connected());

    client.auth().logout().await;
}
