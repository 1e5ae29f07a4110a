//! Verifying a webhook delivery
//!
//! A web framework hands you the request headers and raw body; this example
//! builds them by hand.
//!
//! Run with: cargo run --example webhook_receiver

use chrono::Utc;
use http::{HeaderMap, HeaderValue};
use polar_sdk::api::orders::Order;
use polar_sdk::webhooks::{HEADER_ID, HEADER_SIGNATURE, HEADER_TIMESTAMP};
use polar_sdk::{Webhook, WebhookSecret};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let webhook = Webhook::new(&WebhookSecret::new("polar_whs_example_secret")?)?;

    let body = br#"{"type":"order.paid","timestamp":"2024-06-01T12:00:00Z","data":{"id":"ord_1","created_at":"2024-06-01T12:00:00Z","status":"paid"}}"#;
    let timestamp = Utc::now().timestamp();

    let mut headers = HeaderMap::new();
    headers.insert(HEADER_ID, HeaderValue::from_static("msg_1"));
    headers.insert(HEADER_TIMESTAMP, HeaderValue::from_str(&timestamp.to_string())?);
    headers.insert(
        HEADER_SIGNATURE,
        HeaderValue::from_str(&webhook.sign("msg_1", timestamp, body)?)?,
    );

    let payload = webhook.verify(&headers, body)?;
    match payload.event_type.as_str() {
        "order.paid" => {
            let order: Order = payload.data_as()?;
            println!("Order {} paid", order.id);
        }
        other => println!("Ignoring {other}"),
    }

    Ok(())
}
