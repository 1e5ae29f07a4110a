//! Usage-based billing: ingest events, then read a meter and the customer's
//! balances.
//!
//! Run with: POLAR_ACCESS_TOKEN=polar_oat_... cargo run --example usage_billing

use chrono::{Duration, Utc};
use futures::TryStreamExt;
use polar_sdk::api::events::EventCreate;
use polar_sdk::api::meters::{MeterListQuery, MeterQuantitiesQuery};
use polar_sdk::api::TimeInterval;
use polar_sdk::{AccessToken, Environment, Polar};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let polar = Polar::builder()
        .access_token(AccessToken::new(std::env::var("POLAR_ACCESS_TOKEN")?)?)
        .environment(Environment::Sandbox)
        .requests_per_minute(120)
        .build()?;

    let events: Vec<_> = (0..3)
        .map(|_| EventCreate::for_external_customer("api_call", "user_42"))
        .collect();
    let ingested = polar.events().ingest(&events).await?;
    println!("Ingested {} events", ingested.inserted);

    let meters: Vec<_> = polar
        .meters()
        .list_all(&MeterListQuery::new())
        .try_collect()
        .await?;

    let end = Utc::now();
    let start = end - Duration::days(7);
    for meter in meters {
        let query = MeterQuantitiesQuery::new(start, end, TimeInterval::Day)
            .external_customer_id("user_42");
        let quantities = polar.meters().quantities(&meter.id, &query).await?;
        println!("{}: {} over the last week", meter.name, quantities.total);
    }

    Ok(())
}
