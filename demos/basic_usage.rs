//! Basic usage example for polar-sdk
//!
//! Run with: POLAR_ACCESS_TOKEN=polar_oat_... cargo run --example basic_usage

use polar_sdk::{api::customers::CustomerCreate, types::AccessToken, Environment, Polar};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let token = std::env::var("POLAR_ACCESS_TOKEN")?;
    let polar = Polar::builder()
        .access_token(AccessToken::new(token)?)
        .environment(Environment::Sandbox)
        .build()?;

    let customer = polar
        .customers()
        .create(&CustomerCreate::new("jane@example.com").external_id("user_42"))
        .await?;
    println!("Created customer {} ({})", customer.id, customer.email);

    let same = polar.customers().get_external("user_42").await?;
    println!("Found by external ID: {}", same.id);

    Ok(())
}
