//! `dunya status`

use colored::Colorize;

use crate::api::ApiClient;
use crate::error::Result;

pub async fn run(client: &ApiClient) -> Result<()> {
    let health = client.health_check().await?;
    println!(
        "{} {} (database {})",
        client.base_url(),
        health.status.green(),
        health.database
    );
    Ok(())
}
