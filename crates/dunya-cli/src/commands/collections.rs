//! `dunya collections`

use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Table};

use crate::api::{ApiClient, Collection};
use crate::error::Result;

pub async fn run(client: &ApiClient) -> Result<()> {
    let collections = client.list_collections().await?;
    if collections.is_empty() {
        println!("No collections on {}", client.base_url());
        return Ok(());
    }
    println!("{}", table(&collections));
    Ok(())
}

pub fn table(collections: &[Collection]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec!["Slug", "Name", "Documents", "Description"]);
    for c in collections {
        table.add_row(vec![
            c.slug.clone(),
            c.name.clone(),
            c.num_documents.to_string(),
            c.description.clone(),
        ]);
    }
    table
}
