//! `dunya document <mbid>`

use colored::Colorize;
use dunya_common::types::ExternalId;

use crate::api::{ApiClient, Document};
use crate::error::Result;

pub async fn run(client: &ApiClient, mbid: &str) -> Result<()> {
    let id: ExternalId = mbid.parse()?;
    let document = client.get_document(id.as_str()).await?;
    print!("{}", render(&document));
    Ok(())
}

/// Plain-text summary: title, collections, source files, then one line per
/// module output
pub fn render(document: &Document) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", document.title.bold()));
    if let Some(ref id) = document.external_identifier {
        out.push_str(&format!("  Id:          {}\n", id));
    }
    out.push_str(&format!("  Collections: {}\n", document.collections.join(", ")));
    out.push_str(&format!("  Source files: {}\n", document.sourcefiles.join(", ")));

    if document.derivedfiles.is_empty() {
        out.push_str("  No derived files\n");
        return out;
    }
    out.push_str(&format!("{}\n", "Derived files:".cyan()));
    for (module, outputs) in &document.derivedfiles {
        for (name, output) in outputs {
            out.push_str(&format!(
                "  {}/{} ({}, {} part{}) versions {}\n",
                module,
                name,
                output.mimetype,
                output.numparts,
                if output.numparts == 1 { "" } else { "s" },
                output.versions.join(", ")
            ));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::DerivedOutput;
    use std::collections::BTreeMap;

    #[test]
    fn test_render_lists_outputs() {
        colored::control::set_override(false);
        let document = Document {
            external_identifier: Some("8c2f8e5f-5f2b-4c3e-9d3a-1b2c3d4e5f60".to_string()),
            title: "Sri Raghuvara".to_string(),
            collections: vec!["carnatic".to_string()],
            sourcefiles: vec!["mp3".to_string()],
            derivedfiles: BTreeMap::from([(
                "filehash".to_string(),
                BTreeMap::from([(
                    "blocks".to_string(),
                    DerivedOutput {
                        extension: "json".to_string(),
                        mimetype: "application/json".to_string(),
                        numparts: 3,
                        versions: vec!["0.1".to_string()],
                    },
                )]),
            )]),
        };

        let rendered = render(&document);
        assert!(rendered.starts_with("Sri Raghuvara\n"));
        assert!(rendered.contains("filehash/blocks (application/json, 3 parts) versions 0.1"));
    }
}
