//! Per-document summary of derived files for the API

use std::collections::BTreeMap;

use serde::Serialize;

/// One derived file row, joined with its module and version
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct DerivedRow {
    pub module_slug: String,
    pub outputname: String,
    pub extension: String,
    pub mimetype: String,
    pub numparts: i64,
    pub version: String,
}

/// Output entry: format of an output and the versions that produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DerivedOutput {
    pub extension: String,
    pub mimetype: String,
    pub numparts: i64,
    pub versions: Vec<String>,
}

/// `{module slug: {outputname: output}}`
pub type DerivedMap = BTreeMap<String, BTreeMap<String, DerivedOutput>>;

/// Group derived file rows by module and output name.
///
/// Rows are expected in the order versions were added. Format fields come
/// from the first row seen for an output; later versions only add to
/// `versions`.
pub fn build(rows: impl IntoIterator<Item = DerivedRow>) -> DerivedMap {
    let mut map = DerivedMap::new();

    for row in rows {
        let outputs = map.entry(row.module_slug).or_default();
        match outputs.get_mut(&row.outputname) {
            Some(output) => {
                if !output.versions.contains(&row.version) {
                    output.versions.push(row.version);
                }
            },
            None => {
                outputs.insert(
                    row.outputname,
                    DerivedOutput {
                        extension: row.extension,
                        mimetype: row.mimetype,
                        numparts: row.numparts,
                        versions: vec![row.version],
                    },
                );
            },
        }
    }

    map
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(module: &str, output: &str, version: &str, numparts: i64) -> DerivedRow {
        DerivedRow {
            module_slug: module.to_string(),
            outputname: output.to_string(),
            extension: "json".to_string(),
            mimetype: "application/json".to_string(),
            numparts,
            version: version.to_string(),
        }
    }

    #[test]
    fn test_groups_by_module_and_output() {
        let map = build(vec![
            row("pitch", "pitch", "0.1", 1),
            row("pitch", "histogram", "0.1", 1),
            row("pitch", "pitch", "0.2", 1),
            row("audioimages", "waveform8", "0.3", 12),
        ]);

        assert_eq!(map.len(), 2);
        assert_eq!(map["pitch"]["pitch"].versions, vec!["0.1", "0.2"]);
        assert_eq!(map["pitch"]["histogram"].versions, vec!["0.1"]);
        assert_eq!(map["audioimages"]["waveform8"].numparts, 12);
    }

    #[test]
    fn test_serialises_as_nested_object() {
        let map = build(vec![row("tonic", "tonic", "0.1", 1)]);
        let json = serde_json::to_value(&map).unwrap();
        assert_eq!(json["tonic"]["tonic"]["extension"], "json");
        assert_eq!(json["tonic"]["tonic"]["versions"][0], "0.1");
    }

    #[test]
    fn test_empty() {
        assert!(build(Vec::new()).is_empty());
    }
}
