//! Response bodies of the docserver API

use std::collections::BTreeMap;

use serde::Deserialize;

/// Success envelope: `{ "success": true, "data": ..., "meta": ... }`
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(default)]
    pub meta: Option<serde_json::Value>,
}

/// Error envelope: `{ "success": false, "error": { "code", "message" } }`
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Collection {
    pub id: String,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
    pub num_documents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DerivedOutput {
    pub extension: String,
    pub mimetype: String,
    pub numparts: i64,
    pub versions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Document {
    pub external_identifier: Option<String>,
    pub title: String,
    pub collections: Vec<String>,
    pub sourcefiles: Vec<String>,
    /// `{module slug: {output name: output}}`
    pub derivedfiles: BTreeMap<String, BTreeMap<String, DerivedOutput>>,
}

/// `GET /health`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Health {
    pub status: String,
    pub database: String,
}
