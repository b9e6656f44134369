//! Derived-file resolver
//!
//! Given a document and a slug, picks exactly one file to serve. The slug is
//! either a source file type (`mp3`, `pdf`, ...) or the slug of an analysis
//! module. For modules the version, output subtype and part narrow the
//! choice; anything left ambiguous is reported as [`DocserverError::TooMany`]
//! rather than guessed.
//!
//! The caller loads the candidates (see `features::files::queries::resolve`)
//! and this module only applies the selection rules.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{layout, DocserverError};

/// What the client asked for
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRequest {
    pub slug: String,
    #[serde(default)]
    pub subtype: Option<String>,
    /// Kept as text so that a non-numeric part is reported, not rejected by
    /// the extractor
    #[serde(default)]
    pub part: Option<String>,
    #[serde(default, rename = "v")]
    pub version: Option<String>,
}

impl FileRequest {
    pub fn new(slug: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            ..Default::default()
        }
    }

    pub fn subtype(mut self, subtype: impl Into<String>) -> Self {
        self.subtype = Some(subtype.into());
        self
    }

    pub fn part(mut self, part: impl Into<String>) -> Self {
        self.part = Some(part.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

/// A source file of the requested type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceCandidate {
    pub full_path: PathBuf,
    pub extension: String,
    pub mimetype: String,
    pub size: i64,
}

/// One part of a derived file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartCandidate {
    pub part_order: i32,
    pub full_path: PathBuf,
    pub size: i64,
}

/// A derived file of one module version for the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedCandidate {
    pub outputname: String,
    pub extension: String,
    pub mimetype: String,
    pub parts: Vec<PartCandidate>,
}

/// A module version together with the document's derived files for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionCandidate {
    pub version: String,
    pub date_added: DateTime<Utc>,
    pub derived: Vec<DerivedCandidate>,
}

/// What the request slug turned out to name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlugTarget {
    SourceType(Vec<SourceCandidate>),
    Module { slug: String, versions: Vec<VersionCandidate> },
    Unknown,
}

/// How the chosen file was reached, used to build its URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolvedKind {
    Source {
        extension: String,
    },
    Derived {
        module: String,
        version: String,
        outputname: String,
        part: i32,
    },
}

/// The single file selected for a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedFile {
    pub full_path: PathBuf,
    pub mimetype: String,
    pub size: i64,
    #[serde(flatten)]
    pub kind: ResolvedKind,
}

impl ResolvedFile {
    pub fn url(&self, mbid: &str) -> String {
        match &self.kind {
            ResolvedKind::Source { extension } => layout::source_url(mbid, extension),
            ResolvedKind::Derived {
                module,
                version,
                outputname,
                part,
            } => layout::derived_url(mbid, module, *part, version, outputname),
        }
    }
}

/// Select the file named by `request` among the loaded candidates.
pub fn resolve(request: &FileRequest, target: SlugTarget) -> Result<ResolvedFile, DocserverError> {
    match target {
        SlugTarget::SourceType(files) => select_source(files),
        SlugTarget::Module { slug, versions } => select_derived(request, &slug, versions),
        SlugTarget::Unknown => Err(DocserverError::not_found(format!(
            "Cannot find a module with type {}",
            request.slug
        ))),
    }
}

fn select_source(mut files: Vec<SourceCandidate>) -> Result<ResolvedFile, DocserverError> {
    match files.len() {
        0 => Err(DocserverError::not_found(
            "Looks like a sourcefile, but I can't find one",
        )),
        1 => {
            let file = files.remove(0);
            Ok(ResolvedFile {
                full_path: file.full_path,
                mimetype: file.mimetype,
                size: file.size,
                kind: ResolvedKind::Source {
                    extension: file.extension,
                },
            })
        },
        n => Err(DocserverError::too_many(format!(
            "Found {} source files of this type for the document",
            n
        ))),
    }
}

fn select_derived(
    request: &FileRequest,
    module_slug: &str,
    mut versions: Vec<VersionCandidate>,
) -> Result<ResolvedFile, DocserverError> {
    match request.version {
        Some(ref wanted) => versions.retain(|v| &v.version == wanted),
        None => versions.sort_by(|a, b| b.date_added.cmp(&a.date_added)),
    }

    if versions.is_empty() {
        return Err(DocserverError::not_found("No known versions for this module"));
    }

    // Newest version that produced anything matching wins
    let found = versions.into_iter().find_map(|v| {
        let matching: Vec<DerivedCandidate> = v
            .derived
            .into_iter()
            .filter(|d| request.subtype.as_ref().map_or(true, |s| &d.outputname == s))
            .collect();
        if matching.is_empty() {
            None
        } else {
            Some((v.version, matching))
        }
    });

    let (version, mut derived) = match found {
        Some(found) => found,
        None => {
            let mut message = "No derived files with this type/subtype".to_string();
            if request.version.is_some() {
                message.push_str(" or version");
            }
            return Err(DocserverError::not_found(message));
        },
    };

    if derived.len() > 1 {
        return Err(DocserverError::too_many(
            "Found more than 1 subtype for this module but you haven't specified what you want",
        ));
    }

    let derived = derived.remove(0);
    // A lone output still has to be named explicitly, otherwise adding a
    // second output to the module would silently change the answer
    if request.subtype.as_deref() != Some(derived.outputname.as_str()) {
        return Err(DocserverError::not_found(format!(
            "This module has only one subtype which you must specify ({})",
            derived.outputname
        )));
    }

    let part = select_part(request.part.as_deref(), derived.parts)?;

    Ok(ResolvedFile {
        full_path: part.full_path,
        mimetype: derived.mimetype,
        size: part.size,
        kind: ResolvedKind::Derived {
            module: module_slug.to_string(),
            version,
            outputname: derived.outputname,
            part: part.part_order,
        },
    })
}

fn select_part(
    part: Option<&str>,
    mut parts: Vec<PartCandidate>,
) -> Result<PartCandidate, DocserverError> {
    if let Some(part) = part {
        let wanted: i32 = part
            .trim()
            .parse()
            .map_err(|_| DocserverError::not_found("Invalid part"))?;
        parts.retain(|p| p.part_order == wanted);
    }

    match parts.len() {
        0 => Err(DocserverError::not_found("No parts on this file")),
        1 => Ok(parts.remove(0)),
        _ => Err(DocserverError::too_many("Found more than 1 part without part set")),
    }
}
