//! On-disk layout and download URLs for docserver files
//!
//! Source files live under `<collection root>/<stype>/` and are stored with
//! a path relative to that directory. Derived files live under the audio
//! root, sharded by the first two characters of the document's MBID:
//!
//! ```text
//! <audio root>/<collection id>/<mbid[:2]>/<mbid>/<module slug>/<version>/<module slug>-<output>-<part>.<ext>
//! ```

use std::path::{Path, PathBuf};

use dunya_common::types::ExternalId;
use uuid::Uuid;

/// Directory, relative to the audio root, holding one module version's output
/// for one document.
pub fn derived_dir(
    collection_id: Uuid,
    mbid: &ExternalId,
    module_slug: &str,
    version: &str,
) -> PathBuf {
    PathBuf::from(collection_id.to_string())
        .join(mbid.stub())
        .join(mbid.as_str())
        .join(module_slug)
        .join(version)
}

/// File name of a single derived part. Parts are numbered from 1.
pub fn part_file_name(module_slug: &str, outputname: &str, part: i32, extension: &str) -> String {
    format!("{}-{}-{}.{}", module_slug, outputname, part, extension)
}

/// Relative path of a derived part, as stored in `derived_file_parts.path`
pub fn derived_part_path(
    collection_id: Uuid,
    mbid: &ExternalId,
    module_slug: &str,
    version: &str,
    outputname: &str,
    part: i32,
    extension: &str,
) -> PathBuf {
    derived_dir(collection_id, mbid, module_slug, version).join(part_file_name(
        module_slug,
        outputname,
        part,
        extension,
    ))
}

/// Directory holding source files of one type: `<collection root>/<stype>`
pub fn source_type_root(collection_root: &Path, stype: &str) -> PathBuf {
    collection_root.join(stype)
}

/// Normalise a source file path for storage.
///
/// Paths below the type root are made relative to it, matching whole
/// components only. Any other path keeps its components, minus a
/// leading `/`.
pub fn relative_source_path(type_root: &Path, path: &str) -> String {
    let path = Path::new(path);
    let stripped = path.strip_prefix(type_root).unwrap_or(path);
    stripped
        .to_string_lossy()
        .trim_start_matches('/')
        .to_string()
}

/// Path segments under `/docserver/by-id/<mbid>/` that are not file slugs
pub const RESERVED_SLUGS: &[&str] = &["logs"];

/// Download URL of a source file, addressed by its extension
pub fn source_url(mbid: &str, extension: &str) -> String {
    format!("/docserver/by-id/{}/{}", mbid, extension)
}

/// Download URL of one derived part
pub fn derived_url(mbid: &str, module_slug: &str, part: i32, version: &str, subtype: &str) -> String {
    format!(
        "/docserver/by-id/{}/{}?part={}&v={}&subtype={}",
        mbid, module_slug, part, version, subtype
    )
}
