//! Analysis modules that ship with the server

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use dunya_common::checksum::{compute_file_checksum, sha256_hex};
use serde_json::json;

use super::module::{AnalysisModule, ModuleOutputs, OutputData, OutputSpec};
use super::ProcessingError;
use crate::dashboard::scanner::read_tags;

/// Size of the blocks hashed by [`FileHash`]
pub const HASH_BLOCK_SIZE: usize = 1024 * 1024;

/// Whole-file and per-block SHA-256 of an audio file
pub struct FileHash;

impl AnalysisModule for FileHash {
    fn module_path(&self) -> &'static str {
        "dunya.filehash.FileHash"
    }

    fn name(&self) -> &'static str {
        "File hash"
    }

    fn slug(&self) -> &'static str {
        "filehash"
    }

    fn version(&self) -> &'static str {
        "0.1"
    }

    fn source_type(&self) -> &'static str {
        "mp3"
    }

    fn outputs(&self) -> BTreeMap<&'static str, OutputSpec> {
        BTreeMap::from([
            ("sha256", OutputSpec::json()),
            ("blocks", OutputSpec::json().multipart()),
        ])
    }

    fn process(&self, source: &Path) -> Result<ModuleOutputs, ProcessingError> {
        let digest = compute_file_checksum(source)?;

        let mut file = File::open(source)?;
        let mut buffer = vec![0u8; HASH_BLOCK_SIZE];
        let mut blocks = Vec::new();
        let mut offset: u64 = 0;
        loop {
            let read = read_block(&mut file, &mut buffer)?;
            if read == 0 {
                break;
            }
            blocks.push(OutputData::Json(json!({
                "offset": offset,
                "size": read,
                "sha256": sha256_hex(&buffer[..read]),
            })));
            offset += read as u64;
        }
        // Empty files still get one part
        if blocks.is_empty() {
            blocks.push(OutputData::Json(json!({ "offset": 0, "size": 0, "sha256": sha256_hex(&[]) })));
        }

        Ok(ModuleOutputs::from([
            (
                "sha256".to_string(),
                vec![OutputData::Json(json!({ "sha256": digest, "size": offset }))],
            ),
            ("blocks".to_string(), blocks),
        ]))
    }
}

/// Fill `buffer` as far as the file allows
fn read_block(file: &mut File, buffer: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buffer.len() {
        match file.read(&mut buffer[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}

/// MusicBrainz identifiers found in the ID3 tag
pub struct TagInfo;

impl AnalysisModule for TagInfo {
    fn module_path(&self) -> &'static str {
        "dunya.tags.TagInfo"
    }

    fn name(&self) -> &'static str {
        "Tag information"
    }

    fn slug(&self) -> &'static str {
        "tags"
    }

    fn version(&self) -> &'static str {
        "0.1"
    }

    fn source_type(&self) -> &'static str {
        "mp3"
    }

    fn outputs(&self) -> BTreeMap<&'static str, OutputSpec> {
        BTreeMap::from([("tags", OutputSpec::json())])
    }

    fn process(&self, source: &Path) -> Result<ModuleOutputs, ProcessingError> {
        if !source.is_file() {
            return Err(ProcessingError::Module(format!(
                "{} is not a file",
                source.display()
            )));
        }
        let tags = read_tags(source);
        Ok(ModuleOutputs::from([(
            "tags".to_string(),
            vec![OutputData::Json(json!({
                "release": tags.release_mbid,
                "recording": tags.recording_mbid,
                "album": tags.album,
            }))],
        )]))
    }
}
