//! Filesystem scan of a dashboard collection
//!
//! Walks the collection root, groups `.mp3` files by directory and reads the
//! MusicBrainz identifiers from their ID3 tags.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use id3::TagLike;
use tracing::debug;
use uuid::Uuid;
use walkdir::WalkDir;

const MUSICBRAINZ_UFID_OWNER: &str = "http://musicbrainz.org";
const RELEASE_ID_DESCRIPTION: &str = "MusicBrainz Album Id";

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("Collection root {0} is not a directory")]
    RootMissing(PathBuf),
    #[error("Error walking collection: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// MusicBrainz data carried in a file's tags
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackTags {
    pub release_mbid: Option<Uuid>,
    pub recording_mbid: Option<Uuid>,
    pub album: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedFile {
    pub name: String,
    pub size: i64,
    pub tags: TrackTags,
}

/// A directory containing at least one mp3, path relative to the root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedDirectory {
    pub path: String,
    pub files: Vec<ScannedFile>,
}

impl ScannedDirectory {
    /// The release every file in the directory is tagged with. Directories
    /// with untagged files or files from several releases stay unmatched.
    pub fn release_mbid(&self) -> Option<Uuid> {
        let first = self.files.first()?.tags.release_mbid?;
        self.files
            .iter()
            .all(|f| f.tags.release_mbid == Some(first))
            .then_some(first)
    }

    pub fn album_title(&self) -> Option<&str> {
        self.files.iter().find_map(|f| f.tags.album.as_deref())
    }
}

/// Shorten long paths for display: the first and last 30 characters around
/// an ellipsis.
pub fn short_path(path: &str) -> String {
    let chars: Vec<char> = path.chars().collect();
    if chars.len() < 60 {
        return path.to_string();
    }
    let head: String = chars[..30].iter().collect();
    let tail: String = chars[chars.len() - 30..].iter().collect();
    format!("{}\u{2026}{}", head, tail)
}

fn parse_mbid(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw.trim_matches(char::from(0)).trim()).ok()
}

fn ufid_recording(owner: &str, identifier: &[u8]) -> Option<Uuid> {
    if owner != MUSICBRAINZ_UFID_OWNER {
        return None;
    }
    parse_mbid(&String::from_utf8_lossy(identifier))
}

/// Extract MusicBrainz identifiers from a parsed ID3 tag
pub fn tags_from(tag: &id3::Tag) -> TrackTags {
    let release_mbid = tag
        .extended_texts()
        .find(|t| t.description == RELEASE_ID_DESCRIPTION)
        .and_then(|t| parse_mbid(&t.value));

    let recording_mbid = tag.frames().filter(|f| f.id() == "UFID").find_map(|frame| {
        match frame.content() {
            id3::Content::UniqueFileIdentifier(ufid) => {
                ufid_recording(&ufid.owner_identifier, &ufid.identifier)
            },
            // Older tag versions can leave UFID undecoded: owner\0identifier
            id3::Content::Unknown(unknown) => {
                let split = unknown.data.iter().position(|&b| b == 0)?;
                let owner = String::from_utf8_lossy(&unknown.data[..split]);
                ufid_recording(&owner, &unknown.data[split + 1..])
            },
            _ => None,
        }
    });

    TrackTags {
        release_mbid,
        recording_mbid,
        album: tag.album().map(str::to_string),
    }
}

/// Read tags from a file. Files without a readable tag give empty tags.
pub fn read_tags(path: &Path) -> TrackTags {
    match id3::Tag::read_from_path(path) {
        Ok(tag) => tags_from(&tag),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "No readable ID3 tag");
            TrackTags::default()
        },
    }
}

fn is_mp3(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("mp3"))
        .unwrap_or(false)
}

/// Walk `root` and return every directory that holds mp3 files, sorted by
/// path, files sorted by name.
pub fn scan_directory(root: &Path) -> Result<Vec<ScannedDirectory>, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::RootMissing(root.to_path_buf()));
    }

    let mut grouped: BTreeMap<String, Vec<ScannedFile>> = BTreeMap::new();

    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry?;
        if !entry.file_type().is_file() || !is_mp3(entry.path()) {
            continue;
        }

        let parent = entry.path().parent().unwrap_or(root);
        let relative = parent
            .strip_prefix(root)
            .unwrap_or(parent)
            .to_string_lossy()
            .to_string();
        let size = entry.metadata()?.len() as i64;

        grouped.entry(relative).or_default().push(ScannedFile {
            name: entry.file_name().to_string_lossy().to_string(),
            size,
            tags: read_tags(entry.path()),
        });
    }

    Ok(grouped
        .into_iter()
        .map(|(path, mut files)| {
            files.sort_by(|a, b| a.name.cmp(&b.name));
            ScannedDirectory { path, files }
        })
        .collect())
}
