//! API endpoint URL builders

use urlencoding::encode;

pub fn health_url(base_url: &str) -> String {
    format!("{}/health", base_url)
}

pub fn collections_url(base_url: &str) -> String {
    format!("{}/docserver/collections", base_url)
}

pub fn document_url(base_url: &str, mbid: &str) -> String {
    format!("{}/docserver/by-id/{}", base_url, encode(mbid))
}

/// Download URL of a file. Only the parameters that are set are sent.
pub fn download_url(
    base_url: &str,
    mbid: &str,
    slug: &str,
    subtype: Option<&str>,
    part: Option<u32>,
    version: Option<&str>,
) -> String {
    let mut url = format!("{}/docserver/by-id/{}/{}", base_url, encode(mbid), encode(slug));

    let mut params = Vec::new();
    if let Some(subtype) = subtype {
        params.push(format!("subtype={}", encode(subtype)));
    }
    if let Some(part) = part {
        params.push(format!("part={}", part));
    }
    if let Some(version) = version {
        params.push(format!("v={}", encode(version)));
    }
    if !params.is_empty() {
        url.push('?');
        url.push_str(&params.join("&"));
    }

    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_url() {
        assert_eq!(
            download_url("http://d", "abc", "mp3", None, None, None),
            "http://d/docserver/by-id/abc/mp3"
        );
        assert_eq!(
            download_url("http://d", "abc", "filehash", Some("blocks"), Some(2), Some("0.1")),
            "http://d/docserver/by-id/abc/filehash?subtype=blocks&part=2&v=0.1"
        );
        assert_eq!(
            download_url("http://d", "abc", "pitch", Some("a b"), None, None),
            "http://d/docserver/by-id/abc/pitch?subtype=a%20b"
        );
    }
}
