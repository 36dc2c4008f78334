//! Design file URL parsing
//!
//! Accepts share links of the form
//! `https://<host>/(file|design)/<key>[/<title>][?node-id=<id>]`.

use codelink_core::{CodelinkError, CodelinkResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesignUrl {
    pub file_key: String,
    pub node_id: Option<String>,
}

pub fn parse_design_url(url: &str) -> CodelinkResult<DesignUrl> {
    let invalid = |reason: &str| {
        CodelinkError::Config(format!("Invalid design file URL '{}': {}", url, reason))
    };

    let trimmed = url.trim();
    let trimmed = trimmed.split_once('#').map_or(trimmed, |(before, _)| before);
    let rest = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .ok_or_else(|| invalid("expected an http(s) URL"))?;

    let (location, query) = match rest.split_once('?') {
        Some((location, query)) => (location, Some(query)),
        None => (rest, None),
    };

    let mut segments = location.split('/').skip(1).filter(|s| !s.is_empty());
    let file_key = loop {
        match segments.next() {
            Some("file") | Some("design") => {
                break segments
                    .next()
                    .ok_or_else(|| invalid("missing file key"))?
                    .to_string();
            }
            Some(_) => continue,
            None => return Err(invalid("expected a /file/ or /design/ path")),
        }
    };

    let node_id = query.and_then(|query| {
        query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(name, _)| *name == "node-id")
            .map(|(_, value)| decode_node_id(value))
    });

    Ok(DesignUrl { file_key, node_id })
}

fn decode_node_id(value: &str) -> String {
    value
        .replace("%3A", ":")
        .replace("%3a", ":")
        .replace('-', ":")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_url_with_title() {
        let parsed = parse_design_url("https://design.example.com/file/AbC123/Components").unwrap();
        assert_eq!(parsed.file_key, "AbC123");
        assert_eq!(parsed.node_id, None);
    }

    #[test]
    fn test_design_url_with_node() {
        let parsed =
            parse_design_url("https://design.example.com/design/K9/Library?node-id=12-34&t=x").unwrap();
        assert_eq!(parsed.file_key, "K9");
        assert_eq!(parsed.node_id.as_deref(), Some("12:34"));
    }

    #[test]
    fn test_encoded_node_id() {
        let parsed = parse_design_url("https://design.example.com/file/K9?node-id=1%3A2").unwrap();
        assert_eq!(parsed.node_id.as_deref(), Some("1:2"));
    }

    #[test]
    fn test_fragment_is_ignored() {
        let parsed = parse_design_url("https://design.example.com/file/K9#section").unwrap();
        assert_eq!(parsed.file_key, "K9");
        assert_eq!(parsed.node_id, None);

        let parsed =
            parse_design_url("https://design.example.com/file/K9/Kit?node-id=4%3a5#frame").unwrap();
        assert_eq!(parsed.file_key, "K9");
        assert_eq!(parsed.node_id.as_deref(), Some("4:5"));
    }

    #[test]
    fn test_rejects_other_urls() {
        assert!(parse_design_url("design.example.com/file/K9").is_err());
        assert!(parse_design_url("https://design.example.com/proto/K9").is_err());
        assert!(parse_design_url("https://design.example.com/file/").is_err());
    }
}
