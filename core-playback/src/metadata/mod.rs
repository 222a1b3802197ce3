//! # Metadata Extraction
//!
//! Turns timed metadata entries from any backend into the flat field map
//! carried by `metadata` events.
//!
//! Each entry is named by the first usable identifier in priority order:
//! common key, format-specific key, raw identifier. Entries with no name or
//! no value are dropped. Later entries overwrite earlier ones with the same
//! name.
//!
//! ## ID3 in adaptive segments
//!
//! Adaptive demuxers hand over raw ID3v2 tags found in stream fragments.
//! Native engines already surface parsed items, so tag parsing only runs on
//! the web path. Tags are read with the `id3` crate; each frame becomes one
//! [`TimedMetadataItem`] with identifier `id3/<frame ID>`:
//!
//! | Frame | key | value |
//! |-------|-----|-------|
//! | `T***` | frame ID | text, multiple values joined with `/` |
//! | `TXXX` | description | text |
//! | `W***` | frame ID | URL |
//! | `WXXX` | description | URL |
//! | `COMM` | frame ID | comment text |
//! | `PRIV` | owner identifier | binary payload |
//! | `APIC` | frame ID | picture bytes |
//! | unknown | frame ID | raw frame body |

use bridge_traits::{MetadataValue, TimedMetadataItem};
use bytes::Bytes;
use id3::{Content, Frame, Tag};
use std::collections::BTreeMap;
use std::io::Cursor;
use tracing::{debug, trace};

/// Stateless mapping from raw entries to a field map.
#[derive(Debug, Default, Clone, Copy)]
pub struct MetadataExtractor;

impl MetadataExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Builds the field map. An empty result means no event should be sent.
    pub fn extract(&self, items: &[TimedMetadataItem]) -> BTreeMap<String, MetadataValue> {
        let mut fields = BTreeMap::new();

        for item in items {
            let Some(value) = item.value.as_ref() else {
                continue;
            };

            let name = [&item.common_key, &item.key, &item.identifier]
                .into_iter()
                .flatten()
                .find(|name| !name.is_empty());

            if let Some(name) = name {
                fields.insert(name.clone(), value.clone());
            }
        }

        fields
    }

    /// Parses raw ID3 payloads delivered by an adaptive demuxer.
    ///
    /// Payloads that are not valid tags are logged and skipped.
    pub fn parse_id3_payloads(&self, payloads: &[Bytes]) -> Vec<TimedMetadataItem> {
        let mut items = Vec::new();
        for payload in payloads {
            match Tag::read_from2(Cursor::new(payload.as_ref())) {
                Ok(tag) => items.extend(tag.frames().filter_map(frame_item)),
                Err(e) => debug!(error = %e, len = payload.len(), "Skipping ID3 payload"),
            }
        }
        items
    }
}

/// Maps ID3 frame IDs onto format-independent keys.
pub fn common_key(frame_id: &str) -> Option<&'static str> {
    match frame_id {
        "TIT2" => Some("title"),
        "TPE1" => Some("artist"),
        "TALB" => Some("albumName"),
        "TCON" => Some("type"),
        "TCOP" => Some("copyrights"),
        "TPUB" => Some("publisher"),
        "TLAN" => Some("language"),
        "TDRC" | "TYER" => Some("creationDate"),
        "APIC" => Some("artwork"),
        _ => None,
    }
}

fn frame_item(frame: &Frame) -> Option<TimedMetadataItem> {
    let id = frame.id();
    let named = |description: &str| {
        if description.is_empty() {
            id.to_string()
        } else {
            description.to_string()
        }
    };

    let (key, value) = match frame.content() {
        Content::Text(text) => (id.to_string(), MetadataValue::Text(join_values(text))),
        Content::ExtendedText(text) => (
            named(&text.description),
            MetadataValue::Text(join_values(&text.value)),
        ),
        Content::Link(url) => (id.to_string(), MetadataValue::Text(url.clone())),
        Content::ExtendedLink(link) => (
            named(&link.description),
            MetadataValue::Text(link.link.clone()),
        ),
        Content::Comment(comment) => (id.to_string(), MetadataValue::Text(comment.text.clone())),
        Content::Private(private) => (
            named(&private.owner_identifier),
            MetadataValue::Binary(private.private_data.clone()),
        ),
        Content::Picture(picture) => (id.to_string(), MetadataValue::Binary(picture.data.clone())),
        Content::Unknown(unknown) => (id.to_string(), MetadataValue::Binary(unknown.data.clone())),
        _ => {
            trace!(frame = id, "Skipping structured ID3 frame");
            return None;
        }
    };

    let item = TimedMetadataItem::new()
        .with_identifier(format!("id3/{id}"))
        .with_key(key)
        .with_value(value);
    Some(match common_key(id) {
        Some(common) => item.with_common_key(common),
        None => item,
    })
}

/// v2.4 text frames carry several null-separated values.
fn join_values(text: &str) -> String {
    text.split('\0')
        .filter(|value| !value.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use id3::frame::{ExtendedLink, ExtendedText, Private};
    use id3::{TagLike, Version};

    fn encode(tag: &Tag, version: Version) -> Bytes {
        let mut out = Vec::new();
        tag.write_to(&mut out, version).unwrap();
        Bytes::from(out)
    }

    fn parse(tag: &Tag, version: Version) -> Vec<TimedMetadataItem> {
        MetadataExtractor::new().parse_id3_payloads(&[encode(tag, version)])
    }

    fn syncsafe(value: u32) -> [u8; 4] {
        [
            ((value >> 21) & 0x7F) as u8,
            ((value >> 14) & 0x7F) as u8,
            ((value >> 7) & 0x7F) as u8,
            (value & 0x7F) as u8,
        ]
    }

    #[test]
    fn common_key_wins_over_key_and_identifier() {
        let items = vec![TimedMetadataItem::new()
            .with_common_key("title")
            .with_key("TIT2")
            .with_identifier("id3/TIT2")
            .with_value("News at Nine")];

        let fields = MetadataExtractor::new().extract(&items);

        assert_eq!(fields.len(), 1);
        assert_eq!(fields["title"], MetadataValue::Text("News at Nine".into()));
    }

    #[test]
    fn falls_back_to_key_then_identifier() {
        let items = vec![
            TimedMetadataItem::new().with_key("TXXX").with_value("a"),
            TimedMetadataItem::new()
                .with_identifier("id3/PRIV")
                .with_value(MetadataValue::Binary(vec![1, 2])),
        ];

        let fields = MetadataExtractor::new().extract(&items);

        assert_eq!(fields.keys().collect::<Vec<_>>(), vec!["TXXX", "id3/PRIV"]);
    }

    #[test]
    fn drops_entries_without_key_or_value() {
        let items = vec![
            TimedMetadataItem::new().with_value("orphan"),
            TimedMetadataItem::new().with_common_key("artist"),
            TimedMetadataItem::new().with_common_key("").with_value("blank"),
        ];

        assert!(MetadataExtractor::new().extract(&items).is_empty());
    }

    #[test]
    fn text_frames_carry_common_keys() {
        let mut tag = Tag::new();
        tag.set_title("Morning Edition");
        tag.set_artist("WNYC");

        for version in [Version::Id3v23, Version::Id3v24] {
            let fields = MetadataExtractor::new().extract(&parse(&tag, version));

            assert_eq!(fields["title"], MetadataValue::Text("Morning Edition".into()));
            assert_eq!(fields["artist"], MetadataValue::Text("WNYC".into()));
        }
    }

    #[test]
    fn items_keep_frame_identifiers() {
        let mut tag = Tag::new();
        tag.set_album("Weekend");

        let items = parse(&tag, Version::Id3v24);

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].common_key.as_deref(), Some("albumName"));
        assert_eq!(items[0].key.as_deref(), Some("TALB"));
        assert_eq!(items[0].identifier.as_deref(), Some("id3/TALB"));
    }

    #[test]
    fn txxx_uses_description_as_key() {
        let mut tag = Tag::new();
        tag.add_frame(ExtendedText {
            description: "segment".to_string(),
            value: "42".to_string(),
        });

        let items = parse(&tag, Version::Id3v24);

        assert_eq!(items[0].key.as_deref(), Some("segment"));
        assert_eq!(items[0].identifier.as_deref(), Some("id3/TXXX"));
        assert!(items[0].common_key.is_none());
        assert_eq!(items[0].value, Some(MetadataValue::Text("42".into())));
    }

    #[test]
    fn priv_frames_keep_binary_payload() {
        let timestamp = vec![0, 0, 0, 0, 0, 1, 0x5F, 0x90];
        let mut tag = Tag::new();
        tag.add_frame(Frame::with_content(
            "PRIV",
            Content::Private(Private {
                owner_identifier: "com.apple.streaming.transportStreamTimestamp".to_string(),
                private_data: timestamp.clone(),
            }),
        ));

        let items = parse(&tag, Version::Id3v24);

        assert_eq!(
            items[0].key.as_deref(),
            Some("com.apple.streaming.transportStreamTimestamp")
        );
        assert_eq!(items[0].value, Some(MetadataValue::Binary(timestamp)));
    }

    #[test]
    fn url_frames_decode_as_text() {
        let mut tag = Tag::new();
        tag.add_frame(ExtendedLink {
            description: "station".to_string(),
            link: "https://example.org".to_string(),
        });
        tag.add_frame(Frame::with_content(
            "WOAS",
            Content::Link("https://example.org/show".to_string()),
        ));

        let fields = MetadataExtractor::new().extract(&parse(&tag, Version::Id3v24));

        assert_eq!(fields["station"], MetadataValue::Text("https://example.org".into()));
        assert_eq!(fields["WOAS"], MetadataValue::Text("https://example.org/show".into()));
    }

    #[test]
    fn multi_value_text_is_joined() {
        assert_eq!(join_values("News\0Talk"), "News/Talk");
        assert_eq!(join_values("News\0"), "News");
    }

    #[test]
    fn skips_payloads_that_are_not_tags() {
        let mut tag = Tag::new();
        tag.set_title("Top of the Hour");
        let extractor = MetadataExtractor::new();

        let items = extractor.parse_id3_payloads(&[
            Bytes::from_static(b"junk"),
            encode(&tag, Version::Id3v24),
        ]);
        let fields = extractor.extract(&items);

        assert_eq!(fields.len(), 1);
        assert_eq!(fields["title"], MetadataValue::Text("Top of the Hour".into()));
    }

    #[test]
    fn oversized_frame_length_does_not_panic() {
        // v2.3 frame claiming 0xFFFFFFFF bytes inside a 14 byte tag body.
        let mut data = b"ID3".to_vec();
        data.extend_from_slice(&[3, 0, 0]);
        data.extend_from_slice(&syncsafe(14));
        data.extend_from_slice(b"TIT2");
        data.extend_from_slice(&[0xFF, 0xFF, 0xFF, 0xFF, 0, 0]);
        data.extend_from_slice(b"\0abc");
        let extractor = MetadataExtractor::new();

        let items = extractor.parse_id3_payloads(&[Bytes::from(data)]);

        assert!(items.len() <= 1);
    }
}
