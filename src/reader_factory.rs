//! The Reader Factory (component M): classifies a stream by its first
//! non-whitespace byte (or a filename extension override) and resolves
//! external-metadata sibling files, per `spec.md` §4.M/§4.F/§6.
//!
//! Grounded on `linkml-core`'s `SchemaFormat`-dispatch idiom in
//! `traits.rs`: a small closed enum plus pure classification functions,
//! with actual file access kept to one thin convenience wrapper so the
//! classification logic itself stays unit-testable on plain strings.

use crate::codec::{SetReader, SetWriter};
use crate::config::SssomConfig;
use crate::error::{Result, SssomError};
use crate::model::mapping_set::MappingSet;
use crate::prefix::ExtendedPrefixMap;
use crate::tsv::{self, ExternalMetadata};
use std::path::Path;
use tracing::{debug, warn};

/// Which codec a stream belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    /// SSSOM/TSV: YAML front matter (optional) plus a tab-separated body.
    Tsv,
    /// A JSON document (long IRIs, or CURIEs plus a JSON-LD `@context`).
    Json,
    /// Turtle, one `owl:Axiom`-reified node per mapping.
    Turtle,
}

/// Classify `content` by its first non-whitespace byte: `#` or a lowercase
/// letter/digit is TSV (with or without embedded metadata — `src/tsv`
/// tells those apart itself via `split_front_matter`); `{` is JSON; `@` or
/// `[` is Turtle.
#[must_use]
pub fn peek_codec(content: &str) -> Codec {
    match content.trim_start().chars().next() {
        Some('{') => Codec::Json,
        Some('@' | '[') => Codec::Turtle,
        _ => Codec::Tsv,
    }
}

/// A filename extension override for [`peek_codec`]. Returns `None` for an
/// unrecognised or absent extension, in which case the caller should fall
/// back to peeking.
#[must_use]
pub fn codec_from_filename(filename: &str) -> Option<Codec> {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())?
        .to_ascii_lowercase();
    match ext.as_str() {
        "tsv" => Some(Codec::Tsv),
        "json" | "jsonld" => Some(Codec::Json),
        "ttl" => Some(Codec::Turtle),
        _ => None,
    }
}

/// Resolve the codec for a stream: a recognised filename extension wins,
/// otherwise fall back to peeking `content`.
#[must_use]
pub fn resolve_codec(content: &str, filename: Option<&str>) -> Codec {
    filename
        .and_then(codec_from_filename)
        .unwrap_or_else(|| peek_codec(content))
}

/// Where a TSV file's metadata lives, other than inline front matter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataSource {
    /// An explicit `path:metapath` pairing.
    Explicit { path: String, metapath: String },
    /// The `PATH` -> `PATH.sssom.yml` auto-detected sibling convention.
    Sibling { path: String, metapath: String },
}

impl MetadataSource {
    /// The primary data file's path, with any `:metapath` suffix stripped.
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::Explicit { path, .. } | Self::Sibling { path, .. } => path,
        }
    }

    /// The candidate metadata file's path. For [`Self::Sibling`] this is a
    /// guess the caller should check for existence before reading — an
    /// absent sibling simply means the metadata is inline or truly absent.
    #[must_use]
    pub fn metapath(&self) -> &str {
        match self {
            Self::Explicit { metapath, .. } | Self::Sibling { metapath, .. } => metapath,
        }
    }
}

/// Parse a reader-supplied path into its [`MetadataSource`], per `spec.md`
/// §4.F/§6: `PATH:METAPATH` is an explicit pairing; a bare `PATH` implies
/// the sibling `PATH.sssom.yml`.
#[must_use]
pub fn resolve_metadata_source(path: &str) -> MetadataSource {
    match path.split_once(':') {
        Some((p, m)) => MetadataSource::Explicit {
            path: p.to_string(),
            metapath: m.to_string(),
        },
        None => MetadataSource::Sibling {
            path: path.to_string(),
            metapath: format!("{path}.sssom.yml"),
        },
    }
}

/// Parse already-read `content` into a [`MappingSet`], dispatching on
/// `resolve_codec(content, filename)`.
///
/// # Errors
/// Returns [`SssomError::Format`] if `content` classifies as JSON or
/// Turtle — this crate carries no built-in implementation of either codec,
/// only the [`crate::codec::SetReader`] seam a caller can implement
/// against — and otherwise whatever [`tsv::read_mapping_set`] returns.
pub fn read_mapping_set_auto(
    content: &str,
    filename: Option<&str>,
    external_metadata: Option<&ExternalMetadata>,
    epm: Option<(&ExtendedPrefixMap, crate::config::EpmMode)>,
    config: &SssomConfig,
) -> Result<MappingSet> {
    match resolve_codec(content, filename) {
        Codec::Tsv => tsv::read_mapping_set(content, external_metadata, epm, config),
        Codec::Json => Err(SssomError::format(
            "JSON input recognised but no SetReader was supplied for it",
        )),
        Codec::Turtle => Err(SssomError::format(
            "Turtle input recognised but no SetReader was supplied for it",
        )),
    }
}

/// As [`read_mapping_set_auto`], but for JSON/Turtle content delegates to a
/// caller-supplied codec implementation instead of erroring.
///
/// # Errors
/// As [`read_mapping_set_auto`] for TSV; otherwise whatever `reader` returns.
pub fn read_mapping_set_with(
    content: &str,
    filename: Option<&str>,
    external_metadata: Option<&ExternalMetadata>,
    epm: Option<(&ExtendedPrefixMap, crate::config::EpmMode)>,
    config: &SssomConfig,
    json_reader: Option<&dyn SetReader>,
    turtle_reader: Option<&dyn SetReader>,
) -> Result<MappingSet> {
    match resolve_codec(content, filename) {
        Codec::Tsv => tsv::read_mapping_set(content, external_metadata, epm, config),
        Codec::Json => json_reader
            .ok_or_else(|| SssomError::format("no JSON SetReader was supplied"))?
            .read(content, config),
        Codec::Turtle => turtle_reader
            .ok_or_else(|| SssomError::format("no Turtle SetReader was supplied"))?
            .read(content, config),
    }
}

/// Read a [`MappingSet`] from `path`, auto-resolving TSV external metadata
/// via [`resolve_metadata_source`] when `path` has no inline front matter
/// of its own and no `:metapath` was given explicitly.
///
/// # Errors
/// Returns [`SssomError::Io`] for a filesystem failure reading `path` (a
/// missing auto-detected sibling metadata file is not an error — it is
/// treated as "no external metadata"), and otherwise as
/// [`read_mapping_set_auto`].
pub fn read_mapping_set_from_path(
    path: &str,
    epm: Option<(&ExtendedPrefixMap, crate::config::EpmMode)>,
    config: &SssomConfig,
) -> Result<MappingSet> {
    let source = resolve_metadata_source(path);
    debug!(path = source.path(), "reading mapping set");
    let content = std::fs::read_to_string(source.path())?;

    let external = match &source {
        MetadataSource::Explicit { metapath, .. } => {
            debug!(metapath, "reading explicit external metadata");
            Some(ExternalMetadata(std::fs::read_to_string(metapath)?))
        }
        MetadataSource::Sibling { metapath, .. } => {
            if content.trim_start().starts_with('#') {
                None
            } else {
                match std::fs::read_to_string(metapath) {
                    Ok(text) => Some(ExternalMetadata(text)),
                    Err(e) => {
                        warn!(metapath, error = %e, "no sibling metadata file found, reading without it");
                        None
                    }
                }
            }
        }
    };

    read_mapping_set_auto(&content, Some(source.path()), external.as_ref(), epm, config)
}

/// Write `set` to `path` in TSV form via [`tsv::write_mapping_set`].
///
/// # Errors
/// Returns [`SssomError::Io`] for a filesystem failure, otherwise as
/// [`tsv::write_mapping_set`].
pub fn write_mapping_set_to_path(path: &str, set: &MappingSet, config: &SssomConfig) -> Result<()> {
    let rendered = tsv::write_mapping_set(set, config)?;
    std::fs::write(path, rendered)?;
    Ok(())
}

#[allow(dead_code)]
fn assert_codec_traits_object_safe(_: &dyn SetReader, _: &dyn SetWriter) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peek_classifies_tsv_json_and_turtle() {
        assert_eq!(peek_codec("# title: x\nsubject_id\t...\n"), Codec::Tsv);
        assert_eq!(peek_codec("subject_id\tpredicate_id\n"), Codec::Tsv);
        assert_eq!(peek_codec("  {\"mappings\": []}"), Codec::Json);
        assert_eq!(peek_codec("@prefix ex: <https://example.org/> .\n"), Codec::Turtle);
        assert_eq!(peek_codec("[ a owl:Axiom ] .\n"), Codec::Turtle);
    }

    #[test]
    fn filename_extension_overrides_peeking() {
        assert_eq!(codec_from_filename("mappings.json"), Some(Codec::Json));
        assert_eq!(codec_from_filename("mappings.ttl"), Some(Codec::Turtle));
        assert_eq!(codec_from_filename("mappings.tsv"), Some(Codec::Tsv));
        assert_eq!(codec_from_filename("mappings.txt"), None);
        assert_eq!(
            resolve_codec("{\"a\": 1}", Some("mappings.tsv")),
            Codec::Tsv
        );
    }

    #[test]
    fn explicit_metapath_pairing_splits_on_colon() {
        let source = resolve_metadata_source("data/mappings.tsv:data/meta.yml");
        assert_eq!(source.path(), "data/mappings.tsv");
        assert_eq!(source.metapath(), "data/meta.yml");
        assert!(matches!(source, MetadataSource::Explicit { .. }));
    }

    #[test]
    fn bare_path_implies_sibling_suffix() {
        let source = resolve_metadata_source("data/mappings.tsv");
        assert_eq!(source.metapath(), "data/mappings.tsv.sssom.yml");
        assert!(matches!(source, MetadataSource::Sibling { .. }));
    }

    #[test]
    fn auto_reader_rejects_json_without_a_registered_codec() {
        let cfg = SssomConfig::default();
        let err = read_mapping_set_auto("{}", None, None, None, &cfg).unwrap_err();
        assert!(matches!(err, SssomError::Format { .. }));
    }
}
