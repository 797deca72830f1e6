//! Binary serialization and deserialization of compiled rule sets.
//!
//! This module provides a stable binary format for persisting compiled
//! [`RuleSet`](crate::RuleSet) values. The format consists of a 32-byte fixed
//! header followed by a bincode-encoded payload.
//!
//! ## Wire Format
//!
//! ```text
//! Offset  Size  Field
//! 0       4     Magic bytes: b"TGRD"
//! 4       2     Format version (u16, little-endian)
//! 6       2     Engine version (u16, little-endian)
//! 8       4     Flags (u32, reserved)
//! 12      4     Payload length in bytes (u32, little-endian)
//! 16      16    BLAKE3 hash of the payload (truncated to 16 bytes)
//! 32..    var   Bincode-encoded payload
//! ```
//!
//! Only active rules are stored, already in scan order. Malformed nodes are
//! stored as such and still never match after loading.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::RuleDefect;
use crate::{MatchOptions, ModerationRule, NodeDefect, RuleId, RuleNode, RuleSet};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const MAGIC: &[u8; 4] = b"TGRD";
const FORMAT_VERSION: u16 = 1;
const ENGINE_VERSION: u16 = 1;
const HEADER_SIZE: usize = 32;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur when serializing a [`RuleSet`](crate::RuleSet) to bytes.
#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("failed to encode rule set: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("I/O error during serialization: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur when deserializing a [`RuleSet`](crate::RuleSet) from bytes.
#[derive(Debug, Error)]
pub enum DeserializeError {
    #[error("not a termguard binary: invalid magic bytes")]
    BadMagic,

    #[error("incompatible format version: blob is v{blob}, engine supports v{supported}")]
    IncompatibleVersion { blob: u16, supported: u16 },

    #[error("integrity check failed: BLAKE3 checksum mismatch")]
    ChecksumMismatch,

    #[error("payload length mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: u32, actual: usize },

    #[error("failed to decode payload: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("I/O error during deserialization: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Serialized type hierarchy
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
struct SerializedRuleSet {
    metadata: RuleSetMetadata,
    rules: Vec<SerializedRule>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RuleSetMetadata {
    rule_count: usize,
    inactive_count: usize,
    source_digest: Option<[u8; 32]>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SerializedRule {
    id: u64,
    name: String,
    root: SerializedNode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum SerializedNode {
    Leaf {
        kind: LeafKind,
        min: u64,
        terms: Vec<String>,
        case_sensitive: bool,
        whole_word: bool,
    },
    And(Vec<SerializedNode>),
    Or(Vec<SerializedNode>),
    Malformed(NodeDefect),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum LeafKind {
    Any,
    All,
    NotAny,
    AtLeast,
}

// ---------------------------------------------------------------------------
// Node conversion
// ---------------------------------------------------------------------------

fn serialize_leaf(kind: LeafKind, min: usize, terms: &[String], options: MatchOptions) -> SerializedNode {
    SerializedNode::Leaf {
        kind,
        min: min as u64,
        terms: terms.to_vec(),
        case_sensitive: options.case_sensitive,
        whole_word: options.whole_word,
    }
}

fn serialize_node(node: &RuleNode) -> SerializedNode {
    match node {
        RuleNode::Any { terms, options } => serialize_leaf(LeafKind::Any, 0, terms, *options),
        RuleNode::All { terms, options } => serialize_leaf(LeafKind::All, 0, terms, *options),
        RuleNode::NotAny { terms, options } => {
            serialize_leaf(LeafKind::NotAny, 0, terms, *options)
        }
        RuleNode::AtLeast {
            min,
            terms,
            options,
        } => serialize_leaf(LeafKind::AtLeast, *min, terms, *options),
        RuleNode::And(children) => SerializedNode::And(children.iter().map(serialize_node).collect()),
        RuleNode::Or(children) => SerializedNode::Or(children.iter().map(serialize_node).collect()),
        RuleNode::Malformed { defect } => SerializedNode::Malformed(defect.clone()),
    }
}

fn deserialize_node(node: SerializedNode) -> Result<RuleNode, DeserializeError> {
    match node {
        SerializedNode::Leaf {
            kind,
            min,
            terms,
            case_sensitive,
            whole_word,
        } => {
            let options = MatchOptions {
                case_sensitive,
                whole_word,
            };
            Ok(match kind {
                LeafKind::Any => RuleNode::Any { terms, options },
                LeafKind::All => RuleNode::All { terms, options },
                LeafKind::NotAny => RuleNode::NotAny { terms, options },
                LeafKind::AtLeast => RuleNode::AtLeast {
                    min: usize::try_from(min).map_err(|_| {
                        DeserializeError::Validation(format!("at_least min {min} too large"))
                    })?,
                    terms,
                    options,
                },
            })
        }
        SerializedNode::And(children) => Ok(RuleNode::And(
            children
                .into_iter()
                .map(deserialize_node)
                .collect::<Result<_, _>>()?,
        )),
        SerializedNode::Or(children) => Ok(RuleNode::Or(
            children
                .into_iter()
                .map(deserialize_node)
                .collect::<Result<_, _>>()?,
        )),
        SerializedNode::Malformed(defect) => Ok(RuleNode::Malformed { defect }),
    }
}

// ---------------------------------------------------------------------------
// RuleSet <-> SerializedRuleSet
// ---------------------------------------------------------------------------

fn ruleset_to_serialized(ruleset: &RuleSet, source_text: Option<&str>) -> SerializedRuleSet {
    let source_digest = source_text.map(|s| *blake3::hash(s.as_bytes()).as_bytes());

    let rules = ruleset
        .rules
        .iter()
        .map(|r| SerializedRule {
            id: r.id.0,
            name: r.name.clone(),
            root: serialize_node(&r.root),
        })
        .collect();

    SerializedRuleSet {
        metadata: RuleSetMetadata {
            rule_count: ruleset.rules.len(),
            inactive_count: ruleset.inactive,
            source_digest,
        },
        rules,
    }
}

fn serialized_to_ruleset(ser: SerializedRuleSet) -> Result<RuleSet, DeserializeError> {
    validate(&ser)?;

    let rules = ser
        .rules
        .into_iter()
        .map(|sr| {
            Ok(ModerationRule {
                id: RuleId(sr.id),
                name: sr.name,
                active: true,
                root: deserialize_node(sr.root)?.into_strict(),
            })
        })
        .collect::<Result<Vec<_>, DeserializeError>>()?;

    let defects = rules
        .iter()
        .flat_map(|rule| {
            rule.root.defects().into_iter().map(|defect| RuleDefect {
                rule_id: rule.id,
                rule_name: rule.name.clone(),
                defect,
            })
        })
        .collect();

    Ok(RuleSet {
        rules,
        inactive: ser.metadata.inactive_count,
        defects,
        source_digest: ser.metadata.source_digest,
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(ser: &SerializedRuleSet) -> Result<(), DeserializeError> {
    if ser.metadata.rule_count != ser.rules.len() {
        return Err(DeserializeError::Validation(format!(
            "metadata says {} rules but payload has {}",
            ser.metadata.rule_count,
            ser.rules.len()
        )));
    }

    let mut seen = HashSet::new();
    for rule in &ser.rules {
        if !seen.insert(rule.id) {
            return Err(DeserializeError::Validation(format!(
                "duplicate rule id {}",
                rule.id
            )));
        }
    }

    // Scan order is ascending by name.
    for window in ser.rules.windows(2) {
        if window[0].name > window[1].name {
            return Err(DeserializeError::Validation(
                "rules not sorted by ascending name".to_owned(),
            ));
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Header I/O
// ---------------------------------------------------------------------------

fn write_header(buf: &mut Vec<u8>, payload: &[u8]) {
    let hash = blake3::hash(payload);
    let hash_bytes = hash.as_bytes();

    buf.extend_from_slice(MAGIC);
    buf.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    buf.extend_from_slice(&ENGINE_VERSION.to_le_bytes());
    buf.extend_from_slice(&0u32.to_le_bytes()); // flags (reserved)
    #[allow(clippy::cast_possible_truncation)] // payload will never exceed 4 GiB
    let payload_len = payload.len() as u32;
    buf.extend_from_slice(&payload_len.to_le_bytes());
    buf.extend_from_slice(&hash_bytes[..16]);
}

#[allow(clippy::cast_possible_truncation)] // HEADER_SIZE is 32, always fits in u32
fn read_header(bytes: &[u8]) -> Result<(u16, u32, [u8; 16]), DeserializeError> {
    if bytes.len() < HEADER_SIZE {
        return Err(DeserializeError::LengthMismatch {
            expected: HEADER_SIZE as u32,
            actual: bytes.len(),
        });
    }

    if &bytes[0..4] != MAGIC {
        return Err(DeserializeError::BadMagic);
    }

    let format_version = u16::from_le_bytes([bytes[4], bytes[5]]);
    // bytes[6..8] is engine_version (informational), bytes[8..12] is flags
    let payload_len = u32::from_le_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]);

    let mut hash = [0u8; 16];
    hash.copy_from_slice(&bytes[16..32]);

    Ok((format_version, payload_len, hash))
}

// ---------------------------------------------------------------------------
// Public encode/decode
// ---------------------------------------------------------------------------

pub(crate) fn encode(ruleset: &RuleSet, source_text: Option<&str>) -> Result<Vec<u8>, SerializeError> {
    let serialized = ruleset_to_serialized(ruleset, source_text);
    let payload = bincode::serde::encode_to_vec(&serialized, bincode::config::standard())?;

    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());
    write_header(&mut buf, &payload);
    buf.extend_from_slice(&payload);
    Ok(buf)
}

pub(crate) fn decode(bytes: &[u8]) -> Result<RuleSet, DeserializeError> {
    let (format_version, payload_len, stored_hash) = read_header(bytes)?;

    if format_version != FORMAT_VERSION {
        return Err(DeserializeError::IncompatibleVersion {
            blob: format_version,
            supported: FORMAT_VERSION,
        });
    }

    let payload_end = HEADER_SIZE + payload_len as usize;
    if bytes.len() < payload_end {
        return Err(DeserializeError::LengthMismatch {
            expected: payload_len,
            actual: bytes.len() - HEADER_SIZE,
        });
    }
    let payload = &bytes[HEADER_SIZE..payload_end];

    let computed_hash = blake3::hash(payload);
    if computed_hash.as_bytes()[..16] != stored_hash {
        return Err(DeserializeError::ChecksumMismatch);
    }

    let (serialized, _): (SerializedRuleSet, usize) =
        bincode::serde::decode_from_slice(payload, bincode::config::standard())?;

    serialized_to_ruleset(serialized)
}
