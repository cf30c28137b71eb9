//! Bookmark Encoder/Decoder
//!
//! A bookmark names the last record a caller has seen: its sort value, its
//! id, and the source it came from. Tokens are opaque to callers but not
//! secret; a keyed blake3 MAC makes them tamper-evident, and an embedded
//! collection fingerprint makes them unusable against a different context,
//! sort key, or source list.
//!
//! Token layout: `hex(payload || mac)` where `payload` is bincode of
//! [`BookmarkPayload`] and `mac = blake3::keyed_hash(key, payload)`.

use crate::error::CollatorError;
use crate::types::{Context, RecordId, SortKey, SortValue, SourcePosition, SourceTag};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

pub const BOOKMARK_VERSION: u8 = 1;

const MAC_LEN: usize = blake3::OUT_LEN;
const KEY_DERIVATION_CONTEXT: &str = "lti-apps bookmark signing key v1";

/// Position of the last record handed to a caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub source: SourceTag,
    pub value: SortValue,
    pub id: RecordId,
}

impl Bookmark {
    pub fn new(source: SourceTag, value: SortValue, id: RecordId) -> Self {
        Self { source, value, id }
    }

    pub fn position(&self) -> SourcePosition {
        SourcePosition::new(self.value.clone(), self.id)
    }
}

/// What a bookmark is valid for: one context, one sort key, one ordered
/// list of sources
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionIdentity {
    pub context: Context,
    pub sort_key: SortKey,
    pub sources: Vec<SourceTag>,
}

impl CollectionIdentity {
    pub fn new(context: Context, sort_key: SortKey, sources: Vec<SourceTag>) -> Self {
        Self {
            context,
            sort_key,
            sources,
        }
    }

    /// 128-bit fingerprint embedded in every token
    pub fn fingerprint(&self) -> [u8; 16] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"context:");
        hasher.update(&[self.context.context_type.tag_byte()]);
        hasher.update(&self.context.id.to_be_bytes());
        hasher.update(b"sort:");
        hasher.update(self.sort_key.as_str().as_bytes());
        hasher.update(b"sources:");
        for source in &self.sources {
            hasher.update(source.as_str().as_bytes());
            hasher.update(b";");
        }
        let mut fingerprint = [0u8; 16];
        fingerprint.copy_from_slice(&hasher.finalize().as_bytes()[..16]);
        fingerprint
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct BookmarkPayload {
    version: u8,
    collection: [u8; 16],
    source: SourceTag,
    value: SortValue,
    id: RecordId,
}

/// Signs and verifies bookmark tokens
#[derive(Clone)]
pub struct BookmarkCodec {
    key: [u8; 32],
}

impl fmt::Debug for BookmarkCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BookmarkCodec").finish_non_exhaustive()
    }
}

impl BookmarkCodec {
    /// Derive the signing key from a configured secret
    pub fn from_secret(secret: &str) -> Self {
        Self {
            key: blake3::derive_key(KEY_DERIVATION_CONTEXT, secret.as_bytes()),
        }
    }

    pub fn encode(
        &self,
        identity: &CollectionIdentity,
        bookmark: &Bookmark,
    ) -> Result<String, CollatorError> {
        let payload = BookmarkPayload {
            version: BOOKMARK_VERSION,
            collection: identity.fingerprint(),
            source: bookmark.source,
            value: bookmark.value.clone(),
            id: bookmark.id,
        };
        let mut bytes = bincode::serialize(&payload).map_err(|e| {
            CollatorError::InvalidArgument(format!("failed to encode bookmark: {}", e))
        })?;
        let mac = blake3::keyed_hash(&self.key, &bytes);
        bytes.extend_from_slice(mac.as_bytes());
        Ok(hex::encode(bytes))
    }

    pub fn decode(
        &self,
        identity: &CollectionIdentity,
        token: &str,
    ) -> Result<Bookmark, CollatorError> {
        let bookmark = self.decode_unlogged(identity, token);
        if let Err(ref e) = bookmark {
            warn!(context = %identity.context, error = %e, "Rejected bookmark");
        }
        bookmark
    }

    fn decode_unlogged(
        &self,
        identity: &CollectionIdentity,
        token: &str,
    ) -> Result<Bookmark, CollatorError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(invalid("bookmark must not be empty"));
        }
        let bytes = hex::decode(token).map_err(|e| invalid(&format!("not hex: {}", e)))?;
        if bytes.len() <= MAC_LEN {
            return Err(invalid("bookmark truncated"));
        }

        let (payload, mac) = bytes.split_at(bytes.len() - MAC_LEN);
        let mac: [u8; MAC_LEN] = mac
            .try_into()
            .map_err(|_| invalid("bookmark truncated"))?;
        // blake3::Hash equality is constant-time
        if blake3::Hash::from(mac) != blake3::keyed_hash(&self.key, payload) {
            return Err(invalid("signature mismatch"));
        }

        let payload: BookmarkPayload = bincode::deserialize(payload)
            .map_err(|e| invalid(&format!("malformed payload: {}", e)))?;
        if payload.version != BOOKMARK_VERSION {
            return Err(invalid(&format!("unsupported version {}", payload.version)));
        }
        if payload.collection != identity.fingerprint() {
            return Err(invalid("issued for a different collection"));
        }
        if !identity.sources.contains(&payload.source) {
            return Err(invalid(&format!("unknown source '{}'", payload.source)));
        }
        if !identity.sort_key.accepts(&payload.value) {
            return Err(invalid(&format!(
                "sort value does not match sort key '{}'",
                identity.sort_key
            )));
        }

        Ok(Bookmark {
            source: payload.source,
            value: payload.value,
            id: payload.id,
        })
    }
}

fn invalid(reason: &str) -> CollatorError {
    CollatorError::InvalidBookmark(reason.to_string())
}
