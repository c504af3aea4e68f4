//! The opaque signaling token: descriptor + candidates, JSON-encoded
//! then text-safe-encoded.
//!
//! The wire shape is an ordered JSON array —
//! `[descriptor, candidate, ...moreCandidates]` — run through URL-safe
//! base64 so the result can ride in a URL query parameter or a pasted
//! text blob.

use std::net::SocketAddr;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};

use crate::SignalError;

/// Whether a descriptor opens an exchange or responds to one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Offer,
    Answer,
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Intent::Offer => write!(f, "offer"),
            Intent::Answer => write!(f, "answer"),
        }
    }
}

/// The local connection parameters one peer generates for the other.
///
/// `session` is a random nonce minted by the host when the offer is
/// created; the answer must echo it. It is what makes tokens
/// single-use: a token for a dead exchange carries a nonce nobody is
/// waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Descriptor {
    pub intent: Intent,
    pub session: u64,
}

/// A network reachability hint: one address the peer can try.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub addr: SocketAddr,
}

/// A complete signaling token: one descriptor plus a bounded,
/// order-preserving candidate list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalToken {
    pub descriptor: Descriptor,
    pub candidates: Vec<Candidate>,
}

impl SignalToken {
    /// Encodes the token into its text-safe form.
    pub fn encode(&self) -> String {
        let mut parts = vec![
            serde_json::to_value(self.descriptor).expect("descriptor serializes"),
        ];
        parts.extend(self.candidates.iter().map(|c| {
            serde_json::to_value(c).expect("candidate serializes")
        }));
        let json = serde_json::to_string(&parts).expect("token array serializes");
        URL_SAFE_NO_PAD.encode(json)
    }

    /// Decodes a token from its text-safe form. Leading/trailing
    /// whitespace from copy/paste is tolerated.
    pub fn decode(text: &str) -> Result<Self, SignalError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(text.trim())
            .map_err(|e| SignalError::BadToken(format!("base64: {e}")))?;
        let parts: Vec<serde_json::Value> = serde_json::from_slice(&bytes)
            .map_err(|e| SignalError::BadToken(format!("json: {e}")))?;

        let mut parts = parts.into_iter();
        let descriptor = parts
            .next()
            .ok_or_else(|| SignalError::BadToken("empty token array".into()))?;
        let descriptor: Descriptor = serde_json::from_value(descriptor)
            .map_err(|e| SignalError::BadToken(format!("descriptor: {e}")))?;

        let candidates = parts
            .map(|v| {
                serde_json::from_value(v)
                    .map_err(|e| SignalError::BadToken(format!("candidate: {e}")))
            })
            .collect::<Result<Vec<Candidate>, _>>()?;

        Ok(Self {
            descriptor,
            candidates,
        })
    }
}
