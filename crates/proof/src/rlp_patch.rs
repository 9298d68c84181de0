//! Merkle-Patricia proof node patch for OP-Stack withdrawal proofs.
//!
//! `eth_getProof` can return a storage proof whose final element is a branch
//! node that embeds the target leaf inline (nodes shorter than 32 bytes are
//! stored in place instead of behind a hash). The on-chain verifier expects
//! the leaf as its own proof element, so we decode the final branch, locate
//! the embedded node whose path matches the tail of the target key, and append
//! its RLP encoding to the proof.
//!
//! This is a pure, deterministic transform with no I/O. Anything that does not
//! look like a 17-element branch with a matching embedded node leaves the
//! proof unchanged.

use alloy_primitives::{Bytes, B256};
use alloy_rlp::Header;

/// Hex-prefix flag bits: odd-length remaining path.
const HP_ODD: u8 = 0x1;

/// Append the embedded final leaf to `proof` when the last element is a
/// branch node carrying it inline.
///
/// `trie_key` is the full (hashed) key being proven in the storage trie.
/// Applying the patch twice is a no-op: once appended, the last element is a
/// two-item leaf, not a branch.
pub fn patch_proof(mut proof: Vec<Bytes>, trie_key: B256) -> Vec<Bytes> {
    let Some(last) = proof.last() else {
        return proof;
    };

    if let Some(embedded) = embedded_leaf(last, &nibbles(trie_key.as_slice())) {
        proof.push(embedded);
    }

    proof
}

/// Expand bytes into 4-bit nibbles, high nibble first.
fn nibbles(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push(b >> 4);
        out.push(b & 0x0f);
    }
    out
}

/// Split an RLP buffer into its top-level items, returning for each the raw
/// encoding (header included) and whether it is itself a list.
fn list_items(mut payload: &[u8]) -> Option<Vec<(&[u8], bool)>> {
    let mut items = Vec::new();
    while !payload.is_empty() {
        let raw = payload;
        let header = Header::decode(&mut payload).ok()?;
        if payload.len() < header.payload_length {
            return None;
        }
        let consumed = raw.len() - payload.len() + header.payload_length;
        items.push((&raw[..consumed], header.list));
        payload = &payload[header.payload_length..];
    }
    Some(items)
}

/// If `node` is a 17-element branch embedding the leaf for `key_nibbles`,
/// return that leaf's RLP encoding.
fn embedded_leaf(node: &[u8], key_nibbles: &[u8]) -> Option<Bytes> {
    let mut buf = node;
    let header = Header::decode(&mut buf).ok()?;
    if !header.list || buf.len() < header.payload_length {
        return None;
    }

    let items = list_items(&buf[..header.payload_length])?;
    if items.len() != 17 {
        return None;
    }

    // Only the 16 child slots can embed a node; the 17th is the branch value.
    for (raw, is_list) in &items[..16] {
        if !is_list {
            continue;
        }
        if embedded_path_matches(raw, key_nibbles) {
            return Some(Bytes::copy_from_slice(raw));
        }
    }

    None
}

/// Check whether an embedded two-item node's hex-prefix path equals the tail
/// of the target key.
fn embedded_path_matches(raw_node: &[u8], key_nibbles: &[u8]) -> bool {
    let mut buf = raw_node;
    let Ok(header) = Header::decode(&mut buf) else {
        return false;
    };
    if !header.list || buf.len() < header.payload_length {
        return false;
    }

    let Some(fields) = list_items(&buf[..header.payload_length]) else {
        return false;
    };
    if fields.len() != 2 {
        return false;
    }

    // First field is the hex-prefix encoded remaining path.
    let (mut path, path_is_list) = fields[0];
    if path_is_list {
        return false;
    }
    let Ok(path_header) = Header::decode(&mut path) else {
        return false;
    };
    let path_bytes = &path[..path_header.payload_length.min(path.len())];

    let path_nibbles = nibbles(path_bytes);
    let Some((&flag, rest)) = path_nibbles.split_first() else {
        return false;
    };
    // Even-length paths carry a padding nibble after the flag.
    let remaining = if flag & HP_ODD == HP_ODD {
        rest
    } else {
        match rest.split_first() {
            Some((&0, even_rest)) => even_rest,
            _ => return false,
        }
    };

    remaining.len() <= key_nibbles.len()
        && remaining == &key_nibbles[key_nibbles.len() - remaining.len()..]
}
