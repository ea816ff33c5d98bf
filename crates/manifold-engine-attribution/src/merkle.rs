//! Merkle proof chain over attribution records.
//!
//! Leaves are SHA-256 hashes of canonically serialized records; interior
//! nodes hash the concatenation of their children. Odd nodes are duplicated
//! at each level. Verification is a pure function of
//! `(record, proof, root)` and needs no access to the tree, so any
//! downstream auditor can check inclusion independently.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{AttributionError, AttributionResult};
use crate::weigher::AttributionRecord;

/// 32-byte SHA-256 digest.
pub type Hash = [u8; 32];

/// Domain separator for leaf hashes.
const LEAF_PREFIX: u8 = 0x00;
/// Domain separator for interior node hashes.
const NODE_PREFIX: u8 = 0x01;

/// Which side a sibling hash sits on along the proof path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

/// One sibling along the leaf-to-root path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProofNode {
    /// Sibling hash at this level
    pub hash: Hash,
    /// Side the sibling occupies relative to the running hash
    pub side: Side,
}

/// Inclusion proof for one attribution record.
///
/// Immutable once generated; a holder can verify it against any root without
/// contacting the producer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MerkleProof {
    /// Hash of the proven record's canonical serialization
    pub leaf_hash: Hash,
    /// Root the proof commits to
    pub root_hash: Hash,
    /// Sibling hashes from leaf level up to (excluding) the root
    pub path: Vec<ProofNode>,
}

/// Canonical byte serialization of a record.
///
/// Field order is fixed and the weight is encoded via its IEEE-754 bit
/// pattern, so two records hash equal exactly when they are equal.
fn canonical_bytes(record: &AttributionRecord) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(record.contributor_id.len() + 16);
    bytes.extend_from_slice(record.contributor_id.as_bytes());
    bytes.push(b'|');
    bytes.extend_from_slice(&record.weight.to_bits().to_be_bytes());
    bytes.push(b'|');
    bytes.extend_from_slice(&record.period.to_be_bytes());
    bytes
}

fn hash_leaf(record: &AttributionRecord) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update([LEAF_PREFIX]);
    hasher.update(canonical_bytes(record));
    hasher.finalize().into()
}

fn hash_node(left: &Hash, right: &Hash) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update([NODE_PREFIX]);
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}

/// Binary Merkle tree over an ordered record set.
#[derive(Debug, Clone)]
pub struct ProofChain {
    /// levels[0] = leaf hashes, last level = [root]
    levels: Vec<Vec<Hash>>,
}

impl ProofChain {
    /// Build the tree bottom-up from the period's ordered records.
    pub fn build(records: &[AttributionRecord]) -> AttributionResult<Self> {
        if records.is_empty() {
            return Err(AttributionError::EmptyRecordSet);
        }

        let mut levels: Vec<Vec<Hash>> = vec![records.iter().map(hash_leaf).collect()];
        while levels.last().map(Vec::len).unwrap_or(0) > 1 {
            let prev = levels.last().unwrap();
            let mut next = Vec::with_capacity(prev.len().div_ceil(2));
            for pair in prev.chunks(2) {
                let left = &pair[0];
                // Odd node pairs with itself.
                let right = pair.get(1).unwrap_or(left);
                next.push(hash_node(left, right));
            }
            levels.push(next);
        }

        debug!(
            leaves = levels[0].len(),
            depth = levels.len(),
            "built merkle proof chain"
        );
        Ok(Self { levels })
    }

    /// Root commitment over all records.
    pub fn root(&self) -> Hash {
        self.levels.last().unwrap()[0]
    }

    /// Number of leaves.
    pub fn leaf_count(&self) -> usize {
        self.levels[0].len()
    }

    /// Generate the inclusion proof for the record at `index` (its position
    /// in the record list passed to [`ProofChain::build`]).
    pub fn generate_proof(&self, index: usize) -> AttributionResult<MerkleProof> {
        let leaf_count = self.leaf_count();
        if index >= leaf_count {
            return Err(AttributionError::RecordOutOfRange { index, leaf_count });
        }

        let mut path = Vec::with_capacity(self.levels.len() - 1);
        let mut pos = index;
        for level in &self.levels[..self.levels.len() - 1] {
            let (sibling_pos, side) = if pos % 2 == 0 {
                (pos + 1, Side::Right)
            } else {
                (pos - 1, Side::Left)
            };
            // Odd tail duplicates itself as its own sibling.
            let sibling = level.get(sibling_pos).copied().unwrap_or(level[pos]);
            path.push(ProofNode {
                hash: sibling,
                side,
            });
            pos /= 2;
        }

        Ok(MerkleProof {
            leaf_hash: self.levels[0][index],
            root_hash: self.root(),
            path,
        })
    }
}

/// Verify that `record` is committed under `root` by `proof`.
///
/// Pure function: recomputes the root from the record and sibling path and
/// compares. Independent of any [`ProofChain`] state.
pub fn verify(record: &AttributionRecord, proof: &MerkleProof, root: &Hash) -> bool {
    let mut running = hash_leaf(record);
    if running != proof.leaf_hash {
        return false;
    }
    for node in &proof.path {
        running = match node.side {
            Side::Right => hash_node(&running, &node.hash),
            Side::Left => hash_node(&node.hash, &running),
        };
    }
    running == *root && proof.root_hash == *root
}
