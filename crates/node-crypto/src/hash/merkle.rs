use super::{sha256, Hash256};

/// Binary merkle tree over a list of leaf hashes (transaction ids).
///
/// Odd levels duplicate the last node rather than leaving it unpaired, the
/// common Bitcoin-style convention, so the tree is always a perfect binary
/// shape and `root()` is well-defined for any non-empty input.
pub struct MerkleTree {
    root: Hash256,
}

impl MerkleTree {
    /// Builds a tree from leaf hashes and returns it. An empty input set
    /// hashes to the zero hash, matching an empty block's merkle root.
    pub fn from_leaves(leaves: &[Hash256]) -> Self {
        Self {
            root: Self::compute_root(leaves),
        }
    }

    pub fn root(&self) -> Hash256 {
        self.root
    }

    pub fn compute_root(leaves: &[Hash256]) -> Hash256 {
        if leaves.is_empty() {
            return Hash256::zero();
        }
        let mut level: Vec<Hash256> = leaves.to_vec();
        while level.len() > 1 {
            if level.len() % 2 == 1 {
                level.push(*level.last().unwrap());
            }
            level = level
                .chunks(2)
                .map(|pair| hash_pair(&pair[0], &pair[1]))
                .collect();
        }
        level[0]
    }
}

fn hash_pair(left: &Hash256, right: &Hash256) -> Hash256 {
    let mut combined = Vec::with_capacity(64);
    combined.extend_from_slice(left.as_bytes());
    combined.extend_from_slice(right.as_bytes());
    sha256(&combined)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_tree_is_zero() {
        assert_eq!(MerkleTree::compute_root(&[]), Hash256::zero());
    }

    #[test]
    fn single_leaf_tree_is_deterministic() {
        let leaf = sha256(b"only tx");
        let root = MerkleTree::compute_root(&[leaf]);
        assert_eq!(root, MerkleTree::compute_root(&[leaf]));
    }

    #[test]
    fn odd_leaf_count_duplicates_last() {
        let a = sha256(b"a");
        let b = sha256(b"b");
        let c = sha256(b"c");
        let root_three = MerkleTree::compute_root(&[a, b, c]);
        let root_four = MerkleTree::compute_root(&[a, b, c, c]);
        assert_eq!(root_three, root_four);
    }

    #[test]
    fn order_matters() {
        let a = sha256(b"a");
        let b = sha256(b"b");
        assert_ne!(
            MerkleTree::compute_root(&[a, b]),
            MerkleTree::compute_root(&[b, a])
        );
    }
}
