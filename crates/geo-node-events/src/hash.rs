// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use sha2::{Digest, Sha256};

/// Anonymises a node identifier: lowercase hex encoding of its SHA-256 digest.
pub fn hash(identifier: &str) -> String {
    hex::encode(Sha256::digest(identifier.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::hash;

    #[test]
    fn test_known_vectors() {
        assert_eq!(
            hash(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            hash("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_deterministic_and_fixed_length() {
        let node = "a8b2f7e0-3c61-4f0e-9d7a-1f2e3d4c5b6a";
        assert_eq!(hash(node), hash(node));
        assert_eq!(hash(node).len(), 64);
        assert_ne!(hash(node), hash("another-node"));
    }
}
