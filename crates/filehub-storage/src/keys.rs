//! Object-store key synthesis.
//!
//! Keys are spread across partitions by prefixing them with the first two
//! bytes of the SHA-224 digest of the cleaned path.

use sha2::{Digest, Sha224};

use filehub_core::types::path;

/// First 2 bytes (4 hex chars) of SHA-224 over the cleaned path.
pub fn hash_prefix(cleaned_path: &str) -> String {
    let digest = Sha224::digest(cleaned_path.as_bytes());
    hex::encode(&digest[..2])
}

/// Object key for `(repo, path)` under an optional bucket prefix.
///
/// The result is `[prefix/]<hash>/<repo>[/<path>]`; directory markers
/// append a trailing `/`.
pub fn object_key(prefix: &str, repo: &str, raw_path: &str) -> String {
    let cleaned = path::clean_rooted(raw_path);
    let mut key = String::new();
    if !prefix.is_empty() {
        key.push_str(prefix);
        key.push('/');
    }
    key.push_str(&hash_prefix(&cleaned));
    key.push('/');
    key.push_str(repo);
    key.push_str(if path::is_root(&cleaned) { "" } else { &cleaned });
    key
}

/// Marker key simulating a directory.
pub fn directory_key(prefix: &str, repo: &str, raw_path: &str) -> String {
    format!("{}/", object_key(prefix, repo, raw_path))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_hash_prefix_is_deterministic() {
        let a = hash_prefix("/docs/report.txt");
        let b = hash_prefix("/docs/report.txt");
        assert_eq!(a, b);
        assert_eq!(a.len(), 4);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_hash_prefix_spread() {
        let prefixes: HashSet<String> = (0..1000)
            .map(|i| hash_prefix(&format!("/file-{i}.bin")))
            .collect();
        assert!(prefixes.len() >= 200, "only {} prefixes", prefixes.len());
    }

    #[test]
    fn test_object_key_layout() {
        let key = object_key("", "alice", "/d/../hello.txt");
        assert_eq!(key, format!("{}/alice/hello.txt", hash_prefix("/hello.txt")));

        let root = directory_key("base", "alice", "/");
        assert_eq!(root, format!("base/{}/alice/", hash_prefix("/")));
    }

    #[test]
    fn test_object_key_cleans_escape_attempts() {
        assert_eq!(
            object_key("p", "alice", "../../etc/passwd"),
            object_key("p", "alice", "/etc/passwd")
        );
    }
}
