//! Lexical path normalisation.
//!
//! Every path that crosses a public boundary goes through [`clean`]. The
//! functions here never consult the filesystem, so symlinks are not
//! resolved.

/// Canonicalise a slash-separated path.
///
/// Duplicate separators collapse, `.` segments vanish and `..` removes the
/// preceding segment. A leading `/` is preserved and `..` can never climb
/// above it. An empty relative result is `"."`.
pub fn clean(path: &str) -> String {
    if path.is_empty() {
        return ".".to_string();
    }

    let rooted = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if parts.last().is_some_and(|last| *last != "..") {
                    parts.pop();
                } else if !rooted {
                    parts.push("..");
                }
            }
            other => parts.push(other),
        }
    }

    let joined = parts.join("/");
    if rooted {
        format!("/{joined}")
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}

/// Clean a repository-relative path, forcing it to start at `/`.
pub fn clean_rooted(path: &str) -> String {
    if path.starts_with('/') {
        clean(path)
    } else {
        clean(&format!("/{path}"))
    }
}

/// Join two path fragments and clean the result.
pub fn join(base: &str, name: &str) -> String {
    if base.is_empty() {
        return clean(name);
    }
    clean(&format!("{base}/{name}"))
}

/// Last element of a path. Trailing slashes are ignored; the root is `"/"`.
pub fn basename(path: &str) -> String {
    if path.is_empty() {
        return ".".to_string();
    }
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return "/".to_string();
    }
    match trimmed.rsplit_once('/') {
        Some((_, name)) => name.to_string(),
        None => trimmed.to_string(),
    }
}

/// Everything but the last element, cleaned. The parent of `/` is `/`.
pub fn parent(path: &str) -> String {
    let cleaned = clean(path);
    match cleaned.rfind('/') {
        Some(0) => "/".to_string(),
        Some(idx) => cleaned[..idx].to_string(),
        None => ".".to_string(),
    }
}

/// Whether a cleaned path names the repository root.
pub fn is_root(path: &str) -> bool {
    path == "/"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_cases() {
        let cases = [
            ("", "."),
            ("/", "/"),
            ("//", "/"),
            ("/a//b/", "/a/b"),
            ("/a/./b", "/a/b"),
            ("/a/b/..", "/a"),
            ("/../etc/passwd", "/etc/passwd"),
            ("/a/../../..", "/"),
            ("a/../..", ".."),
            ("a/./b/", "a/b"),
            ("./", "."),
        ];
        for (input, expected) in cases {
            assert_eq!(clean(input), expected, "clean({input:?})");
        }
    }

    #[test]
    fn test_clean_is_idempotent() {
        let inputs = [
            "",
            "/",
            "../../x",
            "/a/b/../../../c/./d//",
            "a//b/../c/.",
            "/dav/../etc/passwd",
            "..",
            "./././",
            "/ünïcode/../fïle.txt",
        ];
        for input in inputs {
            let once = clean(input);
            assert_eq!(clean(&once), once, "clean not idempotent for {input:?}");
        }
    }

    #[test]
    fn test_clean_rooted() {
        assert_eq!(clean_rooted(""), "/");
        assert_eq!(clean_rooted("docs/a.txt"), "/docs/a.txt");
        assert_eq!(clean_rooted("../../etc/passwd"), "/etc/passwd");
    }

    #[test]
    fn test_join() {
        assert_eq!(join("/", "hello.txt"), "/hello.txt");
        assert_eq!(join("/d", "../x"), "/x");
        assert_eq!(join("/d/", "/sub/"), "/d/sub");
    }

    #[test]
    fn test_basename_and_parent() {
        assert_eq!(basename("/d/hi.txt"), "hi.txt");
        assert_eq!(basename("/d/"), "d");
        assert_eq!(basename("/"), "/");
        assert_eq!(parent("/d/hi.txt"), "/d");
        assert_eq!(parent("/d"), "/");
        assert_eq!(parent("/"), "/");
    }
}
