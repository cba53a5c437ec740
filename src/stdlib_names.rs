//! The standard-library package name table mentioned in the size budget.
//!
//! A package is recognized as part of the Go standard library when its
//! import path has no dot in any path segment (ruling out
//! `github.com/...`-shaped paths) *and* its first segment appears in this
//! set (spec §4.4). The table only needs top-level/common names; it is not
//! an exhaustive mirror of every internal compiler package.

use rustc_hash::FxHashSet;

use once_cell::sync::Lazy;

pub static STDLIB_TOP_LEVEL: Lazy<FxHashSet<&'static str>> = Lazy::new(|| {
    [
        "archive", "bufio", "builtin", "bytes", "cmp", "compress", "container", "context",
        "crypto", "database", "debug", "embed", "encoding", "errors", "expvar", "flag", "fmt",
        "go", "hash", "html", "image", "index", "io", "iter", "log", "maps", "math", "mime",
        "net", "os", "path", "plugin", "reflect", "regexp", "runtime", "slices", "sort", "strconv",
        "strings", "sync", "syscall", "testing", "text", "time", "unicode", "unsafe", "internal",
        "cmd", "vendor",
    ]
    .into_iter()
    .collect()
});

/// Returns true when `import_path` has no dotted path segment and its first
/// segment names a known standard-library top-level package.
pub fn is_stdlib(import_path: &str) -> bool {
    if import_path.split('/').any(|seg| seg.contains('.')) {
        return false;
    }
    match import_path.split('/').next() {
        Some(first) => STDLIB_TOP_LEVEL.contains(first),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_common_stdlib_packages() {
        assert!(is_stdlib("fmt"));
        assert!(is_stdlib("net/http"));
        assert!(is_stdlib("encoding/json"));
    }

    #[test]
    fn rejects_dotted_remote_paths() {
        assert!(!is_stdlib("github.com/org/lib"));
        assert!(!is_stdlib("golang.org/x/tools/go/packages"));
    }

    #[test]
    fn rejects_unknown_undotted_first_segment() {
        assert!(!is_stdlib("foo/bar"));
    }
}
