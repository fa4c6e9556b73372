//! Ignore-pattern matching for directory walks
//!
//! Shell-style wildcard patterns applied per path component. Hidden
//! (dot-prefixed) names are always excluded during walks. Patterns never
//! apply to a file the caller passed explicitly by path.

use glob::Pattern;

/// True for dot-prefixed names (`.git`, `.env`, `.hidden.py`).
pub fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

/// True when the name matches any of the wildcard patterns. Invalid patterns
/// fall back to exact string comparison rather than erroring out the walk.
pub fn matches_any(name: &str, patterns: &[String]) -> bool {
    patterns.iter().any(|pattern| match Pattern::new(pattern) {
        Ok(compiled) => compiled.matches(name),
        Err(_) => pattern == name,
    })
}

/// Should a directory with this name be skipped during a walk?
pub fn skip_dir(name: &str, patterns: &[String]) -> bool {
    is_hidden(name) || matches_any(name, patterns)
}

/// Should a file with this name be skipped during a walk?
pub fn skip_file(name: &str, patterns: &[String]) -> bool {
    is_hidden(name) || matches_any(name, patterns)
}
