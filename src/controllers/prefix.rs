//! Route prefix joining.
//!
//! Segment semantics: empty segments and `.` are dropped, `..` pops the
//! previous segment, the result always starts with `/` and only the root keeps
//! a trailing slash.

/// Join the global prefix with a controller's own prefix.
pub fn join_prefix(global: &str, route: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();

    for segment in global.split('/').chain(route.split('/')) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    format!("/{}", segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_cases() {
        assert_eq!(join_prefix("/", ""), "/");
        assert_eq!(join_prefix("", ""), "/");
        assert_eq!(join_prefix("/", "/"), "/");
    }

    #[test]
    fn test_joins_without_duplicate_separators() {
        assert_eq!(join_prefix("/api", "/users"), "/api/users");
        assert_eq!(join_prefix("/api/", "users/"), "/api/users");
        assert_eq!(join_prefix("api", "//v1//users"), "/api/v1/users");
    }

    #[test]
    fn test_dot_segments() {
        assert_eq!(join_prefix("/api/v1", "../v2/users"), "/api/v2/users");
        assert_eq!(join_prefix("/api", "./users"), "/api/users");
        assert_eq!(join_prefix("/", ".."), "/");
    }
}
