//! Route pattern translation.
//!
//! Rules are written with `:name` segment parameters and `*name` catch-alls.
//! axum expects `{name}` and `{*name}`. A catch-all value reaches
//! statements with its leading `/`, which axum strips.

/// Translate a rule path into axum route syntax.
pub fn to_axum_path(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if let Some(name) = segment.strip_prefix(':').filter(|n| !n.is_empty()) {
                format!("{{{name}}}")
            } else if let Some(name) = segment.strip_prefix('*').filter(|n| !n.is_empty()) {
                format!("{{*{name}}}")
            } else {
                segment.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Name of the trailing `*name` catch-all, if the path has one.
pub fn catch_all_name(path: &str) -> Option<&str> {
    path.rsplit('/')
        .next()
        .and_then(|segment| segment.strip_prefix('*'))
        .filter(|name| !name.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_params() {
        assert_eq!(to_axum_path("/show/:id"), "/show/{id}");
        assert_eq!(
            to_axum_path("/users/:user/posts/:post"),
            "/users/{user}/posts/{post}"
        );
    }

    #[test]
    fn test_catch_all() {
        assert_eq!(to_axum_path("/files/*rest"), "/files/{*rest}");
    }

    #[test]
    fn test_catch_all_name() {
        assert_eq!(catch_all_name("/files/*rest"), Some("rest"));
        assert_eq!(catch_all_name("/files/:id"), None);
        assert_eq!(catch_all_name("/files/*"), None);
        assert_eq!(catch_all_name("/"), None);
    }

    #[test]
    fn test_static_paths_unchanged() {
        assert_eq!(to_axum_path("/"), "/");
        assert_eq!(to_axum_path("/aaa/"), "/aaa/");
        assert_eq!(to_axum_path("/a/b"), "/a/b");
    }

    #[test]
    fn test_bare_markers_unchanged() {
        assert_eq!(to_axum_path("/:/*"), "/:/*");
    }
}
