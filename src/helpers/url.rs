//! URL helper functions

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};

/// Characters escaped in a single path segment
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Prefix of the detail route
const POSTS_PREFIX: &str = "posts/";

/// Generate a URL under the deployment base path
///
/// # Examples
/// ```ignore
/// url_for("/react-blog/", "/posts/hello") // -> "/react-blog/posts/hello"
/// ```
pub fn url_for(base_path: &str, path: &str) -> String {
    let root = base_path.trim_end_matches('/');
    let path = path.trim_start_matches('/');

    if path.is_empty() {
        format!("{}/", root)
    } else {
        format!("{}/{}", root, path)
    }
}

/// Resolve an asset path
///
/// Root-relative paths are placed under the deployment base path; anything
/// else (remote URLs, relative paths) is used as is.
pub fn asset_url(base_path: &str, path: &str) -> String {
    if path.starts_with('/') && !path.starts_with("//") {
        url_for(base_path, path)
    } else {
        path.to_string()
    }
}

/// Link to a post detail page
pub fn post_url(base_path: &str, identifier: &str) -> String {
    let encoded = utf8_percent_encode(identifier, SEGMENT);
    url_for(base_path, &format!("{}{}", POSTS_PREFIX, encoded))
}

/// Link to the post list
pub fn home_url(base_path: &str) -> String {
    url_for(base_path, "/")
}

/// A page the routing surface can display
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `/`
    Home,
    /// `/posts/:identifier`
    Post(String),
    /// Anything else
    NotFound,
}

impl Route {
    /// Resolve a browser path against the routes
    pub fn resolve(base_path: &str, path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let root = base_path.trim_end_matches('/');
        let relative = match path.strip_prefix(root) {
            Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
            _ => return Route::NotFound,
        };
        let relative = relative.trim_start_matches('/');

        if relative.is_empty() {
            return Route::Home;
        }

        match relative.strip_prefix(POSTS_PREFIX) {
            Some(segment) => {
                let segment = segment.trim_end_matches('/');
                if segment.is_empty() || segment.contains('/') {
                    return Route::NotFound;
                }
                match percent_decode_str(segment).decode_utf8() {
                    Ok(identifier) => Route::Post(identifier.into_owned()),
                    Err(_) => Route::NotFound,
                }
            }
            None => Route::NotFound,
        }
    }
}
