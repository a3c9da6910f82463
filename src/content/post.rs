//! Post model

use serde::{Deserialize, Serialize};

use super::frontmatter::{AuthorField, FrontMatter, OgImageField};
use crate::helpers::url;

/// Title used when the front-matter has none
pub const DEFAULT_TITLE: &str = "Untitled Post";

/// Author name used when the front-matter has none
pub const DEFAULT_AUTHOR: &str = "Anonymous";

/// Post author
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    pub picture: String,
}

impl Default for Author {
    fn default() -> Self {
        Self {
            name: DEFAULT_AUTHOR.to_string(),
            picture: String::new(),
        }
    }
}

impl From<AuthorField> for Author {
    fn from(field: AuthorField) -> Self {
        Self {
            name: field
                .name
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| DEFAULT_AUTHOR.to_string()),
            picture: field.picture.unwrap_or_default(),
        }
    }
}

/// Open Graph image metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OgImage {
    pub url: String,
}

impl From<OgImageField> for OgImage {
    fn from(field: OgImageField) -> Self {
        Self {
            url: field.url.unwrap_or_default(),
        }
    }
}

/// A blog post
///
/// Read-only once built by the repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// File stem of the source asset, also the `/posts/:identifier` parameter
    #[serde(rename = "slug")]
    pub identifier: String,

    pub title: String,

    /// Publication date as written in the front-matter
    pub date: String,

    /// Root-relative or absolute image path, empty for no cover
    pub cover_image: String,

    pub author: Author,

    pub excerpt: String,

    pub og_image: OgImage,

    /// Markdown with the front-matter stripped
    #[serde(rename = "content")]
    pub body: String,
}

impl Post {
    /// Build a post from parsed front-matter, filling in defaults
    pub fn from_front_matter(
        identifier: String,
        fm: FrontMatter,
        body: String,
        fallback_date: &str,
    ) -> Self {
        Self {
            identifier,
            title: fm
                .title
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            date: fm
                .date
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| fallback_date.to_string()),
            cover_image: fm.cover_image.unwrap_or_default(),
            author: fm.author.map(Author::from).unwrap_or_default(),
            excerpt: fm.excerpt.unwrap_or_default(),
            og_image: fm.og_image.map(OgImage::from).unwrap_or_default(),
            body,
        }
    }

    /// Whether the post has a cover image
    pub fn has_cover_image(&self) -> bool {
        !self.cover_image.is_empty()
    }

    /// Cover image URL under the deployment base path
    pub fn cover_image_url(&self, base_path: &str) -> Option<String> {
        if self.has_cover_image() {
            Some(url::asset_url(base_path, &self.cover_image))
        } else {
            None
        }
    }

    /// Link to this post's detail page
    pub fn href(&self, base_path: &str) -> String {
        url::post_url(base_path, &self.identifier)
    }
}

/// Home page split: newest post first, the rest below it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Feed {
    pub hero: Option<Post>,
    pub more: Vec<Post>,
}

impl From<Vec<Post>> for Feed {
    fn from(posts: Vec<Post>) -> Self {
        let mut posts = posts.into_iter();
        let hero = posts.next();
        Self {
            hero,
            more: posts.collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(identifier: &str) -> Post {
        Post::from_front_matter(
            identifier.to_string(),
            FrontMatter::default(),
            String::new(),
            "2024-01-01T00:00:00.000Z",
        )
    }

    #[test]
    fn test_defaults() {
        let p = post("hello-world");
        assert_eq!(p.title, DEFAULT_TITLE);
        assert_eq!(p.date, "2024-01-01T00:00:00.000Z");
        assert_eq!(p.author, Author::default());
        assert_eq!(p.author.name, "Anonymous");
        assert!(p.excerpt.is_empty());
        assert!(p.og_image.url.is_empty());
        assert!(!p.has_cover_image());
        assert_eq!(p.cover_image_url("/react-blog/"), None);
    }

    #[test]
    fn test_empty_title_counts_as_missing() {
        let fm = FrontMatter {
            title: Some(String::new()),
            ..Default::default()
        };
        let p = Post::from_front_matter("a".into(), fm, String::new(), "now");
        assert_eq!(p.title, DEFAULT_TITLE);
    }

    #[test]
    fn test_partial_author() {
        let fm = FrontMatter {
            author: Some(AuthorField {
                name: None,
                picture: Some("/me.png".into()),
            }),
            ..Default::default()
        };
        let p = Post::from_front_matter("a".into(), fm, String::new(), "now");
        assert_eq!(p.author.name, "Anonymous");
        assert_eq!(p.author.picture, "/me.png");
    }

    #[test]
    fn test_json_shape() {
        let p = post("hello-world");
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["slug"], "hello-world");
        assert_eq!(json["coverImage"], "");
        assert_eq!(json["ogImage"]["url"], "");
        assert_eq!(json["content"], "");
    }

    #[test]
    fn test_feed_split() {
        let feed = Feed::from(vec![post("a"), post("b"), post("c")]);
        assert_eq!(feed.hero.unwrap().identifier, "a");
        let more: Vec<_> = feed.more.iter().map(|p| p.identifier.as_str()).collect();
        assert_eq!(more, ["b", "c"]);

        assert_eq!(Feed::from(Vec::new()), Feed::default());
    }
}
