//! Post repository - discovers markdown assets and builds posts from them

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

use super::{Feed, FrontMatter, Normalizer, Post};
use crate::helpers;

/// Errors raised while discovering content
///
/// These are build problems (missing directory, unreadable file), not
/// something a reader can cause, so they propagate instead of being
/// papered over with defaults.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("content directory {path:?} does not exist")]
    MissingRoot { path: PathBuf },

    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to scan content directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("{first:?} and {second:?} both map to post {identifier:?}")]
    DuplicateIdentifier {
        identifier: String,
        first: String,
        second: String,
    },
}

/// A raw markdown asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentAsset {
    /// File name relative to the content root, e.g. `hello-world.md`
    pub path: String,
    pub text: String,
}

impl ContentAsset {
    pub fn new(path: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }

    /// The routing identifier: the file name without its extension
    pub fn identifier(&self) -> String {
        let name = self.path.rsplit('/').next().unwrap_or(&self.path);
        match name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem.to_string(),
            _ => name.to_string(),
        }
    }
}

/// Where markdown assets come from
pub trait ContentSource {
    /// Every asset, in discovery order
    fn assets(&self) -> Result<Vec<ContentAsset>, ContentError>;
}

/// Markdown files directly inside a directory (`<root>/*.md`)
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ContentSource for DirectorySource {
    fn assets(&self) -> Result<Vec<ContentAsset>, ContentError> {
        if !self.root.is_dir() {
            return Err(ContentError::MissingRoot {
                path: self.root.clone(),
            });
        }

        let mut assets = Vec::new();
        for entry in WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = entry?;
            let path = entry.path();
            if !entry.file_type().is_file() || !is_markdown_file(path) {
                continue;
            }

            let text = fs::read_to_string(path).map_err(|source| ContentError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            let name = entry.file_name().to_string_lossy().to_string();
            assets.push(ContentAsset::new(name, text));
        }

        tracing::debug!("Discovered {} posts in {:?}", assets.len(), self.root);
        Ok(assets)
    }
}

/// Assets compiled into the binary, e.g. with `include_str!`
#[derive(Debug, Clone, Default)]
pub struct EmbeddedSource {
    assets: Vec<(&'static str, &'static str)>,
}

impl EmbeddedSource {
    /// `(file name, contents)` pairs, in discovery order
    pub fn new(assets: Vec<(&'static str, &'static str)>) -> Self {
        Self { assets }
    }
}

impl ContentSource for EmbeddedSource {
    fn assets(&self) -> Result<Vec<ContentAsset>, ContentError> {
        Ok(self
            .assets
            .iter()
            .filter(|(path, _)| is_markdown_file(Path::new(path)))
            .map(|(path, text)| ContentAsset::new(*path, *text))
            .collect())
    }
}

/// Builds posts from a content source
///
/// Nothing is cached: every query re-reads the source and re-parses every
/// asset.
pub struct PostRepository<S: ContentSource> {
    source: S,
    normalizer: Normalizer,
    sanitize: bool,
    fallback_date: String,
}

impl<S: ContentSource> PostRepository<S> {
    /// Create a repository; posts without a date get the creation time
    pub fn new(source: S) -> Self {
        Self {
            source,
            normalizer: Normalizer::new(),
            sanitize: true,
            fallback_date: helpers::iso_now(),
        }
    }

    /// Toggle the browser-safety rewrite of code samples
    pub fn with_sanitize(mut self, sanitize: bool) -> Self {
        self.sanitize = sanitize;
        self
    }

    /// Date given to posts whose front-matter has none
    pub fn with_fallback_date(mut self, date: impl Into<String>) -> Self {
        self.fallback_date = date.into();
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// All posts, newest first
    ///
    /// Dates are compared as strings; posts with equal dates keep their
    /// discovery order.
    pub fn list_all(&self) -> Result<Vec<Post>, ContentError> {
        let assets = self.source.assets()?;

        let mut seen: HashMap<String, &str> = HashMap::with_capacity(assets.len());
        for asset in &assets {
            if let Some(first) = seen.insert(asset.identifier(), &asset.path) {
                return Err(ContentError::DuplicateIdentifier {
                    identifier: asset.identifier(),
                    first: first.to_string(),
                    second: asset.path.clone(),
                });
            }
        }

        let mut posts: Vec<Post> = assets.iter().map(|asset| self.build_post(asset)).collect();

        posts.sort_by(|a, b| b.date.cmp(&a.date));

        Ok(posts)
    }

    /// The post with this identifier, or `None`
    pub fn get_by_identifier(&self, identifier: &str) -> Result<Option<Post>, ContentError> {
        Ok(self
            .list_all()?
            .into_iter()
            .find(|post| post.identifier == identifier))
    }

    /// Posts split for the home page
    pub fn feed(&self) -> Result<Feed, ContentError> {
        Ok(Feed::from(self.list_all()?))
    }

    /// Build a single post from an asset
    fn build_post(&self, asset: &ContentAsset) -> Post {
        let text = if self.sanitize {
            self.normalizer.normalize_code_blocks(&asset.text)
        } else {
            std::borrow::Cow::Borrowed(asset.text.as_str())
        };
        let (fm, body) = FrontMatter::parse(&text);

        Post::from_front_matter(asset.identifier(), fm, body.to_string(), &self.fallback_date)
    }
}

/// Check if a file is a post (`*.md`)
fn is_markdown_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e == "md")
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_post(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    fn two_posts() -> EmbeddedSource {
        EmbeddedSource::new(vec![
            ("a.md", "---\ntitle: A\ndate: \"2024-01-01\"\n---\nFirst"),
            ("b.md", "---\ntitle: B\ndate: \"2024-06-01\"\n---\nSecond"),
        ])
    }

    #[test]
    fn test_identifier_from_file_name() {
        assert_eq!(ContentAsset::new("hello-world.md", "").identifier(), "hello-world");
        assert_eq!(ContentAsset::new("07.md", "").identifier(), "07");
        assert_eq!(ContentAsset::new("v1.2.md", "").identifier(), "v1.2");
    }

    #[test]
    fn test_list_all_newest_first() {
        let repo = PostRepository::new(two_posts());
        let titles: Vec<_> = repo
            .list_all()
            .unwrap()
            .into_iter()
            .map(|p| p.title)
            .collect();
        assert_eq!(titles, ["B", "A"]);
    }

    #[test]
    fn test_sorted_and_stable() {
        let repo = PostRepository::new(EmbeddedSource::new(vec![
            ("x.md", "---\ndate: \"2023-05-01\"\n---\n"),
            ("y.md", "---\ndate: \"2024-02-01\"\n---\n"),
            ("z.md", "---\ndate: \"2023-05-01\"\n---\n"),
            ("w.md", "---\ndate: \"2024-02-01T10:00:00Z\"\n---\n"),
        ]));
        let posts = repo.list_all().unwrap();
        for pair in posts.windows(2) {
            assert!(pair[0].date >= pair[1].date);
        }
        let ids: Vec<_> = posts.iter().map(|p| p.identifier.as_str()).collect();
        assert_eq!(ids, ["w", "y", "x", "z"]);
    }

    #[test]
    fn test_get_by_identifier_matches_list() {
        let repo = PostRepository::new(EmbeddedSource::new(vec![
            ("dated.md", "---\ntitle: Dated\ndate: \"2024-01-01\"\n---\nBody"),
            ("undated.md", "No front-matter at all."),
        ]));
        for post in repo.list_all().unwrap() {
            assert_eq!(repo.get_by_identifier(&post.identifier).unwrap(), Some(post));
        }
    }

    #[test]
    fn test_get_missing_identifier() {
        let repo = PostRepository::new(two_posts());
        assert_eq!(repo.get_by_identifier("does-not-exist").unwrap(), None);
    }

    #[test]
    fn test_defaults_for_bare_markdown() {
        let repo = PostRepository::new(EmbeddedSource::new(vec![(
            "bare.md",
            "# Just a heading\n",
        )]))
        .with_fallback_date("2000-01-01T00:00:00.000Z");

        let post = repo.get_by_identifier("bare").unwrap().unwrap();
        assert_eq!(post.title, "Untitled Post");
        assert_eq!(post.date, "2000-01-01T00:00:00.000Z");
        assert_eq!(post.author.name, "Anonymous");
        assert_eq!(post.body, "# Just a heading\n");
    }

    #[test]
    fn test_body_code_is_normalized() {
        let repo = PostRepository::new(EmbeddedSource::new(vec![(
            "node.md",
            "---\ntitle: Node\n---\nUse process.env.NODE_ENV.\n\n```js\nif (process.env.NODE_ENV) {}\n```\n",
        )]));
        let post = repo.get_by_identifier("node").unwrap().unwrap();
        assert!(post.body.starts_with("Use process.env.NODE_ENV."));
        assert!(post.body.contains("if ('development') {}"));

        let raw = PostRepository::new(repo.source().clone()).with_sanitize(false);
        let post = raw.get_by_identifier("node").unwrap().unwrap();
        assert!(post.body.contains("if (process.env.NODE_ENV) {}"));
    }

    #[test]
    fn test_embedded_skips_non_markdown() {
        let repo = PostRepository::new(EmbeddedSource::new(vec![
            ("notes.txt", "not a post"),
            ("post.md", "---\ntitle: Post\n---\n"),
        ]));
        assert_eq!(repo.list_all().unwrap().len(), 1);
    }

    #[test]
    fn test_only_md_files_are_posts() {
        let repo = PostRepository::new(EmbeddedSource::new(vec![
            ("a.md", "---\ntitle: First\n---\n"),
            ("a.markdown", "---\ntitle: Second\n---\n"),
        ]));
        let posts = repo.list_all().unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].title, "First");
        assert_eq!(repo.get_by_identifier("a").unwrap().unwrap().title, "First");
    }

    #[test]
    fn test_duplicate_identifiers_are_an_error() {
        let repo = PostRepository::new(EmbeddedSource::new(vec![
            ("a.md", "---\ntitle: First\n---\n"),
            ("drafts/a.md", "---\ntitle: Second\n---\n"),
        ]));
        match repo.list_all() {
            Err(ContentError::DuplicateIdentifier {
                identifier,
                first,
                second,
            }) => {
                assert_eq!(identifier, "a");
                assert_eq!(first, "a.md");
                assert_eq!(second, "drafts/a.md");
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_mistyped_key_keeps_date_and_order() {
        let repo = PostRepository::new(EmbeddedSource::new(vec![
            ("new.md", "---\ntitle: New\ndate: \"2024-06-01\"\n---\n"),
            (
                "old.md",
                "---\ntitle: Old\ndate: \"2024-01-01\"\nogImage: /cover.jpg\n---\nBody",
            ),
        ]))
        .with_fallback_date("2099-01-01T00:00:00.000Z");

        let posts = repo.list_all().unwrap();
        let titles: Vec<_> = posts.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, ["New", "Old"]);
        assert_eq!(posts[1].date, "2024-01-01");
        assert_eq!(posts[1].og_image.url, "");
    }

    #[test]
    fn test_directory_source() {
        let dir = tempfile::tempdir().unwrap();
        write_post(dir.path(), "a.md", "---\ntitle: A\ndate: 2024-01-01\n---\nFirst");
        write_post(dir.path(), "b.md", "---\ntitle: B\ndate: 2024-06-01\n---\nSecond");
        write_post(dir.path(), "readme.txt", "ignored");
        write_post(dir.path(), "a.markdown", "---\ntitle: Ignored\n---\n");
        fs::create_dir(dir.path().join("drafts")).unwrap();
        write_post(&dir.path().join("drafts"), "c.md", "---\ntitle: C\n---\n");

        let repo = PostRepository::new(DirectorySource::new(dir.path()));
        let posts = repo.list_all().unwrap();
        let titles: Vec<_> = posts.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, ["B", "A"]);
        assert_eq!(posts[1].body, "First");
    }

    #[test]
    fn test_directory_rescanned_per_call() {
        let dir = tempfile::tempdir().unwrap();
        let repo = PostRepository::new(DirectorySource::new(dir.path()));
        assert!(repo.list_all().unwrap().is_empty());

        write_post(dir.path(), "new.md", "---\ntitle: New\n---\n");
        assert_eq!(repo.list_all().unwrap().len(), 1);
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let repo = PostRepository::new(DirectorySource::new(dir.path().join("_posts")));
        assert!(matches!(
            repo.list_all(),
            Err(ContentError::MissingRoot { .. })
        ));
    }

    #[test]
    fn test_feed() {
        let repo = PostRepository::new(two_posts());
        let feed = repo.feed().unwrap();
        assert_eq!(feed.hero.unwrap().title, "B");
        assert_eq!(feed.more.len(), 1);
    }
}
