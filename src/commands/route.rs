//! Resolve a browser path the way the site router does

use anyhow::Result;

use super::{list, show};
use crate::helpers::Route;
use crate::Blog;

/// Print the page a path resolves to
pub async fn run(blog: &Blog, path: &str) -> Result<()> {
    print!("{}", resolve(blog, path).await?);
    Ok(())
}

/// The page for `path`: the post list, a post, or a not-found notice
pub async fn resolve(blog: &Blog, path: &str) -> Result<String> {
    let route = Route::resolve(&blog.config.base_path, path);
    tracing::debug!("Resolved {} to {:?}", path, route);

    match route {
        Route::Home => list::listing(blog, false),
        Route::Post(identifier) => show::page(blog, &identifier, false, 0.0).await,
        Route::NotFound => Ok(format!(
            "No page at {}\nBack to posts: {}\n",
            path,
            crate::helpers::home_url(&blog.config.base_path)
        )),
    }
}
