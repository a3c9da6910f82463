//! List posts, newest first

use anyhow::Result;

use crate::content::Feed;
use crate::helpers;
use crate::Blog;

/// Print the post list
pub fn run(blog: &Blog, json: bool) -> Result<()> {
    print!("{}", listing(blog, json)?);
    Ok(())
}

/// The post list as text, or as JSON with `json`
pub fn listing(blog: &Blog, json: bool) -> Result<String> {
    let posts = blog.repository().list_all()?;

    if json {
        let mut out = serde_json::to_string_pretty(&posts)?;
        out.push('\n');
        return Ok(out);
    }

    let base_path = &blog.config.base_path;
    let mut out = format!("Posts ({}):\n", posts.len());
    let feed = Feed::from(posts);

    if let Some(hero) = &feed.hero {
        out.push_str(&format!(
            "* {} - {} [{}]\n",
            helpers::display_date(&hero.date, &blog.config.date_format),
            hero.title,
            hero.href(base_path)
        ));
    }
    for post in &feed.more {
        out.push_str(&format!(
            "  {} - {} [{}]\n",
            helpers::display_date(&post.date, &blog.config.date_format),
            post.title,
            post.href(base_path)
        ));
    }

    Ok(out)
}
