//! Print the highlighting stylesheet

use anyhow::Result;

use crate::Blog;

/// Print CSS for the configured (or given) highlight theme
pub fn run(blog: &Blog, theme: Option<&str>) -> Result<()> {
    print!("{}", blog.renderer().stylesheet(theme)?);
    Ok(())
}
