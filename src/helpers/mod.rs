//! Helper functions shared by the content pipeline and the CLI

mod date;
mod html;
pub mod url;

pub use date::*;
pub use html::*;
pub use url::{asset_url, home_url, post_url, url_for, Route};
