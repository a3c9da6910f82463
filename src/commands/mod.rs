//! CLI subcommands

pub mod css;
pub mod list;
pub mod normalize;
pub mod route;
pub mod show;
