//! Configuration module

mod site;

pub use site::RenderConfig;
pub use site::RevealConfig;
pub use site::SiteConfig;
