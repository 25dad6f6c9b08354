//! Derived build artifacts: sitemap, robots.txt, the 404 page, and
//! progressive web app assets.

pub mod error_page;
pub mod pwa;
pub mod robots;
pub mod sitemap;
