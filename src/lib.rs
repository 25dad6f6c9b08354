//! pagecast - a registration-driven static site generator.
//!
//! User sites are Rust binaries: depend on this crate, register page
//! scripts on a [`Site`], and call [`Site::generate`] or [`Site::watch`].
//! A build emits minified HTML pages, `sitemap.xml`, `robots.txt`, an
//! optional PWA manifest and service worker, and bundled CSS/JS, all under
//! one deployable output directory.
//!
//! ```no_run
//! use pagecast::{PageDocument, PageOptions, Site, SiteConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = SiteConfig::from_path("pagecast.toml".as_ref())?;
//!     let mut site = Site::new(config)?;
//!
//!     site.register_script("home", |ctx| async move {
//!         let doc = PageDocument {
//!             title: "Home".into(),
//!             description: "Welcome".into(),
//!             path: "index".into(),
//!             updated_at: "2026-08-23".into(),
//!             ..Default::default()
//!         };
//!         ctx.add_page(&doc, "<h1>Hello</h1>", &PageOptions::default())
//!             .await?;
//!         Ok(())
//!     });
//!
//!     site.generate().await
//! }
//! ```

pub mod bundle;
pub mod cli;
pub mod config;
pub mod document;
pub mod generator;
pub mod init;
pub mod logger;
pub mod mirror;
pub mod pages;
pub mod paths;
pub mod render;
pub mod site;
pub mod utils;

pub use config::{Mode, SiteConfig};
pub use document::{ChangeFreq, Document, DocumentError, PageDocument};
pub use mirror::{CopyOptions, Mirror};
pub use pages::ScriptContext;
pub use paths::SitePaths;
pub use render::{HtmlGenerator, PageOptions};
pub use site::Site;
