//! Helper functions shared by the view, templates and server

pub mod date;
pub mod url;

pub use date::long_date;
pub use url::{post_url, url_for};
