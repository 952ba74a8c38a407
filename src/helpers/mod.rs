//! Helper functions shared by templates, the generator and commands

mod date;
mod reading;
mod url;

pub use date::*;
pub use reading::*;
pub use url::*;
