pub mod admin;
pub mod filter;
pub mod redirect;

pub use filter::{FilterService, filter_routes};
pub use redirect::RedirectService;
