#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]

//! Presentation shell contract for the syncdeck desktop front-end.
//! Holds the side navigation table and the page router; rendering is left to
//! whichever toolkit drives the window.

pub mod nav;
pub mod routes;

pub use nav::{NAV_LINKS, NavItem, NavLink, NavMenu, Navigator};
pub use routes::{Route, TaskView};
