//! Side navigation menu.
//!
//! The table is static and ordered; each entry is keyed by the location path
//! it opens. Labels are translation keys under the `nav.` prefix.

use serde::Serialize;
use tracing::debug;

/// Prefix applied to every navigation label before translation.
pub const LABEL_PREFIX: &str = "nav.";

/// One static entry of the navigation table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavLink {
    /// Location path, also used as the entry key.
    pub path: &'static str,
    /// Untranslated label name.
    pub label: &'static str,
    /// Icon identifier understood by the rendering toolkit.
    pub icon: &'static str,
}

impl NavLink {
    /// Translation key for the label, e.g. `nav.tasks`.
    #[must_use]
    pub fn label_key(&self) -> String {
        format!("{LABEL_PREFIX}{}", self.label)
    }
}

/// Navigation entries in display order.
pub const NAV_LINKS: [NavLink; 5] = [
    NavLink {
        path: "/",
        label: "tasks",
        icon: "SyncToPC",
    },
    NavLink {
        path: "/servers",
        label: "servers",
        icon: "Server",
    },
    NavLink {
        path: "/settings",
        label: "settings",
        icon: "Settings",
    },
    NavLink {
        path: "/logs",
        label: "logs",
        icon: "CustomList",
    },
    NavLink {
        path: "/about",
        label: "about",
        icon: "Help",
    },
];

/// Rendered menu item handed to the toolkit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavItem {
    /// Translated display name.
    pub name: String,
    /// Entry key (the location path).
    pub key: &'static str,
    /// Icon identifier.
    pub icon: &'static str,
}

/// History stack the menu pushes onto when an entry is activated.
pub trait Navigator {
    /// Navigate to `path`.
    fn push(&mut self, path: &str);
}

/// Navigation menu bound to a [`Navigator`].
#[derive(Debug)]
pub struct NavMenu<N> {
    navigator: N,
}

impl<N: Navigator> NavMenu<N> {
    /// Menu that pushes activations onto `navigator`.
    #[must_use]
    pub const fn new(navigator: N) -> Self {
        Self { navigator }
    }

    /// Items in table order, labels passed through `translate`.
    #[must_use]
    pub fn items(&self, translate: impl Fn(&str) -> String) -> Vec<NavItem> {
        NAV_LINKS
            .iter()
            .map(|link| NavItem {
                name: translate(&link.label_key()),
                key: link.path,
                icon: link.icon,
            })
            .collect()
    }

    /// Handle a click on the entry keyed `key`. Keys outside the table are
    /// ignored and `false` is returned.
    pub fn activate(&mut self, key: &str) -> bool {
        let Some(link) = NAV_LINKS.iter().find(|link| link.path == key) else {
            debug!(key, "ignoring unknown navigation key");
            return false;
        };
        self.navigator.push(link.path);
        true
    }

    /// Key of the entry to highlight for the current `location`.
    ///
    /// Only an exact path match selects an entry; nested pages such as
    /// `/edit/42` leave the menu without a selection.
    #[must_use]
    pub fn selected_key(&self, location: &str) -> Option<&'static str> {
        NAV_LINKS
            .iter()
            .find(|link| link.path == location)
            .map(|link| link.path)
    }

    /// Underlying navigator.
    #[must_use]
    pub const fn navigator(&self) -> &N {
        &self.navigator
    }
}
