//! Page routing for the shell.
//!
//! Rules are tried in order and the first match wins. Task pages match exact
//! paths only; the remaining pages match their path and anything below it.

/// Which task view the tasks page opens in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskView {
    /// Task list.
    List,
    /// New task form.
    Create,
    /// Edit form for the task with this id.
    Edit(String),
}

/// Page selected for a location path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Sync task list and editors.
    Tasks(TaskView),
    /// Application settings.
    Settings,
    /// Known servers.
    Servers,
    /// Log viewer.
    Logs,
    /// About and help.
    About,
}

const SECTION_PREFIXES: [(&str, Route); 4] = [
    ("/settings", Route::Settings),
    ("/servers", Route::Servers),
    ("/logs", Route::Logs),
    ("/about", Route::About),
];

impl Route {
    /// Resolve `path` to a page. Unknown paths render nothing.
    #[must_use]
    pub fn recognize(path: &str) -> Option<Self> {
        if let Some(view) = task_view(path) {
            return Some(Self::Tasks(view));
        }
        SECTION_PREFIXES
            .iter()
            .find(|(prefix, _)| has_segment_prefix(path, prefix))
            .map(|(_, route)| route.clone())
    }

    /// Canonical path that opens this page.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Tasks(TaskView::List) => "/".to_string(),
            Self::Tasks(TaskView::Create) => "/create".to_string(),
            Self::Tasks(TaskView::Edit(id)) => format!("/edit/{id}"),
            Self::Settings => "/settings".to_string(),
            Self::Servers => "/servers".to_string(),
            Self::Logs => "/logs".to_string(),
            Self::About => "/about".to_string(),
        }
    }
}

fn task_view(path: &str) -> Option<TaskView> {
    let trimmed = match path.strip_suffix('/') {
        Some(rest) if !rest.is_empty() => rest,
        _ => path,
    };
    match trimmed {
        "/" => Some(TaskView::List),
        "/create" => Some(TaskView::Create),
        _ => trimmed
            .strip_prefix("/edit/")
            .filter(|id| !id.is_empty() && !id.contains('/'))
            .map(|id| TaskView::Edit(id.to_string())),
    }
}

fn has_segment_prefix(path: &str, prefix: &str) -> bool {
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}
