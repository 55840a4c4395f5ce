use std::fmt::Display;

/// Lifecycle of a data-loading page. Starts in `Loading`, settles exactly
/// once into one of the other three.
#[derive(Debug, Clone, Default)]
pub enum PageState<T> {
    #[default]
    Loading,
    Error(String),
    Empty,
    Loaded(Vec<T>),
}

impl<T> PageState<T> {
    /// Settle a loading page with the result of its fetch. `what` names the
    /// collection in the user-facing error message. A page that has already
    /// settled is returned unchanged.
    pub fn settle<E: Display>(self, result: Result<Vec<T>, E>, what: &str) -> Self {
        if !matches!(self, PageState::Loading) {
            return self;
        }
        match result {
            Ok(items) if items.is_empty() => PageState::Empty,
            Ok(items) => PageState::Loaded(items),
            Err(e) => {
                tracing::error!("fetching {}: {}", what, e);
                PageState::Error(format!("Failed to fetch {}", what))
            }
        }
    }

    pub fn count(&self) -> usize {
        match self {
            PageState::Loaded(items) => items.len(),
            _ => 0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct WorkloadCardView {
    pub name: String,
    pub namespace: String,
    pub image: String,
    pub current_version: String,
    pub latest_version: String,
    pub last_scanned: String,
    pub last_scanned_display: String,
    pub update_available: bool,
    pub status: String,
    pub status_class: String,
    pub card_class: String,
    // Carried back to the backend untouched on refresh/upgrade.
    pub include_pattern: String,
    pub exclude_pattern: String,
    pub git_ops_repo: String,
    pub git_directory: String,
}

#[derive(Debug, Clone, Default)]
pub struct SystemInfoView {
    pub watched: usize,
    pub next_run: String,
    pub next_run_error: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ContainerView {
    pub name: String,
    pub image: String,
    pub pod_name: String,
    pub last_scanned: String,
    pub include_pattern: String,
    pub exclude_pattern: String,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateView {
    pub container_name: String,
    pub current_tag: String,
    pub new_tag: String,
    pub image: String,
    pub pod_name: String,
    pub found_at: String,
    pub show_update: bool,
    pub sent_time: String,
    pub card_class: String,
}

#[derive(Debug, Clone, Default)]
pub struct PodView {
    pub name: String,
    pub time_scanned: String,
}

#[derive(Debug, Clone, Default)]
pub struct SettingsView {
    pub schedule: String,
    pub data_dir: String,
    pub run_at_startup: String,
    pub gitops: Vec<GitopsView>,
    pub notifications: Vec<NotificationView>,
}

#[derive(Debug, Clone, Default)]
pub struct GitopsView {
    pub name: String,
    pub repository_url: String,
    pub branch: String,
}

#[derive(Debug, Clone, Default)]
pub struct NotificationView {
    pub kind: String,
    pub target: String,
}
