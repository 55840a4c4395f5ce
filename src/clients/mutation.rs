use reqwest::Method;

use crate::models::slackwatch::Workload;

/// A state-changing call against the backend, described independently of
/// how it is sent. `BackendClient::submit` is the only place that turns one
/// into a request.
#[derive(Debug, Clone, Copy)]
pub enum Mutation<'a> {
    /// Rescan one workload (`POST /api/workloads/update`).
    Refresh(&'a Workload),
    /// Bump the workload's tag in its git-ops repo (`POST /api/workloads/upgrade`).
    Upgrade(&'a Workload),
    /// Rescan one workload, passing its fields as query parameters.
    RefreshSingle(&'a Workload),
    /// Rescan everything.
    RefreshAll,
}

impl<'a> Mutation<'a> {
    pub fn method(&self) -> Method {
        match self {
            Mutation::RefreshSingle(_) => Method::GET,
            _ => Method::POST,
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Mutation::Refresh(_) | Mutation::RefreshSingle(_) => "/api/workloads/update",
            Mutation::Upgrade(_) => "/api/workloads/upgrade",
            Mutation::RefreshAll => "/api/workloads/refresh-all",
        }
    }

    pub fn body(&self) -> Option<&'a Workload> {
        match *self {
            Mutation::Refresh(w) | Mutation::Upgrade(w) => Some(w),
            _ => None,
        }
    }

    pub fn query(&self) -> Vec<(&'static str, String)> {
        let Mutation::RefreshSingle(w) = *self else {
            return Vec::new();
        };
        vec![
            ("name", w.name.clone()),
            ("image", w.image.clone()),
            ("latest_version", w.latest_version.clone()),
            ("current_version", w.current_version.clone()),
            ("namespace", w.namespace.clone()),
            ("git_ops_repo", w.git_ops_repo.clone().unwrap_or_default()),
            ("update_available", w.update_available.as_str().to_string()),
            ("git_directory", w.git_directory.clone().unwrap_or_default()),
        ]
    }

    /// Verb phrase for log lines and user-facing failures.
    pub fn label(&self) -> &'static str {
        match self {
            Mutation::Refresh(_) | Mutation::RefreshSingle(_) => "refresh workload",
            Mutation::Upgrade(_) => "upgrade workload",
            Mutation::RefreshAll => "refresh workloads",
        }
    }

    pub fn target(&self) -> String {
        match self {
            Mutation::Refresh(w) | Mutation::Upgrade(w) | Mutation::RefreshSingle(w) => {
                format!("{}/{}", w.namespace, w.name)
            }
            Mutation::RefreshAll => "all".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::slackwatch::UpdateStatus;

    fn workload() -> Workload {
        Workload {
            name: "web".into(),
            namespace: "default".into(),
            image: "nginx".into(),
            current_version: "1.25".into(),
            latest_version: "1.27".into(),
            update_available: UpdateStatus::Available,
            git_ops_repo: Some("infra".into()),
            ..Default::default()
        }
    }

    #[test]
    fn refresh_and_upgrade_post_the_record() {
        let w = workload();
        let refresh = Mutation::Refresh(&w);
        assert_eq!(refresh.method(), Method::POST);
        assert_eq!(refresh.path(), "/api/workloads/update");
        assert_eq!(refresh.body(), Some(&w));
        assert!(refresh.query().is_empty());

        let upgrade = Mutation::Upgrade(&w);
        assert_eq!(upgrade.path(), "/api/workloads/upgrade");
        assert_eq!(upgrade.target(), "default/web");
    }

    #[test]
    fn refresh_single_carries_fields_as_query() {
        let w = workload();
        let m = Mutation::RefreshSingle(&w);
        assert_eq!(m.method(), Method::GET);
        assert!(m.body().is_none());

        let q = m.query();
        let keys: Vec<&str> = q.iter().map(|(k, _)| *k).collect();
        assert_eq!(
            keys,
            [
                "name",
                "image",
                "latest_version",
                "current_version",
                "namespace",
                "git_ops_repo",
                "update_available",
                "git_directory"
            ]
        );
        assert!(q.contains(&("update_available", "Available".to_string())));
        assert!(q.contains(&("git_ops_repo", "infra".to_string())));
        assert!(q.contains(&("git_directory", String::new())));
    }

    #[test]
    fn refresh_all_has_no_payload() {
        let m = Mutation::RefreshAll;
        assert_eq!(m.path(), "/api/workloads/refresh-all");
        assert!(m.body().is_none());
        assert!(m.query().is_empty());
        assert_eq!(m.target(), "all");
    }
}
