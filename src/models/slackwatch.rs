use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

// Slackwatch backend records. The backend has shipped several shapes for the
// same data (snake_case vs camelCase, bool vs string status), so every record
// accepts the known aliases and normalizes on the way in.

/// Whether a newer image tag exists for a workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UpdateStatus {
    Available,
    NotAvailable,
    #[default]
    Unknown,
}

impl UpdateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateStatus::Available => "Available",
            UpdateStatus::NotAvailable => "NotAvailable",
            UpdateStatus::Unknown => "Unknown",
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, UpdateStatus::Available)
    }

    /// Sort rank: Available first, Unknown last.
    pub fn rank(&self) -> u8 {
        match self {
            UpdateStatus::Available => 0,
            UpdateStatus::NotAvailable => 1,
            UpdateStatus::Unknown => 2,
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "available" | "true" => UpdateStatus::Available,
            "notavailable" | "not_available" | "not-available" | "false" => {
                UpdateStatus::NotAvailable
            }
            _ => UpdateStatus::Unknown,
        }
    }
}

impl fmt::Display for UpdateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<bool> for UpdateStatus {
    fn from(available: bool) -> Self {
        if available {
            UpdateStatus::Available
        } else {
            UpdateStatus::NotAvailable
        }
    }
}

impl Serialize for UpdateStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for UpdateStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct StatusVisitor;

        impl<'de> serde::de::Visitor<'de> for StatusVisitor {
            type Value = UpdateStatus;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an update status string, a boolean or null")
            }

            fn visit_bool<E: serde::de::Error>(self, v: bool) -> Result<Self::Value, E> {
                Ok(UpdateStatus::from(v))
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(UpdateStatus::parse(v))
            }

            fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<Self::Value, E> {
                Ok(UpdateStatus::from(v != 0))
            }

            fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(UpdateStatus::from(v != 0))
            }

            fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
                Ok(UpdateStatus::Unknown)
            }

            fn visit_none<E: serde::de::Error>(self) -> Result<Self::Value, E> {
                Ok(UpdateStatus::Unknown)
            }

            fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Self::Value, D::Error> {
                d.deserialize_any(self)
            }
        }

        deserializer.deserialize_any(StatusVisitor)
    }
}

// Treat an explicit null the same as a missing field.
fn nullable<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

// Form posts send empty strings for absent optional fields.
fn optional<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<String>::deserialize(d)?.filter(|s| !s.is_empty()))
}

// --- Workload ---

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Workload {
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub namespace: String,
    #[serde(default, deserialize_with = "nullable")]
    pub image: String,
    #[serde(
        default,
        deserialize_with = "nullable",
        alias = "currentVersion",
        alias = "currentTag"
    )]
    pub current_version: String,
    #[serde(
        default,
        deserialize_with = "nullable",
        alias = "latestVersion",
        alias = "newTag"
    )]
    pub latest_version: String,
    #[serde(
        default,
        deserialize_with = "nullable",
        alias = "lastScanned",
        alias = "timeScanned"
    )]
    pub last_scanned: String,
    #[serde(default, alias = "updateAvailable")]
    pub update_available: UpdateStatus,
    #[serde(
        default,
        deserialize_with = "optional",
        alias = "includePattern",
        skip_serializing_if = "Option::is_none"
    )]
    pub include_pattern: Option<String>,
    #[serde(
        default,
        deserialize_with = "optional",
        alias = "excludePattern",
        skip_serializing_if = "Option::is_none"
    )]
    pub exclude_pattern: Option<String>,
    #[serde(
        default,
        deserialize_with = "optional",
        alias = "gitOpsRepo",
        skip_serializing_if = "Option::is_none"
    )]
    pub git_ops_repo: Option<String>,
    #[serde(
        default,
        deserialize_with = "optional",
        alias = "gitDirectory",
        skip_serializing_if = "Option::is_none"
    )]
    pub git_directory: Option<String>,
}

/// Stable sort by update status. Backend order is kept within each status.
pub fn sort_by_status(workloads: &mut [Workload]) {
    workloads.sort_by_key(|w| w.update_available.rank());
}

// --- Container ---

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Container {
    #[serde(default, deserialize_with = "nullable", alias = "containerName")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub image: String,
    #[serde(default, deserialize_with = "nullable", alias = "podName")]
    pub pod_name: String,
    #[serde(
        default,
        deserialize_with = "nullable",
        alias = "timeScanned",
        alias = "lastScanned"
    )]
    pub last_scanned: String,
    #[serde(default, deserialize_with = "nullable", alias = "includePattern")]
    pub include_pattern: String,
    #[serde(default, deserialize_with = "nullable", alias = "excludePattern")]
    pub exclude_pattern: String,
}

// --- Image update ---

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageUpdate {
    #[serde(default, deserialize_with = "nullable", alias = "containerName")]
    pub container_name: String,
    #[serde(
        default,
        deserialize_with = "nullable",
        alias = "currentTag",
        alias = "current_version"
    )]
    pub current_tag: String,
    #[serde(
        default,
        deserialize_with = "nullable",
        alias = "newTag",
        alias = "latest_version"
    )]
    pub new_tag: String,
    #[serde(default, deserialize_with = "nullable")]
    pub image: String,
    #[serde(default, deserialize_with = "nullable", alias = "podName")]
    pub pod_name: String,
    #[serde(
        default,
        deserialize_with = "nullable",
        alias = "foundAt",
        alias = "timeScanned",
        alias = "last_scanned"
    )]
    pub found_at: String,
    #[serde(default, alias = "updateAvailable")]
    pub update_available: UpdateStatus,
    #[serde(default, alias = "sentTime")]
    pub sent_time: Option<String>,
    #[serde(default, alias = "gitOpsRepo")]
    pub git_ops_repo: Option<String>,
    #[serde(default, alias = "gitDirectory")]
    pub git_directory: Option<String>,
}

// --- Pods (legacy inventory) ---

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PodInfo {
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable", alias = "timeScanned")]
    pub time_scanned: String,
}

// --- Settings ---

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default, deserialize_with = "nullable")]
    pub system: SystemSettings,
    #[serde(default)]
    pub gitops: Option<Vec<GitopsTarget>>,
    #[serde(default)]
    pub notifications: Option<Notifications>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemSettings {
    #[serde(default = "default_schedule")]
    pub schedule: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default)]
    pub run_at_startup: bool,
}

impl Default for SystemSettings {
    fn default() -> Self {
        Self {
            schedule: default_schedule(),
            data_dir: default_data_dir(),
            run_at_startup: false,
        }
    }
}

fn default_schedule() -> String {
    "0 0 */2 * * *".to_string()
}

fn default_data_dir() -> String {
    "/app/slackwatch/data".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GitopsTarget {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub repository_url: String,
    #[serde(default)]
    pub branch: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Notifications {
    #[serde(default)]
    pub slack_webhook_url: Option<String>,
    #[serde(default)]
    pub discord_webhook_url: Option<String>,
    #[serde(default)]
    pub ntfy: Option<Ntfy>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ntfy {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub topic: String,
}

/// The next-run endpoint is documented as a plain string but has been seen
/// returning JSON strings and JSON objects. Objects render as compact JSON.
pub fn schedule_text(body: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(serde_json::Value::String(s)) => s,
        Ok(other) => other.to_string(),
        Err(_) => body.trim().to_string(),
    }
}
