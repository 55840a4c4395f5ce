use chrono::{DateTime, NaiveDateTime, Utc};

pub fn human_time(t: Option<DateTime<Utc>>) -> String {
    human_time_at(t, Utc::now())
}

pub fn human_time_at(t: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let t = match t {
        Some(t) => t,
        None => return "never".to_string(),
    };

    let d = now - t;
    let secs = d.num_seconds();

    if secs < 60 {
        "just now".to_string()
    } else if secs < 3600 {
        let m = d.num_minutes();
        if m == 1 {
            "1 minute ago".to_string()
        } else {
            format!("{} minutes ago", m)
        }
    } else if secs < 86400 {
        let h = d.num_hours();
        if h == 1 {
            "1 hour ago".to_string()
        } else {
            format!("{} hours ago", h)
        }
    } else if secs < 30 * 86400 {
        let days = d.num_days();
        if days == 1 {
            "1 day ago".to_string()
        } else {
            format!("{} days ago", days)
        }
    } else {
        t.format("%b %e, %Y").to_string()
    }
}

/// Parse the backend's scan timestamps: RFC 3339, or the naive
/// `YYYY-MM-DD HH:MM:SS` form (taken as UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.to_utc());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|n| n.and_utc())
}

/// Relative "last scanned" text. Unparseable values are shown verbatim.
pub fn scanned_display(raw: &str) -> String {
    if raw.trim().is_empty() {
        return "never".to_string();
    }
    match parse_timestamp(raw) {
        Some(t) => human_time(Some(t)),
        None => raw.to_string(),
    }
}
