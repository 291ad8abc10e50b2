//! Formatting helpers for views and small URL utilities

/// Units used by [`format_size`]
const SIZE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Format a byte count with binary units and two decimals
///
/// # Examples
///
/// ```
/// use mediagrab::utils::format_size;
///
/// assert_eq!(format_size(0), "0B");
/// assert_eq!(format_size(1536), "1.50 KB");
/// ```
#[must_use]
pub fn format_size(size_bytes: u64) -> String {
    if size_bytes == 0 {
        return "0B".to_string();
    }

    let mut size = size_bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    format!("{:.2} {}", size, SIZE_UNITS[unit])
}

/// Format a format's size, treating 0 as the "unknown" sentinel
#[must_use]
pub fn format_size_or_unknown(size_bytes: u64) -> String {
    if size_bytes == 0 {
        "unknown".to_string()
    } else {
        format_size(size_bytes)
    }
}

/// Format a duration in seconds as `MM:SS`, or `HH:MM:SS` past one hour
///
/// # Examples
///
/// ```
/// use mediagrab::utils::format_duration;
///
/// assert_eq!(format_duration(65), "01:05");
/// assert_eq!(format_duration(3725), "01:02:05");
/// ```
#[must_use]
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{hours:02}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes:02}:{secs:02}")
    }
}

/// Format a count with comma thousands separators (e.g. view counts)
#[must_use]
pub fn format_count(count: u64) -> String {
    let digits = count.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Whether `input` is an absolute http(s) URL with a host
#[must_use]
pub fn is_http_url(input: &str) -> bool {
    match url::Url::parse(input.trim()) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host_str().is_some(),
        Err(_) => false,
    }
}

/// Build the link a completed job is served from
///
/// Relative (`/download/{id}`) unless a public origin is configured.
#[must_use]
pub fn download_link(public_base_url: Option<&str>, download_id: &str) -> String {
    let path = format!("/download/{}", urlencoding::encode(download_id));
    match public_base_url {
        Some(base) => format!("{}{}", base.trim_end_matches('/'), path),
        None => path,
    }
}
