//! Hostname normalization
//!
//! Raw hostnames arrive decorated: proxies append NUL-delimited metadata,
//! clients include the port, and some resolvers hand back a trailing dot.
//! Everything here is pure and total: malformed input reduces to `None`,
//! never a panic.

/// Normalize a raw requested hostname into a canonical lookup key.
///
/// Steps, in order:
/// 1. split on the first NUL byte and discard everything after it
/// 2. split on the first `:` and discard the port
/// 3. trim surrounding whitespace
/// 4. ASCII-lowercase (locale-independent)
/// 5. strip exactly one trailing `.`
///
/// Returns `None` when the input is empty or blank after reduction.
///
/// # Example
///
/// ```
/// use domain_tags::host::normalize;
///
/// assert_eq!(
///     normalize("MC.Example.COM:25565\0extra"),
///     Some("mc.example.com".to_string())
/// );
/// assert_eq!(normalize("host."), Some("host".to_string()));
/// assert_eq!(normalize(""), None);
/// assert_eq!(normalize("   "), None);
/// ```
#[must_use]
pub fn normalize(raw: &str) -> Option<String> {
    let host = raw.split('\0').next().unwrap_or("");
    let host = host.split(':').next().unwrap_or("");
    let host = host.trim().to_ascii_lowercase();
    let host = host.strip_suffix('.').unwrap_or(&host);

    if host.is_empty() {
        None
    } else {
        Some(host.to_string())
    }
}

/// Extract the requested host from a handshake.
///
/// Prefers the already-parsed server hostname; falls back to the raw
/// original-handshake string, which often carries the requested host as its
/// first NUL-delimited field. Both paths go through [`normalize`].
#[must_use]
pub fn requested_host(
    server_hostname: Option<&str>,
    original_handshake: Option<&str>,
) -> Option<String> {
    server_hostname
        .and_then(normalize)
        .or_else(|| original_handshake.and_then(normalize))
}
