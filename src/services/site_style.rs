//! Visual identity derived from a bookmark's URL.
//!
//! Both helpers depend only on the URL's hostname, so every bookmark on the
//! same site gets the same tile colour and fallback letter across sessions.

use url::Url;

/// Fixed tile palette. The index is derived from the hostname hash.
pub const PALETTE: [&str; 12] = [
    "#FF6B6B", "#4ECDC4", "#45B7D1", "#96CEB4", "#FFEAA7", "#DDA0DD", "#98D8C8", "#F7DC6F",
    "#BB8FCE", "#85C1E9", "#F8C471", "#82E0AA",
];

/// Icon used when no hostname can be extracted.
pub const FALLBACK_ICON: &str = "📌";

fn hostname(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    if host.is_empty() {
        None
    } else {
        Some(host.to_string())
    }
}

/// 32-bit string hash (`h * 31 + unit`, wrapping) over UTF-16 code units.
fn hash_hostname(hostname: &str) -> i32 {
    hostname
        .encode_utf16()
        .fold(0i32, |hash, unit| {
            hash.wrapping_shl(5).wrapping_sub(hash).wrapping_add(unit as i32)
        })
}

/// Palette colour for a URL. Unparseable URLs get the first palette entry.
pub fn color_for_url(url: &str) -> String {
    let index = match hostname(url) {
        Some(host) => (hash_hostname(&host) as i64).unsigned_abs() as usize % PALETTE.len(),
        None => 0,
    };
    PALETTE[index].to_string()
}

/// Upper-cased first letter of the hostname, or a pin when there is none.
pub fn icon_for_url(url: &str) -> String {
    hostname(url)
        .and_then(|host| host.chars().next())
        .map(|c| c.to_uppercase().collect())
        .unwrap_or_else(|| FALLBACK_ICON.to_string())
}
