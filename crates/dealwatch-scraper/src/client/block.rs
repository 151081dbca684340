//! Bot-wall detection.

/// Lowercase phrases that mark a challenge or block page rather than the
/// real storefront.
pub const BLOCK_MARKERS: [&str; 5] = [
    "captcha",
    "cloudflare",
    "enable javascript",
    "unusual traffic",
    "access denied",
];

/// Returns the first marker found in `body`, case-insensitively.
#[must_use]
pub fn find_block_marker(body: &str) -> Option<&'static str> {
    let lowered = body.to_lowercase();
    BLOCK_MARKERS
        .iter()
        .copied()
        .find(|marker| lowered.contains(marker))
}
