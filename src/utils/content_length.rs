//! Content length extraction utilities.
//!
//! Media hosts answer with either a plain `Content-Length` or, for ranged
//! responses, a `Content-Range` whose last component is the full size.

use reqwest::header::CONTENT_RANGE;
use reqwest::Response;

/// Total size of the resource behind a response.
///
/// Prefers the total from `Content-Range`, then `Content-Length`, then
/// `fallback` (usually the size advertised by the stream manifest).
pub fn total_size(response: &Response, fallback: Option<u64>) -> Option<u64> {
    response
        .headers()
        .get(CONTENT_RANGE)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_content_range_total)
        .or_else(|| response.content_length())
        .or(fallback)
}

/// Parse Content-Range header to extract total size.
///
/// Content-Range header format: "bytes start-end/total". An unknown total
/// (`*`) yields `None`.
///
/// # Example
///
/// ```rust
/// use vidqueue::utils::parse_content_range_total;
///
/// let total = parse_content_range_total("bytes 0-1023/2048");
/// assert_eq!(total, Some(2048));
/// ```
pub fn parse_content_range_total(content_range: &str) -> Option<u64> {
    let (_, total) = content_range.split_once('/')?;
    total.trim().parse::<u64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_content_range_total() {
        assert_eq!(parse_content_range_total("bytes 0-1023/2048"), Some(2048));
        assert_eq!(parse_content_range_total("bytes 200-1023/5000"), Some(5000));
        assert_eq!(parse_content_range_total("bytes 0-0/1"), Some(1));
        assert_eq!(parse_content_range_total("bytes 0-1023/*"), None);
        assert_eq!(parse_content_range_total("invalid"), None);
        assert_eq!(parse_content_range_total("bytes 0-1023"), None);
        assert_eq!(parse_content_range_total(""), None);
    }

    #[test]
    fn test_parse_content_range_total_edge_cases() {
        // Test with whitespace
        assert_eq!(parse_content_range_total("bytes 0-1023/ 2048 "), Some(2048));
        // Test with zero size
        assert_eq!(parse_content_range_total("bytes 0-0/0"), Some(0));
        // Test with large numbers
        assert_eq!(
            parse_content_range_total("bytes 0-1023/999999999999"),
            Some(999999999999)
        );
    }
}
