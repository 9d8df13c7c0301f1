use url::Url;

/// Returns `true` when `url` must not be fetched.
///
/// A URL is unsafe when it does not parse, when its scheme is not `http` or
/// `https`, or when its host is `localhost`, a dotted-decimal IPv4 literal, or
/// contains a colon. The colon test stands in for IPv6 literal detection and
/// rejects every bracketed host, including some odd but valid names.
///
/// This is a syntactic gate only. Hostnames that resolve to private ranges
/// (including via DNS rebinding after this check) are not detected.
pub fn is_unsafe(url: &str) -> bool {
    let parsed = match Url::parse(url) {
        Ok(parsed) => parsed,
        Err(_) => return true,
    };

    if !matches!(parsed.scheme(), "http" | "https") {
        return true;
    }

    let host = match parsed.host_str() {
        Some(host) => host,
        None => return true,
    };

    host == "localhost" || is_dotted_ipv4(host) || host.contains(':')
}

/// Strict four-octet check: exactly four dot-separated groups of one to three
/// digits, each in `0..=255`.
fn is_dotted_ipv4(host: &str) -> bool {
    let octets: Vec<&str> = host.split('.').collect();
    octets.len() == 4
        && octets.iter().all(|octet| {
            !octet.is_empty()
                && octet.len() <= 3
                && octet.bytes().all(|b| b.is_ascii_digit())
                && octet.parse::<u16>().map(|n| n <= 255).unwrap_or(false)
        })
}
