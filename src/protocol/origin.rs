// src/protocol/origin.rs
// Origin validation for inbound guest messages

/// Outcome of classifying a reported origin string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OriginVerdict {
    Trusted,
    Rejected,
}

/// Security-critical rule table:
/// - `"null"` is accepted (srcdoc iframes always report this).
/// - Any `https:` origin is accepted.
/// - `http:` is accepted only for `localhost` or `127.0.0.1`.
/// - Everything else, including unparseable strings, is rejected.
pub fn classify_origin(origin: &str) -> OriginVerdict {
    if origin == "null" {
        return OriginVerdict::Trusted;
    }

    let Ok(parsed) = url::Url::parse(origin) else {
        return OriginVerdict::Rejected;
    };

    match parsed.scheme() {
        "https" => OriginVerdict::Trusted,
        "http" => match parsed.host_str() {
            Some("localhost") | Some("127.0.0.1") => OriginVerdict::Trusted,
            _ => OriginVerdict::Rejected,
        },
        _ => OriginVerdict::Rejected,
    }
}
