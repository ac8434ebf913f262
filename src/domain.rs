//! Domain name decomposition.
//!
//! Turns a dotted name into the ordered list of targets the walk will
//! query, from least to most specific.

/// Split a domain name into the query targets for each hop.
///
/// `example.com` becomes `["com", "example.com"]` and
/// `www.example.com` becomes `["com", "example.com", "www.example.com"]`.
///
/// The list is capped at three steps no matter how many labels the name
/// has: for `a.b.example.com` the walk goes root -> `com` servers ->
/// `example.com` servers -> final `A` query for the full name, skipping
/// the intermediate zones. Known limitation, kept for compatibility with
/// the existing cache and tests.
pub fn substrings(name: &str) -> Vec<String> {
    let mut labels = name.rsplit('.');

    // rsplit always yields at least one item, even for "".
    let tld = labels.next().unwrap_or_default().to_string();
    let mut targets = vec![tld];

    if let Some(sld) = labels.next() {
        targets.push(format!("{}.{}", sld, targets[0]));
        targets.push(name.to_string());
    }

    targets
}
