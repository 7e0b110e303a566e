//! Domain-based credibility heuristic for freshly retrieved sources.

use reqwest::Url;

/// Score every source starts from.
pub const BASE_CREDIBILITY: f64 = 0.5;

const INSTITUTIONAL_BONUS: f64 = 0.2;
const ORGANIZATION_BONUS: f64 = 0.1;
const KNOWN_OUTLET_BONUS: f64 = 0.15;

const KNOWN_OUTLETS: &[&str] = &["wikipedia", "reuters", "bbc", "nytimes"];

/// Host of a URL without a leading `www.`, lowercased. Empty if unparseable.
pub fn domain_of(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_lowercase))
        .map(|host| host.trim_start_matches("www.").to_string())
        .unwrap_or_default()
}

/// Heuristic credibility for a domain, in `[0, 1]`.
pub fn domain_credibility(domain: &str) -> f64 {
    let domain = domain.to_lowercase();
    let mut score = BASE_CREDIBILITY;

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.iter().skip(1).any(|l| *l == "gov" || *l == "edu") {
        score += INSTITUTIONAL_BONUS;
    } else if domain.ends_with(".org") {
        score += ORGANIZATION_BONUS;
    }

    if KNOWN_OUTLETS.iter().any(|outlet| labels.contains(outlet)) {
        score += KNOWN_OUTLET_BONUS;
    }

    score.min(1.0)
}
