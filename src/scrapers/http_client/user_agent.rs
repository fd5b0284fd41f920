//! User agent selection for forum requests.

/// Default identifying user agent.
pub const USER_AGENT: &str = "forumscrape/0.1 (vehicle reliability research crawler)";

/// Desktop browser user agents used when a forum rejects bot-looking clients.
pub const BROWSER_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:133.0) Gecko/20100101 Firefox/133.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/18.1 Safari/605.1.15",
];

/// Pick a browser user agent, stable per source so one forum sees one client.
pub fn browser_user_agent(source_id: &str) -> &'static str {
    let hash = source_id
        .bytes()
        .fold(0usize, |acc, b| acc.wrapping_mul(31).wrapping_add(b as usize));
    BROWSER_USER_AGENTS[hash % BROWSER_USER_AGENTS.len()]
}

/// Resolve the configured user agent for a source.
/// - None or blank => [`USER_AGENT`]
/// - "browser" / "impersonate" => a desktop browser string
/// - anything else is sent verbatim
pub fn resolve_user_agent(config: Option<&str>, source_id: &str) -> String {
    match config.map(str::trim) {
        None | Some("") => USER_AGENT.to_string(),
        Some("browser") | Some("impersonate") => browser_user_agent(source_id).to_string(),
        Some(custom) => custom.to_string(),
    }
}
