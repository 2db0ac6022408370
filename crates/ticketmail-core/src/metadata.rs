//! Routing metadata pulled from message headers.

use tracing::trace;

/// Splits an address-list header into bare `local@domain` addresses.
///
/// Accepts `Name <addr>`, bare `addr`, quoted display names containing
/// commas, and a missing closing `>`. Entries without `@` are dropped.
#[must_use]
pub fn parse_address_list(header: &str) -> Vec<String> {
    split_entries(header)
        .into_iter()
        .filter_map(address_of)
        .collect()
}

/// Returns the issue number a message is addressed to.
///
/// Scans the To list and then the Cc list for the first address whose local
/// part is all ASCII digits and whose domain is `ticket_domain`
/// (case-insensitive).
#[must_use]
pub fn extract_issue_number(to: &str, cc: &str, ticket_domain: &str) -> Option<String> {
    [to, cc]
        .into_iter()
        .flat_map(parse_address_list)
        .find_map(|address| {
            let (local, domain) = address.split_once('@')?;
            let is_issue = !local.is_empty()
                && local.bytes().all(|b| b.is_ascii_digit())
                && domain.eq_ignore_ascii_case(ticket_domain);
            trace!(%address, is_issue, "checking recipient");
            is_issue.then(|| local.to_string())
        })
}

/// Returns the lowercased domain of the From address.
#[must_use]
pub fn extract_sender_domain(from: &str) -> Option<String> {
    let address = parse_address_list(from).into_iter().next()?;
    let (_, domain) = address.rsplit_once('@')?;
    let domain = domain.trim_matches(|c: char| c.is_whitespace() || matches!(c, '<' | '>' | '"'));
    (!domain.is_empty()).then(|| domain.to_ascii_lowercase())
}

/// Whether an Authentication-Results value reports an SPF or DKIM pass.
#[must_use]
pub fn passes_email_auth(authentication_results: &str) -> bool {
    let value = authentication_results.to_ascii_lowercase();
    value.contains("spf=pass") || value.contains("dkim=pass")
}

/// Splits on commas that are outside quotes and angle brackets.
fn split_entries(header: &str) -> Vec<&str> {
    let mut entries = Vec::new();
    let mut in_quotes = false;
    let mut in_angle = false;
    let mut escaped = false;
    let mut start = 0;

    for (index, ch) in header.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            '<' if !in_quotes => in_angle = true,
            '>' if !in_quotes => in_angle = false,
            ',' if !in_quotes && !in_angle => {
                entries.push(&header[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    entries.push(&header[start..]);
    entries
}

fn address_of(entry: &str) -> Option<String> {
    let entry = entry.trim();
    let candidate = match entry.rfind('<') {
        Some(open) => {
            let rest = &entry[open + 1..];
            rest.find('>').map_or(rest, |close| &rest[..close])
        }
        None => entry,
    };
    let candidate = candidate.trim().trim_matches('"');
    candidate.contains('@').then(|| candidate.to_string())
}
