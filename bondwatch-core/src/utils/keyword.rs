/// Returns whether `token_id` contains `keyword`, ignoring case.
///
/// An empty keyword matches nothing: an unset keyword must never turn every
/// new listing into an automatic purchase.
pub fn matches_keyword(keyword: &str, token_id: &str) -> bool {
    if keyword.is_empty() {
        return false;
    }
    token_id.to_lowercase().contains(&keyword.to_lowercase())
}
