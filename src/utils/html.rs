use ammonia;

/// Strip markup from free-form user text using the ammonia library.
///
/// Suggestion titles/descriptions are rendered back to other users, so
/// anything that survives here must be safe to echo into a page. Uses a
/// whitelist-based sanitizer: safe tags survive, <script> and friends do not.
pub fn clean_text(input: &str) -> String {
    ammonia::clean(input)
}
