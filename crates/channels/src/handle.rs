/// Strips mention decoration from a user handle: `<@U123>` and `@U123`
/// both become `U123`.
pub fn sanitize_handle(handle: &str) -> String {
    handle.chars().filter(|c| !matches!(c, '@' | '<' | '>')).collect()
}

/// The in-text token that addresses the user `id`.
pub fn mention_token(id: &str) -> String {
    format!("<@{id}>")
}
