use ammonia;

/// Clean HTML content using the ammonia library.
///
/// Whitelist-based sanitization: safe tags (like <b>, <p>) are preserved,
/// dangerous tags (like <script>, <iframe>) and attributes (like onclick)
/// are stripped. Post bodies and comments arrive from a rich-text editor,
/// so this runs on every write before storage.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}
