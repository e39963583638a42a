//! HTML-entity escaping for scraped text

/// Escape the five HTML-significant characters so scraped text is inert when a host
/// renders it back into a page.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escapes_markup() {
        assert_eq!(
            escape_html(r#"<img src="x" onerror='alert(1)'>"#),
            "&lt;img src=&quot;x&quot; onerror=&#39;alert(1)&#39;&gt;"
        );
    }

    #[test]
    fn test_ampersand_first() {
        assert_eq!(escape_html("a &lt; b"), "a &amp;lt; b");
        assert_eq!(escape_html("1 <= n"), "1 &lt;= n");
    }
}
