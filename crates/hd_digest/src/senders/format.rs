use hd_core::Item;

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

fn hashtag(tag: &str) -> String {
    let body: String = tag
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    format!("#{}", body)
}

/// Telegram-flavoured HTML for one digest entry.
pub fn format_item(item: &Item) -> String {
    let mut message = format!(
        "<b><a href=\"{}\">{}</a></b>\n\n{}",
        escape_html(&item.url),
        escape_html(&item.title),
        escape_html(&item.summary)
    );

    if !item.tags.is_empty() {
        let tags: Vec<String> = item.tags.iter().map(|t| hashtag(t)).collect();
        message.push_str("\n\n");
        message.push_str(&escape_html(&tags.join(" ")));
    }

    message.push_str(&format!("\n⬆️ {}", item.engagement_score));
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_format_item_escapes_and_tags() {
        let item = Item {
            id: 1,
            title: "Rust <3 & you".to_string(),
            url: "https://example.com/?a=1&b=\"2\"".to_string(),
            summary: "Fast & safe.".to_string(),
            tags: vec!["rust".to_string(), "machine learning".to_string()],
            engagement_score: 321,
            fetched_at: Utc::now(),
            delivered_at: None,
            message_id: None,
        };

        let text = format_item(&item);
        assert!(text.starts_with(
            "<b><a href=\"https://example.com/?a=1&amp;b=&quot;2&quot;\">Rust &lt;3 &amp; you</a></b>"
        ));
        assert!(text.contains("Fast &amp; safe."));
        assert!(text.contains("#rust #machine_learning"));
        assert!(text.ends_with("⬆️ 321"));
    }
}
