use chrono::DateTime;

use crate::models::ContentItem;

/// Renders the YAML front matter block for an item, including the closing `---` line.
pub fn front_matter(item: &ContentItem) -> String {
    let mut metadata = String::from("---\n");
    metadata.push_str(&format!("id: \"{}\"\n", item.id));
    metadata.push_str(&format!("url: \"{}\"\n", item.url));
    metadata.push_str(&format!("type: \"{}\"\n", item.type_name()));

    if let Some(title) = item.title() {
        metadata.push_str(&format!("title: \"{}\"\n", escape_title(title)));
    }

    if let Some(column) = item.column().filter(|c| !c.url.is_empty()) {
        metadata.push_str(&format!("column: \"[{}]({})\"\n", column.title, column.url));
    }

    metadata.push_str(&format!("published: \"{}\"\n", format_timestamp(item.created)));
    metadata.push_str(&format!("updated: \"{}\"\n", format_timestamp(item.updated)));
    metadata.push_str("---\n");
    metadata
}

/// Escapes a title for a double-quoted YAML scalar.
///
/// Backslashes must be escaped before quotes, otherwise the backslash added in
/// front of each quote would be doubled as well.
pub fn escape_title(title: &str) -> String {
    title.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Reverses [`escape_title`].
#[cfg(test)]
pub fn unescape_title(escaped: &str) -> String {
    let mut title = String::with_capacity(escaped.len());
    let mut chars = escaped.chars();

    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(next) = chars.next() {
                title.push(next);
                continue;
            }
        }
        title.push(ch);
    }

    title
}

/// Seconds since the epoch as `YYYY-MM-DD HH:MM:SS` in UTC.
pub fn format_timestamp(seconds: i64) -> String {
    DateTime::from_timestamp(seconds, 0)
        .unwrap_or(DateTime::UNIX_EPOCH)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Column, ContentKind, sample_item};
    use rstest::rstest;

    #[rstest]
    #[case(r#"Say "hi""#, r#"Say \"hi\""#)]
    #[case(r"C:\temp", r"C:\\temp")]
    #[case(r#"a\"b"#, r#"a\\\"b"#)]
    #[case("plain", "plain")]
    fn test_escape_title(#[case] title: &str, #[case] expected: &str) {
        assert_eq!(escape_title(title), expected);
        assert_eq!(unescape_title(&escape_title(title)), title);
    }

    #[rstest]
    #[case(0, "1970-01-01 00:00:00")]
    #[case(1_700_000_000, "2023-11-14 22:13:20")]
    #[case(1_700_000_100, "2023-11-14 22:15:00")]
    #[case(i64::MAX, "1970-01-01 00:00:00")]
    fn test_format_timestamp(#[case] seconds: i64, #[case] expected: &str) {
        assert_eq!(format_timestamp(seconds), expected);
    }

    #[test]
    fn test_front_matter_field_order() {
        let item = sample_item(ContentKind::Article {
            title: r#"The "best" path\name"#.into(),
            body: "<p>x</p>".into(),
            column: Some(Column {
                title: "Notes".into(),
                url: "https://www.zhihu.com/column/notes".into(),
            }),
        });

        assert_eq!(
            front_matter(&item),
            concat!(
                "---\n",
                "id: \"123\"\n",
                "url: \"https://www.zhihu.com/question/1/answer/123\"\n",
                "type: \"article\"\n",
                "title: \"The \\\"best\\\" path\\\\name\"\n",
                "column: \"[Notes](https://www.zhihu.com/column/notes)\"\n",
                "published: \"2023-11-14 22:13:20\"\n",
                "updated: \"2023-11-14 22:15:00\"\n",
                "---\n",
            )
        );
    }

    #[test]
    fn test_front_matter_omits_missing_fields() {
        let item = sample_item(ContentKind::Pin {
            body: "<p>x</p>".into(),
        });

        let metadata = front_matter(&item);
        assert!(!metadata.contains("title:"));
        assert!(!metadata.contains("column:"));
        assert!(metadata.contains("type: \"pin\"\n"));
    }

    #[test]
    fn test_title_round_trips_through_front_matter() {
        let title = r#"Is "\n" a newline?"#;
        let item = sample_item(ContentKind::Answer {
            question_title: title.into(),
            body: String::new(),
        });

        let metadata = front_matter(&item);
        let line = metadata
            .lines()
            .find_map(|l| l.strip_prefix("title: \""))
            .and_then(|l| l.strip_suffix('"'))
            .unwrap();

        assert_eq!(unescape_title(line), title);
    }
}
