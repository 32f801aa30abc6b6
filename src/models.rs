/// A named collection of bookmarked items, in the order the API paginated them.
#[derive(Debug, Clone, Default)]
pub struct Collection {
    pub id: String,
    pub title: String,
    pub item_count: usize,
    pub items: Vec<ContentItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Author {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentKind {
    Answer { question_title: String, body: String },
    Pin { body: String },
    Article {
        title: String,
        body: String,
        column: Option<Column>,
    },
    ZVideo,
    Other { kind: String, body: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentItem {
    pub id: String,
    pub url: String,
    pub kind: ContentKind,
    pub author: Author,
    /// Seconds since the Unix epoch.
    pub created: i64,
    pub updated: i64,
}

impl ContentItem {
    /// The `type` string used by the API for this item.
    pub fn type_name(&self) -> &str {
        match &self.kind {
            ContentKind::Answer { .. } => "answer",
            ContentKind::Pin { .. } => "pin",
            ContentKind::Article { .. } => "article",
            ContentKind::ZVideo => "zvideo",
            ContentKind::Other { kind, .. } => kind,
        }
    }

    pub fn title(&self) -> Option<&str> {
        let title = match &self.kind {
            ContentKind::Answer { question_title, .. } => question_title,
            ContentKind::Article { title, .. } => title,
            _ => return None,
        };

        Some(title.as_str()).filter(|t| !t.is_empty())
    }

    pub fn body(&self) -> Option<&str> {
        let body = match &self.kind {
            ContentKind::Answer { body, .. }
            | ContentKind::Pin { body }
            | ContentKind::Article { body, .. }
            | ContentKind::Other { body, .. } => body,
            ContentKind::ZVideo => return None,
        };

        Some(body.as_str()).filter(|b| !b.is_empty())
    }

    pub fn column(&self) -> Option<&Column> {
        match &self.kind {
            ContentKind::Article { column, .. } => column.as_ref(),
            _ => None,
        }
    }
}

#[cfg(test)]
pub fn sample_item(kind: ContentKind) -> ContentItem {
    ContentItem {
        id: "123".into(),
        url: "https://www.zhihu.com/question/1/answer/123".into(),
        kind,
        author: Author {
            name: "someone".into(),
            url: "https://www.zhihu.com/people/someone".into(),
        },
        created: 1_700_000_000,
        updated: 1_700_000_100,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answer_exposes_question_title() {
        let item = sample_item(ContentKind::Answer {
            question_title: "Why?".into(),
            body: "<p>Because</p>".into(),
        });

        assert_eq!(item.type_name(), "answer");
        assert_eq!(item.title(), Some("Why?"));
        assert_eq!(item.body(), Some("<p>Because</p>"));
        assert_eq!(item.column(), None);
    }

    #[test]
    fn test_empty_fields_are_absent() {
        let item = sample_item(ContentKind::Article {
            title: String::new(),
            body: String::new(),
            column: None,
        });

        assert_eq!(item.title(), None);
        assert_eq!(item.body(), None);
    }

    #[test]
    fn test_zvideo_has_no_body() {
        let item = sample_item(ContentKind::ZVideo);
        assert_eq!(item.type_name(), "zvideo");
        assert_eq!(item.title(), None);
        assert_eq!(item.body(), None);
    }

    #[test]
    fn test_other_kind_keeps_wire_name() {
        let item = sample_item(ContentKind::Other {
            kind: "question".into(),
            body: "<p>x</p>".into(),
        });
        assert_eq!(item.type_name(), "question");
        assert_eq!(item.body(), Some("<p>x</p>"));
    }
}
