use serde::Serialize;

use crate::types::{ArticleReview, Result};

/// Minimal per-item projection sent to the chat relay.
#[derive(Serialize)]
struct DigestItem<'a> {
    id: &'a str,
    url: &'a str,
    summary: &'a str,
    source: &'a str,
    title: &'a str,
}

/// Serializes the digest as a JSON array, preserving review order.
pub fn build_digest_json(reviews: &[ArticleReview]) -> Result<Vec<u8>> {
    let payload: Vec<DigestItem<'_>> = reviews
        .iter()
        .map(|review| DigestItem {
            id: &review.article.id,
            url: &review.article.url,
            summary: &review.summary,
            source: &review.article.source,
            title: &review.article.title,
        })
        .collect();

    Ok(serde_json::to_vec(&payload)?)
}

/// Renders the human-readable digest: one block per item with the title,
/// two-decimal score, summary, and link, separated by blank lines.
pub fn build_digest_message(reviews: &[ArticleReview]) -> String {
    let mut formatted = String::new();
    for review in reviews {
        formatted.push_str(&format!(
            "- {}\nScore: {:.2}\n{}\n{}\n\n",
            review.article.title, review.score, review.summary, review.article.url
        ));
    }
    formatted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Article;
    use chrono::Utc;

    fn review(id: &str, title: &str, score: f64) -> ArticleReview {
        ArticleReview {
            article: Article {
                id: id.to_string(),
                title: title.to_string(),
                abstract_text: format!("abstract of {id}"),
                url: format!("https://example.org/abs/{id}"),
                source: "arxiv/cs.AI".to_string(),
                published_at: Utc::now(),
            },
            score,
            topics: Vec::new(),
            summary: format!("summary of {id}"),
            ranked_at: Utc::now(),
        }
    }

    #[test]
    fn message_formats_one_block_per_item() {
        let message = build_digest_message(&[review("a", "First", 0.5)]);
        assert_eq!(
            message,
            "- First\nScore: 0.50\nsummary of a\nhttps://example.org/abs/a\n\n"
        );
    }

    #[test]
    fn message_preserves_review_order() {
        let reviews = vec![review("a", "First", 1.0), review("b", "Second", 2.0)];
        let message = build_digest_message(&reviews);
        let first = message.find("First").unwrap();
        let second = message.find("Second").unwrap();
        assert!(first < second);
    }

    #[test]
    fn empty_digest_renders_empty_message() {
        assert!(build_digest_message(&[]).is_empty());
    }

    #[test]
    fn json_payload_projects_expected_fields() {
        let payload = build_digest_json(&[review("a", "First", 0.5)]).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&payload).unwrap();

        let items = value.as_array().unwrap();
        assert_eq!(items.len(), 1);
        let item = &items[0];
        assert_eq!(item["id"], "a");
        assert_eq!(item["url"], "https://example.org/abs/a");
        assert_eq!(item["summary"], "summary of a");
        assert_eq!(item["source"], "arxiv/cs.AI");
        assert_eq!(item["title"], "First");
        assert!(item.get("score").is_none());
    }
}
