//! Product reviews.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bloom_core::{ProductId, ReviewId};

const MAX_COMMENT_LENGTH: usize = 2000;

/// A customer review of a product.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub author_name: String,
    /// Stars, 1 to 5.
    pub rating: i16,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// Body for posting a review.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewInput {
    /// Defaults to the logged-in user's name when blank.
    #[serde(default)]
    pub author_name: String,
    pub rating: i16,
    pub comment: String,
}

impl ReviewInput {
    /// Trim fields and check the rating range.
    ///
    /// # Errors
    ///
    /// Returns every problem found, joined into one message.
    pub fn normalized(self) -> Result<Self, String> {
        let mut problems = Vec::new();
        let author_name = self.author_name.trim().to_string();
        let comment = self.comment.trim().to_string();
        if author_name.is_empty() {
            problems.push("authorName is required".to_string());
        }
        if !(1..=5).contains(&self.rating) {
            problems.push("rating must be between 1 and 5".to_string());
        }
        if comment.is_empty() {
            problems.push("comment is required".to_string());
        } else if comment.chars().count() > MAX_COMMENT_LENGTH {
            problems.push(format!(
                "comment must be at most {MAX_COMMENT_LENGTH} characters"
            ));
        }
        if !problems.is_empty() {
            return Err(problems.join("; "));
        }

        Ok(Self {
            author_name,
            rating: self.rating,
            comment,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn input(rating: i16, comment: &str) -> ReviewInput {
        ReviewInput {
            author_name: " Ana ".to_string(),
            rating,
            comment: comment.to_string(),
        }
    }

    #[test]
    fn test_valid_review_is_trimmed() {
        let review = input(5, " Lovely peonies ").normalized().unwrap();
        assert_eq!(review.author_name, "Ana");
        assert_eq!(review.comment, "Lovely peonies");
    }

    #[test]
    fn test_rating_bounds() {
        assert!(input(0, "meh").normalized().is_err());
        assert!(input(6, "wow").normalized().is_err());
        assert!(input(1, "late delivery").normalized().is_ok());
    }

    #[test]
    fn test_empty_comment_rejected() {
        let err = input(4, "   ").normalized().unwrap_err();
        assert!(err.contains("comment is required"));
    }
}
