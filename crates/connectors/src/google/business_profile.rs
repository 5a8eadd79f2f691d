//! Google Business Profile reviews.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::{last_segment, GoogleClient};
use crate::error::ConnectorError;
use crate::records::{BusinessReview, SourceKind, SyncRecord};
use crate::source::{verification_outcome, SyncSource};
use crate::window::DateWindow;

const BASE_URL: &str = "https://mybusiness.googleapis.com/v4";
const SCOPES: &[&str] = &["https://www.googleapis.com/auth/business.manage"];
const PAGE_SIZE: u32 = 50;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReviewList {
    #[serde(default)]
    reviews: Vec<RawReview>,
    next_page_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawReview {
    pub name: Option<String>,
    pub review_id: Option<String>,
    #[serde(default)]
    pub reviewer: RawReviewer,
    pub star_rating: Option<String>,
    pub comment: Option<String>,
    pub create_time: Option<DateTime<Utc>>,
    pub update_time: Option<DateTime<Utc>>,
    pub review_reply: Option<RawReply>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawReviewer {
    pub display_name: Option<String>,
    pub profile_photo_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawReply {
    pub comment: Option<String>,
    pub update_time: Option<DateTime<Utc>>,
}

/// `ONE`..`FIVE` to 1..5. Anything else counts as five stars.
pub fn star_rating_value(rating: &str) -> i16 {
    match rating {
        "ONE" => 1,
        "TWO" => 2,
        "THREE" => 3,
        "FOUR" => 4,
        _ => 5,
    }
}

pub(crate) fn convert_review(raw: RawReview, now: DateTime<Utc>) -> Option<BusinessReview> {
    let review_id = raw
        .review_id
        .filter(|id| !id.is_empty())
        .or_else(|| raw.name.as_deref().and_then(last_segment).map(str::to_string))?;
    let create_time = raw.create_time.unwrap_or(now);
    Some(BusinessReview {
        review_id,
        reviewer_name: raw
            .reviewer
            .display_name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "Anonymous".to_string()),
        reviewer_photo_url: raw.reviewer.profile_photo_url,
        star_rating: star_rating_value(raw.star_rating.as_deref().unwrap_or("FIVE")),
        comment: raw.comment,
        create_time,
        update_time: raw.update_time.unwrap_or(create_time),
        reply_comment: raw.review_reply.as_ref().and_then(|r| r.comment.clone()),
        reply_update_time: raw.review_reply.and_then(|r| r.update_time),
    })
}

/// Aggregate view over a location's reviews.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewStats {
    pub total_reviews: usize,
    pub average_rating: f64,
    /// Star value (1..=5) to review count. Every value is present.
    pub rating_distribution: BTreeMap<i16, usize>,
    pub unanswered_reviews: usize,
    /// Reviews created in the 30 days before `now`.
    pub recent_reviews: usize,
}

pub fn review_stats(reviews: &[BusinessReview], now: DateTime<Utc>) -> ReviewStats {
    let mut rating_distribution: BTreeMap<i16, usize> = (1..=5).map(|s| (s, 0)).collect();
    let cutoff = now - Duration::days(30);

    let mut total_stars = 0i64;
    let mut unanswered_reviews = 0;
    let mut recent_reviews = 0;
    for review in reviews {
        let stars = if (1..=5).contains(&review.star_rating) {
            review.star_rating
        } else {
            5
        };
        total_stars += i64::from(stars);
        *rating_distribution.entry(stars).or_insert(0) += 1;
        if review.reply_comment.is_none() {
            unanswered_reviews += 1;
        }
        if review.create_time >= cutoff {
            recent_reviews += 1;
        }
    }

    ReviewStats {
        total_reviews: reviews.len(),
        average_rating: if reviews.is_empty() {
            0.0
        } else {
            total_stars as f64 / reviews.len() as f64
        },
        rating_distribution,
        unanswered_reviews,
        recent_reviews,
    }
}

/// One location, addressed as `accounts/{account}/locations/{location}`.
pub struct BusinessProfileSource {
    client: GoogleClient,
    location_path: String,
}

impl BusinessProfileSource {
    pub fn new(client: GoogleClient, location_path: &str) -> Result<Self, ConnectorError> {
        let location_path = location_path.trim().trim_matches('/');
        let parts: Vec<&str> = location_path.split('/').collect();
        let valid = matches!(
            parts.as_slice(),
            ["accounts", account, "locations", location] if !account.is_empty() && !location.is_empty()
        );
        if !valid {
            return Err(ConnectorError::Config(format!(
                "Business Profile location must look like 'accounts/A/locations/L', got '{}'",
                location_path
            )));
        }
        Ok(Self {
            client,
            location_path: location_path.to_string(),
        })
    }

    async fn review_page(&self, page_token: Option<&str>) -> Result<ReviewList, ConnectorError> {
        let url = format!("{}/{}/reviews", BASE_URL, self.location_path);
        let mut query = vec![("pageSize", PAGE_SIZE.to_string())];
        if let Some(token) = page_token {
            query.push(("pageToken", token.to_string()));
        }
        self.client.get_json(&url, &query, SCOPES).await
    }

    pub async fn reviews(&self) -> Result<Vec<BusinessReview>, ConnectorError> {
        let now = Utc::now();
        let mut reviews = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let page = self.review_page(page_token.as_deref()).await?;
            reviews.extend(page.reviews.into_iter().filter_map(|r| convert_review(r, now)));
            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }
        Ok(reviews)
    }
}

#[async_trait]
impl SyncSource for BusinessProfileSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Gbp
    }

    async fn fetch_window(&self, _window: &DateWindow) -> Result<Vec<SyncRecord>, ConnectorError> {
        let reviews = self.reviews().await?;
        tracing::debug!(location = %self.location_path, count = reviews.len(), "fetched reviews");
        Ok(reviews.into_iter().map(SyncRecord::BusinessReview).collect())
    }

    async fn verify(&self) -> Result<bool, ConnectorError> {
        verification_outcome(self.review_page(None).await.map(|_| ()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticToken;
    use chrono::TimeZone;
    use serde_json::json;
    use std::sync::Arc;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 7, 1, 12, 0, 0).unwrap()
    }

    fn review(id: &str, stars: i16, days_ago: i64, replied: bool) -> BusinessReview {
        let created = now() - Duration::days(days_ago);
        BusinessReview {
            review_id: id.to_string(),
            reviewer_name: "Guest".to_string(),
            reviewer_photo_url: None,
            star_rating: stars,
            comment: None,
            create_time: created,
            update_time: created,
            reply_comment: replied.then(|| "Thank you".to_string()),
            reply_update_time: None,
        }
    }

    #[test]
    fn test_star_rating_value() {
        assert_eq!(star_rating_value("ONE"), 1);
        assert_eq!(star_rating_value("THREE"), 3);
        assert_eq!(star_rating_value("FIVE"), 5);
        assert_eq!(star_rating_value("STAR_RATING_UNSPECIFIED"), 5);
    }

    #[test]
    fn test_convert_review() {
        let raw: RawReview = serde_json::from_value(json!({
            "name": "accounts/1/locations/2/reviews/AbC",
            "reviewer": { "displayName": "" },
            "starRating": "TWO",
            "comment": "Late delivery",
            "createTime": "2026-06-20T08:00:00Z",
            "reviewReply": { "comment": "Sorry", "updateTime": "2026-06-21T08:00:00Z" }
        }))
        .unwrap();
        let review = convert_review(raw, now()).unwrap();
        assert_eq!(review.review_id, "AbC");
        assert_eq!(review.reviewer_name, "Anonymous");
        assert_eq!(review.star_rating, 2);
        assert_eq!(review.update_time, review.create_time);
        assert_eq!(review.reply_comment.as_deref(), Some("Sorry"));
        assert!(review.reply_update_time.is_some());
    }

    #[test]
    fn test_review_stats() {
        let reviews = vec![
            review("a", 5, 2, true),
            review("b", 4, 10, false),
            review("c", 3, 45, false),
            review("d", 5, 31, true),
        ];
        let stats = review_stats(&reviews, now());
        assert_eq!(stats.total_reviews, 4);
        assert_eq!(stats.average_rating, 4.25);
        assert_eq!(stats.rating_distribution[&5], 2);
        assert_eq!(stats.rating_distribution[&1], 0);
        assert_eq!(stats.unanswered_reviews, 2);
        assert_eq!(stats.recent_reviews, 2);
    }

    #[test]
    fn test_review_stats_empty() {
        let stats = review_stats(&[], now());
        assert_eq!(stats.total_reviews, 0);
        assert_eq!(stats.average_rating, 0.0);
        assert_eq!(stats.rating_distribution.len(), 5);
    }

    #[test]
    fn test_location_path_validation() {
        let client = GoogleClient::new(Arc::new(StaticToken("t".into()))).unwrap();
        assert!(BusinessProfileSource::new(client.clone(), "accounts/11/locations/22").is_ok());
        assert!(BusinessProfileSource::new(client.clone(), "locations/22").is_err());
        assert!(BusinessProfileSource::new(client, "accounts//locations/22").is_err());
    }
}
