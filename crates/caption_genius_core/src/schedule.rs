//! crates/caption_genius_core/src/schedule.rs
//!
//! Calendar operations on scheduled posts and the content mix summary.

use crate::domain::{
    ContentType, NewScheduledPost, ScheduleRange, ScheduledPost, ScheduledPostUpdate,
};
use crate::ports::{DatabaseService, PortError};
use crate::validation::{validate_platform, validate_schedule_range, ValidationError};
use tracing::info;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Port(#[from] PortError),
}

/// Places one of the caller's captions on the calendar.
pub async fn schedule_caption(
    db: &dyn DatabaseService,
    user_id: Uuid,
    post: NewScheduledPost,
) -> Result<ScheduledPost, ScheduleError> {
    validate_platform(&post.platform)?;
    // Only the owner's captions can be scheduled.
    db.get_caption(user_id, post.caption_id).await?;

    let post = NewScheduledPost {
        platform: post.platform.trim().to_string(),
        ..post
    };
    let created = db.create_scheduled_post(user_id, post).await?;
    info!(%user_id, post_id = %created.id, at = %created.scheduled_time, "Post scheduled");
    Ok(created)
}

pub async fn list_schedule(
    db: &dyn DatabaseService,
    user_id: Uuid,
    range: ScheduleRange,
) -> Result<Vec<ScheduledPost>, ScheduleError> {
    validate_schedule_range(&range)?;
    Ok(db.list_scheduled_posts(user_id, range).await?)
}

pub async fn update_schedule(
    db: &dyn DatabaseService,
    user_id: Uuid,
    post_id: Uuid,
    update: ScheduledPostUpdate,
) -> Result<ScheduledPost, ScheduleError> {
    if let Some(platform) = &update.platform {
        validate_platform(platform)?;
    }
    let update = ScheduledPostUpdate {
        platform: update.platform.map(|p| p.trim().to_string()),
        ..update
    };
    Ok(db.update_scheduled_post(user_id, post_id, update).await?)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContentMixEntry {
    pub content_type: ContentType,
    pub count: usize,
    pub percentage: f64,
}

/// Counts posts per content type. Every type is present, in `ContentType::ALL` order.
pub fn content_mix(posts: &[ScheduledPost]) -> Vec<ContentMixEntry> {
    let total = posts.len();
    ContentType::ALL
        .iter()
        .map(|&content_type| {
            let count = posts
                .iter()
                .filter(|p| p.content_type == content_type)
                .count();
            let percentage = if total > 0 {
                count as f64 / total as f64 * 100.0
            } else {
                0.0
            };
            ContentMixEntry {
                content_type,
                count,
                percentage,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NewCaption, PostStatus};
    use crate::memory::InMemoryDatabase;
    use chrono::{Duration, Utc};

    async fn seeded_caption(db: &InMemoryDatabase, user_id: Uuid) -> Uuid {
        let niche = db.find_niche_by_name("Yoga Studio").await.unwrap().unwrap();
        db.insert_caption(NewCaption {
            user_id,
            niche_id: niche.id,
            prompt: "Morning class announcement".to_string(),
            generated_caption: "Good morning, yogis! #namaste".to_string(),
        })
        .await
        .unwrap()
        .id
    }

    fn new_post(caption_id: Uuid, hours_ahead: i64, content_type: ContentType) -> NewScheduledPost {
        NewScheduledPost {
            caption_id,
            scheduled_time: Utc::now() + Duration::hours(hours_ahead),
            platform: " instagram ".to_string(),
            content_type,
        }
    }

    #[tokio::test]
    async fn scheduling_requires_an_owned_caption() {
        let db = InMemoryDatabase::with_default_niches();
        let owner = Uuid::new_v4();
        let caption_id = seeded_caption(&db, owner).await;

        let err = schedule_caption(&db, Uuid::new_v4(), new_post(caption_id, 2, ContentType::Educational))
            .await
            .unwrap_err();
        assert!(matches!(err, ScheduleError::Port(PortError::NotFound(_))));

        let post = schedule_caption(&db, owner, new_post(caption_id, 2, ContentType::Educational))
            .await
            .unwrap();
        assert_eq!(post.platform, "instagram");
        assert_eq!(post.status, PostStatus::Scheduled);
    }

    #[tokio::test]
    async fn blank_platform_is_rejected() {
        let db = InMemoryDatabase::with_default_niches();
        let owner = Uuid::new_v4();
        let caption_id = seeded_caption(&db, owner).await;
        let mut post = new_post(caption_id, 1, ContentType::Promotional);
        post.platform = "  ".to_string();

        let err = schedule_caption(&db, owner, post).await.unwrap_err();
        assert!(matches!(err, ScheduleError::Validation(_)));
    }

    #[tokio::test]
    async fn listing_filters_by_range_in_time_order() {
        let db = InMemoryDatabase::with_default_niches();
        let owner = Uuid::new_v4();
        let caption_id = seeded_caption(&db, owner).await;
        for hours in [48, 2, 24] {
            schedule_caption(&db, owner, new_post(caption_id, hours, ContentType::Engagement))
                .await
                .unwrap();
        }

        let range = ScheduleRange {
            from: Some(Utc::now()),
            to: Some(Utc::now() + Duration::hours(30)),
        };
        let posts = list_schedule(&db, owner, range).await.unwrap();

        assert_eq!(posts.len(), 2);
        assert!(posts[0].scheduled_time < posts[1].scheduled_time);
        assert_eq!(
            posts[0].caption_text.as_deref(),
            Some("Good morning, yogis! #namaste")
        );
    }

    #[tokio::test]
    async fn update_changes_only_given_fields() {
        let db = InMemoryDatabase::with_default_niches();
        let owner = Uuid::new_v4();
        let caption_id = seeded_caption(&db, owner).await;
        let post = schedule_caption(&db, owner, new_post(caption_id, 5, ContentType::Promotional))
            .await
            .unwrap();

        let updated = update_schedule(
            &db,
            owner,
            post.id,
            ScheduledPostUpdate {
                status: Some(PostStatus::Cancelled),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.status, PostStatus::Cancelled);
        assert_eq!(updated.platform, post.platform);
        assert_eq!(updated.content_type, ContentType::Promotional);
    }

    #[test]
    fn content_mix_reports_every_type() {
        assert!(content_mix(&[])
            .iter()
            .all(|e| e.count == 0 && e.percentage == 0.0));
    }

    #[tokio::test]
    async fn content_mix_percentages_sum_to_one_hundred() {
        let db = InMemoryDatabase::with_default_niches();
        let owner = Uuid::new_v4();
        let caption_id = seeded_caption(&db, owner).await;
        for content_type in [
            ContentType::Promotional,
            ContentType::Promotional,
            ContentType::Educational,
            ContentType::Engagement,
        ] {
            schedule_caption(&db, owner, new_post(caption_id, 1, content_type))
                .await
                .unwrap();
        }
        let posts = list_schedule(&db, owner, ScheduleRange::default()).await.unwrap();

        let mix = content_mix(&posts);
        assert_eq!(mix[0].content_type, ContentType::Promotional);
        assert_eq!(mix[0].count, 2);
        assert_eq!(mix[0].percentage, 50.0);
        assert_eq!(mix[2].count, 0);
        let total: f64 = mix.iter().map(|e| e.percentage).sum();
        assert!((total - 100.0).abs() < 1e-9);
    }
}
