//! crates/caption_genius_core/src/memory.rs
//!
//! In-process implementations of the ports, used by the test suites of every crate in
//! the workspace. `InMemoryDatabase` can be told to fail specific writes so degraded
//! paths are observable.

use crate::domain::{
    AiConfiguration, Caption, CaptionQuery, NewAiConfiguration, NewCaption, NewScheduledPost,
    Niche, PostStatus, Profile, ScheduleRange, ScheduledPost, ScheduledPostUpdate,
    UsageLogEntry,
};
use crate::ports::{CaptionGenerationService, DatabaseService, PortError, PortResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

/// The niches every fresh installation starts with.
pub const DEFAULT_NICHES: [(&str, &str); 6] = [
    ("Yoga Studio", "🧘‍♀️"),
    ("Indie Coffee Shop", "☕"),
    ("Fitness Trainer", "💪"),
    ("Photography", "📸"),
    ("Hair Salon", "💇‍♀️"),
    ("Food Blogger", "🍽️"),
];

#[derive(Default)]
struct Faults {
    session_reads: bool,
    usage_reads: bool,
    usage_writes: bool,
    credit_updates: bool,
    caption_inserts: bool,
}

#[derive(Default)]
struct State {
    sessions: HashMap<String, (Uuid, DateTime<Utc>)>,
    niches: Vec<Niche>,
    configurations: Vec<AiConfiguration>,
    profiles: HashMap<Uuid, Profile>,
    usage: Vec<UsageLogEntry>,
    captions: Vec<Caption>,
    posts: Vec<ScheduledPost>,
    faults: Faults,
}

#[derive(Default)]
pub struct InMemoryDatabase {
    state: Mutex<State>,
}

fn injected(what: &str) -> PortError {
    PortError::Unexpected(format!("injected {} failure", what))
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_niches() -> Self {
        let db = Self::new();
        for (name, icon) in DEFAULT_NICHES {
            db.add_niche(name, Some(icon), true);
        }
        db
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // --- Seeding ---

    pub fn add_niche(&self, name: &str, icon: Option<&str>, is_active: bool) -> Niche {
        let niche = Niche {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: None,
            icon: icon.map(str::to_string),
            is_active,
        };
        self.state().niches.push(niche.clone());
        niche
    }

    pub fn add_auth_session(&self, session_id: &str, user_id: Uuid, expires_at: DateTime<Utc>) {
        self.state()
            .sessions
            .insert(session_id.to_string(), (user_id, expires_at));
    }

    pub fn put_profile(&self, profile: Profile) {
        self.state().profiles.insert(profile.id, profile);
    }

    // --- Fault injection ---

    pub fn fail_session_reads(&self, fail: bool) {
        self.state().faults.session_reads = fail;
    }

    pub fn fail_usage_reads(&self, fail: bool) {
        self.state().faults.usage_reads = fail;
    }

    pub fn fail_usage_writes(&self, fail: bool) {
        self.state().faults.usage_writes = fail;
    }

    pub fn fail_credit_updates(&self, fail: bool) {
        self.state().faults.credit_updates = fail;
    }

    pub fn fail_caption_inserts(&self, fail: bool) {
        self.state().faults.caption_inserts = fail;
    }

    // --- Inspection ---

    pub fn profile(&self, user_id: Uuid) -> Option<Profile> {
        self.state().profiles.get(&user_id).cloned()
    }

    pub fn usage_entries(&self) -> Vec<UsageLogEntry> {
        self.state().usage.clone()
    }

    pub fn caption_count(&self) -> usize {
        self.state().captions.len()
    }

    pub fn configurations(&self, user_id: Uuid) -> Vec<AiConfiguration> {
        self.state()
            .configurations
            .iter()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect()
    }
}

fn caption_not_found(caption_id: Uuid) -> PortError {
    PortError::NotFound(format!("Caption {} not found", caption_id))
}

fn post_not_found(post_id: Uuid) -> PortError {
    PortError::NotFound(format!("Scheduled post {} not found", post_id))
}

#[async_trait]
impl DatabaseService for InMemoryDatabase {
    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let state = self.state();
        if state.faults.session_reads {
            return Err(injected("session read"));
        }
        match state.sessions.get(session_id) {
            Some((user_id, expires_at)) if *expires_at > Utc::now() => Ok(*user_id),
            _ => Err(PortError::Unauthorized),
        }
    }

    async fn list_active_niches(&self) -> PortResult<Vec<Niche>> {
        Ok(self
            .state()
            .niches
            .iter()
            .filter(|n| n.is_active)
            .cloned()
            .collect())
    }

    async fn find_niche_by_name(&self, name: &str) -> PortResult<Option<Niche>> {
        Ok(self.state().niches.iter().find(|n| n.name == name).cloned())
    }

    async fn get_active_configuration(&self, user_id: Uuid) -> PortResult<Option<AiConfiguration>> {
        Ok(self
            .state()
            .configurations
            .iter()
            .find(|c| c.user_id == user_id && c.is_active)
            .cloned())
    }

    async fn save_configuration(
        &self,
        user_id: Uuid,
        config: NewAiConfiguration,
    ) -> PortResult<AiConfiguration> {
        let mut state = self.state();
        for existing in state
            .configurations
            .iter_mut()
            .filter(|c| c.user_id == user_id)
        {
            existing.is_active = false;
        }
        let saved = AiConfiguration {
            id: Uuid::new_v4(),
            user_id,
            purpose: config.purpose,
            tone: config.tone,
            preferences: config.preferences,
            additional_traits: config.additional_traits,
            is_active: true,
            created_at: Utc::now(),
        };
        state.configurations.push(saved.clone());
        Ok(saved)
    }

    async fn get_profile(&self, user_id: Uuid) -> PortResult<Option<Profile>> {
        Ok(self.state().profiles.get(&user_id).cloned())
    }

    async fn decrement_credits(&self, user_id: Uuid) -> PortResult<Option<i32>> {
        let mut state = self.state();
        if state.faults.credit_updates {
            return Err(injected("credit update"));
        }
        Ok(state
            .profiles
            .get_mut(&user_id)
            .filter(|p| p.credits_remaining > 0)
            .map(|p| {
                p.credits_remaining -= 1;
                p.credits_remaining
            }))
    }

    async fn count_usage_since(
        &self,
        user_id: Uuid,
        action_type: &str,
        since: DateTime<Utc>,
    ) -> PortResult<i64> {
        let state = self.state();
        if state.faults.usage_reads {
            return Err(injected("usage read"));
        }
        Ok(state
            .usage
            .iter()
            .filter(|e| e.user_id == user_id && e.action_type == action_type && e.created_at >= since)
            .count() as i64)
    }

    async fn insert_usage_log(&self, entry: UsageLogEntry) -> PortResult<()> {
        let mut state = self.state();
        if state.faults.usage_writes {
            return Err(injected("usage write"));
        }
        state.usage.push(entry);
        Ok(())
    }

    async fn insert_caption(&self, caption: NewCaption) -> PortResult<Caption> {
        let mut state = self.state();
        if state.faults.caption_inserts {
            return Err(injected("caption insert"));
        }
        let niche_name = state
            .niches
            .iter()
            .find(|n| n.id == caption.niche_id)
            .map(|n| n.name.clone())
            .ok_or_else(|| PortError::NotFound(format!("Niche {} not found", caption.niche_id)))?;

        let stored = Caption {
            id: Uuid::new_v4(),
            user_id: caption.user_id,
            niche_id: caption.niche_id,
            niche_name,
            prompt: caption.prompt,
            generated_caption: caption.generated_caption,
            is_favorite: false,
            usage_count: 0,
            created_at: Utc::now(),
        };
        state.captions.push(stored.clone());
        Ok(stored)
    }

    async fn list_captions(&self, user_id: Uuid, query: &CaptionQuery) -> PortResult<Vec<Caption>> {
        let state = self.state();
        // Reverse insertion order keeps same-instant rows newest first after the stable sort.
        let mut captions: Vec<Caption> = state
            .captions
            .iter()
            .rev()
            .filter(|c| c.user_id == user_id)
            .filter(|c| query.niche.as_ref().map_or(true, |n| &c.niche_name == n))
            .cloned()
            .collect();
        captions.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let offset = query.offset.unwrap_or(0).max(0) as usize;
        let limit = query.limit.map_or(usize::MAX, |l| l.max(0) as usize);
        Ok(captions.into_iter().skip(offset).take(limit).collect())
    }

    async fn get_caption(&self, user_id: Uuid, caption_id: Uuid) -> PortResult<Caption> {
        self.state()
            .captions
            .iter()
            .find(|c| c.id == caption_id && c.user_id == user_id)
            .cloned()
            .ok_or_else(|| caption_not_found(caption_id))
    }

    async fn set_caption_favorite(
        &self,
        user_id: Uuid,
        caption_id: Uuid,
        is_favorite: bool,
    ) -> PortResult<Caption> {
        let mut state = self.state();
        let caption = state
            .captions
            .iter_mut()
            .find(|c| c.id == caption_id && c.user_id == user_id)
            .ok_or_else(|| caption_not_found(caption_id))?;
        caption.is_favorite = is_favorite;
        Ok(caption.clone())
    }

    async fn delete_caption(&self, user_id: Uuid, caption_id: Uuid) -> PortResult<()> {
        let mut state = self.state();
        let before = state.captions.len();
        state
            .captions
            .retain(|c| !(c.id == caption_id && c.user_id == user_id));
        if state.captions.len() == before {
            return Err(caption_not_found(caption_id));
        }
        state.posts.retain(|p| p.caption_id != caption_id);
        Ok(())
    }

    async fn create_scheduled_post(
        &self,
        user_id: Uuid,
        post: NewScheduledPost,
    ) -> PortResult<ScheduledPost> {
        let now = Utc::now();
        let created = ScheduledPost {
            id: Uuid::new_v4(),
            user_id,
            caption_id: post.caption_id,
            scheduled_time: post.scheduled_time,
            platform: post.platform,
            status: PostStatus::Scheduled,
            content_type: post.content_type,
            error_message: None,
            retry_count: 0,
            created_at: now,
            updated_at: now,
            caption_text: None,
        };
        self.state().posts.push(created.clone());
        Ok(created)
    }

    async fn list_scheduled_posts(
        &self,
        user_id: Uuid,
        range: ScheduleRange,
    ) -> PortResult<Vec<ScheduledPost>> {
        let state = self.state();
        let mut posts: Vec<ScheduledPost> = state
            .posts
            .iter()
            .filter(|p| p.user_id == user_id && range.contains(p.scheduled_time))
            .map(|p| ScheduledPost {
                caption_text: state
                    .captions
                    .iter()
                    .find(|c| c.id == p.caption_id)
                    .map(|c| c.generated_caption.clone()),
                ..p.clone()
            })
            .collect();
        posts.sort_by_key(|p| p.scheduled_time);
        Ok(posts)
    }

    async fn update_scheduled_post(
        &self,
        user_id: Uuid,
        post_id: Uuid,
        update: ScheduledPostUpdate,
    ) -> PortResult<ScheduledPost> {
        let mut state = self.state();
        let post = state
            .posts
            .iter_mut()
            .find(|p| p.id == post_id && p.user_id == user_id)
            .ok_or_else(|| post_not_found(post_id))?;

        if let Some(at) = update.scheduled_time {
            post.scheduled_time = at;
        }
        if let Some(platform) = update.platform {
            post.platform = platform;
        }
        if let Some(content_type) = update.content_type {
            post.content_type = content_type;
        }
        if let Some(status) = update.status {
            post.status = status;
        }
        post.updated_at = Utc::now();
        Ok(post.clone())
    }

    async fn delete_scheduled_post(&self, user_id: Uuid, post_id: Uuid) -> PortResult<()> {
        let mut state = self.state();
        let before = state.posts.len();
        state
            .posts
            .retain(|p| !(p.id == post_id && p.user_id == user_id));
        if state.posts.len() == before {
            return Err(post_not_found(post_id));
        }
        Ok(())
    }
}

//=========================================================================================
// Scripted completion provider
//=========================================================================================

enum Reply {
    Text(String),
    Unauthorized,
    Empty,
    Fault(String),
}

/// A `CaptionGenerationService` that returns a fixed reply and records its calls.
pub struct ScriptedCaptionGenerator {
    reply: Reply,
    calls: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
}

impl ScriptedCaptionGenerator {
    fn with_reply(reply: Reply) -> Self {
        Self {
            reply,
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    pub fn replying(text: &str) -> Self {
        Self::with_reply(Reply::Text(text.to_string()))
    }

    pub fn failing(error: PortError) -> Self {
        Self::with_reply(match error {
            PortError::Unauthorized => Reply::Unauthorized,
            PortError::EmptyResponse(_) => Reply::Empty,
            other => Reply::Fault(other.to_string()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl CaptionGenerationService for ScriptedCaptionGenerator {
    fn model(&self) -> &str {
        "scripted-model"
    }

    async fn generate_caption(&self, prompt: &str) -> PortResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self
            .last_prompt
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(prompt.to_string());

        match &self.reply {
            Reply::Text(text) => Ok(text.clone()),
            Reply::Unauthorized => Err(PortError::Unauthorized),
            Reply::Empty => Err(PortError::EmptyResponse("no choices".to_string())),
            Reply::Fault(message) => Err(PortError::Unexpected(message.clone())),
        }
    }
}
