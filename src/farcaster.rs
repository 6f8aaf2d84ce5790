use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::cache;

/// Thin typed client for the Neynar Farcaster API. Carries the request and
/// response contracts only; the announcement composers below are the sole
/// additions on top of the raw endpoints.
#[derive(Clone)]
pub struct FarcasterClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, thiserror::Error)]
pub enum FarcasterError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status: {0}")]
    Status(StatusCode),
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FarcasterBio {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FarcasterUser {
    pub fid: i64,
    pub username: String,
    pub display_name: String,
    #[serde(default)]
    pub pfp_url: Option<String>,
    #[serde(default)]
    pub bio: Option<FarcasterBio>,
    #[serde(default)]
    pub follower_count: i64,
    #[serde(default)]
    pub following_count: i64,
    #[serde(default)]
    pub verifications: Vec<String>,
}

impl FarcasterUser {
    pub fn bio_text(&self) -> Option<String> {
        self.bio
            .as_ref()
            .map(|b| b.text.clone())
            .filter(|t| !t.is_empty())
    }

    pub fn verified(&self) -> bool {
        !self.verifications.is_empty()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Cast {
    pub hash: String,
    #[serde(default)]
    pub thread_hash: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserEnvelope {
    user: Option<FarcasterUser>,
}

#[derive(Debug, Deserialize)]
struct CastEnvelope {
    cast: Cast,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    users: Vec<FarcasterUser>,
}

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    result: SearchResult,
}

impl FarcasterClient {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Look up a user by Farcaster id. Profile lookups are cached for
    /// five minutes; an unknown fid is `Ok(None)`.
    pub async fn get_user_by_fid(&self, fid: i64) -> Result<Option<FarcasterUser>, FarcasterError> {
        let key = cache::profile_key(fid);
        if let Some(user) = cache::get::<FarcasterUser>(&key) {
            return Ok(Some(user));
        }

        let response = self
            .http
            .get(format!("{}/v2/user/bulk", self.base_url))
            .query(&[("fids", fid.to_string())])
            .header("api_key", &self.api_key)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(FarcasterError::Status(response.status()));
        }

        let envelope: UserEnvelope = response.json().await?;
        if let Some(user) = &envelope.user {
            if let Err(e) = cache::set(&key, user, cache::PROFILE_TTL) {
                tracing::warn!("Failed to cache Farcaster profile {}: {}", fid, e);
            }
        }
        Ok(envelope.user)
    }

    pub async fn get_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<FarcasterUser>, FarcasterError> {
        let response = self
            .http
            .get(format!("{}/v2/user/by_username", self.base_url))
            .query(&[("username", username)])
            .header("api_key", &self.api_key)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(FarcasterError::Status(response.status()));
        }

        let envelope: UserEnvelope = response.json().await?;
        Ok(envelope.user)
    }

    pub async fn search_users(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Vec<FarcasterUser>, FarcasterError> {
        let response = self
            .http
            .get(format!("{}/v2/user/search", self.base_url))
            .query(&[("q", query), ("limit", &limit.to_string())])
            .header("api_key", &self.api_key)
            .send()
            .await?
            .error_for_status()?;

        let envelope: SearchEnvelope = response.json().await?;
        Ok(envelope.result.users)
    }

    /// Publish a cast, optionally as a reply to a parent hash or URL
    pub async fn publish_cast(
        &self,
        signer_uuid: &str,
        text: &str,
        parent: Option<&str>,
    ) -> Result<Cast, FarcasterError> {
        let mut payload = json!({
            "signer_uuid": signer_uuid,
            "text": text,
        });
        if let Some(parent) = parent {
            payload["parent"] = json!(parent);
        }

        let response = self
            .http
            .post(format!("{}/v2/casts", self.base_url))
            .header("api_key", &self.api_key)
            .json(&payload)
            .send()
            .await?
            .error_for_status()?;

        let envelope: CastEnvelope = response.json().await?;
        Ok(envelope.cast)
    }

    pub async fn like_cast(&self, signer_uuid: &str, cast_hash: &str) -> Result<(), FarcasterError> {
        self.react(signer_uuid, "like", cast_hash).await
    }

    pub async fn recast_cast(
        &self,
        signer_uuid: &str,
        cast_hash: &str,
    ) -> Result<(), FarcasterError> {
        self.react(signer_uuid, "recast", cast_hash).await
    }

    async fn react(
        &self,
        signer_uuid: &str,
        reaction_type: &str,
        target: &str,
    ) -> Result<(), FarcasterError> {
        self.http
            .post(format!("{}/v2/reactions", self.base_url))
            .header("api_key", &self.api_key)
            .json(&json!({
                "signer_uuid": signer_uuid,
                "reaction_type": reaction_type,
                "target": target,
            }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    pub async fn follow_user(
        &self,
        signer_uuid: &str,
        target_fid: i64,
    ) -> Result<(), FarcasterError> {
        self.http
            .post(format!("{}/v2/follows", self.base_url))
            .header("api_key", &self.api_key)
            .json(&json!({
                "signer_uuid": signer_uuid,
                "target_fids": [target_fid],
            }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    pub async fn unfollow_user(
        &self,
        signer_uuid: &str,
        target_fid: i64,
    ) -> Result<(), FarcasterError> {
        self.http
            .delete(format!("{}/v2/follows", self.base_url))
            .header("api_key", &self.api_key)
            .json(&json!({
                "signer_uuid": signer_uuid,
                "target_fids": [target_fid],
            }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    pub async fn post_study_group_announcement(
        &self,
        signer_uuid: &str,
        group_name: &str,
        course: &str,
        description: &str,
    ) -> Result<Cast, FarcasterError> {
        let text = study_group_announcement_text(group_name, course, description);
        self.publish_cast(signer_uuid, &text, None).await
    }

    pub async fn post_circle_invite(
        &self,
        signer_uuid: &str,
        circle_name: &str,
        topic: &str,
        description: &str,
    ) -> Result<Cast, FarcasterError> {
        let text = circle_invite_text(circle_name, topic, description);
        self.publish_cast(signer_uuid, &text, None).await
    }

    pub async fn post_help_request(
        &self,
        signer_uuid: &str,
        subject: &str,
        description: &str,
        urgency: &str,
    ) -> Result<Cast, FarcasterError> {
        let text = help_request_text(subject, description, urgency);
        self.publish_cast(signer_uuid, &text, None).await
    }
}

fn hashtag(raw: &str) -> String {
    raw.split_whitespace().collect()
}

fn study_group_announcement_text(group_name: &str, course: &str, description: &str) -> String {
    format!(
        "📚 New Study Group: {}\n\n🎓 Course: {}\n📝 {}\n\nJoin us on EduConnect! #StudyGroup #{}",
        group_name,
        course,
        description,
        hashtag(course)
    )
}

fn circle_invite_text(circle_name: &str, topic: &str, description: &str) -> String {
    format!(
        "🌟 Join our Circle: {}\n\n🎯 Topic: {}\n✨ {}\n\nConnect with like-minded people on EduConnect! #Circle #{}",
        circle_name,
        topic,
        description,
        hashtag(topic)
    )
}

fn help_request_text(subject: &str, description: &str, urgency: &str) -> String {
    let urgency_emoji = match urgency {
        "high" => "🚨",
        "medium" => "⚡",
        _ => "💡",
    };
    format!(
        "{} Need Help: {}\n\n{}\n\nCan anyone help? Reply or find me on EduConnect! #StudyHelp #{}",
        urgency_emoji,
        subject,
        description,
        hashtag(subject)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashtag_strips_whitespace() {
        assert_eq!(hashtag("Computer Science"), "ComputerScience");
        assert_eq!(hashtag("  Math  "), "Math");
    }

    #[test]
    fn study_group_template() {
        let text = study_group_announcement_text("Calc Crew", "Linear Algebra", "Weekly sessions");
        assert!(text.starts_with("📚 New Study Group: Calc Crew"));
        assert!(text.contains("🎓 Course: Linear Algebra"));
        assert!(text.ends_with("#StudyGroup #LinearAlgebra"));
    }

    #[test]
    fn circle_template() {
        let text = circle_invite_text("Night Owls", "Late Study", "We meet after midnight");
        assert!(text.contains("🎯 Topic: Late Study"));
        assert!(text.ends_with("#Circle #LateStudy"));
    }

    #[test]
    fn help_request_template_picks_urgency_emoji() {
        assert!(help_request_text("Calculus", "stuck", "high").starts_with("🚨"));
        assert!(help_request_text("Calculus", "stuck", "medium").starts_with("⚡"));
        assert!(help_request_text("Calculus", "stuck", "low").starts_with("💡"));
    }

    #[test]
    fn verified_follows_verifications() {
        let user = FarcasterUser {
            fid: 1,
            username: "alice".into(),
            display_name: "Alice".into(),
            pfp_url: None,
            bio: None,
            follower_count: 0,
            following_count: 0,
            verifications: vec!["0xabc".into()],
        };
        assert!(user.verified());
    }
}
