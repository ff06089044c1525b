//! Community discussion board

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationErrors};
use crate::identity::{PostId, UserId};
use crate::user::UserSummary;

/// Public path prefix under which uploaded files are served
pub const UPLOADS_PREFIX: &str = "/uploads/";

/// A persisted discussion post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscussionPost {
    pub id: PostId,
    pub title: String,
    pub content: String,
    /// Either `/uploads/<file>` for an image uploaded with this post, an
    /// external URL, or empty
    pub image_url: String,
    pub author: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DiscussionPost {
    pub fn is_authored_by(&self, user: &UserId) -> bool {
        self.author == *user
    }

    /// Apply changes and return the replaced image URL, if any.
    pub fn apply(&mut self, changes: PostChanges, now: DateTime<Utc>) -> Option<String> {
        self.title = changes.title;
        self.content = changes.content;
        self.updated_at = now;
        match changes.image_url {
            Some(url) if url != self.image_url => {
                Some(std::mem::replace(&mut self.image_url, url))
            }
            _ => None,
        }
    }

    /// The stored `/uploads/<file>` path when the image was uploaded with
    /// this post
    pub fn uploaded_image(&self) -> Option<&str> {
        uploaded_file_name(&self.image_url).map(|_| self.image_url.as_str())
    }
}

/// File name part of a `/uploads/<file>` URL
pub fn uploaded_file_name(url: &str) -> Option<&str> {
    url.strip_prefix(UPLOADS_PREFIX)
        .filter(|name| !name.is_empty() && !name.contains('/'))
}

/// Whether a URL points into the upload directory, in any spelling the
/// file server would accept
pub fn references_uploads(url: &str) -> bool {
    url.trim()
        .replace('\\', "/")
        .trim_start_matches('/')
        .starts_with("uploads/")
}

/// A post together with its author
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostWithAuthor {
    pub post: DiscussionPost,
    pub author: UserSummary,
}

/// Validated input for a new post
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub image_url: String,
    pub author: UserId,
}

impl NewPost {
    pub fn into_post(self, id: PostId, now: DateTime<Utc>) -> DiscussionPost {
        DiscussionPost {
            id,
            title: self.title,
            content: self.content,
            image_url: self.image_url,
            author: self.author,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Validated update. Title and content are always replaced; the image URL
/// only when a file was uploaded or an `imageUrl` field was sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostChanges {
    pub title: String,
    pub content: String,
    pub image_url: Option<String>,
}

/// Untyped post fields from a request body
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostDraft {
    pub title: Option<String>,
    pub content: Option<String>,
    pub image_url: Option<String>,
}

impl PostDraft {
    /// Validate for creation. An uploaded image wins over a supplied URL;
    /// a supplied URL may not point at an existing upload.
    pub fn into_new_post(self, author: UserId, uploaded: Option<String>) -> Result<NewPost> {
        let Some((title, content)) = title_and_content(&self) else {
            return Err(single("Please add a title and content for the discussion post"));
        };
        let image_url = match uploaded {
            Some(url) => url,
            None => {
                let supplied = self.image_url.unwrap_or_default();
                if references_uploads(&supplied) {
                    return Err(single(FOREIGN_UPLOAD));
                }
                supplied
            }
        };
        Ok(NewPost {
            title,
            content,
            image_url,
            author,
        })
    }

    /// Validate for an update of a post whose image is `current_image`.
    /// A supplied URL into the upload directory is only accepted when it
    /// is the post's own image.
    pub fn into_changes(
        self,
        uploaded: Option<String>,
        current_image: &str,
    ) -> Result<PostChanges> {
        let Some((title, content)) = title_and_content(&self) else {
            return Err(single("Title and content cannot be empty."));
        };
        let image_url = match uploaded {
            Some(url) => Some(url),
            None => match self.image_url {
                Some(url) if references_uploads(&url) && url != current_image => {
                    return Err(single(FOREIGN_UPLOAD));
                }
                other => other,
            },
        };
        Ok(PostChanges {
            title,
            content,
            image_url,
        })
    }
}

const FOREIGN_UPLOAD: &str = "Image URL must be an external link; upload a file to attach an image";

fn title_and_content(draft: &PostDraft) -> Option<(String, String)> {
    let title = draft.title.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
    let content = draft.content.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
    Some((title.to_string(), content.to_string()))
}

fn single(message: &str) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.push(message);
    errors
}

/// Board statistics. Engagement counters are reported but not tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityStats {
    pub total_posts: u64,
    pub total_members: u64,
    pub active_discussions: u64,
    pub new_posts_this_week: u64,
    pub online_now: u64,
}

impl CommunityStats {
    pub fn new(total_posts: u64, total_members: u64) -> Self {
        Self {
            total_posts,
            total_members,
            active_discussions: 0,
            new_posts_this_week: 0,
            online_now: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(title: &str, content: &str) -> PostDraft {
        PostDraft {
            title: Some(title.to_string()),
            content: Some(content.to_string()),
            image_url: None,
        }
    }

    #[test]
    fn test_uploaded_image_takes_precedence() {
        let mut d = draft("Best maize variety?", "For the Rift Valley");
        d.image_url = Some("https://example.com/a.png".to_string());

        let post = d
            .clone()
            .into_new_post(UserId::new(), Some("/uploads/image-1.png".to_string()))
            .unwrap();
        assert_eq!(post.image_url, "/uploads/image-1.png");

        let post = d.into_new_post(UserId::new(), None).unwrap();
        assert_eq!(post.image_url, "https://example.com/a.png");
    }

    #[test]
    fn test_missing_title_or_content() {
        let err = draft("", "body").into_new_post(UserId::new(), None).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Please add a title and content for the discussion post"
        );

        let err = draft("title", "  ").into_changes(None, "").unwrap_err();
        assert_eq!(err.to_string(), "Title and content cannot be empty.");
    }

    #[test]
    fn test_image_untouched_without_upload_or_field() {
        let changes = draft("t", "c").into_changes(None, "").unwrap();
        assert_eq!(changes.image_url, None);

        let mut cleared = draft("t", "c");
        cleared.image_url = Some(String::new());
        assert_eq!(
            cleared.into_changes(None, "/uploads/image-1.png").unwrap().image_url,
            Some(String::new())
        );
    }

    #[test]
    fn test_apply_reports_replaced_image() {
        let now = Utc::now();
        let mut post = NewPost {
            title: "a".to_string(),
            content: "b".to_string(),
            image_url: "/uploads/image-1.png".to_string(),
            author: UserId::new(),
        }
        .into_post(PostId::new(), now);

        let replaced = post.apply(
            PostChanges {
                title: "a2".to_string(),
                content: "b2".to_string(),
                image_url: Some("/uploads/image-2.png".to_string()),
            },
            now,
        );
        assert_eq!(replaced.as_deref(), Some("/uploads/image-1.png"));
        assert_eq!(post.uploaded_image(), Some("/uploads/image-2.png"));

        let unchanged = post.apply(
            PostChanges {
                title: "a3".to_string(),
                content: "b3".to_string(),
                image_url: None,
            },
            now,
        );
        assert!(unchanged.is_none());
    }

    #[test]
    fn test_supplied_url_cannot_claim_an_upload() {
        for url in ["/uploads/plough-1.png", "uploads/plough-1.png", "\\uploads\\plough-1.png"] {
            let mut d = draft("t", "c");
            d.image_url = Some(url.to_string());
            assert!(d.clone().into_new_post(UserId::new(), None).is_err());
            assert!(d.into_changes(None, "/uploads/image-1.png").is_err());
        }

        let mut own = draft("t", "c");
        own.image_url = Some("/uploads/image-1.png".to_string());
        let changes = own.into_changes(None, "/uploads/image-1.png").unwrap();
        assert_eq!(changes.image_url.as_deref(), Some("/uploads/image-1.png"));

        let mut external = draft("t", "c");
        external.image_url = Some("https://cdn.example.com/uploads/x.png".to_string());
        assert!(external.into_new_post(UserId::new(), None).is_ok());
    }

    #[test]
    fn test_uploaded_file_name() {
        assert_eq!(uploaded_file_name("/uploads/x.png"), Some("x.png"));
        assert_eq!(uploaded_file_name("/uploads/../x.png"), None);
        assert_eq!(uploaded_file_name("https://cdn/x.png"), None);
    }

    #[test]
    fn test_stats_engagement_is_zero() {
        let json = serde_json::to_value(CommunityStats::new(3, 7)).unwrap();
        assert_eq!(json["totalPosts"], 3);
        assert_eq!(json["totalMembers"], 7);
        assert_eq!(json["activeDiscussions"], 0);
        assert_eq!(json["onlineNow"], 0);
    }
}
