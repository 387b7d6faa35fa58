//! Community feed rules: who may change what, like toggling, and the
//! client-side filters for the feed and the side-job board.

use crate::models::{Comment, CommunityPost, Job, User};

/// Owners and admins may edit or delete.
pub fn can_modify(requester: &User, owner_id: &str) -> bool {
    requester.is_admin() || requester.id == owner_id
}

impl CommunityPost {
    pub fn is_liked_by(&self, user_id: &str) -> bool {
        self.likes.iter().any(|id| id == user_id)
    }

    pub fn like_count(&self) -> usize {
        self.likes.len()
    }

    /// Flip `user_id`'s like and return the new state. Applying it twice
    /// restores the previous like set, matching the server's toggle.
    pub fn toggle_like(&mut self, user_id: &str) -> bool {
        if let Some(pos) = self.likes.iter().position(|id| id == user_id) {
            self.likes.remove(pos);
            false
        } else {
            self.likes.push(user_id.to_string());
            true
        }
    }

    pub fn can_modify(&self, requester: &User) -> bool {
        can_modify(requester, self.author.id())
    }

    pub fn comment(&self, comment_id: &str) -> Option<&Comment> {
        self.comments.iter().find(|c| c.id == comment_id)
    }

    /// Comment edits and deletes are limited to the comment author or an admin.
    pub fn can_modify_comment(&self, requester: &User, comment_id: &str) -> bool {
        self.comment(comment_id)
            .map(|c| can_modify(requester, c.author.id()))
            .unwrap_or(false)
    }

    /// Whether this post belongs under the feed filter `slug`.
    /// "all" matches everything; otherwise the category matches by name
    /// (case-insensitive) or by its slug form ("Savings Tips" -> "savings-tips").
    pub fn matches_category(&self, slug: &str) -> bool {
        let slug = slug.trim();
        if slug.eq_ignore_ascii_case("all") {
            return true;
        }
        let category = self.category.to_lowercase();
        let slug = slug.to_lowercase();
        category == slug || category.replacen(' ', "-", 1) == slug
    }
}

pub fn filter_by_category<'a>(posts: &'a [CommunityPost], slug: &str) -> Vec<&'a CommunityPost> {
    posts.iter().filter(|p| p.matches_category(slug)).collect()
}

/// Case-insensitive search over job title, description and tags.
pub fn search_jobs<'a>(jobs: &'a [Job], query: &str) -> Vec<&'a Job> {
    let query = query.trim().to_lowercase();
    jobs.iter()
        .filter(|job| {
            query.is_empty()
                || job.title.to_lowercase().contains(&query)
                || job.description.to_lowercase().contains(&query)
                || job.tags.iter().any(|t| t.to_lowercase().contains(&query))
        })
        .collect()
}
