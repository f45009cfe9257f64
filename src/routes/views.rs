//! Template-facing view models. Stored text is already escaped, so the
//! templates emit `title` and `content` with `|safe`.

use crate::db::models::{Category, Comment, Post};
use crate::db::timestamp;
use crate::extractors::CurrentUser;
use crate::forum::likes::Vote;

pub struct PostCard {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub author: String,
    pub created: String,
    pub like_count: i64,
    pub dislike_count: i64,
    pub categories: Vec<String>,
    pub owned: bool,
    pub liked: bool,
    pub disliked: bool,
}

impl PostCard {
    pub fn new(post: Post, viewer: Option<&CurrentUser>, vote: Option<Vote>) -> Self {
        Self {
            owned: viewer.is_some_and(|u| u.id == post.user_id),
            created: timestamp::display(&post.created_at),
            liked: vote == Some(Vote::Like),
            disliked: vote == Some(Vote::Dislike),
            id: post.id,
            title: post.title,
            content: post.content,
            author: post.author,
            like_count: post.like_count,
            dislike_count: post.dislike_count,
            categories: post.categories,
        }
    }
}

pub struct CommentCard {
    pub id: i64,
    pub content: String,
    pub author: String,
    pub created: String,
    pub like_count: i64,
    pub dislike_count: i64,
    pub owned: bool,
    pub liked: bool,
    pub disliked: bool,
}

impl CommentCard {
    pub fn new(comment: Comment, viewer: Option<&CurrentUser>, vote: Option<Vote>) -> Self {
        Self {
            owned: viewer.is_some_and(|u| u.id == comment.user_id),
            created: timestamp::display(&comment.created_at),
            liked: vote == Some(Vote::Like),
            disliked: vote == Some(Vote::Dislike),
            id: comment.id,
            content: comment.content,
            author: comment.author,
            like_count: comment.like_count,
            dislike_count: comment.dislike_count,
        }
    }
}

pub struct CategoryOption {
    pub id: i64,
    pub name: String,
    pub selected: bool,
}

impl CategoryOption {
    pub fn list(categories: Vec<Category>, selected: &[i64]) -> Vec<Self> {
        categories
            .into_iter()
            .map(|c| Self {
                selected: selected.contains(&c.id),
                id: c.id,
                name: c.name,
            })
            .collect()
    }
}
