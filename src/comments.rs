//! Comment thread for one movie.
//!
//! The local list mirrors the data service ordered by `created_at`, newest
//! first. Every mutation goes to the data service first and is applied
//! locally only once it succeeds. Edit and delete are offered to the author
//! of a comment only; the data service stays the final authority.

use std::sync::Arc;

use jiff::Timestamp;

use crate::error::{ReelError, Result};
use crate::identity::IdentityContext;
use crate::remote::DataClient;
use crate::types::{Comment, MovieId};
use crate::utils::generate_uuid;

/// What submitting the composer does
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ComposeMode {
    #[default]
    Create,
    Update {
        comment_id: String,
    },
}

/// Entries of a comment's action menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Edit,
    Delete,
    Cancel,
}

pub struct CommentSync {
    data: Arc<dyn DataClient>,
    movie_id: MovieId,
    comments: Vec<Comment>,
    draft: String,
    mode: ComposeMode,
    /// Comment whose action menu is open
    menu_target: Option<String>,
}

impl CommentSync {
    pub fn new(data: Arc<dyn DataClient>, movie_id: MovieId) -> Self {
        Self {
            data,
            movie_id,
            comments: Vec::new(),
            draft: String::new(),
            mode: ComposeMode::Create,
            menu_target: None,
        }
    }

    /// Build from a movie id received as navigation text
    pub fn for_route(data: Arc<dyn DataClient>, movie_id: &str) -> Result<Self> {
        Ok(Self::new(data, MovieId::parse(movie_id)?))
    }

    pub fn movie_id(&self) -> MovieId {
        self.movie_id
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    /// Replace the local list with the data service's.
    ///
    /// On failure the current list is kept.
    pub async fn refresh(&mut self) -> Result<&[Comment]> {
        self.comments = self.data.list_comments(self.movie_id).await?;
        tracing::debug!(movie_id = %self.movie_id, count = self.comments.len(), "comments loaded");
        Ok(&self.comments)
    }

    /// Post a new comment.
    ///
    /// Returns `None` without contacting the data service when the trimmed
    /// body is empty or nobody is signed in.
    pub async fn create(
        &mut self,
        identity: &IdentityContext,
        author_name: Option<String>,
        body: &str,
    ) -> Result<Option<Comment>> {
        let body = body.trim();
        let Some(user_id) = identity.user() else {
            return Ok(None);
        };
        if body.is_empty() {
            return Ok(None);
        }

        let comment = Comment {
            id: generate_uuid(),
            movie_id: self.movie_id,
            user_id: user_id.clone(),
            author_name,
            body: body.to_string(),
            created_at: Timestamp::now(),
        };
        self.data.insert_comment(&comment).await?;

        let position = self
            .comments
            .iter()
            .position(|c| c.created_at <= comment.created_at)
            .unwrap_or(self.comments.len());
        self.comments.insert(position, comment.clone());
        Ok(Some(comment))
    }

    /// Replace the body of one of the current user's comments.
    ///
    /// Returns `false` without contacting the data service when the trimmed
    /// body is empty.
    pub async fn update(
        &mut self,
        identity: &IdentityContext,
        comment_id: &str,
        body: &str,
    ) -> Result<bool> {
        let index = self.authored_index(identity, comment_id)?;
        let body = body.trim();
        if body.is_empty() {
            return Ok(false);
        }

        self.data.update_comment(comment_id, body).await?;
        self.comments[index].body = body.to_string();
        Ok(true)
    }

    /// Delete one of the current user's comments
    pub async fn delete(&mut self, identity: &IdentityContext, comment_id: &str) -> Result<()> {
        self.authored_index(identity, comment_id)?;
        self.data.delete_comment(comment_id).await?;
        self.comments.retain(|c| c.id != comment_id);
        Ok(())
    }

    /// Position of `comment_id` if the signed-in user wrote it
    fn authored_index(&self, identity: &IdentityContext, comment_id: &str) -> Result<usize> {
        let user_id = identity.require_user()?;
        let index = self
            .comments
            .iter()
            .position(|c| c.id == comment_id)
            .ok_or_else(|| ReelError::CommentNotFound(comment_id.to_string()))?;
        if &self.comments[index].user_id != user_id {
            return Err(ReelError::NotAuthor(comment_id.to_string()));
        }
        Ok(index)
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, text: &str) {
        self.draft = text.to_string();
    }

    pub fn mode(&self) -> &ComposeMode {
        &self.mode
    }

    pub fn menu_target(&self) -> Option<&str> {
        self.menu_target.as_deref()
    }

    /// Open the action menu of a comment. Only its author gets one.
    pub fn open_actions(&mut self, comment_id: &str, identity: &IdentityContext) -> bool {
        let authored = self
            .comments
            .iter()
            .any(|c| c.id == comment_id && identity.is_author(&c.user_id));
        self.menu_target = authored.then(|| comment_id.to_string());
        authored
    }

    /// Apply a choice from the open action menu
    pub async fn choose(&mut self, identity: &IdentityContext, action: MenuAction) -> Result<()> {
        let Some(target) = self.menu_target.take() else {
            return Ok(());
        };

        match action {
            MenuAction::Edit => {
                let index = self.authored_index(identity, &target)?;
                self.draft = self.comments[index].body.clone();
                self.mode = ComposeMode::Update { comment_id: target };
            }
            MenuAction::Delete => {
                if let Err(e) = self.delete(identity, &target).await {
                    self.menu_target = Some(target);
                    return Err(e);
                }
            }
            MenuAction::Cancel => {}
        }
        Ok(())
    }

    /// Leave edit mode and discard the draft
    pub fn cancel_edit(&mut self) {
        self.draft.clear();
        self.mode = ComposeMode::Create;
    }

    /// Submit the draft as a new comment or as an edit, depending on mode.
    ///
    /// The draft is cleared only when something was written.
    pub async fn submit(
        &mut self,
        identity: &IdentityContext,
        author_name: Option<String>,
    ) -> Result<bool> {
        let draft = self.draft.clone();
        let written = match self.mode.clone() {
            ComposeMode::Create => self.create(identity, author_name, &draft).await?.is_some(),
            ComposeMode::Update { comment_id } => {
                let updated = self.update(identity, &comment_id, &draft).await?;
                if updated {
                    self.mode = ComposeMode::Create;
                }
                updated
            }
        };

        if written {
            self.draft.clear();
        }
        Ok(written)
    }
}
