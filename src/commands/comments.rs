//! Comment commands.

use jiff::tz::TimeZone;
use owo_colors::OwoColorize;
use serde_json::json;

use super::{App, print_json};
use crate::comments::{CommentSync, MenuAction};
use crate::error::{ReelError, Result};
use crate::identity::IdentityContext;
use crate::profile::Profiles;
use crate::types::{Comment, MovieId};

async fn load_thread(movie_id: MovieId) -> Result<(App, CommentSync)> {
    let app = App::load()?;
    let mut sync = CommentSync::new(app.data()?, movie_id);
    sync.refresh().await?;
    Ok((app, sync))
}

/// Open the action menu of `comment_id` or explain why it is not offered
fn open_menu(sync: &mut CommentSync, identity: &IdentityContext, comment_id: &str) -> Result<()> {
    identity.require_user()?;
    if sync.open_actions(comment_id, identity) {
        return Ok(());
    }
    if sync.comments().iter().any(|c| c.id == comment_id) {
        Err(ReelError::NotAuthor(comment_id.to_string()))
    } else {
        Err(ReelError::CommentNotFound(comment_id.to_string()))
    }
}

fn comment_line(comment: &Comment, identity: &IdentityContext) -> String {
    let when = comment
        .created_at
        .to_zoned(TimeZone::system())
        .strftime("%Y-%m-%d %H:%M")
        .to_string();
    let author = if identity.is_author(&comment.user_id) {
        format!("{} (you)", comment.author_display())
    } else {
        comment.author_display().to_string()
    };
    format!(
        "{} {} {}\n  {}",
        author.cyan(),
        when.dimmed(),
        format!("[{}]", comment.id).dimmed(),
        comment.body
    )
}

/// List the comments on a movie, newest first
pub async fn cmd_comments(movie_id: &str, output_json: bool) -> Result<()> {
    let (app, sync) = load_thread(MovieId::parse(movie_id)?).await?;
    let identity = app.identity().await?;

    if output_json {
        return print_json(&serde_json::to_value(sync.comments())?);
    }

    if sync.comments().is_empty() {
        println!("No comments yet.");
        return Ok(());
    }
    for comment in sync.comments() {
        println!("{}", comment_line(comment, &identity));
    }
    Ok(())
}

/// Post a comment as the signed-in user
pub async fn cmd_comment_add(movie_id: &str, body: &str, output_json: bool) -> Result<()> {
    let movie_id = MovieId::parse(movie_id)?;
    let app = App::load()?;
    let identity = app.identity().await?;
    let user_id = identity.require_user()?;
    let author_name = Profiles::new(app.data()?).author_name(user_id).await?;

    let mut sync = CommentSync::new(app.data()?, movie_id);
    let Some(comment) = sync.create(&identity, author_name, body).await? else {
        return Err(ReelError::Validation("comment cannot be empty".to_string()));
    };

    if output_json {
        return print_json(&serde_json::to_value(&comment)?);
    }
    println!("Posted comment {}", comment.id.cyan());
    Ok(())
}

/// Replace the body of one of the signed-in user's comments
pub async fn cmd_comment_edit(
    movie_id: &str,
    comment_id: &str,
    body: &str,
    output_json: bool,
) -> Result<()> {
    let (app, mut sync) = load_thread(MovieId::parse(movie_id)?).await?;
    let identity = app.identity().await?;

    open_menu(&mut sync, &identity, comment_id)?;
    sync.choose(&identity, MenuAction::Edit).await?;
    sync.set_draft(body);
    if !sync.submit(&identity, None).await? {
        return Err(ReelError::Validation("comment cannot be empty".to_string()));
    }

    if output_json {
        return print_json(&json!({
            "action": "comment_edit",
            "comment_id": comment_id,
            "success": true,
        }));
    }
    println!("Updated comment {}", comment_id.cyan());
    Ok(())
}

/// Delete one of the signed-in user's comments
pub async fn cmd_comment_delete(movie_id: &str, comment_id: &str, output_json: bool) -> Result<()> {
    let (app, mut sync) = load_thread(MovieId::parse(movie_id)?).await?;
    let identity = app.identity().await?;

    open_menu(&mut sync, &identity, comment_id)?;
    sync.choose(&identity, MenuAction::Delete).await?;

    if output_json {
        return print_json(&json!({
            "action": "comment_delete",
            "comment_id": comment_id,
            "success": true,
        }));
    }
    println!("Deleted comment {}", comment_id.cyan());
    Ok(())
}
