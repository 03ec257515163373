//! Bookmark command handlers

use anyhow::{bail, Result};

use marksync_core::Bookmarks;

use crate::output::Output;

/// Bookmark an id
pub async fn add(bookmarks: &Bookmarks, id: String, output: &Output) -> Result<()> {
    let id = parse_id(id)?;
    let handle = bookmarks.add(id.as_str()).await?;
    output.print_write(&id, true, handle.outcome().await);
    Ok(())
}

/// Remove a bookmark
pub async fn remove(bookmarks: &Bookmarks, id: String, output: &Output) -> Result<()> {
    let id = parse_id(id)?;
    let outcome = bookmarks.remove(&id).await.outcome().await;
    output.print_write(&id, false, outcome);
    Ok(())
}

/// Flip an id's bookmark state
pub async fn toggle(bookmarks: &Bookmarks, id: String, output: &Output) -> Result<()> {
    let id = parse_id(id)?;
    let handle = bookmarks.toggle(&id).await?;
    let outcome = handle.outcome().await;
    output.print_write(&id, bookmarks.is_bookmarked(&id), outcome);
    Ok(())
}

pub fn check(bookmarks: &Bookmarks, id: &str, output: &Output) -> Result<()> {
    output.print_check(id, bookmarks.is_bookmarked(id));
    Ok(())
}

pub fn list(bookmarks: &Bookmarks, output: &Output) -> Result<()> {
    output.print_bookmarks(&bookmarks.bookmarks());
    Ok(())
}

/// Ids are opaque, but blank ones are always a typo
fn parse_id(id: String) -> Result<String> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        bail!("Bookmark id cannot be empty");
    }
    Ok(trimmed.to_string())
}
