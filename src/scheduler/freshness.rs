//! Decides which entries of a fetched batch are new for a feed.
//!
//! Feeds are unreliable about both identifiers and timestamps, so an entry
//! has to pass two checks against the cursor: its identifier must differ
//! from the cursor's (the duplicate guard) and its timestamp must be strictly
//! newer (the ordering guard). Identifier match wins, so an entry whose
//! timestamp was bumped in place is not reposted.

use chrono::{DateTime, Utc};

use crate::{data::models::Cursor, util::parser::NormalizedEntry};

pub const DEFAULT_MAX_POSTS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    /// Entries to post, oldest first.
    pub posts: Vec<NormalizedEntry>,
    /// Cursor after every post is delivered. Equals the input when nothing is posted.
    pub cursor: Option<Cursor>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Fresh,
    /// Same identifier as the cursor; ignored regardless of timestamp.
    SameId,
    /// Not strictly newer than the cursor.
    NotNewer,
}

pub fn judge(cursor: &Cursor, timestamp: DateTime<Utc>, id: &str) -> Verdict {
    if cursor.id.as_deref() == Some(id) {
        Verdict::SameId
    } else if timestamp <= cursor.timestamp {
        Verdict::NotNewer
    } else {
        Verdict::Fresh
    }
}

impl NormalizedEntry {
    /// The cursor this entry would leave behind once posted.
    pub fn cursor(&self) -> Option<Cursor> {
        match (self.published, &self.id) {
            (Some(timestamp), Some(id)) => Some(Cursor::new(timestamp, id.clone())),
            _ => None,
        }
    }
}

pub fn evaluate(
    cursor: Option<&Cursor>,
    candidates: Vec<NormalizedEntry>,
    max_posts: usize,
) -> Evaluation {
    let mut eligible: Vec<(Cursor, NormalizedEntry)> = candidates
        .into_iter()
        .filter_map(|entry| entry.cursor().map(|mark| (mark, entry)))
        .collect();

    // stable: ties keep source order
    eligible.sort_by_key(|(mark, _)| mark.timestamp);

    let Some(cursor) = cursor else {
        return Evaluation {
            posts: Vec::new(),
            cursor: eligible.pop().map(|(mark, _)| mark),
        };
    };

    let mut fresh: Vec<(Cursor, NormalizedEntry)> = eligible
        .into_iter()
        .filter(|(mark, _)| {
            let id = mark.id.as_deref().unwrap_or_default();
            judge(cursor, mark.timestamp, id) == Verdict::Fresh
        })
        .collect();
    fresh.truncate(max_posts);

    let next = fresh
        .last()
        .map(|(mark, _)| mark.clone())
        .unwrap_or_else(|| cursor.clone());

    Evaluation {
        posts: fresh.into_iter().map(|(_, entry)| entry).collect(),
        cursor: Some(next),
    }
}
