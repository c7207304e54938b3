//! Bidirectional cursor paginator

use super::types::{Page, PaginationParams};
use crate::cursor::Cursor;
use crate::error::{Error, Result};
use crate::source::{Record, RecordSource};
use crate::types::{OrderKey, Ordering, MAX_OFFSET};

/// Cursor paginator
///
/// Pages through any [`RecordSource`] using the leading ordering key as the
/// pivot position. Sources without an ordering of their own are paged in
/// `default_ordering`.
#[derive(Debug, Clone)]
pub struct CursorPaginator {
    /// Ordering applied when the source has none
    pub default_ordering: Ordering,
}

impl Default for CursorPaginator {
    fn default() -> Self {
        Self {
            default_ordering: Ordering::new(vec![OrderKey::desc("created")]),
        }
    }
}

impl CursorPaginator {
    /// Create a paginator with the given fallback ordering
    pub fn new(default_ordering: Ordering) -> Self {
        Self { default_ordering }
    }

    /// Fetch the page selected by `params`
    ///
    /// Issues exactly one `count` and one `slice` against the source.
    /// Source errors are returned unchanged.
    pub async fn paginate<S: RecordSource>(
        &self,
        source: &S,
        params: &PaginationParams,
    ) -> Result<Page<S::Record>> {
        let limit = params.limit();
        let cursor = params.cursor();

        let order = match source.ordering().filter(|o| !o.is_empty()) {
            Some(ordering) => ordering.clone(),
            None => self.default_ordering.clone(),
        };
        let leading = order
            .leading()
            .cloned()
            .ok_or_else(|| Error::config("Pagination requires at least one ordering key"))?;

        let query = if cursor.reverse() {
            source.with_order(order.reversed())
        } else {
            source.with_order(order.clone())
        };

        let total_count = query.count().await?;

        // Continue past the pivot in whichever direction the query now runs
        let query = match cursor.position() {
            Some(position) if cursor.reverse() != leading.direction.is_descending() => {
                query.filter_lt(&leading.field, position)
            }
            Some(position) => query.filter_gt(&leading.field, position),
            None => query,
        };

        // One extra record tells us whether another page follows
        let mut results = query
            .slice(u64::from(cursor.offset()), u64::from(limit) + 1)
            .await?;

        let following_position = match results.get(limit as usize) {
            Some(record) => Some(record.position(&leading.field)?),
            None => None,
        };
        results.truncate(limit as usize);
        let mut page = results;

        let has_following_position = following_position.is_some();
        let has_position = cursor.position().is_some() || cursor.offset() > 0;

        let (has_next, has_previous, next_position, previous_position) = if cursor.reverse() {
            // The query ran backwards; restore logical order
            page.reverse();
            (
                has_position,
                has_following_position,
                cursor.position(),
                following_position.as_deref(),
            )
        } else {
            (
                has_following_position,
                has_position,
                following_position.as_deref(),
                cursor.position(),
            )
        };

        let positions = page
            .iter()
            .map(|record| record.position(&leading.field))
            .collect::<Result<Vec<_>>>()?;

        let links = LinkState {
            cursor,
            limit,
            has_next,
            has_previous,
            next_position,
            previous_position,
        };

        let next_cursor = if has_next {
            Some(links.next_cursor(&positions)?)
        } else {
            None
        };
        let previous_cursor = if has_previous {
            Some(links.previous_cursor(&positions)?)
        } else {
            None
        };

        tracing::debug!(
            limit,
            total_count,
            returned = page.len(),
            has_next,
            has_previous,
            "Computed page"
        );

        Ok(Page {
            results: page,
            total_count,
            has_next,
            has_previous,
            next_cursor,
            previous_cursor,
        })
    }
}

// ============================================================================
// Link Cursors
// ============================================================================

/// Everything the link computation needs besides the page itself
#[derive(Debug, Clone, Copy)]
pub(crate) struct LinkState<'a> {
    pub(crate) cursor: &'a Cursor,
    pub(crate) limit: u32,
    pub(crate) has_next: bool,
    pub(crate) has_previous: bool,
    pub(crate) next_position: Option<&'a str>,
    pub(crate) previous_position: Option<&'a str>,
}

/// Walk `positions` until one differs from the value before it.
///
/// Returns the differing position and how many positions were passed to
/// reach it, or `None` when the whole walk shares one value.
fn first_distinct<'p, I>(positions: I, seed: Option<&str>) -> Option<(u32, &'p str)>
where
    I: IntoIterator<Item = &'p String>,
{
    let mut compare = seed;
    for (offset, position) in positions.into_iter().enumerate() {
        if compare != Some(position.as_str()) {
            return Some((offset as u32, position.as_str()));
        }
        compare = Some(position.as_str());
    }
    None
}

impl<'a> LinkState<'a> {
    /// Cursor resuming immediately after the page
    pub(crate) fn next_cursor(&self, positions: &[String]) -> Result<Cursor> {
        // Reversing direction with an offset cursor: the last position on
        // the page may sit inside an offset-carried run, so it cannot be
        // trusted as a marker.
        let seed = match positions.last() {
            Some(last) if self.cursor.reverse() && self.cursor.offset() > 0 => Some(last.as_str()),
            _ => self.next_position,
        };

        let (offset, position) = if positions.is_empty() {
            (0, self.next_position)
        } else if let Some((offset, position)) = first_distinct(positions.iter().rev(), seed) {
            (offset, Some(position))
        } else if !self.has_previous {
            // First page and no unique position yet: resume by count alone
            (self.limit, None)
        } else if self.cursor.reverse() {
            // Changing direction inside a duplicate run skips a few records
            (0, self.previous_position)
        } else {
            (self.cursor.offset() + self.limit, self.previous_position)
        };

        build_cursor(offset, false, position)
    }

    /// Cursor resuming immediately before the page
    pub(crate) fn previous_cursor(&self, positions: &[String]) -> Result<Cursor> {
        let seed = match positions.first() {
            Some(first) if !self.cursor.reverse() && self.cursor.offset() > 0 => {
                Some(first.as_str())
            }
            _ => self.previous_position,
        };

        let (offset, position) = if positions.is_empty() {
            (0, self.previous_position)
        } else if let Some((offset, position)) = first_distinct(positions.iter(), seed) {
            (offset, Some(position))
        } else if !self.has_next {
            // Final page and no unique position yet
            (self.limit, None)
        } else if self.cursor.reverse() {
            (self.cursor.offset() + self.limit, self.next_position)
        } else {
            // Changing direction inside a duplicate run skips a few records
            (0, self.next_position)
        };

        build_cursor(offset, true, position)
    }
}

fn build_cursor(offset: u32, reverse: bool, position: Option<&str>) -> Result<Cursor> {
    if offset > MAX_OFFSET {
        return Err(Error::OffsetOverflow {
            offset,
            max: MAX_OFFSET,
        });
    }

    tracing::debug!(offset, reverse, position, "Built link cursor");
    Cursor::new(offset, reverse, position.map(String::from))
}
