//! Merged Bookmarked Collection
//!
//! Presents several independently sorted, independently paged sources as
//! one sequence ordered by `(sort_value, source_rank, id)`. Each page is a
//! k-way merge: every source keeps its own cursor and buffer, the smallest
//! head is popped until the page is full, and a source's buffer is refilled
//! in sub-batches whenever it runs dry mid-merge.
//!
//! Pages are addressed by bookmark, never by offset. A bookmark carries the
//! last record's position, so resuming is a pure function of the token and
//! the current data: no session state is kept between calls.

use crate::bookmark::{Bookmark, BookmarkCodec, CollectionIdentity};
use crate::config::CollectionConfig;
use crate::error::CollatorError;
use crate::source::{RecordSource, SourceRecord};
use crate::types::{Context, RecordId, SortKey, SortValue, SourcePosition};
use std::cmp::Ordering;
use std::collections::VecDeque;
use tracing::{debug, instrument, trace};

/// One page of merged records
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    records: Vec<SourceRecord>,
    next_page: Option<String>,
}

impl Page {
    pub fn records(&self) -> &[SourceRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<SourceRecord> {
        self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SourceRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn first(&self) -> Option<&SourceRecord> {
        self.records.first()
    }

    /// Bookmark token for the following page, if any
    pub fn next_page(&self) -> Option<&str> {
        self.next_page.as_deref()
    }
}

impl IntoIterator for Page {
    type Item = SourceRecord;
    type IntoIter = std::vec::IntoIter<SourceRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

/// Per-source merge state for one `paginate` call
struct SourceCursor<'a> {
    source: &'a dyn RecordSource,
    rank: usize,
    buffer: VecDeque<(SortValue, SourceRecord)>,
    resume: Option<SourcePosition>,
    include: bool,
    exhausted: bool,
}

impl<'a> SourceCursor<'a> {
    /// Translate the global bookmark into this source's resume position.
    ///
    /// A bookmark at `(v, rank_b, id_b)` means everything with a smaller
    /// merge key has been seen. Sources ranked before `rank_b` resume strictly
    /// after value `v`; sources ranked after it resume at value `v` inclusive.
    fn start(source: &'a dyn RecordSource, rank: usize, bookmark: Option<(&Bookmark, usize)>) -> Self {
        let (resume, include) = match bookmark {
            None => (None, false),
            Some((bookmark, bookmark_rank)) => match rank.cmp(&bookmark_rank) {
                Ordering::Equal => (Some(bookmark.position()), false),
                Ordering::Less => (
                    Some(SourcePosition::new(bookmark.value.clone(), RecordId::MAX)),
                    false,
                ),
                Ordering::Greater => (Some(SourcePosition::new(bookmark.value.clone(), 0)), true),
            },
        };
        Self {
            source,
            rank,
            buffer: VecDeque::new(),
            resume,
            include,
            exhausted: false,
        }
    }

    fn refill(&mut self, batch: usize) -> Result<(), CollatorError> {
        if !self.buffer.is_empty() || self.exhausted {
            return Ok(());
        }
        // Take the whole remainder in one read; the cursor is then exhausted
        let batch = if self.source.loads_whole_scope() {
            usize::MAX
        } else {
            batch
        };
        let records = self
            .source
            .fetch_page(self.resume.as_ref(), batch, self.include)?;
        trace!(
            source = %self.source.tag(),
            fetched = records.len(),
            batch,
            "Refilled source buffer"
        );
        if records.len() < batch {
            self.exhausted = true;
        }

        let source = self.source;
        if let Some(last) = records.last() {
            self.resume = Some(SourcePosition::new(
                source.sort_value(last),
                source.record_id(last),
            ));
            self.include = false;
        }
        self.buffer
            .extend(records.into_iter().map(|r| (source.sort_value(&r), r)));
        Ok(())
    }

    fn peek_key(&self) -> Option<(&SortValue, usize, RecordId)> {
        self.buffer
            .front()
            .map(|(value, record)| (value, self.rank, self.source.record_id(record)))
    }
}

/// Refill every cursor, then pick the one holding the smallest head
fn smallest_head(
    cursors: &mut [SourceCursor<'_>],
    batch: usize,
) -> Result<Option<usize>, CollatorError> {
    for cursor in cursors.iter_mut() {
        cursor.refill(batch)?;
    }
    Ok(cursors
        .iter()
        .enumerate()
        .filter_map(|(index, cursor)| cursor.peek_key().map(|key| (key, index)))
        .min_by(|(a, _), (b, _)| a.cmp(b))
        .map(|(_, index)| index))
}

/// A bookmark-paginated union of record sources
pub struct MergedCollection {
    identity: CollectionIdentity,
    sources: Vec<Box<dyn RecordSource>>,
    codec: BookmarkCodec,
    batch_size: usize,
    max_per_page: usize,
}

impl MergedCollection {
    /// Sources are ranked by their tag, so precedence on equal sort values
    /// does not depend on argument order.
    pub fn new(
        context: Context,
        sort_key: SortKey,
        mut sources: Vec<Box<dyn RecordSource>>,
        codec: BookmarkCodec,
        options: &CollectionConfig,
    ) -> Result<Self, CollatorError> {
        context.validate()?;
        if sources.is_empty() {
            return Err(CollatorError::InvalidArgument(
                "a merged collection needs at least one source".to_string(),
            ));
        }
        if let Some(source) = sources.iter().find(|s| s.sort_key() != sort_key) {
            return Err(CollatorError::InvalidArgument(format!(
                "source '{}' is sorted by '{}', collection by '{}'",
                source.tag(),
                source.sort_key(),
                sort_key
            )));
        }
        sources.sort_by_key(|s| s.tag());
        if sources.windows(2).any(|pair| pair[0].tag() == pair[1].tag()) {
            return Err(CollatorError::InvalidArgument(
                "duplicate source in merged collection".to_string(),
            ));
        }
        if options.batch_size == 0 || options.max_per_page == 0 {
            return Err(CollatorError::InvalidArgument(
                "batch_size and max_per_page must be positive".to_string(),
            ));
        }

        let identity = CollectionIdentity::new(
            context,
            sort_key,
            sources.iter().map(|s| s.tag()).collect(),
        );
        Ok(Self {
            identity,
            sources,
            codec,
            batch_size: options.batch_size,
            max_per_page: options.max_per_page,
        })
    }

    pub fn identity(&self) -> &CollectionIdentity {
        &self.identity
    }

    pub fn sort_key(&self) -> SortKey {
        self.identity.sort_key
    }

    /// Fetch the page following `page` (the first page when `None`).
    ///
    /// `per_page` above the configured maximum is clamped.
    #[instrument(skip(self, page), fields(context = %self.identity.context, sort = %self.identity.sort_key))]
    pub fn paginate(&self, page: Option<&str>, per_page: usize) -> Result<Page, CollatorError> {
        if per_page == 0 {
            return Err(CollatorError::InvalidArgument(
                "per_page must be positive".to_string(),
            ));
        }
        let per_page = if per_page > self.max_per_page {
            debug!(requested = per_page, max = self.max_per_page, "Clamped page size");
            self.max_per_page
        } else {
            per_page
        };

        let bookmark = page
            .map(|token| self.codec.decode(&self.identity, token))
            .transpose()?;
        let bookmark_rank = match &bookmark {
            Some(b) => Some(self.rank_of(b)?),
            None => None,
        };
        let resume = bookmark.as_ref().zip(bookmark_rank);

        let mut cursors: Vec<SourceCursor<'_>> = self
            .sources
            .iter()
            .enumerate()
            .map(|(rank, source)| SourceCursor::start(source.as_ref(), rank, resume))
            .collect();

        // One extra row per source lets the final refill answer "is there more"
        let batch = per_page.saturating_add(1).min(self.batch_size);

        let mut records = Vec::with_capacity(per_page);
        let mut last: Option<Bookmark> = None;
        while records.len() < per_page {
            let Some(index) = smallest_head(&mut cursors, batch)? else {
                break;
            };
            let cursor = &mut cursors[index];
            if let Some((value, record)) = cursor.buffer.pop_front() {
                last = Some(Bookmark::new(cursor.source.tag(), value, record.id()));
                records.push(record);
            }
        }

        let has_more = records.len() == per_page && smallest_head(&mut cursors, batch)?.is_some();
        let next_page = match last {
            Some(last) if has_more => Some(self.codec.encode(&self.identity, &last)?),
            _ => None,
        };

        debug!(
            returned = records.len(),
            has_more,
            resumed = bookmark.is_some(),
            "Assembled page"
        );
        Ok(Page { records, next_page })
    }

    /// Iterate every page from the start
    pub fn pages(&self, per_page: usize) -> Pages<'_> {
        Pages {
            collection: self,
            per_page,
            next: None,
            done: false,
        }
    }

    fn rank_of(&self, bookmark: &Bookmark) -> Result<usize, CollatorError> {
        self.sources
            .iter()
            .position(|s| s.tag() == bookmark.source)
            .ok_or_else(|| {
                CollatorError::InvalidBookmark(format!("unknown source '{}'", bookmark.source))
            })
    }
}

/// Iterator over successive pages of a collection
pub struct Pages<'a> {
    collection: &'a MergedCollection,
    per_page: usize,
    next: Option<String>,
    done: bool,
}

impl Iterator for Pages<'_> {
    type Item = Result<Page, CollatorError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.collection.paginate(self.next.as_deref(), self.per_page) {
            Ok(page) => {
                self.next = page.next_page.clone();
                self.done = self.next.is_none();
                Some(Ok(page))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
