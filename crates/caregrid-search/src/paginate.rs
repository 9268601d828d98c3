//! Deterministic slicing of a ranked candidate sequence into pages.

/// One page plus the totals computed over the full sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub total_pages: usize,
}

/// Slice `ordered` into the requested page.
///
/// `total` counts the whole sequence, not the page. `total_pages` is at least
/// 1 even for an empty sequence. A page beyond the end returns empty items
/// with accurate totals — out-of-range pages mean "no more results", not an
/// error.
#[must_use]
pub fn slice<T>(ordered: Vec<T>, page: u32, page_size: u32) -> Page<T> {
    let total = ordered.len();
    let size = page_size as usize;
    let total_pages = total.div_ceil(size).max(1);

    let offset = (page as usize - 1).saturating_mul(size);
    let items = if offset >= total {
        Vec::new()
    } else {
        ordered
            .into_iter()
            .skip(offset)
            .take(size)
            .collect()
    };

    Page {
        items,
        total,
        total_pages,
    }
}
