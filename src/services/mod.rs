pub mod activity_service;
pub mod comment_service;
pub mod registration_service;
pub mod user_service;

/// 1-based page + size to SQL LIMIT/OFFSET, tolerating junk input.
pub(crate) fn page_window(page: i64, page_size: i64) -> (i64, i64) {
    let limit = page_size.max(1);
    let page = page.max(1);
    (limit, (page - 1) * limit)
}

pub(crate) fn total_pages(total: i64, page_size: i64) -> i64 {
    if total == 0 {
        return 0;
    }
    (total + page_size - 1) / page_size
}
