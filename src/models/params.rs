use serde::Deserialize;

/// Hard ceiling on page size, regardless of what the client asks for.
pub const MAX_PAGE_SIZE: i64 = 50;

pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// 1-indexed offset pagination, clamped on read so no handler can be talked
/// into an unbounded result set or a negative offset.
#[derive(Debug, Deserialize, Default)]
pub struct PageParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageParams {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.limit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_first_page() {
        let p = PageParams::default();
        assert_eq!(p.page(), 1);
        assert_eq!(p.limit(), DEFAULT_PAGE_SIZE);
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn clamps_limit_to_maximum() {
        let p = PageParams {
            page: Some(2),
            limit: Some(10_000),
        };
        assert_eq!(p.limit(), MAX_PAGE_SIZE);
        assert_eq!(p.offset(), MAX_PAGE_SIZE);
    }

    #[test]
    fn clamps_page_and_limit_to_minimum() {
        let p = PageParams {
            page: Some(-3),
            limit: Some(0),
        };
        assert_eq!(p.page(), 1);
        assert_eq!(p.limit(), 1);
        assert_eq!(p.offset(), 0);
    }
}
