//! Paging parameters shared by list endpoints

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 200;

/// `from` is the id to start after, `count` the page size
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
pub struct Pagination {
    pub from: Option<i32>,
    pub count: Option<i64>,
}

impl Pagination {
    pub fn new(from: Option<i32>, count: Option<i64>) -> Self {
        Self { from, count }
    }

    pub fn offset_id(&self) -> i32 {
        self.from.unwrap_or(0)
    }

    pub fn limit(&self) -> i64 {
        match self.count {
            Some(count) if count > 0 => count.min(MAX_PAGE_SIZE),
            _ => DEFAULT_PAGE_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limits_are_clamped() {
        assert_eq!(Pagination::default().limit(), DEFAULT_PAGE_SIZE);
        assert_eq!(Pagination::new(None, Some(5)).limit(), 5);
        assert_eq!(Pagination::new(None, Some(-3)).limit(), DEFAULT_PAGE_SIZE);
        assert_eq!(Pagination::new(None, Some(10_000)).limit(), MAX_PAGE_SIZE);
        assert_eq!(Pagination::new(Some(40), None).offset_id(), 40);
    }
}
