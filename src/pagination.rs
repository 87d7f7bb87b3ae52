use serde::Deserialize;

use crate::shared::AppError;

pub const DEFAULT_PAGE_LIMIT: i64 = 20;
pub const MAX_PAGE_LIMIT: i64 = 100;

/// A validated offset/limit window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub offset: i64,
    pub limit: i64,
}

impl Page {
    /// Rejects negative values and clamps the limit to `MAX_PAGE_LIMIT`
    pub fn new(offset: i64, limit: i64) -> Result<Self, AppError> {
        if offset < 0 {
            return Err(AppError::Validation(format!(
                "offset must be non-negative, got {}",
                offset
            )));
        }
        if limit < 0 {
            return Err(AppError::Validation(format!(
                "limit must be non-negative, got {}",
                limit
            )));
        }

        Ok(Self {
            offset,
            limit: limit.min(MAX_PAGE_LIMIT),
        })
    }

    /// Applies the window to an already ordered iterator
    pub fn apply<T>(&self, items: impl Iterator<Item = T>) -> Vec<T> {
        items
            .skip(self.offset as usize)
            .take(self.limit as usize)
            .collect()
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

/// Query string form: `?offset=..&limit=..`
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

impl PageParams {
    pub fn into_page(self) -> Result<Page, AppError> {
        Page::new(
            self.offset.unwrap_or(0),
            self.limit.unwrap_or(DEFAULT_PAGE_LIMIT),
        )
    }
}
