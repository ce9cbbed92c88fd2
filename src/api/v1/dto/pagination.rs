/*
 * Responsibility
 * - 一覧系 RPC 共通のページング要求とレスポンス
 * - page/size → limit/offset 変換と上限チェック
 */
use serde::{Deserialize, Serialize};

use crate::error::FieldViolation;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct PageRequest {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub size: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageMeta {
    pub page: u32,
    pub size: u32,
    pub total: i64,
}

#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub pagination: PageMeta,
}

impl PageRequest {
    /// Bounds a caller may not exceed.
    pub fn violations(&self) -> Vec<FieldViolation> {
        let mut violations = Vec::new();
        if self.size > MAX_PAGE_SIZE {
            violations.push(FieldViolation::new(
                "size",
                format!("must be at most {MAX_PAGE_SIZE}"),
            ));
        }
        violations
    }
}

/// `(limit, offset)` for a page request.
///
/// A zero size means `DEFAULT_PAGE_SIZE`. Pages are 1-based; page 0 clamps to offset 0.
/// The offset saturates instead of overflowing on huge pages.
pub fn calculate_limit_offset(req: &PageRequest) -> (i64, i64) {
    let size = if req.size == 0 {
        DEFAULT_PAGE_SIZE
    } else {
        req.size
    };
    let limit = i64::from(size);
    let offset = i64::from(req.page.saturating_sub(1)).saturating_mul(limit);

    (limit, offset)
}

impl PageMeta {
    pub fn new(req: &PageRequest, total: i64) -> Self {
        let (limit, _) = calculate_limit_offset(req);
        Self {
            page: req.page.max(1),
            size: limit as u32,
            total,
        }
    }
}
