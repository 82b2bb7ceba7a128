//! crates/avatar_core/src/calculator.rs
//!
//! Derives the avatar points from a birth date and resolves their content.

use std::sync::Arc;
use tracing::warn;

use crate::content::ContentTable;
use crate::domain::{AvatarIndices, AvatarPoint, AvatarResult, ContentRecord, Gender};
use crate::numbers::{digit_sum, reduce_to_index_range};

pub const UNKNOWN_TITLE: &str = "Неизвестно";
pub const MISSING_DESCRIPTION: &str = "Описание отсутствует";
pub const MISSING_RECOMMENDATIONS: &str = "Рекомендации отсутствуют";

fn reduce(n: u32) -> u32 {
    // Inputs are sums of at most a handful of points, so the result fits back into u32.
    reduce_to_index_range(u64::from(n)) as u32
}

/// Derives every index from a birth date without touching content.
///
/// Returns `None` when the inputs are out of range. The check is deliberately
/// loose (31.02 passes); the date parser is responsible for calendar validity.
pub fn derive_indices(day: u32, month: u32, year: i32) -> Option<AvatarIndices> {
    if !(1..=31).contains(&day) || !(1..=12).contains(&month) || year == 0 {
        return None;
    }

    let a = reduce(day);
    let b = reduce(month);
    let v = reduce(digit_sum(u64::from(year.unsigned_abs())) as u32);
    let g = reduce(a + b + v);
    let d = reduce(a + b + v + g);
    let k = reduce(d + g);
    let l = reduce(d + v);
    let m = reduce(k + l);
    let n = reduce(k + m);
    let b2 = reduce(b + d);

    Some(AvatarIndices {
        a,
        b,
        v,
        g,
        d,
        k,
        l,
        m,
        n,
        b2,
    })
}

/// Calculates avatar results against a content table.
#[derive(Debug, Clone)]
pub struct AvatarCalculator {
    content: Arc<ContentTable>,
}

impl AvatarCalculator {
    pub fn new(content: Arc<ContentTable>) -> Self {
        Self { content }
    }

    /// Computes the indices and resolves their content for `gender`.
    ///
    /// The character point (A) is mandatory: without content for it the whole
    /// calculation fails. Missing content for any other point is replaced by
    /// placeholder text.
    pub fn calculate(&self, day: u32, month: u32, year: i32, gender: Gender) -> Option<AvatarResult> {
        let indices = derive_indices(day, month, year)?;

        let a = AvatarPoint {
            index: indices.a,
            content: self.content.content_for(indices.a, gender)?.clone(),
        };

        Some(AvatarResult {
            gender,
            indices,
            a,
            b: self.point_or_placeholder(indices.b, gender),
            v: self.point_or_placeholder(indices.v, gender),
            g: self.point_or_placeholder(indices.g, gender),
            d: self.point_or_placeholder(indices.d, gender),
        })
    }

    fn point_or_placeholder(&self, index: u32, gender: Gender) -> AvatarPoint {
        let content = match self.content.content_for(index, gender) {
            Some(record) => record.clone(),
            None => {
                warn!(index, %gender, "No content for avatar point, using placeholder");
                ContentRecord {
                    title: UNKNOWN_TITLE.to_string(),
                    image: None,
                    character: MISSING_DESCRIPTION.to_string(),
                    talents: MISSING_DESCRIPTION.to_string(),
                    money: MISSING_DESCRIPTION.to_string(),
                    lessons: MISSING_DESCRIPTION.to_string(),
                    recommendations: Vec::new(),
                }
            }
        };
        AvatarPoint { index, content }
    }
}
