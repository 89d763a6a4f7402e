//! Rolling rating aggregation for professionals.

use models::review;

use crate::errors::ServiceError;

/// Incremental mean: `(rating * total + score) / (total + 1)`.
///
/// The score is checked before anything is computed; callers must not write
/// when this fails.
pub fn apply_score(rating: f64, total_reviews: i32, score: i32) -> Result<(f64, i32), ServiceError> {
    review::validate_rating(score)?;
    let total = total_reviews.max(0);
    let next_total = total + 1;
    let next = (rating * f64::from(total) + f64::from(score)) / f64::from(next_total);
    Ok((next, next_total))
}
