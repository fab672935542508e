//! Bucket tables: fixed-width summaries of "bad sample" index sets.

use contracts::{AnalysisError, BucketTable, MergedBuckets};

/// Summarize `bad_indices` of a series of `series_length` samples into
/// `bucket_count` equal-width index windows.
///
/// The window width is `series_length / bucket_count` (floating point); indices past
/// the last full window land in the last bucket.
///
/// # Errors
/// `EmptyRange` when `series_length` or `bucket_count` is zero.
pub fn summarize<I>(
    series_length: usize,
    bad_indices: I,
    bucket_count: usize,
) -> Result<BucketTable, AnalysisError>
where
    I: IntoIterator<Item = usize>,
{
    if series_length == 0 {
        return Err(AnalysisError::empty_range("bucket table over an empty series"));
    }
    if bucket_count == 0 {
        return Err(AnalysisError::empty_range("bucket table with zero buckets"));
    }

    let slice_width = series_length as f64 / bucket_count as f64;
    let last = bucket_count - 1;

    let mut table = BucketTable::clear(bucket_count);
    for index in bad_indices {
        let bucket = ((index as f64 / slice_width) as usize).min(last);
        table.mark(bucket);
    }
    Ok(table)
}

/// OR-merge tables: a bucket is bad when it is bad in any input.
///
/// # Errors
/// - `EmptyRange` when no table is given
/// - `BucketWidthMismatch` when widths differ
pub fn merge<'a, I>(tables: I) -> Result<MergedBuckets, AnalysisError>
where
    I: IntoIterator<Item = &'a BucketTable>,
{
    let mut tables = tables.into_iter();
    let mut merged = tables
        .next()
        .cloned()
        .ok_or_else(|| AnalysisError::empty_range("no bucket tables to merge"))?;

    for table in tables {
        if table.width() != merged.width() {
            return Err(AnalysisError::BucketWidthMismatch {
                expected: merged.width(),
                actual: table.width(),
            });
        }
        for (bucket, bad) in table.flags().iter().enumerate() {
            if *bad {
                merged.mark(bucket);
            }
        }
    }

    Ok(MergedBuckets {
        fail_count: merged.bad_count(),
        table: merged,
    })
}
