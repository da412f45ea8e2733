/// Longest accepted vehicle id.
pub const MAX_RESOURCE_ID_LEN: usize = 64;

/// Longest accepted client id.
pub const MAX_CLIENT_ID_LEN: usize = 128;

/// Widest booking a single record may span (in nights).
pub const MAX_RANGE_NIGHTS: i64 = 366;

/// Records held per vehicle before the store refuses new ones.
pub const MAX_RECORDS_PER_RESOURCE: usize = 10_000;

/// Daily price applied when nothing else resolves one.
pub const DEFAULT_FALLBACK_PRICE: crate::model::Money = 50;
