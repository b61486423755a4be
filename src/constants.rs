/// Width of one encoded record, in bytes.
pub const RECORD_SIZE: usize = 8;

pub const DEFAULT_WORKERS: usize = 1;
pub const DEFAULT_SEGMENT_SIZE: u64 = 64 * 1024;
pub const DEFAULT_CHUNK_SIZE: u64 = 1024;
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Number of generated values mirrored into the text sidecar.
pub const SIDECAR_PREVIEW_LEN: u64 = 100;

pub const MIB: u64 = 1024 * 1024;
