pub mod buffer_pool;
pub mod metrics;
pub mod overwrite;
pub mod platform_specific;


// Re-exports
pub use buffer_pool::{AlignedBuffer, PatternBufferPool, RandomBuffer, PAGE_SIZE, SECTOR_SIZE};
pub use metrics::PassStats;
pub use overwrite::OverwritePass;
pub use platform_specific::{device_size, open_device, open_read_write, FileSink, WipeSink};
