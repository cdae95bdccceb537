// Aligned pattern buffers shared by every overwrite pass

use crate::algorithms::Pattern;
use crate::error::{WipeError, WipeResult};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::alloc::{alloc, dealloc, Layout};
use std::ptr::NonNull;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

/// Alignment requirements for Direct I/O
pub const SECTOR_SIZE: usize = 512;
pub const PAGE_SIZE: usize = 4096;

/// Aligned, heap-allocated byte buffer
pub struct AlignedBuffer {
    ptr: NonNull<u8>,
    layout: Layout,
}

impl AlignedBuffer {
    /// Allocate a zeroed buffer of exactly `size` bytes
    pub fn new(size: usize, alignment: usize) -> WipeResult<Self> {
        if size == 0 {
            return Err(WipeError::Allocation("buffer size must be non-zero".into()));
        }

        // Ensure alignment is power of 2
        if !alignment.is_power_of_two() {
            return Err(WipeError::Allocation(format!(
                "alignment {} is not a power of 2",
                alignment
            )));
        }

        let layout = Layout::from_size_align(size, alignment)
            .map_err(|e| WipeError::Allocation(e.to_string()))?;

        let ptr = unsafe {
            let raw_ptr = alloc(layout);
            if raw_ptr.is_null() {
                return Err(WipeError::Allocation(format!(
                    "failed to allocate {} bytes",
                    size
                )));
            }
            std::ptr::write_bytes(raw_ptr, 0, size);
            NonNull::new_unchecked(raw_ptr)
        };

        Ok(Self { ptr, layout })
    }

    /// Create buffer aligned to page boundary (4KB)
    pub fn page_aligned(size: usize) -> WipeResult<Self> {
        Self::new(size, PAGE_SIZE)
    }

    /// Allocate and fill with a single byte
    pub fn filled(size: usize, byte: u8) -> WipeResult<Self> {
        let mut buffer = Self::page_aligned(size)?;
        buffer.fill_byte(byte);
        Ok(buffer)
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.layout.size()) }
    }

    pub fn as_slice(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.layout.size()) }
    }

    pub fn len(&self) -> usize {
        self.layout.size()
    }

    pub fn is_empty(&self) -> bool {
        self.layout.size() == 0
    }

    pub fn alignment(&self) -> usize {
        self.layout.align()
    }

    /// memset the whole buffer; compiles down to a vectorized store loop
    pub fn fill_byte(&mut self, byte: u8) {
        unsafe {
            std::ptr::write_bytes(self.ptr.as_ptr(), byte, self.layout.size());
        }
    }
}

impl Drop for AlignedBuffer {
    fn drop(&mut self) {
        unsafe {
            dealloc(self.ptr.as_ptr(), self.layout);
        }
    }
}

unsafe impl Send for AlignedBuffer {}
unsafe impl Sync for AlignedBuffer {}

impl std::fmt::Debug for AlignedBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlignedBuffer")
            .field("len", &self.len())
            .field("alignment", &self.alignment())
            .finish()
    }
}

/// Random pattern buffer owned by exactly one pass runner.
///
/// The generator is a time-seeded `StdRng`, not a cryptographic source.
pub struct RandomBuffer {
    buffer: AlignedBuffer,
    rng: StdRng,
    stream: u64,
    generated: u64,
}

impl RandomBuffer {
    /// Refill the whole buffer with fresh bytes
    pub fn regenerate(&mut self) {
        let len = self.buffer.len();
        self.regenerate_prefix(len);
    }

    /// Refill only the first `len` bytes (capped at the buffer length) and
    /// return them. A pass over a target smaller than one chunk never needs
    /// more.
    pub fn regenerate_prefix(&mut self, len: usize) -> &[u8] {
        let len = len.min(self.buffer.len());
        self.rng.fill_bytes(&mut self.buffer.as_mut_slice()[..len]);
        self.generated += len as u64;
        &self.buffer.as_slice()[..len]
    }

    /// Total random bytes produced by this stream
    pub fn bytes_generated(&self) -> u64 {
        self.generated
    }

    pub fn as_slice(&self) -> &[u8] {
        self.buffer.as_slice()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn stream_id(&self) -> u64 {
        self.stream
    }

    pub fn into_buffer(self) -> AlignedBuffer {
        self.buffer
    }
}

/// Pattern buffers for one process run.
///
/// The four fixed patterns are filled once at [`init`](Self::init) and shared
/// read-only. Random bytes are never shared: every caller draws its own
/// [`RandomBuffer`] whose generator is derived from the process seed and a
/// per-stream counter.
pub struct PatternBufferPool {
    chunk_size: usize,
    fixed: RwLock<Option<[Arc<AlignedBuffer>; 4]>>,
    seed: u64,
    next_stream: AtomicU64,
}

impl PatternBufferPool {
    /// Allocate and fill all fixed buffers, seeding randomness from the clock
    pub fn init(chunk_size: usize) -> WipeResult<Self> {
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or_default();
        Self::init_with_seed(chunk_size, seed)
    }

    pub fn init_with_seed(chunk_size: usize, seed: u64) -> WipeResult<Self> {
        let fixed = [
            Arc::new(AlignedBuffer::filled(chunk_size, 0x00)?),
            Arc::new(AlignedBuffer::filled(chunk_size, 0xFF)?),
            Arc::new(AlignedBuffer::filled(chunk_size, 0xAA)?),
            Arc::new(AlignedBuffer::filled(chunk_size, 0x55)?),
        ];

        tracing::debug!(chunk_size, seed, "pattern buffer pool initialized");

        Ok(Self {
            chunk_size,
            fixed: RwLock::new(Some(fixed)),
            seed,
            next_stream: AtomicU64::new(0),
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn is_initialized(&self) -> bool {
        self.fixed.read().map(|f| f.is_some()).unwrap_or(false)
    }

    /// Borrow the buffer for `pattern`.
    ///
    /// Fixed patterns return the shared buffer. `Pattern::Random` has no
    /// shared buffer, so it returns a freshly drawn and filled stream.
    pub fn acquire(&self, pattern: Pattern) -> WipeResult<Arc<AlignedBuffer>> {
        match pattern.slot() {
            Some(slot) => {
                let fixed = self.fixed.read().map_err(|_| WipeError::PoolNotInitialized)?;
                fixed
                    .as_ref()
                    .map(|buffers| Arc::clone(&buffers[slot]))
                    .ok_or(WipeError::PoolNotInitialized)
            }
            None => {
                let mut random = self.random_stream()?;
                random.regenerate();
                Ok(Arc::new(random.into_buffer()))
            }
        }
    }

    /// Draw a new chunk-sized random buffer with its own generator.
    ///
    /// The buffer is not filled yet; call [`RandomBuffer::regenerate`] or
    /// [`RandomBuffer::regenerate_prefix`] before use.
    pub fn random_stream(&self) -> WipeResult<RandomBuffer> {
        self.random_stream_sized(self.chunk_size)
    }

    /// Like [`random_stream`](Self::random_stream) but allocates only
    /// `len` bytes, clamped to `1..=chunk_size`
    pub fn random_stream_sized(&self, len: usize) -> WipeResult<RandomBuffer> {
        if !self.is_initialized() {
            return Err(WipeError::PoolNotInitialized);
        }

        let stream = self.next_stream.fetch_add(1, Ordering::Relaxed);
        let rng = StdRng::seed_from_u64(self.seed ^ stream.wrapping_mul(0x9E37_79B9_7F4A_7C15));
        Ok(RandomBuffer {
            buffer: AlignedBuffer::page_aligned(len.clamp(1, self.chunk_size))?,
            rng,
            stream,
            generated: 0,
        })
    }

    /// Release the fixed buffers. Buffers already handed out stay valid until
    /// their holders drop them; further `acquire` calls fail.
    pub fn teardown(&self) {
        if let Ok(mut fixed) = self.fixed.write() {
            if fixed.take().is_some() {
                tracing::debug!("pattern buffer pool torn down");
            }
        }
    }
}

impl std::fmt::Debug for PatternBufferPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatternBufferPool")
            .field("chunk_size", &self.chunk_size)
            .field("initialized", &self.is_initialized())
            .finish()
    }
}
