use rayon::prelude::*;
use thiserror::Error;

/// Number of elements above which [`ExecutionStrategy::Auto`] goes parallel.
pub const AUTO_PARALLEL_THRESHOLD: usize = 100_000;

/// Errors that can occur during parallel execution.
#[derive(Error, Debug, PartialEq)]
pub enum ParallelError {
    /// The thread pool failed to build.
    #[error("failed to build thread pool: {0}")]
    BuildError(String),

    /// The requested thread count is invalid.
    #[error("thread count must be > 0, got {0}")]
    InvalidThreadCount(usize),
}

/// Controls how the lines of a volume are distributed over threads.
///
/// Lines of one axis pass are independent, so every strategy produces the
/// same result bit for bit; only the wall time changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionStrategy {
    /// Serial for small volumes, the global Rayon pool above
    /// [`AUTO_PARALLEL_THRESHOLD`] elements.
    #[default]
    Auto,

    /// Run sequentially on the current thread.
    Serial,

    /// Use the global Rayon thread pool.
    Parallel,

    /// Run on a local thread pool with `n` threads.
    ///
    /// # Warning
    /// Creates a new thread pool on every call, which has significant overhead.
    /// Use this primarily for benchmarking or specific isolation needs.
    Fixed(usize),
}

impl ExecutionStrategy {
    /// Whether an amount of `work` elements is processed in parallel.
    pub fn is_parallel(&self, work: usize) -> bool {
        match self {
            ExecutionStrategy::Auto => work >= AUTO_PARALLEL_THRESHOLD,
            ExecutionStrategy::Serial => false,
            ExecutionStrategy::Parallel | ExecutionStrategy::Fixed(_) => true,
        }
    }
}

/// Apply `op` to every `chunk_len` chunk of `data`, with the chunk index.
///
/// The chunks are disjoint, so `op` may run concurrently on different chunks
/// without synchronisation. The first error returned by `op` aborts the
/// remaining work and is propagated.
///
/// # Arguments
///
/// * `strategy` - The execution strategy.
/// * `data` - The buffer to split; a trailing partial chunk is passed as is.
/// * `chunk_len` - The length of every chunk.
/// * `op` - The operation to perform on each `(index, chunk)` pair.
pub fn try_for_each_chunk<T, E, F>(
    strategy: ExecutionStrategy,
    data: &mut [T],
    chunk_len: usize,
    op: F,
) -> Result<(), E>
where
    T: Send,
    E: Send + From<ParallelError>,
    F: Fn(usize, &mut [T]) -> Result<(), E> + Sync + Send,
{
    try_for_each_chunk_init(strategy, data, chunk_len, || (), |_, i, chunk| op(i, chunk))
}

/// Like [`try_for_each_chunk`], with a per-worker state built by `init`.
///
/// The state is created once per rayon job rather than once per chunk, so it
/// can hold scratch buffers reused across chunks.
pub fn try_for_each_chunk_init<T, S, E, I, F>(
    strategy: ExecutionStrategy,
    data: &mut [T],
    chunk_len: usize,
    init: I,
    op: F,
) -> Result<(), E>
where
    T: Send,
    E: Send + From<ParallelError>,
    I: Fn() -> S + Sync + Send,
    F: Fn(&mut S, usize, &mut [T]) -> Result<(), E> + Sync + Send,
{
    if chunk_len == 0 || data.is_empty() {
        return Ok(());
    }

    if !strategy.is_parallel(data.len()) {
        let mut state = init();
        return data
            .chunks_mut(chunk_len)
            .enumerate()
            .try_for_each(|(i, chunk)| op(&mut state, i, chunk));
    }

    match strategy {
        ExecutionStrategy::Fixed(n) => {
            if n == 0 {
                return Err(ParallelError::InvalidThreadCount(n).into());
            }
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .map_err(|e| ParallelError::BuildError(e.to_string()))?;

            pool.install(|| {
                data.par_chunks_mut(chunk_len)
                    .enumerate()
                    .try_for_each_init(&init, |state, (i, chunk)| op(state, i, chunk))
            })
        }
        _ => data
            .par_chunks_mut(chunk_len)
            .enumerate()
            .try_for_each_init(&init, |state, (i, chunk)| op(state, i, chunk)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill_with_index(strategy: ExecutionStrategy) -> Result<Vec<usize>, ParallelError> {
        let mut data = vec![0; 10];
        try_for_each_chunk(strategy, &mut data, 3, |i, chunk| {
            chunk.iter_mut().for_each(|x| *x = i);
            Ok::<(), ParallelError>(())
        })?;
        Ok(data)
    }

    #[test]
    fn test_strategies_agree() -> Result<(), ParallelError> {
        let expected = vec![0, 0, 0, 1, 1, 1, 2, 2, 2, 3];
        assert_eq!(fill_with_index(ExecutionStrategy::Serial)?, expected);
        assert_eq!(fill_with_index(ExecutionStrategy::Parallel)?, expected);
        assert_eq!(fill_with_index(ExecutionStrategy::Auto)?, expected);
        assert_eq!(fill_with_index(ExecutionStrategy::Fixed(2))?, expected);
        Ok(())
    }

    #[test]
    fn test_fixed_zero_threads() {
        assert_eq!(
            fill_with_index(ExecutionStrategy::Fixed(0)),
            Err(ParallelError::InvalidThreadCount(0))
        );
    }

    #[test]
    fn test_error_propagates() {
        let mut data = vec![0u8; 8];
        let res = try_for_each_chunk(ExecutionStrategy::Parallel, &mut data, 2, |i, _| {
            if i == 3 {
                return Err(ParallelError::BuildError("boom".into()));
            }
            Ok(())
        });
        assert_eq!(res, Err(ParallelError::BuildError("boom".into())));
    }

    #[test]
    fn test_auto_threshold() {
        assert!(!ExecutionStrategy::Auto.is_parallel(AUTO_PARALLEL_THRESHOLD - 1));
        assert!(ExecutionStrategy::Auto.is_parallel(AUTO_PARALLEL_THRESHOLD));
        assert!(!ExecutionStrategy::Serial.is_parallel(usize::MAX));
    }

    #[test]
    fn test_init_state_is_reused() -> Result<(), ParallelError> {
        use std::sync::atomic::{AtomicUsize, Ordering};

        for (strategy, max_inits) in [
            (ExecutionStrategy::Serial, 1),
            (ExecutionStrategy::Fixed(2), 100),
        ] {
            let inits = AtomicUsize::new(0);
            let mut data = vec![0usize; 1000];
            try_for_each_chunk_init(
                strategy,
                &mut data,
                10,
                || {
                    inits.fetch_add(1, Ordering::Relaxed);
                    Vec::<usize>::with_capacity(10)
                },
                |buffer, i, chunk| {
                    buffer.clear();
                    buffer.extend((0..chunk.len()).map(|j| i * 10 + j));
                    chunk.copy_from_slice(buffer);
                    Ok::<(), ParallelError>(())
                },
            )?;
            assert_eq!(data, (0..1000).collect::<Vec<_>>());
            assert!(inits.load(Ordering::Relaxed) <= max_inits);
        }
        Ok(())
    }

    #[test]
    fn test_empty_is_noop() -> Result<(), ParallelError> {
        let mut data: Vec<u8> = vec![];
        try_for_each_chunk(ExecutionStrategy::Parallel, &mut data, 4, |_, _| {
            Err(ParallelError::InvalidThreadCount(1))
        })?;
        Ok(())
    }
}
