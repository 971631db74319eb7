use std::marker::PhantomData;

use deriche_image::{PixelCast, Volume};

use crate::error::FilterError;
use crate::parallel::{try_for_each_chunk, try_for_each_chunk_init, ExecutionStrategy};
use crate::recursive::{RecursiveCoefficients, RecursiveGaussian, RecursiveKernel};
use crate::Real;

/// A filter applied to one line of samples at a time.
pub trait LineFilter<R>: Sync {
    /// Filter `input` into `output`.
    ///
    /// Both slices have the same length, possibly one.
    fn filter_line(&self, output: &mut [R], input: &[R]);
}

/// Apply a line filter to every line of a volume parallel to `axis`.
///
/// Lines are filtered into a line-major scratch buffer, with disjoint chunks
/// handed to the workers, then scattered back to the volume layout.
///
/// # Arguments
///
/// * `src` - The source volume, in the computation precision.
/// * `axis` - The axis the lines run along.
/// * `filter` - The line filter.
/// * `strategy` - The execution strategy.
///
/// # Returns
///
/// A new volume with the same shape and spacing as `src`.
///
/// # Errors
///
/// [`FilterError::InvalidDirection`] if `axis >= N`.
pub fn apply_line_filter<R, F, const N: usize>(
    src: &Volume<R, N>,
    axis: usize,
    filter: &F,
    strategy: ExecutionStrategy,
) -> Result<Volume<R, N>, FilterError>
where
    R: Real,
    F: LineFilter<R> + ?Sized,
{
    if axis >= N {
        return Err(FilterError::InvalidDirection {
            direction: axis,
            dimension: N,
        });
    }

    if src.is_empty() {
        return Ok(src.clone());
    }

    let shape = src.shape();
    let len = shape[axis];
    let inner = src.strides()[axis];
    let num_lines = src.num_lines(axis)?;

    log::trace!(
        "filtering {} lines of length {} along axis {} ({:?})",
        num_lines,
        len,
        axis,
        strategy
    );

    let mut scratch = vec![R::zero(); src.numel()];
    try_for_each_chunk_init(
        strategy,
        &mut scratch,
        len,
        || vec![R::zero(); len],
        |input: &mut Vec<R>, line, out| {
            src.read_line(axis, line, input)?;
            filter.filter_line(out, input);
            Ok::<(), FilterError>(())
        },
    )?;

    // every block of `len * inner` samples holds `inner` interleaved lines
    let block = len * inner;
    let mut data = vec![R::zero(); src.numel()];
    try_for_each_chunk(strategy, &mut data, block, |outer, dst| {
        let lines = &scratch[outer * block..(outer + 1) * block];
        for (i, row) in dst.chunks_mut(inner).enumerate() {
            for (j, v) in row.iter_mut().enumerate() {
                *v = lines[j * len + i];
            }
        }
        Ok::<(), FilterError>(())
    })?;

    Ok(Volume::new(shape, data)?.with_spacing(src.spacing())?)
}

/// Lifecycle of a [`RecursiveSeparableFilter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterState {
    /// No input volume has been set.
    Unconfigured,
    /// Input, direction and kernel are set; coefficients may be stale.
    Configured,
    /// Coefficients are computed for the current configuration.
    Ready,
    /// An output has been produced with the current coefficients.
    Applied,
}

#[derive(Debug, Clone)]
struct CoefficientCache<K> {
    direction: usize,
    spacing: f64,
    kernel: K,
    coefficients: RecursiveCoefficients<f64>,
}

/// Recursive filter along one direction of an N-dimensional volume.
///
/// The coefficients are computed by [`Self::set_up`] from the kernel and the
/// spacing of the filtered axis, and reused until the direction, the kernel
/// or the spacing changes. The pixel type `T` is converted to the
/// computation precision `R` for filtering and back for the output.
///
/// # Examples
///
/// ```rust
/// use deriche_image::Volume;
/// use deriche_imgproc::filter::{FilterState, RecursiveSeparableFilter};
/// use deriche_imgproc::recursive::{GaussianOrder, RecursiveGaussian};
///
/// let ramp = Volume::<f64, 2>::from_shape_fn([4, 32], |[_, x]| x as f64);
///
/// let kernel = RecursiveGaussian::new(2.0).with_order(GaussianOrder::First);
/// let mut filter = RecursiveSeparableFilter::new(kernel);
/// filter.set_input_image(&ramp);
/// filter.set_direction(1);
///
/// let gradient = filter.generate_data().unwrap();
/// assert_eq!(filter.state(), FilterState::Applied);
/// assert!((gradient.get([2, 16]).unwrap() - 1.0).abs() < 1e-3);
/// ```
#[derive(Debug, Clone)]
pub struct RecursiveSeparableFilter<'a, T, const N: usize, K = RecursiveGaussian, R = f64> {
    input: Option<&'a Volume<T, N>>,
    direction: usize,
    kernel: K,
    strategy: ExecutionStrategy,
    cache: Option<CoefficientCache<K>>,
    state: FilterState,
    precision: PhantomData<R>,
}

impl<'a, T, const N: usize, K: RecursiveKernel> RecursiveSeparableFilter<'a, T, N, K, f64> {
    /// Create a filter along direction 0, computing in `f64`.
    pub fn new(kernel: K) -> Self {
        Self {
            input: None,
            direction: 0,
            kernel,
            strategy: ExecutionStrategy::default(),
            cache: None,
            state: FilterState::Unconfigured,
            precision: PhantomData,
        }
    }
}

impl<'a, T, const N: usize, K: RecursiveKernel, R> RecursiveSeparableFilter<'a, T, N, K, R> {
    /// Compute in another floating point precision.
    pub fn with_precision<R2: Real>(self) -> RecursiveSeparableFilter<'a, T, N, K, R2> {
        RecursiveSeparableFilter {
            input: self.input,
            direction: self.direction,
            kernel: self.kernel,
            strategy: self.strategy,
            cache: self.cache,
            state: self.state,
            precision: PhantomData,
        }
    }

    fn invalidate(&mut self) {
        if matches!(self.state, FilterState::Ready | FilterState::Applied) {
            self.state = FilterState::Configured;
        }
    }

    /// Set the input volume.
    pub fn set_input_image(&mut self, input: &'a Volume<T, N>) {
        self.input = Some(input);
        self.state = FilterState::Configured;
    }

    /// The input volume, if set.
    pub fn input_image(&self) -> Option<&'a Volume<T, N>> {
        self.input
    }

    /// Set the axis to filter along.
    ///
    /// The direction is checked against the volume dimension when the filter
    /// runs.
    pub fn set_direction(&mut self, direction: usize) {
        if direction != self.direction {
            self.direction = direction;
            self.invalidate();
        }
    }

    /// The axis to filter along.
    pub fn direction(&self) -> usize {
        self.direction
    }

    /// Replace the kernel.
    pub fn set_kernel(&mut self, kernel: K) {
        if kernel != self.kernel {
            self.kernel = kernel;
            self.invalidate();
        }
    }

    /// The kernel.
    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    /// Set how lines are distributed over threads.
    pub fn set_strategy(&mut self, strategy: ExecutionStrategy) {
        self.strategy = strategy;
    }

    /// The execution strategy.
    pub fn strategy(&self) -> ExecutionStrategy {
        self.strategy
    }

    /// The current lifecycle state.
    pub fn state(&self) -> FilterState {
        self.state
    }
}

impl<'a, T, const N: usize, K, R> RecursiveSeparableFilter<'a, T, N, K, R>
where
    T: PixelCast,
    K: RecursiveKernel,
    R: Real,
{
    /// Compute the coefficients for the current direction and input spacing.
    ///
    /// # Errors
    ///
    /// [`FilterError::MissingInput`] without an input volume,
    /// [`FilterError::InvalidDirection`] if the direction is not an axis of
    /// the input, or the kernel's own parameter errors.
    pub fn set_up(&mut self) -> Result<RecursiveCoefficients<R>, FilterError> {
        let input = self.input.ok_or(FilterError::MissingInput)?;
        if self.direction >= N {
            return Err(FilterError::InvalidDirection {
                direction: self.direction,
                dimension: N,
            });
        }
        let spacing = input.spacing()[self.direction];

        let cached = self
            .cache
            .as_ref()
            .filter(|c| {
                c.direction == self.direction && c.spacing == spacing && c.kernel == self.kernel
            })
            .map(|c| c.coefficients);

        let coefficients = match cached {
            Some(coefficients) => coefficients,
            None => {
                let coefficients = self.kernel.set_up(spacing)?;
                log::debug!(
                    "computed recursive coefficients for direction {} spacing {}: {:?}",
                    self.direction,
                    spacing,
                    self.kernel
                );
                self.cache = Some(CoefficientCache {
                    direction: self.direction,
                    spacing,
                    kernel: self.kernel.clone(),
                    coefficients,
                });
                coefficients
            }
        };

        self.state = FilterState::Ready;
        Ok(coefficients.to_precision())
    }

    /// Filter every line of the input along the current direction.
    ///
    /// # Errors
    ///
    /// See [`Self::set_up`]; also fails if a filtered value cannot be stored
    /// in the pixel type.
    pub fn generate_data(&mut self) -> Result<Volume<T, N>, FilterError> {
        let coefficients = self.set_up()?;
        let input = self.input.ok_or(FilterError::MissingInput)?;

        let real = input.cast::<R>()?;
        let filtered = apply_line_filter(&real, self.direction, &coefficients, self.strategy)?;
        let output = filtered.cast::<T>()?;

        self.state = FilterState::Applied;
        Ok(output)
    }
}
