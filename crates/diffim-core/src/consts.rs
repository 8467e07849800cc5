/// Minimum pixel count (h*w) to use row-level Rayon parallelism.
pub const PARALLEL_PIXEL_THRESHOLD: usize = 65_536;

/// Kernel sums with magnitude below this cannot rescale a difference image.
pub const KERNEL_SUM_EPSILON: f64 = 1e-12;

/// Mask planes ignored by residual statistics unless configured otherwise.
pub const DEFAULT_BAD_MASK_PLANES: [&str; 4] = ["EDGE", "BAD", "SAT", "NO_DATA"];

/// Magic bytes at the start of a `.mimg` masked-image file.
pub const MIMG_MAGIC: &[u8; 12] = b"DIFFIM-MIMG\0";

/// Current `.mimg` format version.
pub const MIMG_VERSION: u32 = 1;

/// Size of the fixed `.mimg` header in bytes.
pub const MIMG_HEADER_SIZE: usize = 36;

/// Default lower bound of the preview stretch, in image units.
pub const DEFAULT_PREVIEW_LOW: f32 = -0.05;

/// Default upper bound of the preview stretch, in image units.
pub const DEFAULT_PREVIEW_HIGH: f32 = 0.05;
