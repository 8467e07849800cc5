use std::fmt::Debug;
use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use num_traits::Float;

/// Floating-point element type of image and variance planes.
///
/// Arithmetic inside the convolution accumulates in `f64`; `widen`/`narrow`
/// move values in and out of that accumulator.
pub trait Pixel: Float + Default + Debug + Send + Sync + 'static {
    /// Human-readable type name, used in error messages.
    const NAME: &'static str;
    /// Code stored in the `.mimg` header (byte width of one sample).
    const TYPE_CODE: u32;

    fn widen(self) -> f64;
    fn narrow(value: f64) -> Self;

    fn write_le<W: Write>(self, w: &mut W) -> std::io::Result<()>;
    fn read_le<R: Read>(r: &mut R) -> std::io::Result<Self>;
}

impl Pixel for f32 {
    const NAME: &'static str = "f32";
    const TYPE_CODE: u32 = 4;

    fn widen(self) -> f64 {
        self as f64
    }

    fn narrow(value: f64) -> Self {
        value as f32
    }

    fn write_le<W: Write>(self, w: &mut W) -> std::io::Result<()> {
        w.write_f32::<LittleEndian>(self)
    }

    fn read_le<R: Read>(r: &mut R) -> std::io::Result<Self> {
        r.read_f32::<LittleEndian>()
    }
}

impl Pixel for f64 {
    const NAME: &'static str = "f64";
    const TYPE_CODE: u32 = 8;

    fn widen(self) -> f64 {
        self
    }

    fn narrow(value: f64) -> Self {
        value
    }

    fn write_le<W: Write>(self, w: &mut W) -> std::io::Result<()> {
        w.write_f64::<LittleEndian>(self)
    }

    fn read_le<R: Read>(r: &mut R) -> std::io::Result<Self> {
        r.read_f64::<LittleEndian>()
    }
}

/// Name of the pixel type stored under a `.mimg` type code.
pub fn type_name_for_code(code: u32) -> &'static str {
    match code {
        4 => f32::NAME,
        8 => f64::NAME,
        _ => "unknown",
    }
}
