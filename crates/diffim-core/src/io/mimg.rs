//! `.mimg`: a little-endian container holding all three planes of a masked
//! image and its parent-coordinate origin.
//!
//! Layout: magic (12 bytes), version u32, pixel type u32 (bytes per sample),
//! x0 i32, y0 i32, width u32, height u32, then the image plane, the mask
//! plane (u32) and the variance plane, each row-major.

use std::fs::File;
use std::io::{BufWriter, Cursor, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use memmap2::Mmap;
use ndarray::Array2;

use crate::consts::{MIMG_HEADER_SIZE, MIMG_MAGIC, MIMG_VERSION};
use crate::error::{DiffimError, Result};
use crate::geom::BoundingBox;
use crate::image::{Image, MaskPixel, MaskedImage};
use crate::pixel::{type_name_for_code, Pixel};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MimgHeader {
    pub version: u32,
    pub pixel_type: u32,
    pub x0: i32,
    pub y0: i32,
    pub width: u32,
    pub height: u32,
}

impl MimgHeader {
    pub fn for_image<P: Pixel>(image: &MaskedImage<P>) -> Self {
        Self {
            version: MIMG_VERSION,
            pixel_type: P::TYPE_CODE,
            x0: image.image.x0,
            y0: image.image.y0,
            width: image.width() as u32,
            height: image.height() as u32,
        }
    }

    pub fn bbox(&self) -> BoundingBox {
        BoundingBox::new(self.x0, self.y0, self.width as usize, self.height as usize)
    }

    pub fn pixel_type_name(&self) -> &'static str {
        type_name_for_code(self.pixel_type)
    }

    fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Total file size implied by the header.
    pub fn file_size(&self) -> usize {
        let n = self.pixel_count();
        MIMG_HEADER_SIZE
            + n * self.pixel_type as usize
            + n * std::mem::size_of::<MaskPixel>()
            + n * self.pixel_type as usize
    }
}

/// Memory-mapped `.mimg` reader.
pub struct MimgReader {
    mmap: Mmap,
    pub header: MimgHeader,
}

impl MimgReader {
    /// Open a file and validate its header against its length.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };

        if mmap.len() < MIMG_HEADER_SIZE {
            return Err(DiffimError::InvalidFile(
                "File too small for header".into(),
            ));
        }
        if &mmap[..MIMG_MAGIC.len()] != MIMG_MAGIC {
            return Err(DiffimError::InvalidFile("Missing DIFFIM-MIMG magic".into()));
        }

        let header = parse_header(&mmap[..MIMG_HEADER_SIZE])?;
        if mmap.len() < header.file_size() {
            return Err(DiffimError::InvalidFile(format!(
                "File truncated: expected {} bytes, got {}",
                header.file_size(),
                mmap.len()
            )));
        }

        Ok(Self { mmap, header })
    }

    /// Decode the planes as pixel type `P`.
    pub fn read<P: Pixel>(&self) -> Result<MaskedImage<P>> {
        if self.header.pixel_type != P::TYPE_CODE {
            return Err(DiffimError::TypeMismatch {
                expected: P::NAME,
                found: self.header.pixel_type_name(),
            });
        }

        let (w, h) = (self.header.width as usize, self.header.height as usize);
        let n = w * h;
        let sample = P::TYPE_CODE as usize;
        let image_end = MIMG_HEADER_SIZE + n * sample;
        let mask_end = image_end + n * std::mem::size_of::<MaskPixel>();
        let variance_end = mask_end + n * sample;

        let mut cursor = Cursor::new(&self.mmap[MIMG_HEADER_SIZE..image_end]);
        let image = read_plane(&mut cursor, h, w, |c| P::read_le(c))?;

        let mut cursor = Cursor::new(&self.mmap[image_end..mask_end]);
        let mask = read_plane(&mut cursor, h, w, |c| c.read_u32::<LittleEndian>())?;

        let mut cursor = Cursor::new(&self.mmap[mask_end..variance_end]);
        let variance = read_plane(&mut cursor, h, w, |c| P::read_le(c))?;

        MaskedImage::new(
            Image::with_origin(image, self.header.x0, self.header.y0),
            mask,
            variance,
        )
    }
}

/// Read a `.mimg` file as pixel type `P`.
pub fn read_mimg<P: Pixel>(path: &Path) -> Result<MaskedImage<P>> {
    MimgReader::open(path)?.read()
}

/// Write all three planes of `image` to `path`.
pub fn write_mimg<P: Pixel>(image: &MaskedImage<P>, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    let mut w = BufWriter::new(file);
    write_header(&mut w, &MimgHeader::for_image(image))?;

    for &v in image.image.data.iter() {
        v.write_le(&mut w)?;
    }
    for &m in image.mask.iter() {
        w.write_u32::<LittleEndian>(m)?;
    }
    for &v in image.variance.iter() {
        v.write_le(&mut w)?;
    }

    w.flush()?;
    Ok(())
}

fn write_header(w: &mut impl Write, header: &MimgHeader) -> Result<()> {
    w.write_all(MIMG_MAGIC)?;
    w.write_u32::<LittleEndian>(header.version)?;
    w.write_u32::<LittleEndian>(header.pixel_type)?;
    w.write_i32::<LittleEndian>(header.x0)?;
    w.write_i32::<LittleEndian>(header.y0)?;
    w.write_u32::<LittleEndian>(header.width)?;
    w.write_u32::<LittleEndian>(header.height)?;
    Ok(())
}

fn parse_header(buf: &[u8]) -> Result<MimgHeader> {
    let mut cursor = Cursor::new(&buf[MIMG_MAGIC.len()..]);

    let version = cursor.read_u32::<LittleEndian>()?;
    let pixel_type = cursor.read_u32::<LittleEndian>()?;
    let x0 = cursor.read_i32::<LittleEndian>()?;
    let y0 = cursor.read_i32::<LittleEndian>()?;
    let width = cursor.read_u32::<LittleEndian>()?;
    let height = cursor.read_u32::<LittleEndian>()?;

    if version != MIMG_VERSION {
        return Err(DiffimError::InvalidFile(format!(
            "Unsupported version {version}"
        )));
    }
    if pixel_type != f32::TYPE_CODE && pixel_type != f64::TYPE_CODE {
        return Err(DiffimError::InvalidFile(format!(
            "Unknown pixel type code {pixel_type}"
        )));
    }
    if width == 0 || height == 0 {
        return Err(DiffimError::InvalidDimensions {
            width: width as usize,
            height: height as usize,
        });
    }

    Ok(MimgHeader {
        version,
        pixel_type,
        x0,
        y0,
        width,
        height,
    })
}

fn read_plane<T, F>(
    cursor: &mut Cursor<&[u8]>,
    h: usize,
    w: usize,
    mut read: F,
) -> Result<Array2<T>>
where
    T: Clone + num_traits::Zero,
    F: FnMut(&mut Cursor<&[u8]>) -> std::io::Result<T>,
{
    let mut plane = Array2::<T>::zeros((h, w));
    for v in plane.iter_mut() {
        *v = read(cursor)?;
    }
    Ok(plane)
}
