// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fixed-layout depth buffer header
//!
//! ```text
//! offset  size  field
//! 0       1     header size
//! 1       2     number of planes   (LE)
//! 3       2     width              (LE)
//! 5       2     height             (LE)
//! 7       2     raster offset      (LE)
//! ```

use crate::error::{Error, Result};
use nom::number::complete::{le_u16, le_u8};
use nom::sequence::tuple;
use nom::IResult;

/// Bytes occupied by the header fields
pub const HEADER_LEN: usize = 9;

/// Size of one plane record: three normal components and a distance, all f32
pub const PLANE_RECORD_LEN: usize = 16;

/// Depth buffer header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Header {
    pub header_size: u8,
    pub number_of_planes: u16,
    pub width: u16,
    pub height: u16,
    /// Byte position of the plane-index raster
    pub offset: u16,
}

impl Header {
    /// Number of raster entries (one byte per pixel)
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Byte position of the first plane record
    #[inline]
    pub fn plane_table_offset(&self) -> usize {
        self.offset as usize + self.pixel_count()
    }

    /// Minimum buffer length that can hold everything the header declares
    #[inline]
    pub fn required_len(&self) -> usize {
        self.plane_table_offset() + self.number_of_planes as usize * PLANE_RECORD_LEN
    }

    /// Serialize the header fields in wire order
    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.push(self.header_size);
        out.extend_from_slice(&self.number_of_planes.to_le_bytes());
        out.extend_from_slice(&self.width.to_le_bytes());
        out.extend_from_slice(&self.height.to_le_bytes());
        out.extend_from_slice(&self.offset.to_le_bytes());
    }
}

fn header_fields(input: &[u8]) -> IResult<&[u8], Header> {
    let (rest, (header_size, number_of_planes, width, height, offset)) =
        tuple((le_u8, le_u16, le_u16, le_u16, le_u16))(input)?;

    Ok((
        rest,
        Header {
            header_size,
            number_of_planes,
            width,
            height,
            offset,
        },
    ))
}

/// Parse the header at byte 0 of a raw depth buffer.
///
/// Only the header itself is checked here; whether the buffer holds the
/// declared raster and plane table is checked by the plane table reader.
pub fn parse_header(buffer: &[u8]) -> Result<Header> {
    let (_, header) = header_fields(buffer).map_err(|_| {
        Error::malformed(format!(
            "buffer of {} bytes is shorter than the {}-byte header",
            buffer.len(),
            HEADER_LEN
        ))
    })?;

    // Projection divides by (width - 1) and (height - 1)
    if header.width < 2 || header.height < 2 {
        return Err(Error::malformed(format!(
            "raster must be at least 2x2, got {}x{}",
            header.width, header.height
        )));
    }

    Ok(header)
}
