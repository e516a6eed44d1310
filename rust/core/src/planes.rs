// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Plane-index raster and plane records

use crate::error::{Error, Result};
use crate::header::Header;
use nom::bytes::complete::take;
use nom::multi::count;
use nom::number::complete::le_f32;
use nom::sequence::tuple;
use nom::IResult;

/// Raster value for pixels that see no surface (sky)
pub const NO_PLANE: u8 = 0;

/// An infinite plane `n · p = d` around the capture position
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Plane {
    /// Unit normal
    pub n: [f32; 3],
    /// Signed distance from the viewpoint along the normal
    pub d: f32,
}

impl Plane {
    pub fn new(n: [f32; 3], d: f32) -> Self {
        Self { n, d }
    }

    /// Normal promoted to f64
    #[inline]
    pub fn normal_f64(&self) -> [f64; 3] {
        [self.n[0] as f64, self.n[1] as f64, self.n[2] as f64]
    }
}

/// Raster and plane records read from a depth buffer
#[derive(Debug, Clone)]
pub struct PlaneTable {
    /// Row-major plane index per pixel
    pub indices: Vec<u8>,
    /// Plane records; index 0 is the null plane
    pub planes: Vec<Plane>,
}

fn plane_record(input: &[u8]) -> IResult<&[u8], Plane> {
    let (rest, (nx, ny, nz, d)) = tuple((le_f32, le_f32, le_f32, le_f32))(input)?;
    Ok((rest, Plane::new([nx, ny, nz], d)))
}

/// Read the plane-index raster at `header.offset` and the plane records that
/// follow it.
///
/// The buffer length is checked against the header before anything is read,
/// and every raster entry must reference a declared plane.
pub fn parse_plane_table(buffer: &[u8], header: &Header) -> Result<PlaneTable> {
    let required = header.required_len();
    if buffer.len() < required {
        return Err(Error::malformed(format!(
            "header declares {}x{} raster and {} planes ({} bytes) but buffer holds {} bytes",
            header.width,
            header.height,
            header.number_of_planes,
            required,
            buffer.len()
        )));
    }

    let body = &buffer[header.offset as usize..];
    let parsed: IResult<&[u8], (&[u8], Vec<Plane>)> = tuple((
        take(header.pixel_count()),
        count(plane_record, header.number_of_planes as usize),
    ))(body);
    let (_, (raster, planes)) =
        parsed.map_err(|e| Error::malformed(format!("plane table: {:?}", e)))?;

    if let Some(pos) = raster
        .iter()
        .position(|&idx| idx as usize >= planes.len() && idx != NO_PLANE)
    {
        return Err(Error::malformed(format!(
            "pixel ({}, {}) references plane {} but only {} planes are declared",
            pos % header.width as usize,
            pos / header.width as usize,
            raster[pos],
            planes.len()
        )));
    }

    Ok(PlaneTable {
        indices: raster.to_vec(),
        planes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::HEADER_LEN;

    fn buffer(header: &Header, raster: &[u8], planes: &[Plane]) -> Vec<u8> {
        let mut bytes = Vec::new();
        header.write_to(&mut bytes);
        bytes.resize(header.offset as usize, 0);
        bytes.extend_from_slice(raster);
        for plane in planes {
            for c in plane.n {
                bytes.extend_from_slice(&c.to_le_bytes());
            }
            bytes.extend_from_slice(&plane.d.to_le_bytes());
        }
        bytes
    }

    fn header(planes: u16, width: u16, height: u16, offset: u16) -> Header {
        Header {
            header_size: HEADER_LEN as u8,
            number_of_planes: planes,
            width,
            height,
            offset,
        }
    }

    #[test]
    fn test_reads_raster_and_records() {
        let header = header(2, 2, 2, 12);
        let planes = [
            Plane::new([0.0, 0.0, 0.0], 0.0),
            Plane::new([0.25, -0.5, 1.0], 7.5),
        ];
        let bytes = buffer(&header, &[0, 1, 1, 0], &planes);

        let table = parse_plane_table(&bytes, &header).unwrap();
        assert_eq!(table.indices, vec![0, 1, 1, 0]);
        assert_eq!(table.planes, planes.to_vec());
    }

    #[test]
    fn test_truncated_by_one_byte() {
        let header = header(2, 2, 2, HEADER_LEN as u16);
        let planes = [Plane::new([0.0; 3], 0.0), Plane::new([1.0, 0.0, 0.0], 3.0)];
        let mut bytes = buffer(&header, &[1, 1, 1, 1], &planes);
        assert!(parse_plane_table(&bytes, &header).is_ok());

        bytes.pop();
        let err = parse_plane_table(&bytes, &header).unwrap_err();
        assert!(matches!(err, Error::MalformedHeader(_)));
    }

    #[test]
    fn test_out_of_range_plane_index() {
        let header = header(2, 2, 2, HEADER_LEN as u16);
        let planes = [Plane::new([0.0; 3], 0.0), Plane::new([1.0, 0.0, 0.0], 3.0)];
        let bytes = buffer(&header, &[0, 1, 2, 1], &planes);

        let err = parse_plane_table(&bytes, &header).unwrap_err();
        assert!(err.to_string().contains("pixel (0, 1)"));
    }
}
