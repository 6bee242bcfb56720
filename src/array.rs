//! Wire header and dimension model shared by the encoder and decoder.

use std::io::Cursor;

use byteorder::{BigEndian, ReadBytesExt};
use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{ArrayError, ArrayResult};
use crate::types::Oid;

/// Wire length marking a NULL element.
pub const NULL_LENGTH: i32 = -1;

// ---------------------------------------------------------------------------
// Dimension
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dimension {
    pub len: i32,
    pub lower_bound: i32,
}

impl Dimension {
    pub fn new(len: i32) -> Self {
        Self { len, lower_bound: 1 }
    }
}

// ---------------------------------------------------------------------------
// ArrayHeader
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayHeader {
    /// Opaque; read and re-emitted unchanged.
    pub flags: i32,
    pub element_oid: Oid,
    pub dimensions: Vec<Dimension>,
}

impl ArrayHeader {
    /// Header of an absent array: zero dimensions, zero elements.
    pub fn absent(element_oid: Oid) -> Self {
        Self {
            flags: 0,
            element_oid,
            dimensions: Vec::new(),
        }
    }

    pub fn is_absent(&self) -> bool {
        self.dimensions.is_empty()
    }

    pub fn lengths(&self) -> Vec<usize> {
        self.dimensions.iter().map(|d| d.len as usize).collect()
    }

    /// Total number of elements, or 0 for an absent array.
    pub fn element_count(&self) -> ArrayResult<usize> {
        if self.is_absent() {
            return Ok(0);
        }
        element_count(&self.lengths())
    }

    pub fn write(&self, out: &mut BytesMut) {
        out.reserve(12 + 8 * self.dimensions.len());
        out.put_i32(self.dimensions.len() as i32);
        out.put_i32(self.flags);
        out.put_u32(self.element_oid);
        for dim in &self.dimensions {
            out.put_i32(dim.len);
            out.put_i32(dim.lower_bound);
        }
    }
}

/// Product of the dimension lengths, failing on overflow.
pub fn element_count(lengths: &[usize]) -> ArrayResult<usize> {
    lengths.iter().try_fold(1usize, |acc, &len| {
        acc.checked_mul(len).ok_or_else(|| {
            ArrayError::MalformedWireData(format!("element count overflows for shape {lengths:?}"))
        })
    })
}

/// Append one element: a length prefix and payload, or the NULL marker.
pub(crate) fn put_element(out: &mut BytesMut, payload: Option<&[u8]>) -> ArrayResult<()> {
    match payload {
        None => out.put_i32(NULL_LENGTH),
        Some(p) => {
            let len = i32::try_from(p.len()).map_err(|_| {
                ArrayError::Encode(format!("element of {} bytes exceeds wire limit", p.len()))
            })?;
            out.put_i32(len);
            out.put_slice(p);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// ArrayReader
// ---------------------------------------------------------------------------

/// Leading fixed fields of the wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrayPrefix {
    pub ndims: usize,
    pub flags: i32,
    pub element_oid: Oid,
}

/// Incremental reader so callers can reject a buffer after the prefix,
/// before touching dimensions or elements.
pub struct ArrayReader<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> ArrayReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(buf),
        }
    }

    fn remaining(&self) -> usize {
        let buf = self.cursor.get_ref();
        buf.len().saturating_sub(self.cursor.position() as usize)
    }

    pub fn read_prefix(&mut self, max_dimensions: usize) -> ArrayResult<ArrayPrefix> {
        let ndims = self.cursor.read_i32::<BigEndian>()?;
        let flags = self.cursor.read_i32::<BigEndian>()?;
        let element_oid = self.cursor.read_u32::<BigEndian>()?;

        if ndims < 0 {
            return Err(ArrayError::MalformedWireData(format!(
                "negative dimension count {ndims}"
            )));
        }
        let ndims = ndims as usize;
        if ndims > max_dimensions {
            return Err(ArrayError::TooManyDimensions {
                ndims,
                max: max_dimensions,
            });
        }

        Ok(ArrayPrefix {
            ndims,
            flags,
            element_oid,
        })
    }

    pub fn read_dimensions(&mut self, ndims: usize) -> ArrayResult<Vec<Dimension>> {
        let mut dims = Vec::with_capacity(ndims);
        for i in 0..ndims {
            let len = self.cursor.read_i32::<BigEndian>()?;
            let lower_bound = self.cursor.read_i32::<BigEndian>()?;
            if len < 0 {
                return Err(ArrayError::MalformedWireData(format!(
                    "dimension {i} has negative length {len}"
                )));
            }
            dims.push(Dimension { len, lower_bound });
        }
        Ok(dims)
    }

    /// Fail early when `count` elements cannot possibly fit in what is left.
    pub fn ensure_capacity(&self, count: usize) -> ArrayResult<()> {
        let needed = count.saturating_mul(4);
        if needed > self.remaining() {
            return Err(ArrayError::MalformedWireData(format!(
                "{count} elements need at least {needed} bytes, {} remain",
                self.remaining()
            )));
        }
        Ok(())
    }

    pub fn read_element(&mut self) -> ArrayResult<Option<&'a [u8]>> {
        let len = self.cursor.read_i32::<BigEndian>()?;
        if len == NULL_LENGTH {
            return Ok(None);
        }
        if len < 0 {
            return Err(ArrayError::MalformedWireData(format!(
                "invalid element length {len}"
            )));
        }
        let len = len as usize;
        if len > self.remaining() {
            return Err(ArrayError::MalformedWireData(format!(
                "element of {len} bytes truncated, {} remain",
                self.remaining()
            )));
        }
        let start = self.cursor.position() as usize;
        let buf: &'a [u8] = *self.cursor.get_ref();
        self.cursor.set_position((start + len) as u64);
        Ok(Some(&buf[start..start + len]))
    }

    /// Reject trailing bytes after the last element.
    pub fn finish(self) -> ArrayResult<()> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(ArrayError::MalformedWireData(format!(
                "{n} trailing bytes after array"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// RawArray
// ---------------------------------------------------------------------------

/// A wire array with its element payloads left undecoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawArray {
    pub header: ArrayHeader,
    pub elements: Vec<Option<Bytes>>,
}

impl RawArray {
    pub fn parse(buf: &[u8], max_dimensions: usize) -> ArrayResult<Self> {
        let mut reader = ArrayReader::new(buf);
        let prefix = reader.read_prefix(max_dimensions)?;
        let dimensions = reader.read_dimensions(prefix.ndims)?;
        let header = ArrayHeader {
            flags: prefix.flags,
            element_oid: prefix.element_oid,
            dimensions,
        };

        let count = header.element_count()?;
        reader.ensure_capacity(count)?;
        let mut elements = Vec::with_capacity(count);
        for _ in 0..count {
            elements.push(reader.read_element()?.map(Bytes::copy_from_slice));
        }
        reader.finish()?;

        Ok(Self { header, elements })
    }

    pub fn encode(&self) -> ArrayResult<Bytes> {
        let expected = self.header.element_count()?;
        if expected != self.elements.len() {
            return Err(ArrayError::Encode(format!(
                "header describes {expected} elements but {} are present",
                self.elements.len()
            )));
        }
        let mut out = BytesMut::new();
        self.header.write(&mut out);
        for element in &self.elements {
            put_element(&mut out, element.as_deref())?;
        }
        Ok(out.freeze())
    }
}
