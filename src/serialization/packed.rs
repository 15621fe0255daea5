//! Variable-length integer packing used by the host's persisted cursor
//! format. A 32-bit value takes one, two, four or five bytes depending on
//! its magnitude; the high bits of the first byte say which:
//!
//! | first byte  | total | value                          |
//! |-------------|-------|--------------------------------|
//! | `0xxxxxxx`  | 1     | `x`                            |
//! | `10xxxxxx`  | 2     | 14 bits, big endian            |
//! | `110xxxxx`  | 4     | 29 bits, big endian            |
//! | `111xxxxx`  | 5     | the next four bytes, big endian |
//!
//! 64-bit values are packed as their low half followed by their high half.

use byteorder::{BigEndian, ByteOrder, ReadBytesExt};

#[derive(Debug, thiserror::Error)]
pub enum UnpackError {
    #[error("packed value truncated")]
    Truncated(#[from] std::io::Error),
}

pub fn pack_dd(out: &mut Vec<u8>, x: u32) {
    let mut buf = [0u8; 4];

    if x < 0x80 {
        out.push(x as u8);
    } else if x < 0x4000 {
        BigEndian::write_u16(&mut buf, x as u16);
        buf[0]|= 0x80;
        out.extend_from_slice(&buf[0..2]);
    } else if x < 0x2000_0000 {
        BigEndian::write_u32(&mut buf, x);
        buf[0]|= 0xc0;
        out.extend_from_slice(&buf);
    } else {
        BigEndian::write_u32(&mut buf, x);
        out.push(0xff);
        out.extend_from_slice(&buf);
    }
}

pub fn pack_ea(out: &mut Vec<u8>, x: u64) {
    pack_dd(out, x as u32);
    pack_dd(out, (x >> 32) as u32);
}

/// Reads one packed 32-bit value off the front of `input`.
pub fn unpack_dd(input: &mut &[u8]) -> Result<u32, UnpackError> {
    let first = input.read_u8()?;

    Ok(match first {
        b if b & 0x80 == 0 => b as u32,
        b if b & 0xc0 == 0x80 => ((b & 0x3f) as u32) << 8 | input.read_u8()? as u32,
        b if b & 0xe0 == 0xc0 => ((b & 0x1f) as u32) << 24 | input.read_u24::<BigEndian>()?,
        _ => input.read_u32::<BigEndian>()?,
    })
}

pub fn unpack_ea(input: &mut &[u8]) -> Result<u64, UnpackError> {
    let low = unpack_dd(input)?;
    let high = unpack_dd(input)?;
    Ok((high as u64) << 32 | low as u64)
}
