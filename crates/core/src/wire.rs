//! Binary decoders for the two housing payloads.
//!
//! Both decoders walk the byte slice with an explicit little-endian
//! cursor rather than a reflection-driven layout, so the known layout
//! variants (the ward payload grew trailing bytes at one point) stay
//! auditable. Decoders read structure only; interpreting the values is
//! the coordinator's job.

use crate::types::{
    AvailabilityType, HouseInfoEntry, HousingFlags, LandIdent, PlacardSaleInfo, PurchaseType,
    TenantType, WardInfo, HOUSES_PER_WARD,
};

/// Total size of the older ward payload layout. The decoded fields (an
/// 8-byte land ident plus 60 40-byte house entries) span the first 2408
/// bytes; the rest of the region is undocumented and left unread.
pub const WARD_INFO_MIN_SIZE: usize = 2656;

/// Total size of the newer layout carrying purchase/tenant bytes after
/// the house entries.
pub const WARD_INFO_EXTENDED_SIZE: usize = 2664;

/// Minimum placard sale payload size.
pub const PLACARD_SALE_INFO_MIN_SIZE: usize = 32;

/// Length of the fixed owner-name field in a house entry.
const OWNER_NAME_LEN: usize = 32;

/// Failures while decoding a raw housing payload.
///
/// Decode failures are local and non-fatal: the offending event is
/// dropped with a warning upstream.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The payload is shorter than the layout requires.
    #[error("buffer too short: needed {needed} bytes, got {got}")]
    ShortBuffer { needed: usize, got: usize },

    /// An enum-typed byte holds a value outside the known set.
    #[error("bad value {value} for {field}")]
    BadEnumValue { field: &'static str, value: u8 },
}

/// Little-endian byte-cursor walker over an input slice.
struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        if self.remaining() < n {
            return Err(DecodeError::ShortBuffer {
                needed: self.pos + n,
                got: self.buf.len(),
            });
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take(1)?[0])
    }

    fn read_i8(&mut self) -> Result<i8, DecodeError> {
        Ok(self.take(1)?[0] as i8)
    }

    fn read_i16(&mut self) -> Result<i16, DecodeError> {
        let bytes = self.take(2)?;
        Ok(i16::from_le_bytes([bytes[0], bytes[1]]))
    }

    fn read_u32(&mut self) -> Result<u32, DecodeError> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn skip(&mut self, n: usize) -> Result<(), DecodeError> {
        self.take(n).map(|_| ())
    }
}

fn read_land_ident(cur: &mut Cursor<'_>) -> Result<LandIdent, DecodeError> {
    Ok(LandIdent {
        land_id: cur.read_i16()?,
        ward_number: cur.read_i16()?,
        territory_type_id: cur.read_i16()?,
        world_id: cur.read_i16()?,
    })
}

/// Decode a ward snapshot payload.
///
/// Accepts the 2656-byte layout, or the 2664-byte layout with trailing
/// `purchase_type`/`tenant_type` bytes. Owner names are UTF-8 with
/// trailing NULs trimmed; when the plot is not owned the name field is
/// garbage and is normalized to empty.
pub fn decode_ward_info(bytes: &[u8]) -> Result<WardInfo, DecodeError> {
    if bytes.len() < WARD_INFO_MIN_SIZE {
        return Err(DecodeError::ShortBuffer {
            needed: WARD_INFO_MIN_SIZE,
            got: bytes.len(),
        });
    }

    let mut cur = Cursor::new(bytes);
    let land_ident = read_land_ident(&mut cur)?;

    let mut entries = Vec::with_capacity(HOUSES_PER_WARD);
    for _ in 0..HOUSES_PER_WARD {
        let price = cur.read_u32()?;
        let flags = HousingFlags(cur.read_u8()?);
        let appeals = [cur.read_i8()?, cur.read_i8()?, cur.read_i8()?];
        let raw_name = cur.take(OWNER_NAME_LEN)?;
        let owner_name = if flags.contains(HousingFlags::PLOT_OWNED) {
            String::from_utf8_lossy(raw_name)
                .trim_end_matches('\0')
                .to_string()
        } else {
            String::new()
        };
        entries.push(HouseInfoEntry {
            price,
            flags,
            appeals,
            owner_name,
        });
    }

    // Newer payloads carry the ward-wide sale mode after the entries.
    let (purchase_type, tenant_type) = if bytes.len() >= WARD_INFO_EXTENDED_SIZE {
        let purchase = cur.read_u8()?;
        cur.skip(1)?;
        let tenant = cur.read_u8()?;
        cur.skip(1)?;
        cur.skip(4)?;
        (Some(purchase), Some(tenant))
    } else {
        (None, None)
    };

    Ok(WardInfo {
        land_ident,
        entries,
        purchase_type,
        tenant_type,
    })
}

/// Decode the sale metadata behind an unowned plot's placard.
///
/// The trailing `unknown4` region holds whatever follows the entry
/// count, capped at 16 bytes; short payloads simply carry less of it.
pub fn decode_placard_sale_info(bytes: &[u8]) -> Result<PlacardSaleInfo, DecodeError> {
    if bytes.len() < PLACARD_SALE_INFO_MIN_SIZE {
        return Err(DecodeError::ShortBuffer {
            needed: PLACARD_SALE_INFO_MIN_SIZE,
            got: bytes.len(),
        });
    }

    let mut cur = Cursor::new(bytes);

    let purchase_raw = cur.read_u8()?;
    let purchase_type =
        PurchaseType::try_from(purchase_raw).map_err(|_| DecodeError::BadEnumValue {
            field: "purchase_type",
            value: purchase_raw,
        })?;

    let tenant_type = TenantType(cur.read_u8()?);

    let availability_raw = cur.read_u8()?;
    let availability_type =
        AvailabilityType::try_from(availability_raw).map_err(|_| DecodeError::BadEnumValue {
            field: "availability_type",
            value: availability_raw,
        })?;

    let unknown1 = cur.read_u8()?;
    let unknown2 = cur.read_u32()?;
    let phase_ends_at = cur.read_u32()?;
    let unknown3 = cur.read_u32()?;
    let entry_count = cur.read_u32()?;
    let unknown4 = cur.take(cur.remaining().min(16))?.to_vec();

    Ok(PlacardSaleInfo {
        purchase_type,
        tenant_type,
        availability_type,
        unknown1,
        unknown2,
        phase_ends_at,
        unknown3,
        entry_count,
        unknown4,
    })
}
