//! Bitcoin compact variable-length integer codec
//!
//! Used for the count fields of the sign-psbt command header and for the
//! length prefixes serialized into sighash preimages.
//!

use ledger_proto::ApduError;

/// Number of bytes required to encode `n`
pub const fn encoded_len(n: u64) -> usize {
    match n {
        0..=0xfc => 1,
        0xfd..=0xffff => 3,
        0x1_0000..=0xffff_ffff => 5,
        _ => 9,
    }
}

/// Write `n` to `buff`, returning the number of bytes written
pub fn write(buff: &mut [u8], n: u64) -> Result<usize, ApduError> {
    let l = encoded_len(n);

    if buff.len() < l {
        return Err(ApduError::InvalidLength);
    }

    match l {
        1 => buff[0] = n as u8,
        3 => {
            buff[0] = 0xfd;
            buff[1..3].copy_from_slice(&(n as u16).to_le_bytes());
        }
        5 => {
            buff[0] = 0xfe;
            buff[1..5].copy_from_slice(&(n as u32).to_le_bytes());
        }
        _ => {
            buff[0] = 0xff;
            buff[1..9].copy_from_slice(&n.to_le_bytes());
        }
    }

    Ok(l)
}

/// Read a varint from `buff`, returning the value and the number of bytes consumed
pub fn read(buff: &[u8]) -> Result<(u64, usize), ApduError> {
    if buff.is_empty() {
        return Err(ApduError::InvalidLength);
    }

    match buff[0] {
        n @ 0x00..=0xfc => Ok((n as u64, 1)),
        0xfd => {
            if buff.len() < 3 {
                return Err(ApduError::InvalidLength);
            }
            Ok((u16::from_le_bytes([buff[1], buff[2]]) as u64, 3))
        }
        0xfe => {
            if buff.len() < 5 {
                return Err(ApduError::InvalidLength);
            }
            let mut b = [0u8; 4];
            b.copy_from_slice(&buff[1..5]);
            Ok((u32::from_le_bytes(b) as u64, 5))
        }
        _ => {
            if buff.len() < 9 {
                return Err(ApduError::InvalidLength);
            }
            let mut b = [0u8; 8];
            b.copy_from_slice(&buff[1..9]);
            Ok((u64::from_le_bytes(b), 9))
        }
    }
}
