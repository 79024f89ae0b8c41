//! Basket (data block) reading for TTree branches.

use crate::decompress::decompress;
use crate::error::{Result, RootError};
use crate::key::Key;
use crate::rbuffer::RBuffer;

/// Read one basket and return its decompressed payload.
///
/// The payload is big-endian element data; jagged branches append an
/// entry-offset table at the tail.
pub fn read_basket_data(file_data: &[u8], seek: u64, is_large: bool) -> Result<Vec<u8>> {
    let pos = seek as usize;
    if pos >= file_data.len() {
        return Err(RootError::BufferUnderflow {
            offset: pos,
            need: 1,
            have: 0,
        });
    }

    let mut r = RBuffer::new(file_data);
    r.set_pos(pos);
    let key = Key::read(&mut r, is_large)?;

    let key_end = pos + key.n_bytes as usize;
    if key_end > file_data.len() {
        return Err(RootError::BufferUnderflow {
            offset: pos,
            need: key.n_bytes as usize,
            have: file_data.len() - pos,
        });
    }

    let obj_start = pos + key.key_len as usize;
    let stored = &file_data[obj_start..key_end];

    if key.obj_len as usize == stored.len() {
        // Stored uncompressed
        Ok(stored.to_vec())
    } else {
        decompress(stored, key.obj_len as usize)
    }
}
