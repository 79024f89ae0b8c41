//! Column-oriented data extraction from TTree branches.

use crate::basket::read_basket_data;
use crate::error::{Result, RootError};
use crate::tree::{BranchInfo, LeafType};

/// A jagged (variable-length) column: flat values + per-entry offsets.
///
/// `offsets` has length `n_entries + 1`. Entry `i` holds values
/// `flat[offsets[i]..offsets[i+1]]`.
#[derive(Debug, Clone)]
pub struct JaggedCol {
    /// Flat array of all values across all entries.
    pub flat: Vec<f64>,
    /// Entry boundaries: `offsets.len() == n_entries + 1`.
    pub offsets: Vec<usize>,
}

impl JaggedCol {
    /// Number of entries.
    pub fn n_entries(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    /// Values of entry `row`.
    pub fn entry(&self, row: usize) -> &[f64] {
        &self.flat[self.offsets[row]..self.offsets[row + 1]]
    }
}

/// Reader for extracting column data from a single TTree branch.
pub struct BranchReader<'a> {
    file_data: &'a [u8],
    branch: &'a BranchInfo,
    is_large: bool,
}

impl<'a> BranchReader<'a> {
    /// Create a new branch reader.
    pub fn new(file_data: &'a [u8], branch: &'a BranchInfo, is_large: bool) -> Self {
        Self { file_data, branch, is_large }
    }

    /// Read all entries as `f64`, converting from the native leaf type.
    pub fn as_f64(&self) -> Result<Vec<f64>> {
        let raw_baskets = self.read_all_baskets()?;
        Ok(decode_flat_f64(&raw_baskets, self.branch.leaf_type))
    }

    /// Read all entries as a jagged column (variable elements per entry).
    ///
    /// Three basket layouts are recognized:
    /// - entry-offset table at the basket tail (`fEntryOffsetLen > 0`),
    ///   with each entry either raw elements or a ROOT-streamed
    ///   `std::vector<T>` chunk;
    /// - unsplit `std::vector<T>` payloads (`[len][elems...]` per entry,
    ///   no offset table);
    /// - fixed-size arrays, for which uniform offsets are synthesized.
    pub fn as_jagged_f64(&self) -> Result<JaggedCol> {
        let entries = self.branch.entries as usize;
        if entries == 0 {
            return Ok(JaggedCol { flat: Vec::new(), offsets: vec![0] });
        }

        let raw_baskets = self.read_all_baskets()?;

        if self.branch.entry_offset_len > 0 {
            let mut flat = Vec::new();
            let mut offsets = vec![0usize];
            for (i, payload) in raw_baskets.iter().enumerate() {
                let n_entries = self.basket_entries(i);
                if n_entries == 0 {
                    continue;
                }
                decode_jagged_from_payload(
                    payload,
                    self.branch.leaf_type,
                    n_entries,
                    &mut flat,
                    &mut offsets,
                )?;
            }
            return Ok(JaggedCol { flat, offsets });
        }

        // No offset table: probe for unsplit std::vector<T> payloads.
        if let Some(col) = try_decode_unsplit_vector(
            &raw_baskets,
            &self.branch.basket_entry,
            self.branch.entries,
            self.branch.leaf_type,
        )? {
            return Ok(col);
        }

        // Fixed-size array: synthesize uniform offsets.
        let flat = decode_flat_f64(&raw_baskets, self.branch.leaf_type);
        let offsets = fixed_array_offsets(flat.len(), entries, &self.branch.name)?;
        Ok(JaggedCol { flat, offsets })
    }

    fn basket_entries(&self, basket_idx: usize) -> usize {
        let end = self
            .branch
            .basket_entry
            .get(basket_idx + 1)
            .copied()
            .unwrap_or(self.branch.entries);
        let start = self.branch.basket_entry.get(basket_idx).copied().unwrap_or(0);
        end.saturating_sub(start) as usize
    }

    fn read_all_baskets(&self) -> Result<Vec<Vec<u8>>> {
        let mut baskets = Vec::with_capacity(self.branch.n_baskets);
        for i in 0..self.branch.n_baskets {
            baskets.push(read_basket_data(
                self.file_data,
                self.branch.basket_seek[i],
                self.is_large,
            )?);
        }
        Ok(baskets)
    }
}

// ── Entry-offset-table baskets ─────────────────────────────────

/// Decode one basket with a tail offset table into `flat`/`offsets`.
///
/// Basket layout:
/// ```text
/// [data bytes...][count: u32][offset_0 .. offset_n : u32 each]
/// ```
/// Offsets are absolute within the full TBasket buffer (they include the
/// TKey header length), so `offset_0` serves as the base for slicing the
/// decompressed payload. A zero final offset is repaired to the data end.
fn decode_jagged_from_payload(
    payload: &[u8],
    leaf_type: LeafType,
    n_entries: usize,
    flat: &mut Vec<f64>,
    offsets: &mut Vec<usize>,
) -> Result<()> {
    let n_offsets = n_entries + 1;
    let tail_bytes = 4 + n_offsets
        .checked_mul(4)
        .ok_or_else(|| RootError::Deserialization("offset table size overflow".into()))?;
    if payload.len() < tail_bytes {
        return Err(RootError::Deserialization(format!(
            "basket payload too small for offset table: have {} need {}",
            payload.len(),
            tail_bytes
        )));
    }

    let data_end = payload.len() - tail_bytes;
    let data = &payload[..data_end];
    let tail = &payload[data_end..];

    let count = read_be_u32(&tail[..4]) as usize;
    if count != n_offsets {
        return Err(RootError::Deserialization(format!(
            "unexpected entry-offset count word: got {} want {}",
            count, n_offsets
        )));
    }

    let mut entry_offsets: Vec<usize> = (0..n_offsets)
        .map(|i| read_be_u32(&tail[4 + 4 * i..8 + 4 * i]) as usize)
        .collect();

    let base = entry_offsets[0];
    if entry_offsets[n_offsets - 1] == 0 {
        entry_offsets[n_offsets - 1] = base + data.len();
    }

    let elem_size = leaf_type.byte_size();

    // Per-entry chunks are either raw elements or ROOT-streamed
    // std::vector<T> (byte-count header + version + length). Decide once
    // per basket: any chunk not divisible by the element size implies the
    // streamed form.
    let mut streamed_vector = false;
    for i in 0..n_entries {
        let start = entry_offsets[i].saturating_sub(base);
        let end = entry_offsets[i + 1].saturating_sub(base);
        if end > data.len() || start > end {
            return Err(RootError::Deserialization(format!(
                "invalid entry offsets in basket: start={start} end={end} data_len={}",
                data.len()
            )));
        }
        if (end - start) % elem_size != 0 {
            streamed_vector = true;
            break;
        }
    }

    for i in 0..n_entries {
        let start = entry_offsets[i].saturating_sub(base);
        let end = entry_offsets[i + 1].saturating_sub(base);
        if end > data.len() || start > end {
            return Err(RootError::Deserialization(format!(
                "invalid entry offsets in basket: start={start} end={end} data_len={}",
                data.len()
            )));
        }
        let chunk = &data[start..end];

        if streamed_vector {
            let Some((n, values_off)) = try_parse_stl_vector_chunk(chunk, elem_size) else {
                return Err(RootError::Deserialization(
                    "failed to parse ROOT-streamed std::vector<T> entry payload".into(),
                ));
            };
            for j in 0..n {
                flat.push(decode_one_f64(chunk, values_off + j * elem_size, leaf_type));
            }
        } else {
            for j in 0..(end - start) / elem_size {
                flat.push(decode_one_f64(chunk, j * elem_size, leaf_type));
            }
        }
        offsets.push(flat.len());
    }

    Ok(())
}

/// Probe a chunk for the ROOT-streamed `std::vector<T>` form:
/// `[byte-count u32 | kByteCountMask][version u16][len u32][elems...]`.
///
/// Returns `(len, offset_of_first_element)` on match.
fn try_parse_stl_vector_chunk(chunk: &[u8], elem_size: usize) -> Option<(usize, usize)> {
    if chunk.len() < 10 {
        return None;
    }
    let raw = read_be_u32(&chunk[0..4]);
    if raw & 0x4000_0000 == 0 {
        return None;
    }
    let byte_count = (raw & !0x4000_0000) as usize;
    if byte_count != chunk.len() - 4 {
        return None;
    }
    let n = read_be_u32(&chunk[6..10]) as usize;
    if chunk.len() - 10 != n.checked_mul(elem_size)? {
        return None;
    }
    Some((n, 10))
}

// ── Unsplit std::vector<T> baskets (no offset table) ───────────

const MAX_UNSPLIT_VECTOR_LEN: usize = 1_000_000;

/// Candidate element types to probe, preferred type first.
fn leaf_type_candidates(prefer: LeafType) -> Vec<LeafType> {
    let all = [
        prefer,
        LeafType::F32,
        LeafType::F64,
        LeafType::I32,
        LeafType::I64,
        LeafType::I16,
        LeafType::I8,
        LeafType::Bool,
    ];
    let mut out: Vec<LeafType> = Vec::with_capacity(all.len());
    for lt in all {
        if !out.contains(&lt) {
            out.push(lt);
        }
    }
    out
}

fn try_decode_unsplit_vector(
    raw_baskets: &[Vec<u8>],
    basket_entry: &[u64],
    total_entries: u64,
    prefer: LeafType,
) -> Result<Option<JaggedCol>> {
    let total = total_entries as usize;
    if total == 0 || raw_baskets.is_empty() {
        return Ok(None);
    }

    'candidates: for lt in leaf_type_candidates(prefer) {
        let mut flat: Vec<f64> = Vec::new();
        let mut offsets: Vec<usize> = vec![0];

        for (i, payload) in raw_baskets.iter().enumerate() {
            let end = basket_entry.get(i + 1).copied().unwrap_or(total_entries);
            let start = basket_entry.get(i).copied().unwrap_or(0);
            let n_entries = end.saturating_sub(start) as usize;
            if n_entries == 0 {
                continue;
            }
            if decode_unsplit_vector_payload(payload, lt, n_entries, &mut flat, &mut offsets)
                .is_err()
            {
                continue 'candidates;
            }
        }

        if offsets.len() == total + 1 {
            return Ok(Some(JaggedCol { flat, offsets }));
        }
    }

    Ok(None)
}

/// Decode one basket of `[len: u32][elems...]` entry records.
fn decode_unsplit_vector_payload(
    payload: &[u8],
    elem_type: LeafType,
    n_entries: usize,
    flat: &mut Vec<f64>,
    offsets: &mut Vec<usize>,
) -> Result<()> {
    let elem_size = elem_type.byte_size();
    let mut pos = 0usize;

    for _ in 0..n_entries {
        if pos + 4 > payload.len() {
            return Err(RootError::Deserialization(
                "unsplit vector payload underflow (missing length)".into(),
            ));
        }
        let len = read_be_u32(&payload[pos..pos + 4]) as usize;
        pos += 4;

        if len > MAX_UNSPLIT_VECTOR_LEN {
            return Err(RootError::Deserialization(format!(
                "unsplit vector length too large: {len}"
            )));
        }
        let bytes = len
            .checked_mul(elem_size)
            .ok_or_else(|| RootError::Deserialization("unsplit vector length overflow".into()))?;
        if pos + bytes > payload.len() {
            return Err(RootError::Deserialization(
                "unsplit vector payload underflow (elements)".into(),
            ));
        }

        for j in 0..len {
            flat.push(decode_one_f64(payload, pos + j * elem_size, elem_type));
        }
        pos += bytes;
        offsets.push(flat.len());
    }

    // ROOT may pad the basket; anything non-zero after the last entry means
    // this basket was not an unsplit-vector payload after all.
    if payload[pos..].iter().any(|&b| b != 0) {
        return Err(RootError::Deserialization(
            "unsplit vector payload has trailing non-zero bytes".into(),
        ));
    }

    Ok(())
}

// ── Big-endian element decoding ────────────────────────────────

fn read_be_u32(b: &[u8]) -> u32 {
    u32::from_be_bytes(b.try_into().expect("slice length checked by caller"))
}

/// Decode a single value at byte offset `off` as `f64`.
fn decode_one_f64(data: &[u8], off: usize, leaf_type: LeafType) -> f64 {
    match leaf_type {
        LeafType::F64 => f64::from_be_bytes(data[off..off + 8].try_into().unwrap()),
        LeafType::F32 => f32::from_be_bytes(data[off..off + 4].try_into().unwrap()) as f64,
        LeafType::I32 => i32::from_be_bytes(data[off..off + 4].try_into().unwrap()) as f64,
        LeafType::I64 => i64::from_be_bytes(data[off..off + 8].try_into().unwrap()) as f64,
        LeafType::I16 => i16::from_be_bytes(data[off..off + 2].try_into().unwrap()) as f64,
        LeafType::I8 => data[off] as i8 as f64,
        LeafType::Bool => {
            if data[off] != 0 {
                1.0
            } else {
                0.0
            }
        }
    }
}

/// Decode flat basket payloads (no per-entry structure) to `f64`.
fn decode_flat_f64(baskets: &[Vec<u8>], leaf_type: LeafType) -> Vec<f64> {
    let elem_size = leaf_type.byte_size();
    let mut out = Vec::new();
    for basket in baskets {
        let n = basket.len() / elem_size;
        for i in 0..n {
            out.push(decode_one_f64(basket, i * elem_size, leaf_type));
        }
    }
    out
}

/// Uniform per-entry offsets for a fixed-size array branch.
///
/// A flat length that does not divide evenly over the entries means the
/// basket data matches none of the supported jagged layouts.
fn fixed_array_offsets(flat_len: usize, entries: usize, branch: &str) -> Result<Vec<usize>> {
    if flat_len % entries != 0 {
        return Err(RootError::TypeMismatch(format!(
            "branch '{branch}' has no usable jagged layout: {flat_len} values over {entries} entries"
        )));
    }
    let elem_per_entry = flat_len / entries;
    Ok((0..=entries).map(|i| i * elem_per_entry).collect())
}
