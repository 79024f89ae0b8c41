//! TTree and TBranch deserialization from ROOT streamer format.

use crate::error::{Result, RootError};
use crate::rbuffer::RBuffer;
use crate::tree::{BranchInfo, LeafType, Tree};

const K_BYTE_COUNT_MASK: u32 = 0x4000_0000;
const K_NEW_CLASS_TAG: u32 = 0xFFFF_FFFF;
const K_CLASS_MASK: u32 = 0x8000_0000;

/// Skip a versioned object by jumping to the end given by its byte count.
fn skip_versioned(r: &mut RBuffer) -> Result<()> {
    let (_ver, end) = r.read_version()?;
    if let Some(end_pos) = end {
        r.set_pos(end_pos);
    }
    Ok(())
}

/// Read a TTree from a decompressed TKey payload.
pub fn read_ttree(payload: &[u8]) -> Result<Tree> {
    let mut r = RBuffer::new(payload);

    let (tree_ver, tree_end) = r.read_version()?;
    let tree_end =
        tree_end.ok_or_else(|| RootError::Deserialization("TTree missing byte count".into()))?;

    let (name, _title) = r.read_tnamed()?;

    // TAttLine, TAttFill, TAttMarker
    skip_versioned(&mut r)?;
    skip_versioned(&mut r)?;
    skip_versioned(&mut r)?;

    let entries = r.read_i64()? as u64; // fEntries
    let _tot_bytes = r.read_i64()?;
    let _zip_bytes = r.read_i64()?;
    let _saved_bytes = r.read_i64()?;

    if tree_ver >= 18 {
        let _flushed_bytes = r.read_i64()?;
    }

    let _weight = r.read_f64()?;
    let _timer_interval = r.read_i32()?;
    let _scan_field = r.read_i32()?;
    let _update = r.read_i32()?;

    if tree_ver >= 18 {
        let _default_entry_offset_len = r.read_i32()?;
    }

    let n_cluster_range = if tree_ver >= 19 { r.read_i32()? } else { 0 };

    let _max_entries = r.read_i64()?;
    let _max_entry_loop = r.read_i64()?;
    let _max_virtual_size = r.read_i64()?;
    let _auto_save = r.read_i64()?;

    if tree_ver >= 18 {
        let _auto_flush = r.read_i64()?;
    }

    let _estimate = r.read_i64()?;

    // fClusterRangeEnd / fClusterSize (v19+). ROOT writes the UChar_t size
    // header even when n_cluster_range == 0.
    if tree_ver >= 19 {
        let _n = r.read_u8()?;
        for _ in 0..n_cluster_range {
            let _ = r.read_i64()?;
        }
        let _n = r.read_u8()?;
        for _ in 0..n_cluster_range {
            let _ = r.read_i64()?;
        }
    }

    // fIOFeatures (v20+): TBits, streamed as a versioned object.
    if tree_ver >= 20 {
        skip_versioned(&mut r)?;
    }

    // fBranches: TObjArray of TBranch
    let branches = read_tobjarray_branches(&mut r)?;

    // Remaining TTree members (aliases, friends, ...) are not needed.
    r.set_pos(tree_end);

    Ok(Tree { name, entries, branches })
}

/// State for the byte-offset class-reference system used inside TObjArray.
///
/// `kNewClassTag` introduces a new class name (NUL-terminated C string);
/// later elements reference it as `kClassMask | offset`, where `offset` is
/// the stream position of the introducing tag.
struct ClassRefTracker {
    classes: Vec<(usize, String)>,
}

impl ClassRefTracker {
    fn new() -> Self {
        Self { classes: Vec::new() }
    }

    fn lookup(&self, offset: usize) -> Option<&str> {
        self.classes
            .iter()
            .find(|(off, _)| *off == offset)
            .map(|(_, name)| name.as_str())
    }

    /// Read one TObjArray element header.
    ///
    /// Returns `(class_name, obj_end)`, where `obj_end` is the absolute
    /// position where this element ends, or `None` for a null entry.
    fn read_element(&mut self, r: &mut RBuffer) -> Result<Option<(String, usize)>> {
        let tag = r.read_u32()?;

        if tag == 0 {
            return Ok(None);
        }

        if tag & K_BYTE_COUNT_MASK == 0 {
            return Err(RootError::Deserialization(format!(
                "unexpected tag {:#010x} in TObjArray at pos {}",
                tag,
                r.pos() - 4
            )));
        }

        let byte_count = (tag & !K_BYTE_COUNT_MASK) as usize;
        let obj_end = r.pos() - 4 + 4 + byte_count;

        let class_tag_pos = r.pos();
        let class_tag = r.read_u32()?;

        let class_name = if class_tag == K_NEW_CLASS_TAG {
            let name = r.read_cstring()?;
            self.classes.push((class_tag_pos, name.clone()));
            name
        } else if class_tag & K_CLASS_MASK != 0 {
            let ref_offset = (class_tag & !K_CLASS_MASK) as usize;
            self.lookup(ref_offset)
                .map(str::to_owned)
                .ok_or_else(|| {
                    RootError::Deserialization(format!(
                        "class ref offset {} not found (tag={:#010x})",
                        ref_offset, class_tag
                    ))
                })?
        } else {
            return Err(RootError::Deserialization(format!(
                "unexpected class tag {:#010x} at pos {}",
                class_tag, class_tag_pos
            )));
        };

        Ok(Some((class_name, obj_end)))
    }
}

/// Read the TObjArray header shared by branch and leaf arrays.
///
/// Returns `(element_count, array_end)`.
fn read_tobjarray_header(r: &mut RBuffer) -> Result<(i32, usize)> {
    let (_ver, arr_end) = r.read_version()?;
    let arr_end =
        arr_end.ok_or_else(|| RootError::Deserialization("TObjArray missing byte count".into()))?;

    r.read_tobject()?;
    let _name = r.read_string()?;
    let count = r.read_i32()?;
    let _low_bound = r.read_i32()?;

    Ok((count, arr_end))
}

/// Read a TObjArray of TBranch objects.
fn read_tobjarray_branches(r: &mut RBuffer) -> Result<Vec<BranchInfo>> {
    let (count, arr_end) = read_tobjarray_header(r)?;

    let mut branches = Vec::new();
    let mut tracker = ClassRefTracker::new();

    for _ in 0..count {
        match tracker.read_element(r)? {
            None => {}
            Some((class_name, obj_end)) => {
                if class_name != "TBranch" {
                    log::debug!("reading non-TBranch branch class as TBranch: {}", class_name);
                }
                match read_tbranch(r) {
                    Ok(branch) => branches.push(branch),
                    Err(e) => {
                        log::debug!("skipping unreadable branch ({}): {}", class_name, e);
                        r.set_pos(obj_end);
                    }
                }
            }
        }
    }

    r.set_pos(arr_end);
    Ok(branches)
}

/// Skip a TObjArray whose contents are not needed.
fn skip_tobjarray(r: &mut RBuffer) -> Result<()> {
    skip_versioned(r)
}

/// Read a single TBranch.
fn read_tbranch(r: &mut RBuffer) -> Result<BranchInfo> {
    let (branch_ver, branch_end) = r.read_version()?;
    let branch_end = branch_end
        .ok_or_else(|| RootError::Deserialization("TBranch missing byte count".into()))?;

    let (name, _title) = r.read_tnamed()?;

    // TAttFill
    skip_versioned(r)?;

    let _compress = r.read_i32()?;
    let _basket_size = r.read_i32()?;
    let entry_offset_len = r.read_i32()?; // fEntryOffsetLen
    let write_basket = r.read_i32()?; // fWriteBasket
    let _entry_number = r.read_i64()?;

    // fIOFeatures (v13+)
    if branch_ver >= 13 {
        skip_versioned(r)?;
    }

    let _offset = r.read_i32()?;
    let max_baskets = r.read_i32()?;
    let _split_level = r.read_i32()?;
    let entries = r.read_i64()? as u64;

    if branch_ver >= 11 {
        let _first_entry = r.read_i64()?;
    }

    let _tot_bytes = r.read_i64()?;
    let _zip_bytes = r.read_i64()?;

    // fBranches (sub-branches): not needed for flat Geant4 ntuples
    skip_tobjarray(r)?;

    // fLeaves: take the leaf type of the first leaf
    let leaf_type = read_tobjarray_leaves(r)?;

    // fBaskets (in-memory baskets)
    skip_tobjarray(r)?;

    // Basket arrays are sized fMaxBaskets; only the first fWriteBasket
    // (fWriteBasket + 1 for fBasketEntry) slots hold written baskets.
    // Each TArray is preceded by a 1-byte count.
    let n_baskets = write_basket as usize;
    let max = max_baskets as usize;

    let _n = r.read_u8()?;
    for _ in 0..max {
        let _basket_bytes = r.read_i32()?;
    }

    let _n = r.read_u8()?;
    let mut basket_entry = Vec::with_capacity(n_baskets + 1);
    for i in 0..max {
        let v = r.read_i64()? as u64;
        if i <= n_baskets {
            basket_entry.push(v);
        }
    }

    let _n = r.read_u8()?;
    let mut basket_seek = Vec::with_capacity(n_baskets);
    for i in 0..max {
        let v = r.read_i64()? as u64;
        if i < n_baskets {
            basket_seek.push(v);
        }
    }

    if branch_end > r.pos() {
        r.set_pos(branch_end);
    }

    Ok(BranchInfo {
        name,
        leaf_type: leaf_type.unwrap_or(LeafType::F64),
        entries,
        entry_offset_len,
        basket_entry,
        basket_seek,
        n_baskets,
    })
}

/// Read a TObjArray of TLeaf objects; return the type of the first leaf.
fn read_tobjarray_leaves(r: &mut RBuffer) -> Result<Option<LeafType>> {
    let (count, arr_end) = read_tobjarray_header(r)?;

    let mut leaf_type = None;
    let mut tracker = ClassRefTracker::new();

    for _ in 0..count {
        if let Some((class_name, obj_end)) = tracker.read_element(r)? {
            // The leaf body itself is not parsed; the class name determines
            // the element type (TLeafElement yields None → caller defaults).
            if leaf_type.is_none() {
                leaf_type = leaf_type_from_class(&class_name);
            }
            r.set_pos(obj_end);
        }
    }

    r.set_pos(arr_end);
    Ok(leaf_type)
}

/// Map a TLeaf class name to a `LeafType`.
fn leaf_type_from_class(class_name: &str) -> Option<LeafType> {
    match class_name {
        "TLeafF" => Some(LeafType::F32),
        "TLeafD" => Some(LeafType::F64),
        "TLeafI" => Some(LeafType::I32),
        "TLeafL" => Some(LeafType::I64),
        "TLeafS" => Some(LeafType::I16),
        "TLeafB" => Some(LeafType::I8),
        "TLeafO" => Some(LeafType::Bool),
        _ => None,
    }
}
