//! Synthetic ROOT file writer for integration tests.
//!
//! Produces a small ROOT file containing one `events` TTree with a scalar
//! `E0` branch and a jagged `edep` branch, in any of the basket layouts
//! the reader supports. Baskets are stored raw or as zlib `ZL` blocks.

#![allow(dead_code)]

/// Basket layout used for the `edep` branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdepLayout {
    /// Entry-offset table at the basket tail, raw elements per entry.
    OffsetTable,
    /// Unsplit `std::vector<double>`: `[len][elems...]` per entry.
    UnsplitVector,
    /// Fixed-size array: all entries must have the same length.
    FixedArray,
}

const BEGIN: u32 = 100;
const TREE_NAME: &str = "events";
const FILE_NAME: &str = "response.root";

/// Build a ROOT file with `E0`/`edep` branches, one basket per branch.
pub fn response_file(e0: &[f64], edep: &[Vec<f64>], layout: EdepLayout) -> Vec<u8> {
    response_file_chunked(e0, edep, layout, e0.len().max(1))
}

/// Like [`response_file`], but with every basket zlib-compressed.
pub fn response_file_zlib(e0: &[f64], edep: &[Vec<f64>], layout: EdepLayout) -> Vec<u8> {
    build_response_file(e0, edep, layout, e0.len().max(1), true)
}

/// Like [`response_file`], but splitting both branches into baskets of at
/// most `chunk` entries.
pub fn response_file_chunked(
    e0: &[f64],
    edep: &[Vec<f64>],
    layout: EdepLayout,
    chunk: usize,
) -> Vec<u8> {
    build_response_file(e0, edep, layout, chunk, false)
}

fn build_response_file(
    e0: &[f64],
    edep: &[Vec<f64>],
    layout: EdepLayout,
    chunk: usize,
    zlib: bool,
) -> Vec<u8> {
    assert_eq!(e0.len(), edep.len(), "fixture branches must align");
    assert!(chunk > 0);
    if layout == EdepLayout::FixedArray {
        let k = edep.first().map(Vec::len).unwrap_or(0);
        assert!(
            edep.iter().all(|row| row.len() == k),
            "FixedArray layout requires uniform row length"
        );
    }

    let entries = e0.len() as u64;
    let mut buf = vec![0u8; BEGIN as usize];

    // Name record at fBEGIN: a TKey followed by TNamed-ish content. The
    // reader only uses its length to find the directory streamer.
    let mut name_obj = Vec::new();
    push_string(&mut name_obj, FILE_NAME);
    push_string(&mut name_obj, "");
    append_object(&mut buf, "TFile", FILE_NAME, "", &name_obj);
    let nbytes_name = buf.len() as u32 - BEGIN;

    // TDirectory streamer; fNbytesKeys and fSeekKeys patched at the end.
    let dir_pos = buf.len();
    buf.extend_from_slice(&5u16.to_be_bytes()); // version
    buf.extend_from_slice(&0u32.to_be_bytes()); // datime created
    buf.extend_from_slice(&0u32.to_be_bytes()); // datime modified
    buf.extend_from_slice(&0u32.to_be_bytes()); // fNbytesKeys (patched)
    buf.extend_from_slice(&nbytes_name.to_be_bytes());
    buf.extend_from_slice(&BEGIN.to_be_bytes()); // fSeekDir
    buf.extend_from_slice(&0u32.to_be_bytes()); // fSeekParent
    buf.extend_from_slice(&0u32.to_be_bytes()); // fSeekKeys (patched)

    // Baskets.
    let boundaries = chunk_boundaries(e0.len(), chunk);
    let mut e0_baskets = BasketSet::default();
    for w in boundaries.windows(2) {
        let payload: Vec<u8> = e0[w[0]..w[1]]
            .iter()
            .flat_map(|v| v.to_be_bytes())
            .collect();
        e0_baskets.append(&mut buf, "E0", &payload, zlib);
    }

    let edep_key_len = key_len("TBasket", "edep", TREE_NAME);
    let mut edep_baskets = BasketSet::default();
    for w in boundaries.windows(2) {
        let rows = &edep[w[0]..w[1]];
        let payload = match layout {
            EdepLayout::OffsetTable => offset_table_payload(rows, edep_key_len),
            EdepLayout::UnsplitVector => unsplit_vector_payload(rows),
            EdepLayout::FixedArray => rows
                .iter()
                .flatten()
                .flat_map(|v| v.to_be_bytes())
                .collect(),
        };
        edep_baskets.append(&mut buf, "edep", &payload, zlib);
    }

    let entry_bounds: Vec<u64> = boundaries.iter().map(|&b| b as u64).collect();
    let branches = [
        BranchSpec {
            name: "E0",
            title: "E0/D",
            leaf_class: "TLeafD",
            entry_offset_len: 0,
            entries,
            basket_entry: entry_bounds.clone(),
            baskets: e0_baskets,
        },
        BranchSpec {
            name: "edep",
            title: "edep",
            leaf_class: match layout {
                EdepLayout::OffsetTable | EdepLayout::FixedArray => "TLeafD",
                EdepLayout::UnsplitVector => "TLeafElement",
            },
            entry_offset_len: match layout {
                EdepLayout::OffsetTable => 1000,
                _ => 0,
            },
            entries,
            basket_entry: entry_bounds,
            baskets: edep_baskets,
        },
    ];

    // TTree object.
    let tree_payload = tree_payload(entries, &branches);
    let (tree_seek, _) = append_object(&mut buf, "TTree", TREE_NAME, TREE_NAME, &tree_payload);
    let tree_key = key_record(
        "TTree",
        TREE_NAME,
        TREE_NAME,
        tree_payload.len() as u32,
        tree_payload.len() as u32,
        tree_seek,
    );

    // Key list.
    let seek_keys = buf.len() as u32;
    let mut list_obj = Vec::new();
    list_obj.extend_from_slice(&1u32.to_be_bytes());
    list_obj.extend_from_slice(&tree_key);
    append_object(&mut buf, "TFile", FILE_NAME, "", &list_obj);
    let nbytes_keys = buf.len() as u32 - seek_keys;

    patch_u32(&mut buf, dir_pos + 10, nbytes_keys);
    patch_u32(&mut buf, dir_pos + 26, seek_keys);

    write_file_header(&mut buf, nbytes_name);
    buf
}

// ── TKey records ───────────────────────────────────────────────

fn key_len(class: &str, name: &str, title: &str) -> u16 {
    (26 + 3 + class.len() + name.len() + title.len()) as u16
}

fn key_record(
    class: &str,
    name: &str,
    title: &str,
    obj_len: u32,
    stored_len: u32,
    seek: u32,
) -> Vec<u8> {
    let key_len = key_len(class, name, title);
    let mut k = Vec::new();
    k.extend_from_slice(&(key_len as u32 + stored_len).to_be_bytes()); // fNbytes
    k.extend_from_slice(&4u16.to_be_bytes()); // key version
    k.extend_from_slice(&obj_len.to_be_bytes());
    k.extend_from_slice(&0u32.to_be_bytes()); // datime
    k.extend_from_slice(&key_len.to_be_bytes());
    k.extend_from_slice(&1u16.to_be_bytes()); // cycle
    k.extend_from_slice(&seek.to_be_bytes());
    k.extend_from_slice(&BEGIN.to_be_bytes()); // seek_pdir
    push_string(&mut k, class);
    push_string(&mut k, name);
    push_string(&mut k, title);
    assert_eq!(k.len(), key_len as usize);
    k
}

/// Append a TKey + uncompressed object; returns (seek, total record length).
fn append_object(
    buf: &mut Vec<u8>,
    class: &str,
    name: &str,
    title: &str,
    obj: &[u8],
) -> (u32, usize) {
    let seek = buf.len() as u32;
    let key = key_record(class, name, title, obj.len() as u32, obj.len() as u32, seek);
    let total = key.len() + obj.len();
    buf.extend_from_slice(&key);
    buf.extend_from_slice(obj);
    (seek, total)
}

/// Append a TKey + object stored as a single ROOT `ZL` block (9-byte
/// header, little-endian 24-bit sizes, zlib stream).
fn append_zlib_object(
    buf: &mut Vec<u8>,
    class: &str,
    name: &str,
    title: &str,
    obj: &[u8],
) -> (u32, usize) {
    use flate2::Compression;
    use flate2::write::ZlibEncoder;
    use std::io::Write;

    let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
    enc.write_all(obj).unwrap();
    let deflated = enc.finish().unwrap();

    let mut stored = Vec::with_capacity(9 + deflated.len());
    stored.extend_from_slice(b"ZL");
    stored.push(8); // method: deflate
    for shift in [0, 8, 16] {
        stored.push((deflated.len() >> shift) as u8);
    }
    for shift in [0, 8, 16] {
        stored.push((obj.len() >> shift) as u8);
    }
    stored.extend_from_slice(&deflated);

    let seek = buf.len() as u32;
    let key = key_record(class, name, title, obj.len() as u32, stored.len() as u32, seek);
    let total = key.len() + stored.len();
    buf.extend_from_slice(&key);
    buf.extend_from_slice(&stored);
    (seek, total)
}

#[derive(Default)]
struct BasketSet {
    seeks: Vec<u64>,
    nbytes: Vec<u32>,
}

impl BasketSet {
    fn append(&mut self, buf: &mut Vec<u8>, branch: &str, payload: &[u8], zlib: bool) {
        let (seek, total) = if zlib {
            append_zlib_object(buf, "TBasket", branch, TREE_NAME, payload)
        } else {
            append_object(buf, "TBasket", branch, TREE_NAME, payload)
        };
        self.seeks.push(seek as u64);
        self.nbytes.push(total as u32);
    }

    fn len(&self) -> usize {
        self.seeks.len()
    }
}

// ── Basket payloads ────────────────────────────────────────────

fn offset_table_payload(rows: &[Vec<f64>], key_len: u16) -> Vec<u8> {
    let mut data = Vec::new();
    let mut offsets = Vec::with_capacity(rows.len() + 1);
    for row in rows {
        offsets.push(key_len as u32 + data.len() as u32);
        for v in row {
            data.extend_from_slice(&v.to_be_bytes());
        }
    }
    offsets.push(key_len as u32 + data.len() as u32);

    let mut payload = data;
    payload.extend_from_slice(&(offsets.len() as u32).to_be_bytes());
    for off in offsets {
        payload.extend_from_slice(&off.to_be_bytes());
    }
    payload
}

fn unsplit_vector_payload(rows: &[Vec<f64>]) -> Vec<u8> {
    let mut payload = Vec::new();
    for row in rows {
        payload.extend_from_slice(&(row.len() as u32).to_be_bytes());
        for v in row {
            payload.extend_from_slice(&v.to_be_bytes());
        }
    }
    payload
}

// ── Streamer payloads ──────────────────────────────────────────

struct BranchSpec {
    name: &'static str,
    title: &'static str,
    leaf_class: &'static str,
    entry_offset_len: i32,
    entries: u64,
    /// `n_baskets + 1` entry boundaries.
    basket_entry: Vec<u64>,
    baskets: BasketSet,
}

const K_BYTE_COUNT: u32 = 0x4000_0000;
const K_NEW_CLASS: u32 = 0xFFFF_FFFF;
const K_CLASS_REF: u32 = 0x8000_0000;

/// Apprentice of ROOT's TBufferFile: big-endian writes with byte-count
/// patching for versioned objects.
struct StreamWriter {
    buf: Vec<u8>,
}

impl StreamWriter {
    fn new() -> Self {
        Self { buf: Vec::new() }
    }

    fn u8(&mut self, v: u8) {
        self.buf.push(v);
    }
    fn u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }
    fn u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }
    fn i32(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }
    fn i64(&mut self, v: i64) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }
    fn f64(&mut self, v: f64) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    fn string(&mut self, s: &str) {
        push_string(&mut self.buf, s);
    }

    fn cstring(&mut self, s: &str) {
        self.buf.extend_from_slice(s.as_bytes());
        self.buf.push(0);
    }

    /// Start a versioned object; returns the patch position.
    fn begin_versioned(&mut self, ver: u16) -> usize {
        let at = self.buf.len();
        self.u32(0); // byte count placeholder
        self.u16(ver);
        at
    }

    /// Patch the byte count of a versioned object started at `at`.
    fn end_versioned(&mut self, at: usize) {
        let bc = (self.buf.len() - at - 4) as u32;
        self.buf[at..at + 4].copy_from_slice(&(K_BYTE_COUNT | bc).to_be_bytes());
    }

    /// A versioned object with no members beyond the version word.
    fn empty_versioned(&mut self, ver: u16) {
        let at = self.begin_versioned(ver);
        self.end_versioned(at);
    }

    fn tobject(&mut self) {
        self.u16(1); // TObject version
        self.u32(0); // fUniqueID
        self.u32(0x0300_0000); // fBits
    }

    fn tnamed(&mut self, name: &str, title: &str) {
        let at = self.begin_versioned(1);
        self.tobject();
        self.string(name);
        self.string(title);
        self.end_versioned(at);
    }

    fn empty_tobjarray(&mut self) {
        let at = self.begin_versioned(3);
        self.tobject();
        self.string("");
        self.i32(0); // size
        self.i32(0); // lower bound
        self.end_versioned(at);
    }

    /// Start a TObjArray element. Registers/references the class via the
    /// byte-offset reference system; returns the element patch position.
    fn begin_element(&mut self, class: &str, registry: &mut Vec<(String, u32)>) -> usize {
        let at = self.buf.len();
        self.u32(0); // element byte count placeholder
        match registry.iter().find(|(name, _)| name == class) {
            Some((_, tag_pos)) => {
                let tag_pos = *tag_pos;
                self.u32(K_CLASS_REF | tag_pos);
            }
            None => {
                let tag_pos = self.buf.len() as u32;
                self.u32(K_NEW_CLASS);
                self.cstring(class);
                registry.push((class.to_string(), tag_pos));
            }
        }
        at
    }

    fn end_element(&mut self, at: usize) {
        self.end_versioned(at);
    }
}

fn tree_payload(entries: u64, branches: &[BranchSpec]) -> Vec<u8> {
    let mut w = StreamWriter::new();
    let tree = w.begin_versioned(19);

    w.tnamed(TREE_NAME, TREE_NAME);
    w.empty_versioned(2); // TAttLine
    w.empty_versioned(2); // TAttFill
    w.empty_versioned(2); // TAttMarker

    w.i64(entries as i64); // fEntries
    w.i64(0); // fTotBytes
    w.i64(0); // fZipBytes
    w.i64(0); // fSavedBytes
    w.i64(0); // fFlushedBytes
    w.f64(1.0); // fWeight
    w.i32(0); // fTimerInterval
    w.i32(25); // fScanField
    w.i32(0); // fUpdate
    w.i32(1000); // fDefaultEntryOffsetLen
    w.i32(0); // fNClusterRange
    w.i64(1_000_000_000_000); // fMaxEntries
    w.i64(0); // fMaxEntryLoop
    w.i64(0); // fMaxVirtualSize
    w.i64(-300_000_000); // fAutoSave
    w.i64(-30_000_000); // fAutoFlush
    w.i64(1_000_000); // fEstimate
    w.u8(0); // fClusterRangeEnd size
    w.u8(0); // fClusterSize size

    // fBranches
    let arr = w.begin_versioned(3);
    w.tobject();
    w.string("");
    w.i32(branches.len() as i32);
    w.i32(0);
    let mut registry = Vec::new();
    for spec in branches {
        let elem = w.begin_element("TBranch", &mut registry);
        write_branch(&mut w, spec);
        w.end_element(elem);
    }
    w.end_versioned(arr);

    w.end_versioned(tree);
    w.buf
}

fn write_branch(w: &mut StreamWriter, spec: &BranchSpec) {
    let n_baskets = spec.baskets.len();
    let max_baskets = n_baskets + 1;
    assert_eq!(spec.basket_entry.len(), n_baskets + 1);

    let branch = w.begin_versioned(13);
    w.tnamed(spec.name, spec.title);
    w.empty_versioned(2); // TAttFill

    w.i32(0); // fCompress
    w.i32(32000); // fBasketSize
    w.i32(spec.entry_offset_len); // fEntryOffsetLen
    w.i32(n_baskets as i32); // fWriteBasket
    w.i64(spec.entries as i64); // fEntryNumber
    w.empty_versioned(1); // fIOFeatures
    w.i32(0); // fOffset
    w.i32(max_baskets as i32); // fMaxBaskets
    w.i32(0); // fSplitLevel
    w.i64(spec.entries as i64); // fEntries
    w.i64(0); // fFirstEntry
    w.i64(0); // fTotBytes
    w.i64(0); // fZipBytes

    w.empty_tobjarray(); // fBranches

    // fLeaves: one leaf; only the class name matters to the reader.
    let arr = w.begin_versioned(3);
    w.tobject();
    w.string("");
    w.i32(1);
    w.i32(0);
    let mut registry = Vec::new();
    let elem = w.begin_element(spec.leaf_class, &mut registry);
    w.empty_versioned(1); // leaf body (unread)
    w.end_element(elem);
    w.end_versioned(arr);

    w.empty_tobjarray(); // fBaskets

    w.u8(max_baskets as u8); // fBasketBytes
    for i in 0..max_baskets {
        w.i32(spec.baskets.nbytes.get(i).copied().unwrap_or(0) as i32);
    }
    w.u8(max_baskets as u8); // fBasketEntry
    for i in 0..max_baskets {
        w.i64(spec.basket_entry[i] as i64);
    }
    w.u8(max_baskets as u8); // fBasketSeek
    for i in 0..max_baskets {
        w.i64(spec.baskets.seeks.get(i).copied().unwrap_or(0) as i64);
    }

    w.end_versioned(branch);
}

// ── File header ────────────────────────────────────────────────

fn write_file_header(buf: &mut Vec<u8>, nbytes_name: u32) {
    let end = buf.len() as u32;
    let mut h = Vec::with_capacity(BEGIN as usize);
    h.extend_from_slice(b"root");
    h.extend_from_slice(&63200u32.to_be_bytes()); // fVersion
    h.extend_from_slice(&BEGIN.to_be_bytes());
    h.extend_from_slice(&end.to_be_bytes());
    h.extend_from_slice(&end.to_be_bytes()); // fSeekFree
    h.extend_from_slice(&0u32.to_be_bytes()); // fNbytesFree
    h.extend_from_slice(&1u32.to_be_bytes()); // nfree
    h.extend_from_slice(&nbytes_name.to_be_bytes());
    h.push(4); // fUnits
    h.extend_from_slice(&0u32.to_be_bytes()); // fCompress
    h.extend_from_slice(&0u32.to_be_bytes()); // fSeekInfo
    h.extend_from_slice(&0u32.to_be_bytes()); // fNbytesInfo
    h.resize(BEGIN as usize, 0); // fUUID + padding
    buf[..BEGIN as usize].copy_from_slice(&h);
}

// ── Small helpers ──────────────────────────────────────────────

fn push_string(buf: &mut Vec<u8>, s: &str) {
    assert!(s.len() < 255);
    buf.push(s.len() as u8);
    buf.extend_from_slice(s.as_bytes());
}

fn patch_u32(buf: &mut [u8], at: usize, v: u32) {
    buf[at..at + 4].copy_from_slice(&v.to_be_bytes());
}

fn chunk_boundaries(n: usize, chunk: usize) -> Vec<usize> {
    let mut bounds = vec![0];
    let mut i = 0;
    while i < n {
        i = (i + chunk).min(n);
        bounds.push(i);
    }
    if bounds.len() == 1 {
        bounds.push(0);
    }
    bounds
}
