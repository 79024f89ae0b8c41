//! # respmat-root
//!
//! Native ROOT file reader and 2D response-matrix accumulation.
//!
//! Reads TTrees from `.root` files without Python or external ROOT
//! libraries. Supports zlib, LZ4, ZSTD, and XZ compression, scalar
//! branches, and jagged branches in the common Geant4 layouts
//! (entry-offset tables, unsplit `std::vector<T>`, fixed-size arrays).
//!
//! ## Example
//!
//! ```no_run
//! use respmat_root::{flatten_positive, Hist2D, RootFile};
//!
//! let f = RootFile::open("response.root").unwrap();
//! let tree = f.get_tree("events").unwrap();
//! let e0 = f.branch_data(&tree, "E0").unwrap();
//! let edep = f.branch_data_jagged(&tree, "edep").unwrap();
//!
//! let (xs, ys) = flatten_positive(&e0, &edep).unwrap();
//! let mut hist = Hist2D::response();
//! hist.fill_pairs(&xs, &ys).unwrap();
//! println!("counts: {}", hist.total());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod basket;
pub mod branch_reader;
pub mod datasource;
pub mod decompress;
pub mod directory;
pub mod error;
pub mod file;
pub mod filler;
pub mod hist2d;
pub mod key;
pub mod objects;
pub mod rbuffer;
pub mod tree;

pub use branch_reader::{BranchReader, JaggedCol};
pub use error::{Result, RootError};
pub use file::RootFile;
pub use filler::flatten_positive;
pub use hist2d::{Hist2D, RESPONSE_BINS, RESPONSE_MAX, RESPONSE_MIN};
pub use key::KeyInfo;
pub use tree::{BranchInfo, LeafType, Tree};
