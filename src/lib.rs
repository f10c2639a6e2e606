//! Line Top - a row <-> pixel index for editors with variable-height blocks.
//!
//! Every row of a document has the same default height, but blocks (inline
//! widgets, diagnostics, folded regions) can add extra vertical space at
//! any logical position. The index answers "where does row N start" and
//! "which row is at pixel P" in O(log n) and keeps block anchors in step
//! with document edits.
//!
//! # Quick Start
//!
//! ```
//! use line_top::LineTopIndex;
//! use line_top::Params;
//!
//! let mut index: LineTopIndex<u32> = LineTopIndex::with_params(Params {
//!     default_line_height: 10,
//!     seed: Some(7),
//! });
//!
//! // A 20px block above row 3.
//! index.insert_block(1, 3, false, 20);
//! assert_eq!(index.pixel_position_for_row(3), 50);
//! assert_eq!(index.row_for_pixel_position(45), 3);
//!
//! // Insert four rows at the top of the document.
//! index.splice(0, 0, 4, false);
//! assert_eq!(index.block_position(1), Some(7));
//! ```

mod cursor;
pub mod error;
pub mod index;
pub mod linear;
mod node;
pub mod position;
mod tree;

pub use error::Error;
pub use index::BlockId;
pub use index::LineTopIndex;
pub use index::Params;
pub use linear::LinearLineTopIndex;
pub use position::Anchor;
pub use position::LogicalPosition;
pub use position::Point;
