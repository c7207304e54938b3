//! Cursor module
//!
//! A cursor is the resume state of a paginated listing: a pivot position
//! (the leading ordering key of a reference record), an offset of
//! same-keyed records to skip past that pivot, and a direction flag.
//!
//! # Token format
//!
//! Cursors travel as opaque, URL-safe tokens. A token is the base64url
//! form of a form-urlencoded string of the non-default fields using the
//! short keys `o` (offset), `r` (reverse) and `p` (position). The
//! all-default cursor is the empty token.
//!
//! Tokens are compact, not tamper-proof: a client can decode and craft
//! them, which is why the offset is bounded by [`MAX_OFFSET`].
//!
//! [`MAX_OFFSET`]: crate::types::MAX_OFFSET

mod codec;

pub use codec::Cursor;
