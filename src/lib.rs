//! # bufchain
//!
//! Fixed-region input/output buffers that sit between raw byte resources
//! (files, serial ports, sockets) and the parsers and formatters above them.
//!
//! ## Overview
//!
//! Each buffer owns one fixed byte region with a read cursor (`position`)
//! and a content boundary (`limit`), and talks to exactly one neighbor in
//! its stream chain. Requests are served from the region whenever possible;
//! the neighbor is only called when the region cannot satisfy them. The
//! region never grows, so a request that cannot fit fails instead of
//! allocating.
//!
//! ## Key Features
//!
//! * **Zero-copy views**: `buffered`, `slice` and `next` borrow the region
//! * **Token scanning**: `next` refills and compresses until a scanner matches
//! * **Bypass paths**: transfers larger than the region skip the copy
//! * **Buffer sharing**: `chain::create_input` / `create_output` find an
//!   existing buffer in a chain instead of stacking a second one
//! * **Explicit end-of-data**: `Ok(None)` is distinct from a zero-byte transfer
//!
//! ## Quick Start
//!
//! ```rust
//! use bufchain::*;
//!
//! fn main() -> Result<()> {
//!     let mut out = OutputBuffer::with_capacity(MemoryResource::new(), 8);
//!     out.append(b"alpha,beta,")?;
//!     out.flush()?;
//!
//!     let device = MemoryResource::from_bytes(out.into_inner().into_contents());
//!     let mut input = InputBuffer::with_capacity(device, 8);
//!     let mut fields = Vec::new();
//!     while let Some(token) = input.next(&mut scan::delimiter(b','))? {
//!         fields.push(token.to_vec());
//!     }
//!     assert_eq!(fields, [b"alpha,".to_vec(), b"beta,".to_vec()]);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! * **`Source` / `Sink` / `Resource`**: the byte-resource contract buffers consume
//! * **`Upstream` / `Downstream`**: chain links with capability queries
//! * **`BufferedInput` / `BufferedOutput`**: the buffer capability other filters discover

pub mod chain;
pub mod error;
pub mod framing;
pub mod input;
pub mod memory;
pub mod output;
mod region;
pub mod resource;
pub mod scan;

// Re-export the main public API for user convenience.
pub use chain::{
    create_input, create_output, BufferedInput, BufferedOutput, Downstream, InputHandle, Mutator,
    Observed, OutputHandle, Upstream,
};
pub use error::{Error, Phase, Result};
pub use input::InputBuffer;
pub use memory::MemoryResource;
pub use output::OutputBuffer;
pub use resource::{IoResource, Resource, Sink, Source, StreamResource, DEFAULT_CHUNK_SIZE};
