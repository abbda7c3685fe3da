//! Storyboard Crypto Codec
//!
//! Seals a serializable document into an opaque, authenticated blob and opens
//! it again. No I/O happens here.
//!
//! - [`encrypt`] / [`decrypt`]: one-shot functions over any serde type
//! - [`CryptoCodec`]: the same, bound to a [`StoryboardKey`]
//! - [`DecodeError`]: every way a blob can fail to open; callers treat it as
//!   "no usable document" rather than a crash
//!
//! # Example
//!
//! ```rust
//! use storyboard_codec::{decrypt, encrypt, StoryboardKey};
//!
//! let key = StoryboardKey::generate();
//! let blob = encrypt(&vec![1, 2, 3], &key).unwrap();
//! let back: Vec<i32> = decrypt(blob.as_str(), &key).unwrap();
//! assert_eq!(back, vec![1, 2, 3]);
//! ```

#![warn(unreachable_pub)]

mod codec;
mod key;

pub use codec::{decrypt, encrypt, CipherText, CryptoCodec, DecodeError, EncodeError};
pub use key::{KeyError, StoryboardKey, KEY_LEN};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
