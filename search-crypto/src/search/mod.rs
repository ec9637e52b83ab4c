//! # Search Module
//!
//! The searchable-encryption protocol: a searcher holds an
//! [`EncryptedSearchPrivateKey`] and a keypair, turns terms into encrypted
//! tokens and publishes blinded [`QueryHasherPair`]s; a document owner holds
//! an [`EncryptedSearchSharingKey`]; an [`EncryptedSearchBridgeKey`] lets a
//! server test hasher outputs against document index values.

pub mod bridge_key;
pub mod hashing;
pub mod params;
pub mod private_key;
pub mod sharing_key;

pub use bridge_key::EncryptedSearchBridgeKey;
pub use hashing::{HashAlgorithm, HashConfig};
pub use params::SearchParams;
pub use private_key::{EncryptedSearchPrivateKey, QueryHasherPair};
pub use sharing_key::EncryptedSearchSharingKey;
