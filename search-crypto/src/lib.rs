pub mod codec;
pub mod errors;
pub mod gf2;
pub mod keypair;
pub mod polynomial;
pub mod search;
