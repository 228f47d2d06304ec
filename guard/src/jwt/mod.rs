pub mod claims;
pub mod codec;
pub mod errors;
pub mod options;

pub use claims::Claims;
pub use codec::TokenCodec;
pub use errors::CodecError;
pub use options::Lifetime;
pub use options::OneOrMany;
pub use options::TokenOptions;
