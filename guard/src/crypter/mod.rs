pub mod envelope;

pub use envelope::Envelope;
pub use envelope::EnvelopeAlgorithm;
