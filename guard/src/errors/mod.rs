pub mod auth;
pub mod fault;
pub mod responses;
pub mod translator;

pub use auth::AuthError;
pub use fault::DomainFault;
pub use fault::FaultCode;
pub use responses::ErrorDescriptor;
pub use responses::ResponseEntry;
pub use responses::ResponseTable;
pub use translator::ErrorTranslator;
pub use translator::RenderedResponse;
pub use translator::ResponseFormat;
