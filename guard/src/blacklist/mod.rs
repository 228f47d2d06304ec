pub mod driver;
pub mod errors;
pub mod memory;
pub mod registry;

pub use driver::BlacklistDriver;
pub use errors::BlacklistError;
pub use memory::MemoryBlacklist;
pub use memory::MemoryDriverParams;
pub use registry::DriverRegistry;
