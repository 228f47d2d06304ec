pub mod defaults;
pub mod errors;
pub mod settings;
pub mod store;

pub use errors::ConfigError;
pub use settings::BlacklistSettings;
pub use settings::EncryptionSettings;
pub use settings::ExtractSettings;
pub use settings::JwtSettings;
pub use settings::Settings;
pub use store::ConfigStore;
