pub mod paths;
pub mod settings;

pub use settings::{CredentialPolicy, HostKeyPolicy, Settings};
