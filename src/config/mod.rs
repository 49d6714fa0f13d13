pub mod play_config;
pub mod settings;

pub use play_config::PlayConfig;
pub use settings::Settings;
