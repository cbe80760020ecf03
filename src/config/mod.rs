//! Configuration loading.

mod settings;

pub use settings::{
    expand_env_vars, GeneratorSettings, MetadataSettings, ModelSettings, Settings, SettingsError,
};
