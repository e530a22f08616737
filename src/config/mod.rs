//! Form configuration parsing, validation and settings storage

pub mod app_config;
pub mod parser;
pub mod persistence;
pub mod settings;
pub mod validator;

pub use app_config::{AppConfig, AppConfigError};
pub use parser::{parse_config, ConfigParser, ConfigSyntaxError};
pub use persistence::{JsonFileStore, KeyValueStore, MemoryStore, StoreError};
pub use settings::{SettingKey, Settings};
pub use validator::{
    validate_file_name, validate_row, FieldError, FieldErrorKind, FileNameError, RowValidator,
    MAX_FILE_NAME_LENGTH, MAX_TEXT_LENGTH,
};
