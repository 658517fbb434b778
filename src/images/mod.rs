pub mod services;

pub use services::UploadItem;
