pub mod subscription_files;

pub use subscription_files::*;
