pub mod app;
pub mod features;
pub mod shared;

pub use app::run;
pub use features::auth::{LoginClient, MockBackend};
pub use features::currency::{ConverterController, ConverterSession};
pub use shared::{AppError, AppResult};
