// Library root. The binary in `src/main.rs` is a thin headless renderer on
// top of these modules; integration tests in `tests/` use them directly.

pub mod autostart;
pub mod credentials;
pub mod error;
pub mod monitors;
pub mod presentation;
pub mod provider;
pub mod region;
pub mod scheduler;
pub mod services;

pub mod cli;
pub mod config;
pub mod logging;

pub use credentials::{CredentialStore, Credentials};
pub use error::{AlertError, AppError};
pub use monitors::{Alert, MonitorState};
pub use presentation::{BadgeTier, PresentationState};
pub use region::RegionId;
pub use scheduler::{spawn_monitor, MonitorHandle};
