pub mod config;
pub mod lifecycle;
pub mod notification;
pub mod settings;
pub mod store;
pub mod view;

pub use config::AppConfig;
pub use notification::{Notification, NotificationKind, NOTIFICATION_CAP};
pub use settings::{BackendMode, ParseSettingError, ResolvedTheme, Theme};
pub use store::{ClientState, ClientStore, DEFAULT_API_BASE_URL};
pub use view::{BindingName, View, ViewSelector};
