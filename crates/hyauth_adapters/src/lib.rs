pub mod configuration;
pub mod device_auth;
pub mod network;
pub mod profiles;
pub mod session_store;
pub mod sessions;
pub mod telemetry;

// Re-exports for convenience
pub use device_auth::HttpDeviceAuthorizer;
pub use network::build_http_client;
pub use profiles::HttpProfileDirectory;
pub use session_store::FileSessionStore;
pub use sessions::HttpGameSessionService;
