/// Capture collaborator interface.
pub mod capture;
/// Console command parsing.
pub mod console;
/// Async event loop driving a game session.
pub mod session_driver;
