//! Page components.

mod editor;
mod home;
mod not_found;

pub use editor::EditorPage;
pub use home::HomePage;
pub use not_found::NotFoundPage;
