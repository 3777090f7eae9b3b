pub mod auth;
pub mod categories;
pub mod contents;
pub mod faculties;
pub mod users;

pub use self::auth::model::LoginRequest;
pub use self::contents::model::Content;
pub use self::users::model::User;
