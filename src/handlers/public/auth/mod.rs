pub mod login;
pub mod signup;

pub use login::login_post;
pub use signup::signup_post;

use serde::Deserialize;

/// Credentials payload shared by signup and login
#[derive(Debug, Deserialize)]
pub struct AuthRequest {
    pub username: String,
    pub password: String,
}
