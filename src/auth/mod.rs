pub mod jwt;
pub mod login_flow;
pub mod password;

pub use jwt::{Claims, TokenService};
pub use login_flow::{LoginError, LoginFlow, LoginStep, PhoneProfile};
pub use password::{hash_password, verify_password, PasswordError};
