mod session;
mod sign_in;

pub use session::GameSessionUseCase;
pub use sign_in::{FirstProfile, ProfileByUsername, SignInUseCase};
