pub mod amount;
pub mod percentage;

pub use amount::{Amount, MAX_DECIMALS, TOKEN_DECIMALS};
pub use percentage::Percentage;
