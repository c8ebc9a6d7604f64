// Module declarations
pub mod backstop;
pub mod client;

// Re-export commonly used types
pub use backstop::{
    BackstopConfig, BackstopPoolBalance, BackstopPoolUser, BackstopToken, Q4W, UserBalance,
    UserEmissions,
};
pub use client::BlendClient;
