pub mod model;

pub use model::{Payment, PaymentState};
