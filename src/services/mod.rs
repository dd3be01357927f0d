pub mod payment;

pub use payment::PaymentSimulator;
