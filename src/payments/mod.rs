mod braintree;

pub use braintree::{
    BraintreeClient, BraintreeConfig, BraintreeEnvironment, TransactionSummary,
    REQUEST_TIMEOUT_SECS,
};
