pub mod datadog;

pub use datadog::DatadogClient;
