//! Sensor subsystem — the ADC read path and the averaging that turns raw
//! conversions into a baseline.

pub mod adc;
pub mod baseline;
pub mod rolling_average;

pub use baseline::BaselineEstimator;
pub use rolling_average::RollingAverage;
