//! Variance-stabilising and differencing transforms.
//!
//! # Example
//!
//! ```
//! use retail_forecast::transform::{boxcox, inv_boxcox, difference};
//!
//! let sales = vec![120.0, 135.0, 150.0, 171.0];
//! let logged = boxcox(&sales, 0.0).unwrap();
//! let back = inv_boxcox(&logged, 0.0);
//! assert!((back[3] - 171.0).abs() < 1e-9);
//!
//! assert_eq!(difference(&sales, 1), vec![15.0, 15.0, 21.0]);
//! ```

pub mod boxcox;
pub mod diff;

pub use boxcox::{
    boxcox, boxcox_lambda, boxcox_value, inv_boxcox, inv_boxcox_value, LambdaMethod,
};
pub use diff::{difference, difference_polynomial, integrate, poly_mul, seasonal_difference};
