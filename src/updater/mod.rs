//! Distribution updaters
//!
//! This module provides the cost-to-weight transforms and the interchangeable
//! update policies (mean-only, covariance decay, covariance adaptation).

pub mod config;
pub mod covar_adaptation;
pub mod covar_decay;
pub mod mean;
pub mod traits;
pub mod weighting;

pub use config::*;
pub use covar_adaptation::*;
pub use covar_decay::*;
pub use mean::*;
pub use traits::*;
pub use weighting::*;

pub mod prelude {
    pub use super::config::*;
    pub use super::covar_adaptation::*;
    pub use super::covar_decay::*;
    pub use super::mean::*;
    pub use super::traits::*;
    pub use super::weighting::*;
}
