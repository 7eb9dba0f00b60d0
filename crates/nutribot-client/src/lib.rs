//! Client for the remote Analysis and Nutrition Lookup services.
//!
//! [`FoodService`] is the seam the conversation controller talks to;
//! [`HttpFoodService`] is the production implementation over reqwest.

pub mod error;
pub mod http;
pub mod service;

pub use error::ServiceError;
pub use http::HttpFoodService;
pub use service::{AnalysisInput, FoodService, ImageUpload};
