//! Core logic for the virtual try-on application.
//!
//! This crate holds everything that does not need a network or a runtime:
//!
//! - [`pose`] - carousel navigation between the full pose catalog and the
//!   poses currently available to the user
//! - [`compare`] - the before/after comparison slider state machine
//! - [`data_url`] - parsing and formatting of `data:<mime>;base64,<payload>` images
//! - [`request`] - the generation request model and its validation
//! - [`prompt`] - the fixed instructions sent to the image model
//! - [`error`] - the proxy error taxonomy
//!
//! The HTTP surface lives in `tryon-server`.
//!
//! # Example
//!
//! ```
//! use tryon_core::pose::{self, DEFAULT_POSE_INSTRUCTIONS};
//!
//! let all: Vec<String> = DEFAULT_POSE_INSTRUCTIONS.iter().map(|s| s.to_string()).collect();
//! let available = vec![all[0].clone(), all[2].clone()];
//!
//! assert_eq!(pose::next(0, &all, &available), Some(2));
//! assert_eq!(pose::previous(0, &all, &available), Some(2));
//! ```

pub mod compare;
pub mod data_url;
pub mod error;
pub mod pose;
pub mod prompt;
pub mod request;

pub use compare::{ComparePair, ComparisonSlider, ContainerRect, SlideMode, SliderInput};
pub use data_url::{DataUrl, DataUrlError};
pub use error::{ProxyError, ProxyResult};
pub use pose::{Direction, PoseCatalog, PoseNavigator};
pub use request::{Action, GenerateBody, GenerationRequest};
