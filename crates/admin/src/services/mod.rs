//! External services proxied for the admin UI.
//!
//! # Services
//!
//! - `photos` - Google Photos album creation and sharing
//! - `weather` - Today's forecast summary from `OpenWeatherMap`

pub mod photos;
pub mod weather;

pub use photos::{GooglePhotosClient, PhotosApi, PhotosError};
pub use weather::{WeatherClient, WeatherError, WeatherSummary};
