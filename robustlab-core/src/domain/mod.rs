//! Domain types: portfolios, strategy parameters, price series, date windows.

pub mod params;
pub mod portfolio;
pub mod price;
pub mod window;

pub use params::{ParamValue, StrategyParams};
pub use portfolio::{Portfolio, PortfolioError};
pub use price::{PricePoint, PriceSeries};
pub use window::DateWindow;
