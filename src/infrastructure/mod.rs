//! 基础设施层
//!
//! 持有稀缺资源（浏览器页面），只暴露能力。

pub mod chrome_driver;
pub mod driver;
pub mod locator;

pub use chrome_driver::{ChromeDriver, ChromeDriverFactory};
pub use driver::{Driver, DriverFactory, Selector};
pub use locator::{
    first_success, LocatorAction, LocatorAttempt, LocatorFailure, LocatorHit, LocatorStrategy,
};
