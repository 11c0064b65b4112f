//! 登录服务 - 业务能力层
//!
//! 每个任务开始前登录一次，失败即任务失败。

use std::time::Duration;

use tracing::{debug, info};

use crate::config::{Config, Credentials};
use crate::error::{AuthenticationError, DriverError};
use crate::infrastructure::{first_success, Driver, LocatorFailure, LocatorStrategy};
use crate::workflow::locators;

pub struct AuthService {
    login_url: String,
    credentials: Credentials,
    step_timeout: Duration,
    /// 登录后等待跳转完成的上限
    confirm_timeout: Duration,
}

impl AuthService {
    pub fn new(config: &Config) -> Self {
        Self {
            login_url: config.login_url.clone(),
            credentials: config.credentials.clone(),
            step_timeout: config.step_timeout(),
            confirm_timeout: config.page_timeout(),
        }
    }

    pub async fn login<D: Driver>(&self, driver: &D) -> Result<(), AuthenticationError> {
        if !self.credentials.is_complete() {
            return Err(AuthenticationError::MissingCredentials);
        }

        info!("🔐 正在登录...");
        driver
            .navigate(&self.login_url)
            .await
            .map_err(|source| AuthenticationError::Step {
                step: "open_login_page",
                source,
            })?;

        self.step(
            driver,
            "email",
            &locators::login_email_field(&self.credentials.username),
        )
        .await?;
        self.step(
            driver,
            "password",
            &locators::login_password_field(&self.credentials.password),
        )
        .await?;
        self.step(driver, "submit", &locators::login_button()).await?;

        // 登录跳转需要时间，轮询等待已登录标志
        first_success(driver, &locators::logged_in_marker(), self.confirm_timeout)
            .await
            .map_err(|failure| AuthenticationError::NotConfirmed(last_error(failure)))?;

        info!("✓ 登录成功");
        Ok(())
    }

    async fn step<D: Driver>(
        &self,
        driver: &D,
        step: &'static str,
        candidates: &[LocatorStrategy],
    ) -> Result<(), AuthenticationError> {
        let hit = first_success(driver, candidates, self.step_timeout)
            .await
            .map_err(|failure| AuthenticationError::Step {
                step,
                source: last_error(failure),
            })?;
        debug!("登录步骤 `{}` 使用定位策略 [{}]", step, hit.name);
        Ok(())
    }
}

/// 取最后一个候选的失败原因作为代表
fn last_error(failure: LocatorFailure) -> DriverError {
    let summary = failure.to_string();
    failure
        .attempts
        .into_iter()
        .last()
        .map(|attempt| attempt.error)
        .unwrap_or(DriverError::NotFound { selector: summary })
}
