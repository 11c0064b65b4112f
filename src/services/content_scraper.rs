//! 主页内容抓取 - 业务能力层
//!
//! 只负责"把一个主页读成快照"，不关心分类和举报。
//! 每个子步骤独立容错：某一项读取失败时使用占位值，不影响其它项。

use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::ScrapeError;
use crate::infrastructure::{Driver, Selector};
use crate::models::snapshot::UNKNOWN_NAME;
use crate::models::{Post, ProfileInfo, ProfileSnapshot, Target};
use crate::workflow::locators;

pub struct ContentScraper {
    max_posts: usize,
    max_images: usize,
    image_host_filter: String,
    unavailable_markers: Vec<String>,
    settle: Duration,
}

impl ContentScraper {
    pub fn new(config: &Config) -> Self {
        Self {
            max_posts: config.max_posts,
            max_images: config.max_images,
            image_host_filter: config.image_host_filter.clone(),
            unavailable_markers: config
                .unavailable_markers
                .iter()
                .map(|m| m.to_lowercase())
                .collect(),
            settle: config.action_settle(),
        }
    }

    /// 抓取目标主页
    ///
    /// 导航失败或页面不可用时返回只带错误标记的快照，不返回错误。
    pub async fn scrape<D: Driver>(&self, target: &Target, driver: &D) -> ProfileSnapshot {
        if let Err(e) = self.open(target, driver).await {
            warn!("抓取 {} 失败: {}", target, e);
            return ProfileSnapshot::failed(target, e.to_string());
        }

        let profile_info = ProfileInfo {
            name: self
                .read_text(driver, &Selector::xpath(locators::PROFILE_NAME))
                .await
                .unwrap_or_else(|| UNKNOWN_NAME.to_string()),
            bio: self
                .read_text(driver, &Selector::xpath(locators::PROFILE_BIO))
                .await
                .unwrap_or_default(),
            url: match driver.current_url().await {
                Ok(url) if !url.is_empty() => url,
                _ => target.to_string(),
            },
        };

        // 帖子是懒加载的，先滚动到底部
        if let Err(e) = driver.scroll_to_bottom().await {
            debug!("滚动页面失败: {}", e);
        } else {
            self.settle().await;
        }

        let posts = self.read_posts(driver).await;
        let image_refs = self.read_images(driver).await;
        let friends_count = self
            .read_text(driver, &Selector::xpath(locators::FRIENDS_LINK))
            .await;

        debug!(
            "抓取完成: {} | 帖子 {} | 图片 {}",
            profile_info.name,
            posts.len(),
            image_refs.len()
        );

        ProfileSnapshot {
            target: target.clone(),
            profile_info,
            posts,
            image_refs,
            friends_count,
            captured_at: chrono::Utc::now(),
            error: None,
        }
    }

    async fn open<D: Driver>(&self, target: &Target, driver: &D) -> Result<(), ScrapeError> {
        driver
            .navigate(target.as_str())
            .await
            .map_err(ScrapeError::Navigation)?;
        self.settle().await;

        let source = driver
            .page_source()
            .await
            .map_err(ScrapeError::Navigation)?
            .to_lowercase();
        if self
            .unavailable_markers
            .iter()
            .any(|marker| source.contains(marker.as_str()))
        {
            return Err(ScrapeError::Unavailable {
                url: target.to_string(),
            });
        }
        Ok(())
    }

    /// 读取单个元素的文本；找不到或为空时返回 None
    async fn read_text<D: Driver>(&self, driver: &D, selector: &Selector) -> Option<String> {
        let element = driver.locate(selector).await.ok()?;
        let text = driver.extract_text(&element).await.ok()?;
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }

    async fn read_posts<D: Driver>(&self, driver: &D) -> Vec<Post> {
        let elements = match driver.locate_all(&Selector::xpath(locators::POSTS)).await {
            Ok(elements) => elements,
            Err(e) => {
                debug!("读取帖子失败: {}", e);
                return Vec::new();
            }
        };

        let mut posts = Vec::new();
        for element in elements.iter().take(self.max_posts) {
            let text = driver
                .extract_text(element)
                .await
                .map(|t| t.trim().to_string())
                .unwrap_or_default();

            let timestamp = match driver.find_within(element, locators::POST_TIMESTAMP_CSS).await {
                Ok(found) => match found.first() {
                    Some(abbr) => match driver.attribute(abbr, "title").await {
                        Ok(Some(title)) if !title.is_empty() => title,
                        _ => driver.extract_text(abbr).await.unwrap_or_default(),
                    },
                    None => String::new(),
                },
                Err(_) => String::new(),
            };

            let reaction_count = driver
                .find_within(element, locators::POST_REACTION_CSS)
                .await
                .map(|found| found.len())
                .unwrap_or(0);

            posts.push(Post {
                text,
                timestamp,
                reaction_count,
            });
        }
        posts
    }

    async fn read_images<D: Driver>(&self, driver: &D) -> Vec<String> {
        let elements = match driver.locate_all(&Selector::css(locators::IMAGES_CSS)).await {
            Ok(elements) => elements,
            Err(e) => {
                debug!("读取图片失败: {}", e);
                return Vec::new();
            }
        };

        let mut refs = Vec::new();
        for element in &elements {
            if refs.len() >= self.max_images {
                break;
            }
            if let Ok(Some(src)) = driver.attribute(element, "src").await {
                if !src.is_empty() && src.contains(self.image_host_filter.as_str()) {
                    refs.push(src);
                }
            }
        }
        refs
    }

    async fn settle(&self) {
        if !self.settle.is_zero() {
            sleep(self.settle).await;
        }
    }
}
