//! 集成测试共用的内存驱动和脚本化分类服务
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use profile_report_flow::config::{Config, Credentials};
use profile_report_flow::error::{ClassificationError, DriverError, DriverInitError, DriverResult};
use profile_report_flow::infrastructure::{Driver, DriverFactory, LocatorStrategy, Selector};
use profile_report_flow::services::ClassificationBackend;
use profile_report_flow::workflow::locators;

pub const UNAVAILABLE_HTML: &str = "<html><body>Sorry, this page isn't available.</body></html>";

/// 测试用配置：无等待、无间隔
pub fn test_config(results_dir: &Path) -> Config {
    Config {
        credentials: Credentials {
            username: "tester@example.com".to_string(),
            password: "secret".to_string(),
        },
        max_reports_per_session: 5,
        delay_between_reports_secs: 0,
        confidence_threshold: 80.0,
        results_dir: results_dir.display().to_string(),
        log_file: None,
        page_timeout_secs: 1,
        step_timeout_secs: 0,
        action_settle_ms: 0,
        classifier_timeout_secs: 5,
        ..Config::default()
    }
}

pub fn profile_url(name: &str) -> String {
    format!("https://www.facebook.com/{}", name)
}

// ========== 内存驱动 ==========

#[derive(Debug, Clone, Default)]
pub struct FakeElement {
    pub selector: String,
    pub text: String,
    pub attrs: HashMap<String, String>,
    pub children: HashMap<String, Vec<FakeElement>>,
}

impl FakeElement {
    fn generic(selector: &Selector) -> Self {
        Self {
            selector: selector.as_str().to_string(),
            ..Self::default()
        }
    }

    fn with_text(selector: &Selector, text: &str) -> Self {
        Self {
            selector: selector.as_str().to_string(),
            text: text.to_string(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct FakePost {
    pub text: String,
    pub timestamp: String,
    pub reactions: usize,
}

/// 一个主页的可抓取内容
#[derive(Debug, Clone)]
pub struct FakePage {
    pub name: String,
    pub bio: String,
    pub posts: Vec<FakePost>,
    pub images: Vec<String>,
    pub friends: Option<String>,
}

impl Default for FakePage {
    fn default() -> Self {
        Self {
            name: "Test Profile".to_string(),
            bio: String::new(),
            posts: Vec::new(),
            images: Vec::new(),
            friends: None,
        }
    }
}

#[derive(Default)]
struct FakeState {
    current_url: String,
    blocked: HashSet<String>,
    blocked_on: HashMap<String, HashSet<String>>,
    unavailable: HashSet<String>,
    failing_navigation: HashSet<String>,
    pages: HashMap<String, FakePage>,
    navigations: Vec<String>,
    clicks: Vec<(String, String)>,
    typed: Vec<(String, String)>,
    releases: usize,
}

/// 默认所有元素都能找到、所有操作都成功；用 builder 方法屏蔽特定选择器
#[derive(Clone, Default)]
pub struct FakeDriver {
    state: Arc<Mutex<FakeState>>,
}

impl FakeDriver {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state(self, f: impl FnOnce(&mut FakeState)) -> Self {
        f(&mut self.state.lock().unwrap());
        self
    }

    /// 所有页面上都找不到该选择器
    pub fn block(self, selector: &str) -> Self {
        self.with_state(|s| {
            s.blocked.insert(selector.to_string());
        })
    }

    /// 只在指定页面上找不到该选择器
    pub fn block_on(self, url: &str, selector: &str) -> Self {
        self.with_state(|s| {
            s.blocked_on
                .entry(url.to_string())
                .or_default()
                .insert(selector.to_string());
        })
    }

    pub fn block_all(mut self, candidates: &[LocatorStrategy]) -> Self {
        for candidate in candidates {
            self = self.block(candidate.selector.as_str());
        }
        self
    }

    pub fn block_all_on(mut self, url: &str, candidates: &[LocatorStrategy]) -> Self {
        for candidate in candidates {
            self = self.block_on(url, candidate.selector.as_str());
        }
        self
    }

    pub fn unavailable(self, url: &str) -> Self {
        self.with_state(|s| {
            s.unavailable.insert(url.to_string());
        })
    }

    pub fn failing_navigation(self, url: &str) -> Self {
        self.with_state(|s| {
            s.failing_navigation.insert(url.to_string());
        })
    }

    pub fn with_page(self, url: &str, page: FakePage) -> Self {
        self.with_state(|s| {
            s.pages.insert(url.to_string(), page);
        })
    }

    pub fn navigations(&self) -> Vec<String> {
        self.state.lock().unwrap().navigations.clone()
    }

    /// (页面地址, 选择器)
    pub fn clicks(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().clicks.clone()
    }

    pub fn clicked(&self, selector: &str) -> bool {
        self.clicks().iter().any(|(_, s)| s == selector)
    }

    pub fn typed(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().typed.clone()
    }

    pub fn release_count(&self) -> usize {
        self.state.lock().unwrap().releases
    }

    fn is_blocked(state: &FakeState, selector: &Selector) -> bool {
        let key = selector.as_str();
        state.blocked.contains(key)
            || state
                .blocked_on
                .get(&state.current_url)
                .is_some_and(|set| set.contains(key))
    }

    fn current_page(state: &FakeState) -> FakePage {
        state
            .pages
            .get(&state.current_url)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl Driver for FakeDriver {
    type Element = FakeElement;

    async fn navigate(&self, url: &str) -> DriverResult<()> {
        let mut state = self.state.lock().unwrap();
        state.navigations.push(url.to_string());
        if state.failing_navigation.contains(url) {
            return Err(DriverError::Navigation {
                url: url.to_string(),
                reason: "net::ERR_CONNECTION_RESET".to_string(),
            });
        }
        state.current_url = url.to_string();
        Ok(())
    }

    async fn locate(&self, selector: &Selector) -> DriverResult<FakeElement> {
        let state = self.state.lock().unwrap();
        if Self::is_blocked(&state, selector) {
            return Err(DriverError::NotFound {
                selector: selector.to_string(),
            });
        }

        let page = Self::current_page(&state);
        let key = selector.as_str();
        if key == locators::PROFILE_NAME {
            Ok(FakeElement::with_text(selector, &page.name))
        } else if key == locators::PROFILE_BIO {
            Ok(FakeElement::with_text(selector, &page.bio))
        } else if key == locators::FRIENDS_LINK {
            match page.friends {
                Some(friends) => Ok(FakeElement::with_text(selector, &friends)),
                None => Err(DriverError::NotFound {
                    selector: selector.to_string(),
                }),
            }
        } else {
            Ok(FakeElement::generic(selector))
        }
    }

    async fn locate_all(&self, selector: &Selector) -> DriverResult<Vec<FakeElement>> {
        let state = self.state.lock().unwrap();
        if Self::is_blocked(&state, selector) {
            return Ok(Vec::new());
        }

        let page = Self::current_page(&state);
        let key = selector.as_str();
        if key == locators::POSTS {
            Ok(page
                .posts
                .iter()
                .map(|post| {
                    let mut abbr = FakeElement::default();
                    abbr.attrs
                        .insert("title".to_string(), post.timestamp.clone());
                    let reactions = vec![FakeElement::default(); post.reactions];

                    let mut element = FakeElement::with_text(selector, &post.text);
                    element
                        .children
                        .insert(locators::POST_TIMESTAMP_CSS.to_string(), vec![abbr]);
                    element
                        .children
                        .insert(locators::POST_REACTION_CSS.to_string(), reactions);
                    element
                })
                .collect())
        } else if key == locators::IMAGES_CSS {
            Ok(page
                .images
                .iter()
                .map(|src| {
                    let mut element = FakeElement::generic(selector);
                    element.attrs.insert("src".to_string(), src.clone());
                    element
                })
                .collect())
        } else {
            Ok(vec![FakeElement::generic(selector)])
        }
    }

    async fn click(&self, element: &FakeElement) -> DriverResult<()> {
        let mut state = self.state.lock().unwrap();
        let url = state.current_url.clone();
        state.clicks.push((url, element.selector.clone()));
        Ok(())
    }

    async fn type_text(&self, element: &FakeElement, text: &str) -> DriverResult<()> {
        self.state
            .lock()
            .unwrap()
            .typed
            .push((element.selector.clone(), text.to_string()));
        Ok(())
    }

    async fn extract_text(&self, element: &FakeElement) -> DriverResult<String> {
        Ok(element.text.clone())
    }

    async fn attribute(&self, element: &FakeElement, name: &str) -> DriverResult<Option<String>> {
        Ok(element.attrs.get(name).cloned())
    }

    async fn find_within(&self, element: &FakeElement, css: &str) -> DriverResult<Vec<FakeElement>> {
        Ok(element.children.get(css).cloned().unwrap_or_default())
    }

    async fn page_source(&self) -> DriverResult<String> {
        let state = self.state.lock().unwrap();
        if state.unavailable.contains(&state.current_url) {
            Ok(UNAVAILABLE_HTML.to_string())
        } else {
            Ok("<html><body>profile</body></html>".to_string())
        }
    }

    async fn current_url(&self) -> DriverResult<String> {
        Ok(self.state.lock().unwrap().current_url.clone())
    }

    async fn scroll_to_bottom(&self) -> DriverResult<()> {
        Ok(())
    }

    async fn release(&self) {
        self.state.lock().unwrap().releases += 1;
    }

    /// 内存驱动中元素要么立即存在要么永远不存在，不需要轮询
    async fn wait_until_present(
        &self,
        selector: &Selector,
        _timeout: Duration,
    ) -> DriverResult<FakeElement> {
        self.locate(selector).await
    }
}

/// 每次都交出同一个内存驱动的克隆
pub struct FakeFactory {
    driver: FakeDriver,
    fail: bool,
    acquired: AtomicUsize,
}

impl FakeFactory {
    pub fn new(driver: FakeDriver) -> Self {
        Self {
            driver,
            fail: false,
            acquired: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            driver: FakeDriver::new(),
            fail: true,
            acquired: AtomicUsize::new(0),
        }
    }

    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DriverFactory for FakeFactory {
    type Driver = FakeDriver;

    async fn acquire(&self) -> Result<FakeDriver, DriverInitError> {
        self.acquired.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(DriverInitError::Launch("chrome not found".to_string()));
        }
        Ok(self.driver.clone())
    }
}

// ========== 脚本化分类服务 ==========

#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    Error,
    /// 永不返回，用于测试超时
    Hang,
}

/// 按提示词中包含的子串匹配回复，未匹配时返回空结果
pub struct ScriptedBackend {
    rules: Vec<(String, Reply)>,
    latency: Duration,
    calls: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            latency: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn reply(mut self, needle: &str, reply: Reply) -> Self {
        self.rules.push((needle.to_string(), reply));
        self
    }

    /// 主页信息单元的提示词包含主页地址
    pub fn violation_for(self, url: &str, kind: &str, score: f64, category: &str) -> Self {
        self.reply(url, Reply::Text(violation_json(kind, score, category)))
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ClassificationBackend for ScriptedBackend {
    async fn complete(&self, _system: &str, prompt: &str) -> Result<String, ClassificationError> {
        self.calls.lock().unwrap().push(prompt.to_string());
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let reply = self
            .rules
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map(|(_, reply)| reply.clone());

        match reply {
            None => Ok(r#"{"violations": []}"#.to_string()),
            Some(Reply::Text(text)) => Ok(text),
            Some(Reply::Error) => Err(ClassificationError::Backend {
                model: "scripted".to_string(),
                reason: "502 Bad Gateway".to_string(),
            }),
            Some(Reply::Hang) => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        }
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

pub fn violation_json(kind: &str, score: f64, category: &str) -> String {
    serde_json::json!({
        "violations": [{
            "violation_type": kind,
            "confidence_score": score,
            "evidence": format!("evidence for {}", kind),
            "report_category": category,
        }]
    })
    .to_string()
}
