//! 目标平台页面的定位表
//!
//! 每一步的候选按优先级排列；页面改版时只需要改这里。

use phf::phf_map;

use crate::infrastructure::{LocatorStrategy, Selector};
use crate::models::ReportCategory;

// ========== 抓取 ==========

pub const PROFILE_NAME: &str = "//h1";
pub const PROFILE_BIO: &str = "//div[contains(@class, 'bio')]";
pub const POSTS: &str = "//div[contains(@data-ad-preview, 'message')]";
pub const POST_TIMESTAMP_CSS: &str = "abbr";
pub const POST_REACTION_CSS: &str = "span[class*='like']";
pub const IMAGES_CSS: &str = "img";
pub const FRIENDS_LINK: &str = "//a[contains(@href, 'friends')]";

// ========== 类别映射 ==========

/// 抽象类别 → 页面上实际显示的选项文字
static CATEGORY_LABELS: phf::Map<&'static str, &'static str> = phf_map! {
    "Impersonation" => "Pretending to Be Someone",
    "Fake Profile" => "Fake Account",
    "Harassment" => "Harassment or Bullying",
    "Hate Speech" => "Hate Speech",
    "Nudity or Sexual Content" => "Nudity or Sexual Activity",
    "Violence" => "Violence",
    "Self-Injury" => "Suicide or Self-Injury",
    "Spam" => "Spam",
    "Fraud or Scam" => "Scam or Fraud",
    "Underage" => "Involves a Child",
};

pub fn category_label(category: ReportCategory) -> Option<&'static str> {
    CATEGORY_LABELS.get(category.as_str()).copied()
}

// ========== 登录 ==========

pub fn login_email_field(username: &str) -> Vec<LocatorStrategy> {
    vec![
        LocatorStrategy::type_into("email#id", Selector::css("#email"), username),
        LocatorStrategy::type_into("email#name", Selector::css("input[name='email']"), username),
    ]
}

pub fn login_password_field(password: &str) -> Vec<LocatorStrategy> {
    vec![
        LocatorStrategy::type_into("pass#id", Selector::css("#pass"), password),
        LocatorStrategy::type_into("pass#name", Selector::css("input[name='pass']"), password),
    ]
}

pub fn login_button() -> Vec<LocatorStrategy> {
    vec![
        LocatorStrategy::click("loginbutton#id", Selector::css("#loginbutton")),
        LocatorStrategy::click("login#name", Selector::css("button[name='login']")),
        LocatorStrategy::click("submit", Selector::xpath("//button[@type='submit']")),
    ]
}

pub fn logged_in_marker() -> Vec<LocatorStrategy> {
    vec![
        LocatorStrategy::present("brand-label", Selector::css("[aria-label='Facebook']")),
        LocatorStrategy::present("navigation", Selector::css("div[role='navigation']")),
    ]
}

// ========== 举报流程 ==========

pub fn menu_candidates() -> Vec<LocatorStrategy> {
    vec![
        LocatorStrategy::click(
            "more-options#aria",
            Selector::xpath("//div[@aria-label='More options']"),
        ),
        LocatorStrategy::click(
            "more-options#class",
            Selector::xpath("//div[contains(@class, 'more_options')]"),
        ),
        LocatorStrategy::click("ellipsis#text", Selector::xpath("//span[contains(text(), '...')]")),
        LocatorStrategy::click(
            "more#button",
            Selector::xpath("//button[contains(@aria-label, 'More')]"),
        ),
    ]
}

pub fn report_option_candidates() -> Vec<LocatorStrategy> {
    [
        "Find support or report profile",
        "Report profile",
        "Give feedback or report this profile",
        "Report",
    ]
    .iter()
    .map(|text| LocatorStrategy::click(format!("report#{}", text), span_containing(text)))
    .collect()
}

/// 类别选项（文字或单选项）
pub fn category_candidates(label: &str) -> Vec<LocatorStrategy> {
    vec![
        LocatorStrategy::click(format!("category#{}", label), span_containing(label)),
        LocatorStrategy::click(
            format!("category-radio#{}", label),
            Selector::xpath(format!(
                "//div[@role='radio' and contains(., {})]",
                xpath_literal(label)
            )),
        ),
    ]
}

/// 补充信息页：点"下一步"；页面直接给出提交按钮时视为已跳过
pub fn details_candidates() -> Vec<LocatorStrategy> {
    vec![
        LocatorStrategy::click(
            "details#next-button",
            Selector::xpath("//div[@role='button' and contains(., 'Next')]"),
        ),
        LocatorStrategy::click("details#next", span_containing("Next")),
        LocatorStrategy::click("details#continue", span_containing("Continue")),
        LocatorStrategy::present("details#skipped", submit_button_selector()),
    ]
}

pub fn submit_candidates() -> Vec<LocatorStrategy> {
    vec![
        LocatorStrategy::click("submit#button", submit_button_selector()),
        LocatorStrategy::click("submit#span", span_containing("Submit")),
        LocatorStrategy::click(
            "submit#native",
            Selector::xpath("//button[contains(., 'Submit')]"),
        ),
    ]
}

pub fn confirmation_candidates() -> Vec<LocatorStrategy> {
    vec![
        LocatorStrategy::click("done#aria", Selector::xpath("//div[@aria-label='Done']")),
        LocatorStrategy::click("done#span", span_containing("Done")),
    ]
}

fn submit_button_selector() -> Selector {
    Selector::xpath("//div[@role='button' and contains(., 'Submit')]")
}

fn span_containing(text: &str) -> Selector {
    Selector::xpath(format!("//span[contains(text(), {})]", xpath_literal(text)))
}

/// 生成 XPath 字符串字面量，文本同时含单双引号时使用 concat()
pub fn xpath_literal(text: &str) -> String {
    if !text.contains('\'') {
        return format!("'{}'", text);
    }
    if !text.contains('"') {
        return format!("\"{}\"", text);
    }
    let parts: Vec<String> = text
        .split('\'')
        .map(|part| format!("'{}'", part))
        .collect();
    format!("concat({})", parts.join(", \"'\", "))
}
