//! Keyword classifiers: user persona and report/resource tag.
//!
//! Both classifiers walk a fixed list in order and return the first category
//! with any keyword contained in the text. There is no scoring.

use strum::{AsRefStr, Display};

/// Coarse user classification, used only to pick a group-invite message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
pub enum Persona {
    #[strum(serialize = "大客户")]
    Vip,
    #[strum(serialize = "推广号")]
    Promoter,
    #[strum(serialize = "资源中介")]
    Broker,
    #[strum(serialize = "普通用户")]
    Ordinary,
}

/// Topic tag attached to report and resource rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
pub enum Tag {
    #[strum(serialize = "担保")]
    Escrow,
    #[strum(serialize = "换汇")]
    Exchange,
    #[strum(serialize = "收款")]
    Payment,
    #[strum(serialize = "其它")]
    Other,
}

const PERSONA_KEYWORDS: &[(Persona, &[&str])] = &[
    (Persona::Vip, &["老板", "担保", "收单", "大额"]),
    (Persona::Promoter, &["推广", "广告", "引流", "运营"]),
    (Persona::Broker, &["招聘", "工人", "司机", "人事"]),
];

const TAG_KEYWORDS: &[(Tag, &[&str])] = &[
    (Tag::Escrow, &["担保", "押金", "中介", "信用"]),
    (Tag::Exchange, &["换汇", "汇率", "转账", "USDT", "币"]),
    (Tag::Payment, &["收款", "码", "通道", "微信", "支付宝"]),
];

fn first_match<T: Copy>(text: &str, table: &[(T, &[&str])]) -> Option<T> {
    table
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| text.contains(k)))
        .map(|(category, _)| *category)
}

/// Classifies the sender from the lower-cased message text.
pub fn classify_persona(text: &str) -> Persona {
    first_match(&text.to_lowercase(), PERSONA_KEYWORDS).unwrap_or(Persona::Ordinary)
}

/// Tags a report or submission. Matching is case-sensitive (`USDT`, not `usdt`).
pub fn classify_tag(text: &str) -> Tag {
    first_match(text, TAG_KEYWORDS).unwrap_or(Tag::Other)
}

/// Group links used by the invite messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupLinks {
    pub main: String,
    pub vip: String,
}

impl GroupLinks {
    pub fn from_config() -> Self {
        Self {
            main: crate::config::GROUP_LINK.clone(),
            vip: crate::config::VIP_GROUP_LINK.clone(),
        }
    }
}

/// Canned group-invite message for a persona.
pub fn invite_hook(persona: Persona, links: &GroupLinks) -> String {
    match persona {
        Persona::Vip => format!("尊敬的贵宾，欢迎加入VIP对接群，专属撮合、优先推荐！进群链接：{}", links.vip),
        Persona::Promoter => format!("推广人专属福利群，资源互换、广告合作，欢迎加入主群：{}", links.main),
        Persona::Broker => format!("中介资源专属群，供需撮合、信息同步，欢迎加入主群：{}", links.main),
        Persona::Ordinary => format!("加入资源互助主群，免费对接供需，合作交流：{}", links.main),
    }
}
