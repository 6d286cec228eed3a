//! The keyword chain that decides which handler a message goes to.

use strum::{AsRefStr, Display};

/// Message category. The label is what lands in the interactions worksheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
pub enum Intent {
    #[strum(serialize = "资源请求")]
    ResourceRequest,
    #[strum(serialize = "资源发布意图")]
    PublishIntent,
    #[strum(serialize = "举报")]
    Report,
    #[strum(serialize = "加群")]
    JoinGroup,
    #[strum(serialize = "身份询问")]
    Identity,
    #[strum(serialize = "资源发布")]
    PublishForm,
    #[strum(serialize = "知识库")]
    KnowledgeBase,
    #[strum(serialize = "AI对话")]
    Fallback,
}

const JOIN_GROUP_PHRASES: &[&str] = &["加群", "进群", "入群"];
const IDENTITY_PHRASES: &[&str] = &["你是谁", "你叫啥", "你叫什么"];

/// Prefix of a structured submission, in normalized form.
pub const PUBLISH_PREFIX: &str = "发布:";

/// Runs the fixed chain against the normalized text.
///
/// Returns `None` when nothing in the chain matched; the caller then tries the
/// knowledge base and finally the completion fallback.
pub fn detect_intent(clean: &str) -> Option<Intent> {
    if clean.contains("我要资源") {
        return Some(Intent::ResourceRequest);
    }
    if clean.contains("我要发布") {
        return Some(Intent::PublishIntent);
    }
    if clean.contains("举报") {
        return Some(Intent::Report);
    }
    if JOIN_GROUP_PHRASES.contains(&clean) {
        return Some(Intent::JoinGroup);
    }
    if IDENTITY_PHRASES.contains(&clean) {
        return Some(Intent::Identity);
    }
    if clean.starts_with(PUBLISH_PREFIX) {
        return Some(Intent::PublishForm);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::normalize;
    use pretty_assertions::assert_eq;

    fn intent_of(input: &str) -> Option<Intent> {
        detect_intent(&normalize(input).clean)
    }

    #[test]
    fn test_first_checked_category_wins() {
        assert_eq!(intent_of("举报一下，我要资源"), Some(Intent::ResourceRequest));
        assert_eq!(intent_of("我要发布，顺便举报"), Some(Intent::PublishIntent));
        assert_eq!(intent_of("我要发布 我要资源"), Some(Intent::ResourceRequest));
    }

    #[test]
    fn test_exact_phrases_need_whole_message() {
        assert_eq!(intent_of(" 加 群 "), Some(Intent::JoinGroup));
        assert_eq!(intent_of("入群"), Some(Intent::JoinGroup));
        assert_eq!(intent_of("我想加群"), None);
        assert_eq!(intent_of("你叫什么"), Some(Intent::Identity));
        assert_eq!(intent_of("你叫什么名字"), None);
    }

    #[test]
    fn test_publish_prefix_accepts_full_width_colon() {
        assert_eq!(intent_of("发布：上海+招聘+司机+微信"), Some(Intent::PublishForm));
        assert_eq!(intent_of("发布:上海"), Some(Intent::PublishForm));
        assert_eq!(intent_of("请发布:上海"), None);
    }

    #[test]
    fn test_report_beats_publish_form() {
        assert_eq!(intent_of("发布：举报+a+b+c"), Some(Intent::Report));
    }

    #[test]
    fn test_intent_labels() {
        assert_eq!(Intent::ResourceRequest.as_ref(), "资源请求");
        assert_eq!(Intent::PublishIntent.to_string(), "资源发布意图");
    }
}
