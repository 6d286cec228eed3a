//! Structured resource submissions: `发布：地区 + 类型 + 内容 + 联系方式`

use thiserror::Error;

use crate::classify::{classify_tag, Tag};

/// Reply sent when a submission cannot be parsed.
pub const USAGE: &str = "格式错误，正确格式：发布：地区 + 类型 + 内容 + 联系方式";

/// A parsed submission, ready for the resources worksheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceSubmission {
    pub region: String,
    pub resource_type: String,
    pub content: String,
    pub contact: String,
}

impl ResourceSubmission {
    /// Tag derived from the content and contact fields.
    pub fn tag(&self) -> Tag {
        classify_tag(&format!("{}{}", self.content, self.contact))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PublishFormError {
    #[error("expected 4 fields separated by '+', got {0}")]
    FieldCount(usize),

    #[error("field {0} is empty")]
    EmptyField(&'static str),
}

const FIELD_NAMES: [&str; 4] = ["region", "type", "content", "contact"];

/// Parses the raw (trimmed, not normalized) message text.
pub fn parse_publish_form(raw: &str) -> Result<ResourceSubmission, PublishFormError> {
    let body = raw.replace("发布：", "").replace("发布:", "");
    let fields: Vec<&str> = body.split('+').map(str::trim).collect();

    let [region, resource_type, content, contact] = fields.as_slice() else {
        return Err(PublishFormError::FieldCount(fields.len()));
    };

    for (value, name) in [region, resource_type, content, contact].iter().zip(FIELD_NAMES) {
        if value.is_empty() {
            return Err(PublishFormError::EmptyField(name));
        }
    }

    Ok(ResourceSubmission {
        region: region.to_string(),
        resource_type: resource_type.to_string(),
        content: content.to_string(),
        contact: contact.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_full_width_colon() {
        let submission = parse_publish_form("发布：上海 + 招聘 + 招司机两名 + 微信abc").unwrap();
        assert_eq!(
            submission,
            ResourceSubmission {
                region: "上海".to_string(),
                resource_type: "招聘".to_string(),
                content: "招司机两名".to_string(),
                contact: "微信abc".to_string(),
            }
        );
        assert_eq!(submission.tag(), Tag::Payment);
    }

    #[test]
    fn test_parse_ascii_colon() {
        let submission = parse_publish_form("发布:深圳+换汇+USDT+tg@someone").unwrap();
        assert_eq!(submission.region, "深圳");
        assert_eq!(submission.tag(), Tag::Exchange);
    }

    #[test]
    fn test_too_few_fields() {
        assert_eq!(
            parse_publish_form("发布：上海 + 招聘"),
            Err(PublishFormError::FieldCount(2))
        );
    }

    #[test]
    fn test_too_many_fields() {
        assert_eq!(
            parse_publish_form("发布：a+b+c+d+e"),
            Err(PublishFormError::FieldCount(5))
        );
    }

    #[test]
    fn test_empty_field() {
        assert_eq!(
            parse_publish_form("发布：上海 +  + 内容 + 电话"),
            Err(PublishFormError::EmptyField("type"))
        );
    }
}
