use crate::storage::Link;
use migration::entities::link;

/// 将 Sea-ORM Model 转换为 Link
pub fn model_to_link(model: link::Model) -> Link {
    Link {
        short_code: model.short_code,
        original_url: model.original_url,
        clicks: model.clicks.max(0) as u64,
        created_at: model.created_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_model_to_link_clamps_negative_clicks() {
        let model = link::Model {
            id: 1,
            short_code: "abc123".to_string(),
            original_url: "https://example.com".to_string(),
            clicks: -5,
            created_at: Utc::now(),
        };

        let link = model_to_link(model);

        assert_eq!(link.short_code, "abc123");
        assert_eq!(link.original_url, "https://example.com");
        assert_eq!(link.clicks, 0);
    }
}
