//! Route templates for span and metric labels.

/// Collapse numeric id segments so `/coupons/42/status` and
/// `/coupons/7/status` share one label.
pub(super) fn route_template(path: &str) -> String {
    if path == "/" {
        return "/".to_owned();
    }

    let segments: Vec<&str> = path
        .trim_start_matches('/')
        .split('/')
        .map(|segment| {
            if !segment.is_empty() && segment.bytes().all(|byte| byte.is_ascii_digit()) {
                "{id}"
            } else {
                segment
            }
        })
        .collect();

    format!("/{}", segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_segments_become_placeholders() {
        assert_eq!(route_template("/coupons/42"), "/coupons/{id}");
        assert_eq!(route_template("/coupons/42/status"), "/coupons/{id}/status");
        assert_eq!(route_template("/storefront/quote"), "/storefront/quote");
        assert_eq!(route_template("/"), "/");
    }
}
