use grok_filter_contracts::chat::GeneratedImage;
use serde_json::Value;

use crate::client::RawImageResponse;
use crate::error::GenerationError;

const HTTP_OK: u16 = 200;

/// Turns a raw generations response into the images to show.
pub fn interpret_response(
    response: &RawImageResponse,
) -> Result<Vec<GeneratedImage>, GenerationError> {
    if response.status != HTTP_OK {
        return Err(GenerationError::Status {
            status: response.status,
            body: response.body.clone(),
        });
    }
    let payload: Value = serde_json::from_str(&response.body)?;
    let images = extract_images(&payload)?;
    if images.is_empty() {
        return Err(GenerationError::NoImageData);
    }
    Ok(images)
}

/// Maps `data[]` entries to images, keeping API order.
///
/// The index in `![image{i}]` is the entry's position in `data`, so skipped
/// entries leave gaps. A non-object entry fails the whole response.
pub fn extract_images(payload: &Value) -> Result<Vec<GeneratedImage>, GenerationError> {
    let rows = match payload.get("data") {
        None | Some(Value::Null) => return Err(GenerationError::MissingData),
        Some(Value::Array(rows)) if rows.is_empty() => return Err(GenerationError::MissingData),
        Some(Value::Array(rows)) => rows,
        Some(other) => {
            return Err(GenerationError::UnexpectedShape(format!(
                "'data' is {}, expected an array",
                json_kind(other)
            )))
        }
    };

    let mut out = Vec::new();
    for (idx, row) in rows.iter().enumerate() {
        let Some(obj) = row.as_object() else {
            return Err(GenerationError::UnexpectedShape(format!(
                "'data[{idx}]' is {}, expected an object",
                json_kind(row)
            )));
        };
        let revised_prompt = obj
            .get("revised_prompt")
            .and_then(Value::as_str)
            .unwrap_or_default();

        if let Some(url) = non_empty_str(obj.get("url")) {
            out.push(GeneratedImage::from_url(idx, url, revised_prompt));
            continue;
        }
        if non_empty_str(obj.get("b64_json")).is_some() {
            out.push(GeneratedImage::base64_placeholder(revised_prompt));
        }
    }
    Ok(out)
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|text| !text.is_empty())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{extract_images, interpret_response};
    use crate::client::RawImageResponse;
    use crate::error::GenerationError;

    fn ok(body: serde_json::Value) -> RawImageResponse {
        RawImageResponse {
            status: 200,
            body: body.to_string(),
        }
    }

    #[test]
    fn url_entries_keep_order_and_prompts() -> anyhow::Result<()> {
        let images = extract_images(&json!({"data": [
            {"url": "http://x/a.png", "revised_prompt": "first"},
            {"url": "http://x/b.png"}
        ]}))?;
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].image, "![image0](http://x/a.png)");
        assert_eq!(images[0].revised_prompt, "first");
        assert_eq!(images[1].image, "![image1](http://x/b.png)");
        assert_eq!(images[1].revised_prompt, "");
        Ok(())
    }

    #[test]
    fn url_wins_over_b64_and_b64_payload_is_dropped() -> anyhow::Result<()> {
        let images = extract_images(&json!({"data": [
            {"url": "", "b64_json": "aGVsbG8=", "revised_prompt": "encoded"},
            {"url": "http://x/c.png", "b64_json": "aGVsbG8="}
        ]}))?;
        assert_eq!(images[0].image, "(Base64-encoded image)");
        assert_eq!(images[0].revised_prompt, "encoded");
        assert!(!images[0].image.contains("aGVsbG8="));
        assert_eq!(images[1].image, "![image1](http://x/c.png)");
        Ok(())
    }

    #[test]
    fn entries_without_image_fields_are_skipped_but_keep_indices() -> anyhow::Result<()> {
        let images = extract_images(&json!({"data": [
            {"revised_prompt": "nothing here"},
            {"url": null, "b64_json": 7},
            {"url": "http://x/d.png"}
        ]}))?;
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].image, "![image2](http://x/d.png)");
        Ok(())
    }

    #[test]
    fn non_object_entry_fails_whole_response() {
        for bad in [json!(42), json!("http://x/e.png"), json!(null), json!([])] {
            let err = interpret_response(&ok(json!({"data": [{"url": "http://x/a.png"}, bad]})));
            match err {
                Err(GenerationError::UnexpectedShape(detail)) => {
                    assert!(detail.starts_with("'data[1]'"), "{detail}");
                }
                other => panic!("unexpected result: {other:?}"),
            }
        }
    }

    #[test]
    fn missing_null_or_empty_data_is_missing_data() {
        for payload in [json!({}), json!({"data": null}), json!({"data": []}), json!([1, 2])] {
            assert!(matches!(
                extract_images(&payload),
                Err(GenerationError::MissingData)
            ));
        }
    }

    #[test]
    fn non_array_data_is_unexpected_shape() {
        let err = extract_images(&json!({"data": {"url": "http://x"}}));
        assert!(matches!(err, Err(GenerationError::UnexpectedShape(_))));
    }

    #[test]
    fn all_entries_skipped_is_no_image_data() {
        let err = interpret_response(&ok(json!({"data": [{"url": ""}, {}]})));
        assert!(matches!(err, Err(GenerationError::NoImageData)));
    }

    #[test]
    fn non_200_is_status_error_before_parsing() {
        let err = interpret_response(&RawImageResponse {
            status: 429,
            body: "slow down".to_string(),
        });
        match err {
            Err(GenerationError::Status { status, body }) => {
                assert_eq!(status, 429);
                assert_eq!(body, "slow down");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn invalid_json_is_decode_error() {
        let err = interpret_response(&RawImageResponse {
            status: 200,
            body: "<html>".to_string(),
        });
        assert!(matches!(err, Err(GenerationError::Decode(_))));
    }
}
