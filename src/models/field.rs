use serde_json::{Map, Value};
use std::borrow::Cow;

/// 生のフィールド値の形状
///
/// チケットのフィールドは文字列・単一選択オブジェクト・リッチテキスト文書・欠損の
/// いずれかとして届く。形状ごとに正規化処理を分けるための分類。
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue<'a> {
    /// そのまま使える文字列（数値・真偽値はJSON表記の文字列として扱う）
    PlainString(Cow<'a, str>),
    /// `value` サブフィールドを持つ単一選択カスタムフィールド
    SingleSelect(&'a Map<String, Value>),
    /// `content` ブロックが入れ子になったリッチテキスト文書
    RichText(&'a Value),
    /// キーなし・null・配列など、取り出せる値がないもの
    Missing,
}

impl<'a> FieldValue<'a> {
    /// 生のJSON値を分類
    pub fn classify(raw: Option<&'a Value>) -> Self {
        let Some(value) = raw else {
            return FieldValue::Missing;
        };

        match value {
            Value::String(s) => FieldValue::PlainString(Cow::Borrowed(s.as_str())),
            Value::Number(n) => FieldValue::PlainString(Cow::Owned(n.to_string())),
            Value::Bool(b) => FieldValue::PlainString(Cow::Owned(b.to_string())),
            Value::Object(obj) if obj.contains_key("content") => FieldValue::RichText(value),
            Value::Object(obj) => FieldValue::SingleSelect(obj),
            Value::Null | Value::Array(_) => FieldValue::Missing,
        }
    }

    /// 平坦な文字列に正規化する。失敗せず、取り出せなければ空文字列を返す。
    pub fn to_text(&self) -> String {
        match self {
            FieldValue::PlainString(s) => s.to_string(),
            FieldValue::SingleSelect(obj) => obj
                .get("value")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            FieldValue::RichText(doc) => first_text_leaf(doc).unwrap_or_default().to_string(),
            FieldValue::Missing => String::new(),
        }
    }
}

/// 先頭ブロック → その先頭の子ブロック → `text` の順にだけ降りる。
///
/// 2段目より深い構造や、先頭以外のブロックにあるテキストは拾わない。
/// どこかの段が欠けていれば `None`。
fn first_text_leaf(doc: &Value) -> Option<&str> {
    doc.get("content")?
        .get(0)?
        .get("content")?
        .get(0)?
        .get("text")?
        .as_str()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_shapes() {
        let plain = json!("Loja Centro");
        let select = json!({ "value": "SP", "id": "10021" });
        let doc = json!({ "type": "doc", "content": [] });
        let list = json!(["a", "b"]);

        assert_eq!(
            FieldValue::classify(Some(&plain)),
            FieldValue::PlainString(Cow::Borrowed("Loja Centro"))
        );
        assert!(matches!(FieldValue::classify(Some(&select)), FieldValue::SingleSelect(_)));
        assert!(matches!(FieldValue::classify(Some(&doc)), FieldValue::RichText(_)));
        assert_eq!(FieldValue::classify(Some(&list)), FieldValue::Missing);
        assert_eq!(FieldValue::classify(Some(&Value::Null)), FieldValue::Missing);
        assert_eq!(FieldValue::classify(None), FieldValue::Missing);
    }

    #[test]
    fn test_single_select_value() {
        let select = json!({ "self": "https://example/option/1", "value": "Campinas" });
        let without_value = json!({ "id": "10021" });
        let non_string_value = json!({ "value": 42 });

        assert_eq!(FieldValue::classify(Some(&select)).to_text(), "Campinas");
        assert_eq!(FieldValue::classify(Some(&without_value)).to_text(), "");
        assert_eq!(FieldValue::classify(Some(&non_string_value)).to_text(), "");
    }

    #[test]
    fn test_rich_text_unwrap() {
        // Given: 2段のcontentの先にtextを持つ文書
        let doc = json!({ "content": [{ "content": [{ "text": "João" }] }] });

        // When/Then: 先頭のテキスト葉が取り出される
        assert_eq!(FieldValue::classify(Some(&doc)).to_text(), "João");
    }

    #[test]
    fn test_rich_text_missing_levels() {
        let empty = json!({ "content": [] });
        let no_inner = json!({ "content": [{ "type": "paragraph" }] });
        let empty_inner = json!({ "content": [{ "content": [] }] });
        let no_text = json!({ "content": [{ "content": [{ "type": "hardBreak" }] }] });
        let content_not_array = json!({ "content": "texto" });

        for doc in [empty, no_inner, empty_inner, no_text, content_not_array] {
            assert_eq!(FieldValue::classify(Some(&doc)).to_text(), "");
        }
    }

    #[test]
    fn test_rich_text_takes_first_leaf_only() {
        let doc = json!({
            "type": "doc",
            "version": 1,
            "content": [
                { "type": "paragraph", "content": [
                    { "type": "text", "text": "Rua A, 100" },
                    { "type": "text", "text": " - fundos" }
                ]},
                { "type": "paragraph", "content": [{ "type": "text", "text": "ignorado" }] }
            ]
        });

        assert_eq!(FieldValue::classify(Some(&doc)).to_text(), "Rua A, 100");
    }

    #[test]
    fn test_scalar_rendering() {
        let number = json!(1234);
        let flag = json!(true);

        assert_eq!(FieldValue::classify(Some(&number)).to_text(), "1234");
        assert_eq!(FieldValue::classify(Some(&flag)).to_text(), "true");
    }
}
