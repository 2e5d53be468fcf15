use serde::{Deserialize, Serialize, de::Error as _};
use serde_json::{Map, Value};

const RECEIPT_FIELDS: [&str; 5] = ["retailer", "purchaseDate", "purchaseTime", "items", "total"];
const ITEM_FIELDS: [&str; 2] = ["shortDescription", "price"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub retailer: String,
    pub purchase_date: String,
    pub purchase_time: String,
    pub items: Vec<Item>,
    pub total: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub short_description: String,
    pub price: String,
}

impl Item {
    pub fn new(short_description: impl Into<String>, price: impl Into<String>) -> Self {
        Self {
            short_description: short_description.into(),
            price: price.into(),
        }
    }
}

/// Decodes the first JSON value in `body` as a [`Receipt`].
///
/// Anything after that value is ignored. Field names match regardless of
/// ASCII case (`"Retailer"`, `"PURCHASEDATE"`); an exact match wins when
/// several spellings are present.
pub fn decode_receipt(body: &[u8]) -> serde_json::Result<Receipt> {
    let mut value = serde_json::Deserializer::from_slice(body)
        .into_iter::<Value>()
        .next()
        .unwrap_or_else(|| Err(serde_json::Error::custom("empty receipt body")))?;

    if let Value::Object(receipt) = &mut value {
        canonicalize_keys(receipt, &RECEIPT_FIELDS);
        if let Some(Value::Array(items)) = receipt.get_mut("items") {
            for item in items.iter_mut().filter_map(Value::as_object_mut) {
                canonicalize_keys(item, &ITEM_FIELDS);
            }
        }
    }

    serde_json::from_value(value)
}

fn canonicalize_keys(object: &mut Map<String, Value>, fields: &[&str]) {
    for field in fields {
        if object.contains_key(*field) {
            continue;
        }
        let spelling = object
            .keys()
            .find(|key| key.eq_ignore_ascii_case(field))
            .cloned();
        if let Some(value) = spelling.and_then(|key| object.remove(&key)) {
            object.insert((*field).to_string(), value);
        }
    }
}

/// Body returned by `POST /receipts/process`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessResponse {
    pub id: String,
}

/// Body returned by `GET /receipts/{id}/points`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsResponse {
    pub points: i64,
}
