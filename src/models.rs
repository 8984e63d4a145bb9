//! Typed records mapped from PayPay API response payloads.
//!
//! The API returns loosely structured JSON; every record here is a flat
//! projection of one payload shape with a default for each absent key, so an
//! empty payload always maps to an all-default record instead of an error.
//! Raw payload values never cross the client boundary.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// User profile returned by `getProfile`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProfileInfo {
    pub name: String,
    pub external_user_id: String,
    pub icon: Option<String>,
}

/// Wallet breakdown returned by `getBalance`. Amounts are in yen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BalanceInfo {
    pub all_balance: i64,
    pub useable_balance: i64,
    pub money_light: i64,
    pub money: i64,
    pub points: i64,
}

/// Payment link state returned by the link check endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LinkInfo {
    pub amount: i64,
    pub money_light: i64,
    pub money: i64,
    pub has_password: bool,
    pub chat_room_id: Option<String>,
    pub status: String,
    pub order_id: String,
    pub link_id: Option<String>,
}

/// Result of `createLink`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateLinkResult {
    pub link: String,
    pub chat_room_id: String,
    pub order_id: Option<String>,
}

/// Result of `createP2PCode`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct P2PCodeResult {
    pub p2pcode: String,
}

/// Result of `sendMoney`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SendMoneyResult {
    pub chat_room_id: String,
    pub order_id: Option<String>,
}

/// One match returned by `searchP2PUser`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserSearchResult {
    pub name: String,
    pub icon: Option<String>,
    pub external_user_id: String,
}

/// Result of `initializeChatroom`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChatRoomResult {
    pub chatroom_id: String,
}

/// Decoded QR/barcode details returned by `getBarcodeInfo`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BarcodeInfo {
    pub amount: Option<i64>,
    pub external_user_id: String,
}

/// One entry of the payment or point history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HistoryItem {
    pub order_id: String,
    pub amount: i64,
    pub transaction_type: String,
    pub datetime: String,
    pub description: Option<String>,
}

/// One chat room listed by `getChatRooms`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChatRoom {
    pub chat_room_id: String,
    pub name: String,
    pub last_message: Option<String>,
    pub updated_at: Option<String>,
}

/// One message listed by `getChatRoomMessages`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChatMessage {
    pub message_id: String,
    pub message: String,
    pub sender_name: Option<String>,
    pub created_at: Option<String>,
}

/// Map a payload object into a record. Malformed payloads degrade to field
/// defaults rather than failing the call.
pub(crate) fn from_payload<T>(payload: Value) -> T
where
    T: DeserializeOwned + Default,
{
    serde_json::from_value(payload).unwrap_or_default()
}

/// Map the array under `key` in a payload, one record per element.
pub(crate) fn list_from_payload<T>(mut payload: Value, key: &str) -> Vec<T>
where
    T: DeserializeOwned + Default,
{
    let items = match payload.get_mut(key).map(Value::take) {
        Some(Value::Array(items)) => items,
        _ => return Vec::new(),
    };
    items.into_iter().map(from_payload).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_payload_maps_to_defaults() {
        let profile: ProfileInfo = from_payload(json!({}));
        assert_eq!(profile.name, "");
        assert_eq!(profile.external_user_id, "");
        assert_eq!(profile.icon, None);

        let balance: BalanceInfo = from_payload(json!({}));
        assert_eq!(balance.all_balance, 0);
        assert_eq!(balance.points, 0);

        let link: LinkInfo = from_payload(json!({}));
        assert!(!link.has_password);
        assert_eq!(link.order_id, "");
        assert_eq!(link.chat_room_id, None);
    }

    #[test]
    fn missing_payload_maps_to_defaults() {
        let result: SendMoneyResult = from_payload(Value::Null);
        assert_eq!(result, SendMoneyResult::default());
    }

    #[test]
    fn camel_case_keys_map_to_snake_case_fields() {
        let user: UserSearchResult = from_payload(json!({
            "name": "Taro",
            "externalUserId": "abc-123",
            "icon": "https://image.paypay.ne.jp/icon.png",
        }));
        assert_eq!(user.external_user_id, "abc-123");
        assert_eq!(user.icon.as_deref(), Some("https://image.paypay.ne.jp/icon.png"));
    }

    #[test]
    fn link_info_maps_documented_keys() {
        let link: LinkInfo = from_payload(json!({
            "amount": 500,
            "moneyLight": 300,
            "money": 200,
            "hasPassword": true,
            "chatRoomId": "sendbird_group_channel_XYZ",
            "status": "PENDING",
            "orderId": "order-1",
        }));
        assert_eq!(link.amount, 500);
        assert!(link.has_password);
        assert_eq!(link.order_id, "order-1");
        assert_eq!(link.link_id, None);
    }

    #[test]
    fn list_mapping_tolerates_missing_and_partial_entries() {
        let items: Vec<HistoryItem> = list_from_payload(json!({}), "history");
        assert!(items.is_empty());

        let items: Vec<HistoryItem> = list_from_payload(
            json!({"history": [{"orderId": "o1", "amount": 100}, {}]}),
            "history",
        );
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].order_id, "o1");
        assert_eq!(items[1].amount, 0);
    }
}
