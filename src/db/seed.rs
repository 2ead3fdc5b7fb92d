//! Seed data for the runtime store: a small commerce catalog with products,
//! customers, a month of daily sales, and orders whose totals are computed
//! from product unit prices.

use serde_json::{Value, json};

pub(super) fn products() -> Vec<Value> {
    vec![
        json!({"sku": "LNR-001", "name": "Lunar Lamp", "category": "Lighting", "unit_price": 49.0, "inventory": 125, "status": "active"}),
        json!({"sku": "SLR-002", "name": "Solar Speaker", "category": "Audio", "unit_price": 89.0, "inventory": 82, "status": "active"}),
        json!({"sku": "GLX-003", "name": "Galaxy Projector", "category": "Lighting", "unit_price": 129.0, "inventory": 48, "status": "active"}),
        json!({"sku": "AUR-004", "name": "Aurora Clock", "category": "Home", "unit_price": 75.0, "inventory": 60, "status": "active"}),
        json!({"sku": "COS-005", "name": "Cosmic Candle", "category": "Home", "unit_price": 25.0, "inventory": 210, "status": "active"}),
        json!({"sku": "STL-006", "name": "Starlight Charger", "category": "Accessories", "unit_price": 39.0, "inventory": 155, "status": "active"}),
        json!({"sku": "MET-007", "name": "Meteor Mug", "category": "Kitchen", "unit_price": 19.0, "inventory": 260, "status": "active"}),
        json!({"sku": "NEB-008", "name": "Nebula Diffuser", "category": "Wellness", "unit_price": 59.0, "inventory": 95, "status": "active"}),
        json!({"sku": "ORB-009", "name": "Orbit Headphones", "category": "Audio", "unit_price": 139.0, "inventory": 70, "status": "backorder"}),
        json!({"sku": "ECL-010", "name": "Eclipse Watch", "category": "Wearables", "unit_price": 199.0, "inventory": 38, "status": "preorder"}),
    ]
}

pub(super) fn customers() -> Vec<Value> {
    vec![
        json!({"id": 1, "name": "Aisha Khan", "email": "aisha.khan@example.com", "segment": "Premium", "city": "Seattle", "country": "USA", "lifetime_value": 4820.50, "joined_date": "2022-03-14"}),
        json!({"id": 2, "name": "Leo Martinez", "email": "leo.martinez@example.com", "segment": "Loyal", "city": "Austin", "country": "USA", "lifetime_value": 3655.20, "joined_date": "2021-11-02"}),
        json!({"id": 3, "name": "Harper Chen", "email": "harper.chen@example.com", "segment": "New", "city": "San Francisco", "country": "USA", "lifetime_value": 940.75, "joined_date": "2024-01-18"}),
        json!({"id": 4, "name": "Mateo Silva", "email": "mateo.silva@example.com", "segment": "At Risk", "city": "Toronto", "country": "Canada", "lifetime_value": 2110.40, "joined_date": "2020-07-09"}),
        json!({"id": 5, "name": "Sofia Ibarra", "email": "sofia.ibarra@example.com", "segment": "Premium", "city": "Miami", "country": "USA", "lifetime_value": 5320.10, "joined_date": "2019-05-27"}),
        json!({"id": 6, "name": "Noah Becker", "email": "noah.becker@example.com", "segment": "Loyal", "city": "Berlin", "country": "Germany", "lifetime_value": 2985.90, "joined_date": "2023-04-06"}),
    ]
}

/// Daily gross totals for October 2025; the remaining sales fields derive
/// from these.
const SALES_BASE: [(&str, f64); 31] = [
    ("2025-10-01", 500.0),
    ("2025-10-02", 720.0),
    ("2025-10-03", 610.0),
    ("2025-10-04", 680.0),
    ("2025-10-05", 455.0),
    ("2025-10-06", 790.0),
    ("2025-10-07", 1020.0),
    ("2025-10-08", 880.0),
    ("2025-10-09", 940.0),
    ("2025-10-10", 560.0),
    ("2025-10-11", 730.0),
    ("2025-10-12", 845.0),
    ("2025-10-13", 620.0),
    ("2025-10-14", 970.0),
    ("2025-10-15", 1090.0),
    ("2025-10-16", 780.0),
    ("2025-10-17", 830.0),
    ("2025-10-18", 675.0),
    ("2025-10-19", 940.0),
    ("2025-10-20", 995.0),
    ("2025-10-21", 1105.0),
    ("2025-10-22", 910.0),
    ("2025-10-23", 765.0),
    ("2025-10-24", 830.0),
    ("2025-10-25", 1190.0),
    ("2025-10-26", 880.0),
    ("2025-10-27", 970.0),
    ("2025-10-28", 1050.0),
    ("2025-10-29", 990.0),
    ("2025-10-30", 1125.0),
    ("2025-10-31", 1230.0),
];

pub(super) fn sales() -> Vec<Value> {
    SALES_BASE
        .iter()
        .map(|(date, total)| {
            #[allow(clippy::cast_possible_truncation)]
            let orders = ((total / 22.0).round() as i64).max(18);
            let new_customers = (orders / 5).max(2);
            #[allow(clippy::cast_precision_loss)]
            let avg_order_value = round2(total / orders as f64);
            json!({
                "date": date,
                "total": total,
                "orders": orders,
                "avg_order_value": avg_order_value,
                "new_customers": new_customers,
            })
        })
        .collect()
}

struct OrderTemplate {
    id: &'static str,
    customer_id: i64,
    order_date: &'static str,
    status: &'static str,
    channel: &'static str,
    items: &'static [(&'static str, i64)],
}

const ORDER_TEMPLATES: [OrderTemplate; 12] = [
    OrderTemplate { id: "SO-1001", customer_id: 1, order_date: "2025-10-01", status: "fulfilled", channel: "online", items: &[("LNR-001", 1), ("STL-006", 2)] },
    OrderTemplate { id: "SO-1002", customer_id: 3, order_date: "2025-10-02", status: "fulfilled", channel: "online", items: &[("GLX-003", 1), ("COS-005", 2)] },
    OrderTemplate { id: "SO-1003", customer_id: 4, order_date: "2025-10-03", status: "fulfilled", channel: "retail", items: &[("ORB-009", 1)] },
    OrderTemplate { id: "SO-1004", customer_id: 2, order_date: "2025-10-04", status: "fulfilled", channel: "online", items: &[("NEB-008", 1), ("MET-007", 4)] },
    OrderTemplate { id: "SO-1005", customer_id: 5, order_date: "2025-10-05", status: "fulfilled", channel: "online", items: &[("ECL-010", 1)] },
    OrderTemplate { id: "SO-1006", customer_id: 6, order_date: "2025-10-06", status: "processing", channel: "online", items: &[("SLR-002", 1), ("COS-005", 3)] },
    OrderTemplate { id: "SO-1007", customer_id: 1, order_date: "2025-10-07", status: "fulfilled", channel: "retail", items: &[("AUR-004", 1), ("COS-005", 2), ("MET-007", 2)] },
    OrderTemplate { id: "SO-1008", customer_id: 2, order_date: "2025-10-08", status: "fulfilled", channel: "online", items: &[("LNR-001", 2), ("NEB-008", 1)] },
    OrderTemplate { id: "SO-1009", customer_id: 3, order_date: "2025-10-09", status: "fulfilled", channel: "online", items: &[("STL-006", 1), ("MET-007", 4)] },
    OrderTemplate { id: "SO-1010", customer_id: 4, order_date: "2025-10-10", status: "fulfilled", channel: "retail", items: &[("AUR-004", 2), ("COS-005", 1)] },
    OrderTemplate { id: "SO-1011", customer_id: 5, order_date: "2025-10-11", status: "processing", channel: "online", items: &[("ORB-009", 1), ("MET-007", 2)] },
    OrderTemplate { id: "SO-1012", customer_id: 6, order_date: "2025-10-12", status: "fulfilled", channel: "online", items: &[("GLX-003", 1), ("SLR-002", 1)] },
];

/// Build the orders and order_items tables. Order totals come from product
/// unit prices at seed time; item ids are sequential from 1.
pub(super) fn orders_and_items() -> (Vec<Value>, Vec<Value>) {
    let products = products();
    let price_of = |sku: &str| -> f64 {
        products
            .iter()
            .find(|p| p.get("sku").and_then(Value::as_str) == Some(sku))
            .and_then(|p| p.get("unit_price").and_then(Value::as_f64))
            .unwrap_or(0.0)
    };

    let mut orders = Vec::new();
    let mut items = Vec::new();
    let mut next_item_id = 1i64;

    for template in &ORDER_TEMPLATES {
        let mut total = 0.0;
        for (sku, quantity) in template.items {
            let unit_price = price_of(sku);
            #[allow(clippy::cast_precision_loss)]
            {
                total += unit_price * *quantity as f64;
            }
            items.push(json!({
                "id": next_item_id,
                "order_id": template.id,
                "product_sku": sku,
                "quantity": quantity,
                "unit_price": unit_price,
            }));
            next_item_id += 1;
        }
        orders.push(json!({
            "id": template.id,
            "customer_id": template.customer_id,
            "order_date": template.order_date,
            "status": template.status,
            "channel": template.channel,
            "total": round2(total),
        }));
    }
    (orders, items)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
